//! Parsed translation units.

use crate::diagnostic::DiagnosticCollection;
use crate::error::{ClangError, Result};
use crate::handle::{IndexKind, SafeHandle, TranslationUnitKind};
use crate::options::SaveOptions;
use crate::resource_usage::ResourceUsage;
use crate::util::{path_to_cstring, take_string};
use std::cell::OnceCell;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A source file parsed by libclang, or an AST file loaded from disk.
///
/// A translation unit keeps the index it was created from alive.
pub struct TranslationUnit {
    // Fields drop in declaration order: the unit and every holder of a unit
    // share go before the index.
    handle: SafeHandle<TranslationUnitKind>,
    diagnostics: OnceCell<DiagnosticCollection>,
    spelling: OnceCell<String>,
    resource_usage: OnceCell<ResourceUsage>,
    index: SafeHandle<IndexKind>,
}

impl TranslationUnit {
    pub(crate) fn new(
        handle: SafeHandle<TranslationUnitKind>,
        index: SafeHandle<IndexKind>,
    ) -> Self {
        Self {
            handle,
            diagnostics: OnceCell::new(),
            spelling: OnceCell::new(),
            resource_usage: OnceCell::new(),
            index,
        }
    }

    /// The original source file name, or the AST file name for a loaded unit.
    pub fn spelling(&self) -> Result<&str> {
        let raw = self.handle.raw()?;
        if let Some(spelling) = self.spelling.get() {
            return Ok(spelling);
        }
        let native = self.handle.native();
        // SAFETY: `raw` is live; the returned string is taken over.
        let spelling = unsafe { take_string(native, native.translation_unit_spelling(raw)) };
        Ok(self.spelling.get_or_init(|| spelling))
    }

    /// Memory used by this translation unit. Computed once.
    pub fn resource_usage(&self) -> Result<&ResourceUsage> {
        let raw = self.handle.raw()?;
        if let Some(usage) = self.resource_usage.get() {
            return Ok(usage);
        }
        let native = self.handle.native();
        // SAFETY: `raw` is live; the usage structure is disposed by `from_native`.
        let usage = unsafe { ResourceUsage::from_native(native, native.resource_usage(raw)) };
        Ok(self.resource_usage.get_or_init(|| usage))
    }

    /// Diagnostics produced while parsing.
    pub fn diagnostics(&self) -> Result<&DiagnosticCollection> {
        self.handle.raw()?;
        if let Some(diagnostics) = self.diagnostics.get() {
            return Ok(diagnostics);
        }
        let diagnostics = DiagnosticCollection::from_unit(self.handle.share()?)?;
        Ok(self.diagnostics.get_or_init(|| diagnostics))
    }

    /// Write the unit to an AST file.
    ///
    /// `None` uses libclang's default save options for this unit.
    pub fn save(&self, path: impl AsRef<Path>, options: Option<SaveOptions>) -> Result<()> {
        let raw = self.handle.raw()?;
        let path = path.as_ref();
        let c_path = path_to_cstring(path, "path")?;
        let native = self.handle.native();

        // SAFETY: `raw` is live and `c_path` outlives the call.
        let code = unsafe {
            let options = match options {
                Some(options) => options.bits(),
                None => native.default_save_options(raw),
            };
            native.save_translation_unit(raw, c_path.as_ptr(), options)
        };
        debug!(path = %path.display(), code, "saved translation unit");
        ClangError::check_save(code)
    }

    /// Release the translation unit. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.handle.release();
        if let Some(diagnostics) = self.diagnostics.get_mut() {
            diagnostics.dispose();
        }
        self.index.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling().unwrap_or_default())
    }
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("handle", &self.handle)
            .field("index", &self.index)
            .finish()
    }
}

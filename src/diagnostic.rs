//! Diagnostics from translation units and serialized diagnostic files.

use crate::collection::LazyList;
use crate::error::Result;
use crate::handle::{DiagnosticKind, DiagnosticSetKind, SafeHandle, TranslationUnitKind};
use crate::native::{Native, RawHandle};
use crate::options::DiagnosticDisplayOptions;
use crate::status::DiagnosticSeverity;
use crate::util::{native_index, take_string};
use clang_sys::CXString;
use libc::c_uint;
use std::cell::OnceCell;
use std::fmt;
use std::ptr;
use std::rc::Rc;

/// The category a diagnostic belongs to, such as "Semantic Issue".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiagnosticCategory {
    number: u32,
    text: String,
}

impl DiagnosticCategory {
    /// libclang's category number; `0` means uncategorized.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single diagnostic message.
///
/// Severity and spelling are read when the diagnostic is loaded. Everything else
/// is read from the native diagnostic on first use and cached. A diagnostic lives
/// inside the collection it was loaded from and is released with it.
pub struct Diagnostic {
    handle: SafeHandle<DiagnosticKind>,
    severity: DiagnosticSeverity,
    spelling: String,
    category: OnceCell<DiagnosticCategory>,
    options: OnceCell<(String, String)>,
    children: OnceCell<DiagnosticCollection>,
}

impl Diagnostic {
    fn load(handle: SafeHandle<DiagnosticKind>) -> Result<Self> {
        let raw = handle.raw()?;
        let native = handle.native();
        // SAFETY: `raw` is a live diagnostic owned by `handle`.
        let (severity, spelling) = unsafe {
            (
                native.diagnostic_severity(raw),
                take_string(native, native.diagnostic_spelling(raw)),
            )
        };
        Ok(Self {
            handle,
            severity: DiagnosticSeverity::from_raw(severity),
            spelling,
            category: OnceCell::new(),
            options: OnceCell::new(),
            children: OnceCell::new(),
        })
    }

    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    /// The diagnostic text, without location or option information.
    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    /// Render the diagnostic the way clang prints it.
    ///
    /// `None` uses libclang's default display options.
    pub fn format(&self, options: Option<DiagnosticDisplayOptions>) -> Result<String> {
        let raw = self.handle.raw()?;
        let native = self.handle.native();
        let options = match options {
            Some(options) => options,
            // SAFETY: no preconditions.
            None => DiagnosticDisplayOptions::from_bits(unsafe {
                native.default_diagnostic_display_options()
            }),
        };
        // SAFETY: `raw` is live; the string is taken over.
        Ok(unsafe { take_string(native, native.format_diagnostic(raw, options.bits())) })
    }

    pub fn category(&self) -> Result<&DiagnosticCategory> {
        let raw = self.handle.raw()?;
        if let Some(category) = self.category.get() {
            return Ok(category);
        }
        let native = self.handle.native();
        // SAFETY: `raw` is live; the string is taken over.
        let category = unsafe {
            DiagnosticCategory {
                number: native.diagnostic_category(raw),
                text: take_string(native, native.diagnostic_category_text(raw)),
            }
        };
        Ok(self.category.get_or_init(|| category))
    }

    /// The command-line option that enables this diagnostic (`-Wunused-variable`),
    /// or an empty string.
    pub fn enable_option(&self) -> Result<&str> {
        Ok(&self.options()?.0)
    }

    /// The command-line option that disables this diagnostic (`-Wno-unused-variable`),
    /// or an empty string.
    pub fn disable_option(&self) -> Result<&str> {
        Ok(&self.options()?.1)
    }

    fn options(&self) -> Result<&(String, String)> {
        let raw = self.handle.raw()?;
        if let Some(options) = self.options.get() {
            return Ok(options);
        }
        let native = self.handle.native();
        let mut disable = CXString {
            data: ptr::null(),
            private_flags: 0,
        };
        // SAFETY: `raw` is live. Both returned strings are taken over.
        let options = unsafe {
            let enable = take_string(native, native.diagnostic_option(raw, &mut disable));
            (enable, take_string(native, disable))
        };
        Ok(self.options.get_or_init(|| options))
    }

    /// Notes and other diagnostics attached to this one.
    pub fn children(&self) -> Result<&DiagnosticCollection> {
        let raw = self.handle.raw()?;
        if let Some(children) = self.children.get() {
            return Ok(children);
        }
        // SAFETY: `raw` is live. The returned set belongs to the diagnostic.
        let set = unsafe { self.handle.native().child_diagnostics(raw) };
        let children = DiagnosticCollection::new(Source::Children {
            set,
            parent: self.handle.share()?,
        })?;
        Ok(self.children.get_or_init(|| children))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostic")
            .field("severity", &self.severity)
            .field("spelling", &self.spelling)
            .finish()
    }
}

enum Source {
    Set(SafeHandle<DiagnosticSetKind>),
    Unit(SafeHandle<TranslationUnitKind>),
    /// A child set; owned by `parent` and never disposed on its own.
    Children {
        set: RawHandle,
        parent: SafeHandle<DiagnosticKind>,
    },
}

impl Source {
    fn native(&self) -> &dyn Native {
        match self {
            Source::Set(set) => set.native(),
            Source::Unit(unit) => unit.native(),
            Source::Children { parent, .. } => parent.native(),
        }
    }

    fn native_rc(&self) -> Rc<dyn Native> {
        match self {
            Source::Set(set) => set.native_rc(),
            Source::Unit(unit) => unit.native_rc(),
            Source::Children { parent, .. } => parent.native_rc(),
        }
    }

    /// The live set or unit handle, or `Disposed`.
    fn raw(&self) -> Result<RawHandle> {
        match self {
            Source::Set(set) => set.raw(),
            Source::Unit(unit) => unit.raw(),
            Source::Children { set, parent } => parent.raw().map(|_| *set),
        }
    }

    fn len(&self) -> Result<usize> {
        let raw = self.raw()?;
        let native = self.native();
        // SAFETY: `raw` is live; a null child set is empty.
        let len = unsafe {
            match self {
                Source::Unit(_) => native.num_diagnostics(raw),
                _ if raw.is_null() => 0,
                _ => native.num_diagnostics_in_set(raw),
            }
        };
        Ok(len as usize)
    }

    fn diagnostic(&self, index: c_uint) -> Result<RawHandle> {
        let raw = self.raw()?;
        let native = self.native();
        // SAFETY: `raw` is live and `index` was range checked.
        Ok(unsafe {
            match self {
                Source::Unit(_) => native.diagnostic(raw, index),
                _ => native.diagnostic_in_set(raw, index),
            }
        })
    }

    fn release(&mut self) {
        match self {
            Source::Set(set) => set.release(),
            Source::Unit(unit) => unit.release(),
            Source::Children { parent, .. } => parent.release(),
        }
    }

    fn is_released(&self) -> bool {
        match self {
            Source::Set(set) => set.is_released(),
            Source::Unit(unit) => unit.is_released(),
            Source::Children { parent, .. } => parent.is_released(),
        }
    }
}

/// Read-only list of diagnostics.
///
/// Backed by a diagnostic set loaded from disk, by a translation unit, or by
/// the parent of a group of child diagnostics. The backing object is kept alive
/// by the collection.
pub struct DiagnosticCollection {
    items: LazyList<Diagnostic>,
    source: Source,
}

impl DiagnosticCollection {
    pub(crate) fn from_set(set: SafeHandle<DiagnosticSetKind>) -> Result<Self> {
        Self::new(Source::Set(set))
    }

    pub(crate) fn from_unit(unit: SafeHandle<TranslationUnitKind>) -> Result<Self> {
        Self::new(Source::Unit(unit))
    }

    fn new(source: Source) -> Result<Self> {
        let len = source.len()?;
        Ok(Self {
            items: LazyList::new(len),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<&Diagnostic> {
        self.source.raw()?;
        self.items.get_or_load(index, |index| self.load(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&Diagnostic>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    /// Release every loaded diagnostic and the backing set or unit.
    pub fn dispose(&mut self) {
        self.items.clear();
        self.source.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.source.is_released()
    }

    fn load(&self, index: usize) -> Result<Diagnostic> {
        let raw = self.source.diagnostic(native_index(index, self.len())?)?;
        let handle = SafeHandle::<DiagnosticKind>::acquire(self.source.native_rc(), raw)?;
        Diagnostic::load(handle)
    }
}

impl fmt::Debug for DiagnosticCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticCollection")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

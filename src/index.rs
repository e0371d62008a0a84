//! Indexes: the shared context translation units are created in.

use crate::error::{ClangError, Result};
use crate::handle::{IndexKind, SafeHandle, TranslationUnitKind};
use crate::native::{Native, RawHandle};
use crate::options::{GlobalOptions, ParseOptions};
use crate::translation_unit::TranslationUnit;
use crate::unsaved_file::{NativeUnsavedFiles, UnsavedFile};
use crate::util::{CStringArray, native_count, optional_ptr, path_to_cstring};
use libc::c_int;
use std::fmt;
use std::path::Path;
use std::ptr;
use std::rc::Rc;
use tracing::debug;

/// A libclang index (`CXIndex`).
pub struct Index {
    handle: SafeHandle<IndexKind>,
    default_parse_options: Option<ParseOptions>,
}

impl Index {
    pub(crate) fn create(
        native: Rc<dyn Native>,
        exclude_declarations_from_pch: bool,
        display_diagnostics: bool,
        default_parse_options: Option<ParseOptions>,
    ) -> Result<Self> {
        // SAFETY: plain factory call.
        let raw = unsafe {
            native.create_index(
                c_int::from(exclude_declarations_from_pch),
                c_int::from(display_diagnostics),
            )
        };
        debug!(
            exclude_declarations_from_pch,
            display_diagnostics, "created index"
        );
        Ok(Self {
            handle: SafeHandle::acquire(native, raw)?,
            default_parse_options,
        })
    }

    pub fn global_options(&self) -> Result<GlobalOptions> {
        let raw = self.handle.raw()?;
        // SAFETY: `raw` is live.
        let bits = unsafe { self.handle.native().index_global_options(raw) };
        Ok(GlobalOptions::from_bits(bits))
    }

    pub fn set_global_options(&self, options: GlobalOptions) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: `raw` is live.
        unsafe { self.handle.native().set_index_global_options(raw, options.bits()) };
        Ok(())
    }

    /// Parse a source file with no extra arguments and the default options.
    pub fn parse_translation_unit(&self, source: impl AsRef<Path>) -> Result<TranslationUnit> {
        self.parse_translation_unit_with(Some(source.as_ref()), &[] as &[&str], &[], None)
    }

    /// Parse a translation unit.
    ///
    /// `source` may be `None` when the file name is part of `args`. `None`
    /// options fall back to the configured defaults, then to libclang's default
    /// editing options. With [`ParseOptions::ARGUMENTS_ARE_FULL_COMMAND_LINE`] set,
    /// `args[0]` is the compiler executable and `args` must not be empty.
    pub fn parse_translation_unit_with<S: AsRef<str>>(
        &self,
        source: Option<&Path>,
        args: &[S],
        unsaved_files: &[UnsavedFile],
        options: Option<ParseOptions>,
    ) -> Result<TranslationUnit> {
        let raw = self.handle.raw()?;
        let native = self.handle.native();

        let mut options = match options.or(self.default_parse_options) {
            Some(options) => options,
            // SAFETY: no preconditions.
            None => ParseOptions::from_bits(unsafe { native.default_editing_options() }),
        };
        let full_command_line = options.contains(ParseOptions::ARGUMENTS_ARE_FULL_COMMAND_LINE);
        options = options.without(ParseOptions::ARGUMENTS_ARE_FULL_COMMAND_LINE);

        let c_source = source.map(|path| path_to_cstring(path, "source")).transpose()?;
        let c_args = CStringArray::new(args, "args")?;
        if full_command_line && c_args.is_empty() {
            return Err(ClangError::invalid_argument(
                "args",
                "a full command line needs at least the compiler executable",
            ));
        }
        let num_args: c_int = native_count(c_args.len(), "args")?;
        let mut c_unsaved = NativeUnsavedFiles::new(unsaved_files)?;

        debug!(
            source = ?source,
            args = c_args.len(),
            unsaved = unsaved_files.len(),
            options = options.bits(),
            full_command_line,
            "parsing translation unit"
        );

        let mut unit = ptr::null_mut();
        // SAFETY: every pointer argument outlives the call.
        let code = unsafe {
            if full_command_line {
                native.parse_translation_unit_full_argv(
                    raw,
                    optional_ptr(c_source.as_ref()),
                    c_args.as_ptr(),
                    num_args,
                    c_unsaved.as_mut_ptr(),
                    c_unsaved.len(),
                    options.bits(),
                    &mut unit,
                )
            } else {
                native.parse_translation_unit(
                    raw,
                    optional_ptr(c_source.as_ref()),
                    c_args.as_ptr(),
                    num_args,
                    c_unsaved.as_mut_ptr(),
                    c_unsaved.len(),
                    options.bits(),
                    &mut unit,
                )
            }
        };
        ClangError::check(code)?;
        self.wrap_unit(unit)
    }

    /// Load a translation unit from an AST file written by
    /// [`TranslationUnit::save`].
    pub fn load_translation_unit(&self, ast_file: impl AsRef<Path>) -> Result<TranslationUnit> {
        let raw = self.handle.raw()?;
        let ast_file = ast_file.as_ref();
        let c_path = path_to_cstring(ast_file, "ast_file")?;

        let mut unit = ptr::null_mut();
        // SAFETY: `c_path` outlives the call.
        let code = unsafe {
            self.handle
                .native()
                .create_translation_unit(raw, c_path.as_ptr(), &mut unit)
        };
        debug!(ast_file = %ast_file.display(), code, "loaded translation unit");
        ClangError::check(code)?;
        self.wrap_unit(unit)
    }

    fn wrap_unit(&self, unit: RawHandle) -> Result<TranslationUnit> {
        let handle = SafeHandle::<TranslationUnitKind>::acquire(self.handle.native_rc(), unit)?;
        Ok(TranslationUnit::new(handle, self.handle.share()?))
    }

    pub fn dispose(&mut self) {
        self.handle.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index").field("handle", &self.handle).finish()
    }
}

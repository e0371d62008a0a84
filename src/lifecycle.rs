//! Library entry point.
//!
//! [`Clang`] owns the native function table and creates every top-level object:
//! indexes, compilation databases, module map descriptors, overlays, remappings
//! and loaded diagnostics.

use crate::compilation_database::CompilationDatabase;
use crate::config::ClangConfig;
use crate::diagnostic::DiagnosticCollection;
use crate::error::{ClangError, Result};
use crate::handle::{DiagnosticSetKind, RemappingKind, SafeHandle};
use crate::index::Index;
use crate::libclang::Libclang;
use crate::module_map::ModuleMapDescriptor;
use crate::native::Native;
use crate::options::ParseOptions;
use crate::overlay::VirtualFileOverlay;
use crate::remapping::RemappingCollection;
use crate::status::DiagnosticLoadErrorCode;
use crate::translation_unit::TranslationUnit;
use crate::unsaved_file::UnsavedFile;
use crate::util::{CStringArray, native_count, path_to_cstring, take_string};
use clang_sys::CXString;
use libc::{c_int, c_uint};
use std::cell::OnceCell;
use std::fmt;
use std::path::Path;
use std::ptr;
use std::rc::Rc;
use tracing::debug;

/// Entry point to libclang.
pub struct Clang {
    native: Rc<dyn Native>,
    config: ClangConfig,
    version: OnceCell<String>,
}

impl Clang {
    /// Load libclang with the default configuration.
    pub fn load() -> Result<Self> {
        Self::with_config(ClangConfig::default())
    }

    /// Load libclang and apply `config`.
    pub fn with_config(config: ClangConfig) -> Result<Self> {
        let native: Rc<dyn Native> = Rc::new(Libclang::load()?);
        Ok(Self::from_native_with_config(native, config))
    }

    /// Use an existing native function table.
    pub fn from_native(native: Rc<dyn Native>) -> Self {
        Self::from_native_with_config(native, ClangConfig::default())
    }

    pub fn from_native_with_config(native: Rc<dyn Native>, config: ClangConfig) -> Self {
        let clang = Self {
            native,
            config,
            version: OnceCell::new(),
        };
        if let Some(enabled) = clang.config.crash_recovery {
            clang.set_crash_recovery(enabled);
        }
        clang
    }

    pub fn config(&self) -> &ClangConfig {
        &self.config
    }

    /// The libclang version string. Read once and cached.
    pub fn version(&self) -> &str {
        self.version.get_or_init(|| {
            // SAFETY: the returned string is taken over.
            unsafe { take_string(&*self.native, self.native.version()) }
        })
    }

    /// Timestamp shared by every build in the current build session.
    pub fn build_session_timestamp(&self) -> u64 {
        // SAFETY: no preconditions.
        unsafe { self.native.build_session_timestamp() }
    }

    /// Enable or disable libclang's crash recovery. The current setting cannot
    /// be queried.
    pub fn set_crash_recovery(&self, enabled: bool) {
        debug!(enabled, "toggling crash recovery");
        // SAFETY: no preconditions.
        unsafe { self.native.toggle_crash_recovery(c_uint::from(enabled)) }
    }

    /// Create an index using the configured flags.
    pub fn create_index(&self) -> Result<Index> {
        self.create_index_with(
            self.config.exclude_declarations_from_pch,
            self.config.display_diagnostics,
        )
    }

    pub fn create_index_with(
        &self,
        exclude_declarations_from_pch: bool,
        display_diagnostics: bool,
    ) -> Result<Index> {
        Index::create(
            Rc::clone(&self.native),
            exclude_declarations_from_pch,
            display_diagnostics,
            self.config.parse_options,
        )
    }

    /// Load the `compile_commands.json` database in `directory`.
    pub fn create_compilation_database(
        &self,
        directory: impl AsRef<Path>,
    ) -> Result<CompilationDatabase> {
        CompilationDatabase::from_directory(Rc::clone(&self.native), directory.as_ref())
    }

    pub fn create_module_map_descriptor(&self) -> Result<ModuleMapDescriptor> {
        self.create_module_map_descriptor_with("", "")
    }

    /// Create a module map descriptor; non-empty names are applied immediately.
    pub fn create_module_map_descriptor_with(
        &self,
        framework_module: &str,
        umbrella_header: &str,
    ) -> Result<ModuleMapDescriptor> {
        ModuleMapDescriptor::create(Rc::clone(&self.native), framework_module, umbrella_header)
    }

    pub fn create_virtual_file_overlay(&self) -> Result<VirtualFileOverlay> {
        VirtualFileOverlay::create(Rc::clone(&self.native))
    }

    /// Collect the remappings recorded in the given files.
    pub fn create_remappings<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RemappingCollection> {
        let paths = paths
            .iter()
            .map(|path| {
                path.as_ref()
                    .to_str()
                    .ok_or_else(|| ClangError::invalid_argument("paths", "path is not valid UTF-8"))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut c_paths = CStringArray::new(&paths, "paths")?;
        let count: c_uint = native_count(c_paths.len(), "paths")?;
        // SAFETY: `c_paths` outlives the call.
        let raw = unsafe { self.native.remappings_from_file_list(c_paths.as_mut_ptr(), count) };
        RemappingCollection::new(SafeHandle::<RemappingKind>::acquire(
            Rc::clone(&self.native),
            raw,
        )?)
    }

    /// Load the remappings stored under `path`.
    pub fn load_remappings(&self, path: impl AsRef<Path>) -> Result<RemappingCollection> {
        let c_path = path_to_cstring(path.as_ref(), "path")?;
        // SAFETY: `c_path` outlives the call.
        let raw = unsafe { self.native.remappings(c_path.as_ptr()) };
        RemappingCollection::new(SafeHandle::<RemappingKind>::acquire(
            Rc::clone(&self.native),
            raw,
        )?)
    }

    /// Load a serialized diagnostics file (`clang --serialize-diagnostics`).
    pub fn load_diagnostics(&self, path: impl AsRef<Path>) -> Result<DiagnosticCollection> {
        let path = path.as_ref();
        let c_path = path_to_cstring(path, "path")?;
        let mut error: c_int = 0;
        let mut message = CXString {
            data: ptr::null(),
            private_flags: 0,
        };

        // SAFETY: `c_path` outlives the call; the message string is taken over.
        let (set, message) = unsafe {
            let set = self
                .native
                .load_diagnostics(c_path.as_ptr(), &mut error, &mut message);
            (set, take_string(&*self.native, message))
        };
        if set.is_null() {
            let code = DiagnosticLoadErrorCode::from_raw(error);
            debug!(path = %path.display(), %code, "failed to load diagnostics");
            return Err(ClangError::diagnostic_load(code, message));
        }
        DiagnosticCollection::from_set(SafeHandle::<DiagnosticSetKind>::acquire(
            Rc::clone(&self.native),
            set,
        )?)
    }

    /// Parse `source` in a fresh index that lives as long as the unit.
    pub fn parse_translation_unit(&self, source: impl AsRef<Path>) -> Result<TranslationUnit> {
        self.create_index()?.parse_translation_unit(source)
    }

    pub fn parse_translation_unit_with<S: AsRef<str>>(
        &self,
        source: Option<&Path>,
        args: &[S],
        unsaved_files: &[UnsavedFile],
        options: Option<ParseOptions>,
    ) -> Result<TranslationUnit> {
        self.create_index()?
            .parse_translation_unit_with(source, args, unsaved_files, options)
    }

    /// Load an AST file in a fresh index that lives as long as the unit.
    pub fn load_translation_unit(&self, ast_file: impl AsRef<Path>) -> Result<TranslationUnit> {
        self.create_index()?.load_translation_unit(ast_file)
    }
}

impl fmt::Debug for Clang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clang")
            .field("config", &self.config)
            .field("version", &self.version.get())
            .finish()
    }
}

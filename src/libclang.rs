//! [`Native`] implementation backed by the real libclang.
//!
//! libclang is loaded at run time through `clang-sys`. The library search honours
//! `LIBCLANG_PATH` and falls back to the usual system locations. `clang-sys`
//! tracks the loaded library per thread, so a [`Libclang`] must be created on the
//! thread that uses it (the wrappers are not `Send` anyway).
//!
//! A few entry points (module maps, VFS overlays, the build session timestamp)
//! are not declared by `clang-sys`. They are resolved by name from the same
//! shared library with `libloading`.

use crate::error::{ClangError, Result};
use crate::native::{Native, RawHandle};
use clang_sys::*;
use libc::{c_char, c_int, c_uint, c_ulonglong, c_void};
use libloading::Library;
use std::path::Path;
use std::ptr;
use tracing::debug;

type WriteToBuffer =
    unsafe extern "C" fn(RawHandle, c_uint, *mut *mut c_char, *mut c_uint) -> c_int;
type SetName = unsafe extern "C" fn(RawHandle, *const c_char) -> c_int;

/// Entry points looked up by symbol name.
#[derive(Debug)]
struct Extensions {
    build_session_timestamp: unsafe extern "C" fn() -> c_ulonglong,
    module_map_create: unsafe extern "C" fn(c_uint) -> RawHandle,
    module_map_set_framework_module_name: SetName,
    module_map_set_umbrella_header: SetName,
    module_map_write_to_buffer: WriteToBuffer,
    module_map_dispose: unsafe extern "C" fn(RawHandle),
    overlay_create: unsafe extern "C" fn(c_uint) -> RawHandle,
    overlay_add_file_mapping:
        unsafe extern "C" fn(RawHandle, *const c_char, *const c_char) -> c_int,
    overlay_set_case_sensitivity: unsafe extern "C" fn(RawHandle, c_int) -> c_int,
    overlay_write_to_buffer: WriteToBuffer,
    overlay_dispose: unsafe extern "C" fn(RawHandle),
    // Must outlive every function pointer above.
    _library: Library,
}

impl Extensions {
    fn resolve(path: &Path) -> Result<Self> {
        // SAFETY: this is the library `clang-sys` already loaded; opening it again
        // only takes another reference and runs no initializers.
        let library = unsafe { Library::new(path) }
            .map_err(|err| ClangError::Library(format!("{}: {err}", path.display())))?;
        Ok(Self {
            build_session_timestamp: symbol(&library, b"clang_getBuildSessionTimestamp\0")?,
            module_map_create: symbol(&library, b"clang_ModuleMapDescriptor_create\0")?,
            module_map_set_framework_module_name: symbol(
                &library,
                b"clang_ModuleMapDescriptor_setFrameworkModuleName\0",
            )?,
            module_map_set_umbrella_header: symbol(
                &library,
                b"clang_ModuleMapDescriptor_setUmbrellaHeader\0",
            )?,
            module_map_write_to_buffer: symbol(
                &library,
                b"clang_ModuleMapDescriptor_writeToBuffer\0",
            )?,
            module_map_dispose: symbol(&library, b"clang_ModuleMapDescriptor_dispose\0")?,
            overlay_create: symbol(&library, b"clang_VirtualFileOverlay_create\0")?,
            overlay_add_file_mapping: symbol(
                &library,
                b"clang_VirtualFileOverlay_addFileMapping\0",
            )?,
            overlay_set_case_sensitivity: symbol(
                &library,
                b"clang_VirtualFileOverlay_setCaseSensitivity\0",
            )?,
            overlay_write_to_buffer: symbol(
                &library,
                b"clang_VirtualFileOverlay_writeToBuffer\0",
            )?,
            overlay_dispose: symbol(&library, b"clang_VirtualFileOverlay_dispose\0")?,
            _library: library,
        })
    }
}

/// Look up `name` and copy the function pointer out of the symbol.
fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
    // SAFETY: callers pair each libclang symbol name with its C signature.
    unsafe { library.get::<T>(name) }
        .map(|symbol| *symbol)
        .map_err(|err| ClangError::Library(err.to_string()))
}

/// The libclang shared library.
#[derive(Debug)]
pub struct Libclang {
    extensions: Extensions,
}

impl Libclang {
    /// Load libclang on the current thread, reusing an already loaded library.
    pub fn load() -> Result<Self> {
        if !clang_sys::is_loaded() {
            clang_sys::load().map_err(ClangError::Library)?;
        }
        let library = clang_sys::get_library()
            .ok_or_else(|| ClangError::Library("libclang is not loaded".to_string()))?;
        let extensions = Extensions::resolve(library.path())?;
        debug!(path = %library.path().display(), "loaded libclang");
        Ok(Self { extensions })
    }
}

impl Native for Libclang {
    unsafe fn create_index(
        &self,
        exclude_declarations_from_pch: c_int,
        display_diagnostics: c_int,
    ) -> RawHandle {
        unsafe { clang_createIndex(exclude_declarations_from_pch, display_diagnostics).cast() }
    }

    unsafe fn dispose_index(&self, index: RawHandle) {
        unsafe { clang_disposeIndex(index.cast()) }
    }

    unsafe fn index_global_options(&self, index: RawHandle) -> c_uint {
        unsafe { clang_CXIndex_getGlobalOptions(index.cast()) as c_uint }
    }

    unsafe fn set_index_global_options(&self, index: RawHandle, options: c_uint) {
        unsafe { clang_CXIndex_setGlobalOptions(index.cast(), options as _) }
    }

    unsafe fn default_editing_options(&self) -> c_uint {
        unsafe { clang_defaultEditingTranslationUnitOptions() as c_uint }
    }

    unsafe fn parse_translation_unit(
        &self,
        index: RawHandle,
        source: *const c_char,
        args: *const *const c_char,
        num_args: c_int,
        unsaved: *mut CXUnsavedFile,
        num_unsaved: c_uint,
        options: c_uint,
        out: *mut RawHandle,
    ) -> c_int {
        let mut unit: CXTranslationUnit = ptr::null_mut();
        let code = unsafe {
            clang_parseTranslationUnit2(
                index.cast(),
                source,
                args,
                num_args,
                unsaved,
                num_unsaved,
                options as _,
                &mut unit,
            )
        };
        unsafe { *out = unit.cast() };
        code as c_int
    }

    unsafe fn parse_translation_unit_full_argv(
        &self,
        index: RawHandle,
        source: *const c_char,
        args: *const *const c_char,
        num_args: c_int,
        unsaved: *mut CXUnsavedFile,
        num_unsaved: c_uint,
        options: c_uint,
        out: *mut RawHandle,
    ) -> c_int {
        let mut unit: CXTranslationUnit = ptr::null_mut();
        let code = unsafe {
            clang_parseTranslationUnit2FullArgv(
                index.cast(),
                source,
                args,
                num_args,
                unsaved,
                num_unsaved,
                options as _,
                &mut unit,
            )
        };
        unsafe { *out = unit.cast() };
        code as c_int
    }

    unsafe fn create_translation_unit(
        &self,
        index: RawHandle,
        ast_file: *const c_char,
        out: *mut RawHandle,
    ) -> c_int {
        let mut unit: CXTranslationUnit = ptr::null_mut();
        let code = unsafe { clang_createTranslationUnit2(index.cast(), ast_file, &mut unit) };
        unsafe { *out = unit.cast() };
        code as c_int
    }

    unsafe fn dispose_translation_unit(&self, unit: RawHandle) {
        unsafe { clang_disposeTranslationUnit(unit.cast()) }
    }

    unsafe fn translation_unit_spelling(&self, unit: RawHandle) -> CXString {
        unsafe { clang_getTranslationUnitSpelling(unit.cast()) }
    }

    unsafe fn default_save_options(&self, unit: RawHandle) -> c_uint {
        unsafe { clang_defaultSaveOptions(unit.cast()) as c_uint }
    }

    unsafe fn save_translation_unit(
        &self,
        unit: RawHandle,
        path: *const c_char,
        options: c_uint,
    ) -> c_int {
        unsafe { clang_saveTranslationUnit(unit.cast(), path, options as _) as c_int }
    }

    unsafe fn resource_usage(&self, unit: RawHandle) -> CXTUResourceUsage {
        unsafe { clang_getCXTUResourceUsage(unit.cast()) }
    }

    unsafe fn dispose_resource_usage(&self, usage: CXTUResourceUsage) {
        unsafe { clang_disposeCXTUResourceUsage(usage) }
    }

    unsafe fn num_diagnostics(&self, unit: RawHandle) -> c_uint {
        unsafe { clang_getNumDiagnostics(unit.cast()) }
    }

    unsafe fn diagnostic(&self, unit: RawHandle, index: c_uint) -> RawHandle {
        unsafe { clang_getDiagnostic(unit.cast(), index).cast() }
    }

    unsafe fn load_diagnostics(
        &self,
        path: *const c_char,
        error: *mut c_int,
        message: *mut CXString,
    ) -> RawHandle {
        unsafe { clang_loadDiagnostics(path, error.cast(), message).cast() }
    }

    unsafe fn num_diagnostics_in_set(&self, set: RawHandle) -> c_uint {
        unsafe { clang_getNumDiagnosticsInSet(set.cast()) }
    }

    unsafe fn diagnostic_in_set(&self, set: RawHandle, index: c_uint) -> RawHandle {
        unsafe { clang_getDiagnosticInSet(set.cast(), index).cast() }
    }

    unsafe fn dispose_diagnostic_set(&self, set: RawHandle) {
        unsafe { clang_disposeDiagnosticSet(set.cast()) }
    }

    unsafe fn diagnostic_spelling(&self, diagnostic: RawHandle) -> CXString {
        unsafe { clang_getDiagnosticSpelling(diagnostic.cast()) }
    }

    unsafe fn diagnostic_severity(&self, diagnostic: RawHandle) -> c_int {
        unsafe { clang_getDiagnosticSeverity(diagnostic.cast()) as c_int }
    }

    unsafe fn dispose_diagnostic(&self, diagnostic: RawHandle) {
        unsafe { clang_disposeDiagnostic(diagnostic.cast()) }
    }

    unsafe fn default_diagnostic_display_options(&self) -> c_uint {
        unsafe { clang_defaultDiagnosticDisplayOptions() as c_uint }
    }

    unsafe fn format_diagnostic(&self, diagnostic: RawHandle, options: c_uint) -> CXString {
        unsafe { clang_formatDiagnostic(diagnostic.cast(), options as _) }
    }

    unsafe fn diagnostic_option(&self, diagnostic: RawHandle, disable: *mut CXString) -> CXString {
        unsafe { clang_getDiagnosticOption(diagnostic.cast(), disable) }
    }

    unsafe fn diagnostic_category(&self, diagnostic: RawHandle) -> c_uint {
        unsafe { clang_getDiagnosticCategory(diagnostic.cast()) }
    }

    unsafe fn diagnostic_category_text(&self, diagnostic: RawHandle) -> CXString {
        unsafe { clang_getDiagnosticCategoryText(diagnostic.cast()) }
    }

    unsafe fn child_diagnostics(&self, diagnostic: RawHandle) -> RawHandle {
        unsafe { clang_getChildDiagnostics(diagnostic.cast()).cast() }
    }

    unsafe fn compilation_database_from_directory(
        &self,
        directory: *const c_char,
        error: *mut c_int,
    ) -> RawHandle {
        unsafe { clang_CompilationDatabase_fromDirectory(directory, error.cast()).cast() }
    }

    unsafe fn dispose_compilation_database(&self, database: RawHandle) {
        unsafe { clang_CompilationDatabase_dispose(database.cast()) }
    }

    unsafe fn all_compile_commands(&self, database: RawHandle) -> RawHandle {
        unsafe { clang_CompilationDatabase_getAllCompileCommands(database.cast()).cast() }
    }

    unsafe fn compile_commands(&self, database: RawHandle, filename: *const c_char) -> RawHandle {
        unsafe { clang_CompilationDatabase_getCompileCommands(database.cast(), filename).cast() }
    }

    unsafe fn dispose_compile_commands(&self, commands: RawHandle) {
        unsafe { clang_CompileCommands_dispose(commands.cast()) }
    }

    unsafe fn compile_commands_size(&self, commands: RawHandle) -> c_uint {
        unsafe { clang_CompileCommands_getSize(commands.cast()) }
    }

    unsafe fn compile_command(&self, commands: RawHandle, index: c_uint) -> RawHandle {
        unsafe { clang_CompileCommands_getCommand(commands.cast(), index).cast() }
    }

    unsafe fn compile_command_directory(&self, command: RawHandle) -> CXString {
        unsafe { clang_CompileCommand_getDirectory(command.cast()) }
    }

    unsafe fn compile_command_filename(&self, command: RawHandle) -> CXString {
        unsafe { clang_CompileCommand_getFilename(command.cast()) }
    }

    unsafe fn compile_command_num_args(&self, command: RawHandle) -> c_uint {
        unsafe { clang_CompileCommand_getNumArgs(command.cast()) }
    }

    unsafe fn compile_command_arg(&self, command: RawHandle, index: c_uint) -> CXString {
        unsafe { clang_CompileCommand_getArg(command.cast(), index) }
    }

    unsafe fn compile_command_num_mapped_sources(&self, command: RawHandle) -> c_uint {
        unsafe { clang_CompileCommand_getNumMappedSources(command.cast()) }
    }

    unsafe fn compile_command_mapped_source_path(
        &self,
        command: RawHandle,
        index: c_uint,
    ) -> CXString {
        unsafe { clang_CompileCommand_getMappedSourcePath(command.cast(), index) }
    }

    unsafe fn compile_command_mapped_source_content(
        &self,
        command: RawHandle,
        index: c_uint,
    ) -> CXString {
        unsafe { clang_CompileCommand_getMappedSourceContent(command.cast(), index) }
    }

    unsafe fn module_map_create(&self) -> RawHandle {
        unsafe { (self.extensions.module_map_create)(0) }
    }

    unsafe fn module_map_set_framework_module_name(
        &self,
        descriptor: RawHandle,
        name: *const c_char,
    ) -> c_int {
        unsafe { (self.extensions.module_map_set_framework_module_name)(descriptor, name) }
    }

    unsafe fn module_map_set_umbrella_header(
        &self,
        descriptor: RawHandle,
        name: *const c_char,
    ) -> c_int {
        unsafe { (self.extensions.module_map_set_umbrella_header)(descriptor, name) }
    }

    unsafe fn module_map_write_to_buffer(
        &self,
        descriptor: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int {
        unsafe { (self.extensions.module_map_write_to_buffer)(descriptor, 0, buffer, size) }
    }

    unsafe fn module_map_dispose(&self, descriptor: RawHandle) {
        unsafe { (self.extensions.module_map_dispose)(descriptor) }
    }

    unsafe fn overlay_create(&self) -> RawHandle {
        unsafe { (self.extensions.overlay_create)(0) }
    }

    unsafe fn overlay_add_file_mapping(
        &self,
        overlay: RawHandle,
        virtual_path: *const c_char,
        real_path: *const c_char,
    ) -> c_int {
        unsafe { (self.extensions.overlay_add_file_mapping)(overlay, virtual_path, real_path) }
    }

    unsafe fn overlay_set_case_sensitivity(
        &self,
        overlay: RawHandle,
        case_sensitive: c_int,
    ) -> c_int {
        unsafe { (self.extensions.overlay_set_case_sensitivity)(overlay, case_sensitive) }
    }

    unsafe fn overlay_write_to_buffer(
        &self,
        overlay: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int {
        unsafe { (self.extensions.overlay_write_to_buffer)(overlay, 0, buffer, size) }
    }

    unsafe fn overlay_dispose(&self, overlay: RawHandle) {
        unsafe { (self.extensions.overlay_dispose)(overlay) }
    }

    unsafe fn remappings(&self, path: *const c_char) -> RawHandle {
        unsafe { clang_getRemappings(path).cast() }
    }

    unsafe fn remappings_from_file_list(
        &self,
        paths: *mut *const c_char,
        count: c_uint,
    ) -> RawHandle {
        unsafe { clang_getRemappingsFromFileList(paths, count).cast() }
    }

    unsafe fn remap_num_files(&self, remapping: RawHandle) -> c_uint {
        unsafe { clang_remap_getNumFiles(remapping.cast()) }
    }

    unsafe fn remap_filenames(
        &self,
        remapping: RawHandle,
        index: c_uint,
        original: *mut CXString,
        transformed: *mut CXString,
    ) {
        unsafe { clang_remap_getFilenames(remapping.cast(), index, original, transformed) }
    }

    unsafe fn remap_dispose(&self, remapping: RawHandle) {
        unsafe { clang_remap_dispose(remapping.cast()) }
    }

    unsafe fn string_data(&self, string: CXString) -> *const c_char {
        unsafe { clang_getCString(string) }
    }

    unsafe fn dispose_string(&self, string: CXString) {
        unsafe { clang_disposeString(string) }
    }

    unsafe fn free(&self, buffer: *mut c_void) {
        unsafe { clang_free(buffer) }
    }

    unsafe fn version(&self) -> CXString {
        unsafe { clang_getClangVersion() }
    }

    unsafe fn build_session_timestamp(&self) -> u64 {
        unsafe { (self.extensions.build_session_timestamp)() }
    }

    unsafe fn toggle_crash_recovery(&self, enabled: c_uint) {
        unsafe { clang_toggleCrashRecovery(enabled) }
    }
}

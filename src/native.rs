//! The native function table.
//!
//! [`Native`] has one method per libclang entry point the wrappers use, with the
//! C signatures kept as they are: raw handles, C strings, `c_int` status codes and
//! out-parameters. [`Libclang`](crate::libclang::Libclang) forwards each method to
//! the real library. Keeping the table behind a trait lets every wrapper run
//! against a recording double in tests.
//!
//! # Safety
//!
//! Every method is `unsafe`: handle arguments must be live handles of the kind the
//! method expects, and pointer arguments must satisfy the same contract as the
//! underlying C function.

use clang_sys::{CXString, CXTUResourceUsage, CXUnsavedFile};
use libc::{c_char, c_int, c_uint, c_void};

/// An opaque native resource handle.
pub type RawHandle = *mut c_void;

#[allow(clippy::missing_safety_doc)]
pub trait Native {
    // Indexes

    unsafe fn create_index(&self, exclude_declarations_from_pch: c_int, display_diagnostics: c_int)
    -> RawHandle;
    unsafe fn dispose_index(&self, index: RawHandle);
    unsafe fn index_global_options(&self, index: RawHandle) -> c_uint;
    unsafe fn set_index_global_options(&self, index: RawHandle, options: c_uint);

    // Translation units

    unsafe fn default_editing_options(&self) -> c_uint;
    #[allow(clippy::too_many_arguments)]
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
    ) -> c_int;
    #[allow(clippy::too_many_arguments)]
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
    ) -> c_int;
    unsafe fn create_translation_unit(
        &self,
        index: RawHandle,
        ast_file: *const c_char,
        out: *mut RawHandle,
    ) -> c_int;
    unsafe fn dispose_translation_unit(&self, unit: RawHandle);
    unsafe fn translation_unit_spelling(&self, unit: RawHandle) -> CXString;
    unsafe fn default_save_options(&self, unit: RawHandle) -> c_uint;
    unsafe fn save_translation_unit(&self, unit: RawHandle, path: *const c_char, options: c_uint)
    -> c_int;
    unsafe fn resource_usage(&self, unit: RawHandle) -> CXTUResourceUsage;
    unsafe fn dispose_resource_usage(&self, usage: CXTUResourceUsage);
    unsafe fn num_diagnostics(&self, unit: RawHandle) -> c_uint;
    unsafe fn diagnostic(&self, unit: RawHandle, index: c_uint) -> RawHandle;

    // Diagnostics

    unsafe fn load_diagnostics(
        &self,
        path: *const c_char,
        error: *mut c_int,
        message: *mut CXString,
    ) -> RawHandle;
    unsafe fn num_diagnostics_in_set(&self, set: RawHandle) -> c_uint;
    unsafe fn diagnostic_in_set(&self, set: RawHandle, index: c_uint) -> RawHandle;
    unsafe fn dispose_diagnostic_set(&self, set: RawHandle);
    unsafe fn diagnostic_spelling(&self, diagnostic: RawHandle) -> CXString;
    unsafe fn diagnostic_severity(&self, diagnostic: RawHandle) -> c_int;
    unsafe fn dispose_diagnostic(&self, diagnostic: RawHandle);
    unsafe fn default_diagnostic_display_options(&self) -> c_uint;
    unsafe fn format_diagnostic(&self, diagnostic: RawHandle, options: c_uint) -> CXString;
    /// Returns the enabling option; the disabling option goes to `disable`.
    unsafe fn diagnostic_option(&self, diagnostic: RawHandle, disable: *mut CXString) -> CXString;
    unsafe fn diagnostic_category(&self, diagnostic: RawHandle) -> c_uint;
    unsafe fn diagnostic_category_text(&self, diagnostic: RawHandle) -> CXString;
    /// The set is owned by `diagnostic` and must not be disposed.
    unsafe fn child_diagnostics(&self, diagnostic: RawHandle) -> RawHandle;

    // Compilation databases

    unsafe fn compilation_database_from_directory(
        &self,
        directory: *const c_char,
        error: *mut c_int,
    ) -> RawHandle;
    unsafe fn dispose_compilation_database(&self, database: RawHandle);
    unsafe fn all_compile_commands(&self, database: RawHandle) -> RawHandle;
    unsafe fn compile_commands(&self, database: RawHandle, filename: *const c_char) -> RawHandle;
    unsafe fn dispose_compile_commands(&self, commands: RawHandle);
    unsafe fn compile_commands_size(&self, commands: RawHandle) -> c_uint;
    unsafe fn compile_command(&self, commands: RawHandle, index: c_uint) -> RawHandle;
    unsafe fn compile_command_directory(&self, command: RawHandle) -> CXString;
    unsafe fn compile_command_filename(&self, command: RawHandle) -> CXString;
    unsafe fn compile_command_num_args(&self, command: RawHandle) -> c_uint;
    unsafe fn compile_command_arg(&self, command: RawHandle, index: c_uint) -> CXString;
    unsafe fn compile_command_num_mapped_sources(&self, command: RawHandle) -> c_uint;
    unsafe fn compile_command_mapped_source_path(&self, command: RawHandle, index: c_uint)
    -> CXString;
    unsafe fn compile_command_mapped_source_content(
        &self,
        command: RawHandle,
        index: c_uint,
    ) -> CXString;

    // Module map descriptors

    unsafe fn module_map_create(&self) -> RawHandle;
    unsafe fn module_map_set_framework_module_name(
        &self,
        descriptor: RawHandle,
        name: *const c_char,
    ) -> c_int;
    unsafe fn module_map_set_umbrella_header(&self, descriptor: RawHandle, name: *const c_char)
    -> c_int;
    unsafe fn module_map_write_to_buffer(
        &self,
        descriptor: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int;
    unsafe fn module_map_dispose(&self, descriptor: RawHandle);

    // Virtual file overlays

    unsafe fn overlay_create(&self) -> RawHandle;
    unsafe fn overlay_add_file_mapping(
        &self,
        overlay: RawHandle,
        virtual_path: *const c_char,
        real_path: *const c_char,
    ) -> c_int;
    unsafe fn overlay_set_case_sensitivity(&self, overlay: RawHandle, case_sensitive: c_int)
    -> c_int;
    unsafe fn overlay_write_to_buffer(
        &self,
        overlay: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int;
    unsafe fn overlay_dispose(&self, overlay: RawHandle);

    // Remappings

    unsafe fn remappings(&self, path: *const c_char) -> RawHandle;
    unsafe fn remappings_from_file_list(&self, paths: *mut *const c_char, count: c_uint)
    -> RawHandle;
    unsafe fn remap_num_files(&self, remapping: RawHandle) -> c_uint;
    unsafe fn remap_filenames(
        &self,
        remapping: RawHandle,
        index: c_uint,
        original: *mut CXString,
        transformed: *mut CXString,
    );
    unsafe fn remap_dispose(&self, remapping: RawHandle);

    // Strings and buffers

    unsafe fn string_data(&self, string: CXString) -> *const c_char;
    unsafe fn dispose_string(&self, string: CXString);
    unsafe fn free(&self, buffer: *mut c_void);

    // Library-wide

    unsafe fn version(&self) -> CXString;
    unsafe fn build_session_timestamp(&self) -> u64;
    unsafe fn toggle_crash_recovery(&self, enabled: c_uint);
}

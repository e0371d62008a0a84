//! Recording stand-in for libclang used by unit tests.
//!
//! Handles are opaque counters. Strings and buffers are real heap allocations so
//! that leaks and double frees show up as counter mismatches or crashes.

use crate::native::{Native, RawHandle};
use clang_sys::{CXString, CXTUResourceUsage, CXTUResourceUsageEntry, CXUnsavedFile};
use libc::{c_char, c_int, c_uint, c_ulong, c_void};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::ptr;
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
pub struct FakeCommand {
    pub directory: String,
    pub filename: String,
    pub arguments: Vec<String>,
    pub mapped_sources: Vec<(String, String)>,
}

impl FakeCommand {
    pub fn new(directory: &str, filename: &str, arguments: &[&str]) -> Self {
        Self {
            directory: directory.to_string(),
            filename: filename.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            mapped_sources: Vec::new(),
        }
    }
}

/// A scripted diagnostic, with its nested child diagnostics.
#[derive(Clone, Debug, Default)]
pub struct FakeDiagnostic {
    pub severity: c_int,
    pub spelling: String,
    pub category: (c_uint, String),
    pub enable_option: String,
    pub disable_option: String,
    pub children: Vec<FakeDiagnostic>,
}

impl FakeDiagnostic {
    pub fn new(severity: c_int, spelling: &str) -> Self {
        Self {
            severity,
            spelling: spelling.to_string(),
            ..Self::default()
        }
    }
}

fn fake_diagnostics(entries: &[(c_int, &str)]) -> Vec<FakeDiagnostic> {
    entries
        .iter()
        .map(|&(severity, spelling)| FakeDiagnostic::new(severity, spelling))
        .collect()
}

/// What the last parse call received.
#[derive(Clone, Debug, Default)]
pub struct ParseCall {
    pub source: Option<String>,
    pub arguments: Vec<String>,
    pub unsaved: Vec<(String, String)>,
    pub options: u32,
    pub full_argv: bool,
}

#[derive(Default)]
struct Overlay {
    mappings: Vec<(String, String)>,
    case_sensitive: Option<bool>,
}

#[derive(Default)]
struct State {
    next_handle: Cell<usize>,
    releases: RefCell<HashMap<&'static str, usize>>,
    calls: RefCell<HashMap<&'static str, usize>>,

    strings_created: Cell<usize>,
    strings_disposed: Cell<usize>,
    buffers: RefCell<HashMap<usize, usize>>,
    buffers_freed: Cell<usize>,
    zero_length_buffers: Cell<bool>,

    global_options: RefCell<HashMap<usize, c_uint>>,
    units: RefCell<HashMap<usize, String>>,
    parse_result: Cell<c_int>,
    last_parse: RefCell<Option<ParseCall>>,
    save_result: Cell<c_int>,
    saved: RefCell<Vec<(String, c_uint)>>,
    usage_entries: RefCell<Vec<(c_int, u64)>>,
    unit_diagnostics: RefCell<Vec<FakeDiagnostic>>,
    diagnostic_file: RefCell<Option<Vec<FakeDiagnostic>>>,
    diagnostic_sets: RefCell<HashMap<usize, Vec<FakeDiagnostic>>>,
    diagnostics: RefCell<HashMap<usize, FakeDiagnostic>>,
    child_sets: RefCell<HashMap<usize, RawHandle>>,
    format_options: RefCell<Vec<c_uint>>,

    database: RefCell<Option<Vec<FakeCommand>>>,
    command_lists: RefCell<HashMap<usize, Vec<FakeCommand>>>,
    commands: RefCell<HashMap<usize, FakeCommand>>,

    module_maps: RefCell<HashMap<usize, (Option<String>, Option<String>)>>,
    overlays: RefCell<HashMap<usize, Overlay>>,
    mapped_paths: RefCell<Vec<(String, String)>>,

    remappings: RefCell<Option<Vec<(String, String)>>>,
    remapping_lists: RefCell<HashMap<usize, Vec<(String, String)>>>,
    remapping_sources: RefCell<Vec<String>>,

    crash_recovery: RefCell<Vec<c_uint>>,
}

impl State {
    fn handle(&self) -> RawHandle {
        let next = self.next_handle.get().max(0x1000) + 0x10;
        self.next_handle.set(next);
        ptr::without_provenance_mut(next)
    }

    fn record(&self, call: &'static str) {
        *self.calls.borrow_mut().entry(call).or_default() += 1;
    }

    fn released(&self, kind: &'static str) {
        *self.releases.borrow_mut().entry(kind).or_default() += 1;
    }

    fn string(&self, value: &str) -> CXString {
        let raw = CString::new(value)
            .unwrap_or_default()
            .into_raw();
        self.strings_created.set(self.strings_created.get() + 1);
        CXString {
            data: raw.cast_const().cast(),
            private_flags: 0,
        }
    }

    fn buffer(&self, bytes: &[u8], out: *mut *mut c_char, size: *mut c_uint) -> c_int {
        let reported = if self.zero_length_buffers.get() { 0 } else { bytes.len() };
        let storage: Box<[u8]> = if bytes.is_empty() { Box::new([0]) } else { bytes.into() };
        let len = storage.len();
        let data = Box::into_raw(storage).cast::<u8>();
        self.buffers.borrow_mut().insert(data.addr(), len);
        unsafe {
            *out = data.cast();
            *size = reported as c_uint;
        }
        0
    }

    fn diagnostic_handle(&self, entry: FakeDiagnostic) -> RawHandle {
        let handle = self.handle();
        self.diagnostics.borrow_mut().insert(handle.addr(), entry);
        handle
    }

    fn diagnostic_entry(&self, diagnostic: RawHandle) -> FakeDiagnostic {
        self.diagnostics
            .borrow()
            .get(&diagnostic.addr())
            .cloned()
            .unwrap_or_default()
    }

    fn command(&self, command: RawHandle) -> FakeCommand {
        self.commands
            .borrow()
            .get(&command.addr())
            .cloned()
            .unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    unsafe fn parse(
        &self,
        source: *const c_char,
        args: *const *const c_char,
        num_args: c_int,
        unsaved: *mut CXUnsavedFile,
        num_unsaved: c_uint,
        options: c_uint,
        out: *mut RawHandle,
        full_argv: bool,
    ) -> c_int {
        let source = unsafe { opt_str(source) };
        let arguments = (0..num_args.max(0) as usize)
            .map(|i| unsafe { opt_str(*args.add(i)) }.unwrap_or_default())
            .collect();
        let unsaved = (0..num_unsaved as usize)
            .map(|i| {
                let file = unsafe { &*unsaved.add(i) };
                let name = unsafe { opt_str(file.Filename) }.unwrap_or_default();
                let bytes = unsafe {
                    std::slice::from_raw_parts(file.Contents.cast::<u8>(), file.Length as usize)
                };
                (name, String::from_utf8_lossy(bytes).into_owned())
            })
            .collect();
        *self.last_parse.borrow_mut() = Some(ParseCall {
            source: source.clone(),
            arguments,
            unsaved,
            options,
            full_argv,
        });

        let result = self.parse_result.get();
        if result != 0 {
            unsafe { *out = ptr::null_mut() };
            return result;
        }
        let unit = self.handle();
        self.units
            .borrow_mut()
            .insert(unit.addr(), source.unwrap_or_default());
        unsafe { *out = unit };
        0
    }
}

unsafe fn opt_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Test handle onto a shared recording [`Native`].
pub struct FakeNative {
    state: Rc<State>,
}

impl FakeNative {
    pub fn new() -> Self {
        Self {
            state: Rc::new(State::default()),
        }
    }

    pub fn native(&self) -> Rc<dyn Native> {
        Rc::clone(&self.state) as Rc<dyn Native>
    }

    pub fn releases(&self, kind: &str) -> usize {
        self.state.releases.borrow().get(kind).copied().unwrap_or(0)
    }

    pub fn calls(&self, call: &str) -> usize {
        self.state.calls.borrow().get(call).copied().unwrap_or(0)
    }

    pub fn new_overlay(&self) -> RawHandle {
        unsafe { self.state.overlay_create() }
    }

    pub fn new_string(&self, value: &str) -> CXString {
        self.state.string(value)
    }

    pub fn new_buffer(&self, bytes: &[u8]) -> *mut c_char {
        let mut data = ptr::null_mut();
        let mut len = 0;
        self.state.buffer(bytes, &mut data, &mut len);
        data
    }

    pub fn strings_disposed(&self) -> usize {
        self.state.strings_disposed.get()
    }

    /// Strings handed out and not yet disposed.
    pub fn strings_outstanding(&self) -> usize {
        self.state.strings_created.get() - self.state.strings_disposed.get()
    }

    pub fn buffers_freed(&self) -> usize {
        self.state.buffers_freed.get()
    }

    pub fn buffers_outstanding(&self) -> usize {
        self.state.buffers.borrow().len()
    }

    pub fn set_zero_length_buffers(&self, enabled: bool) {
        self.state.zero_length_buffers.set(enabled);
    }

    pub fn set_parse_result(&self, code: c_int) {
        self.state.parse_result.set(code);
    }

    pub fn last_parse(&self) -> Option<ParseCall> {
        self.state.last_parse.borrow().clone()
    }

    pub fn set_save_result(&self, code: c_int) {
        self.state.save_result.set(code);
    }

    pub fn saved(&self) -> Vec<(String, c_uint)> {
        self.state.saved.borrow().clone()
    }

    pub fn set_resource_usage(&self, entries: &[(c_int, u64)]) {
        *self.state.usage_entries.borrow_mut() = entries.to_vec();
    }

    pub fn set_unit_diagnostics(&self, diagnostics: &[(c_int, &str)]) {
        self.set_unit_diagnostic_tree(fake_diagnostics(diagnostics));
    }

    pub fn set_unit_diagnostic_tree(&self, diagnostics: Vec<FakeDiagnostic>) {
        *self.state.unit_diagnostics.borrow_mut() = diagnostics;
    }

    pub fn set_diagnostic_file(&self, diagnostics: &[(c_int, &str)]) {
        *self.state.diagnostic_file.borrow_mut() = Some(fake_diagnostics(diagnostics));
    }

    /// Option bits received by `format_diagnostic`, in call order.
    pub fn format_options(&self) -> Vec<c_uint> {
        self.state.format_options.borrow().clone()
    }

    pub fn set_database(&self, commands: Vec<FakeCommand>) {
        *self.state.database.borrow_mut() = Some(commands);
    }

    pub fn set_remappings(&self, pairs: &[(&str, &str)]) {
        *self.state.remappings.borrow_mut() = Some(
            pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        );
    }

    pub fn remapping_sources(&self) -> Vec<String> {
        self.state.remapping_sources.borrow().clone()
    }

    /// Paths received by `overlay_add_file_mapping`, as `(virtual, real)`.
    pub fn mapped_paths(&self) -> Vec<(String, String)> {
        self.state.mapped_paths.borrow().clone()
    }

    pub fn module_map_names(&self, descriptor: RawHandle) -> (Option<String>, Option<String>) {
        self.state
            .module_maps
            .borrow()
            .get(&descriptor.addr())
            .cloned()
            .unwrap_or_default()
    }

    pub fn crash_recovery(&self) -> Vec<c_uint> {
        self.state.crash_recovery.borrow().clone()
    }
}

impl Native for State {
    unsafe fn create_index(&self, _exclude: c_int, _display: c_int) -> RawHandle {
        self.record("create_index");
        self.handle()
    }

    unsafe fn dispose_index(&self, index: RawHandle) {
        self.global_options.borrow_mut().remove(&index.addr());
        self.released("index");
    }

    unsafe fn index_global_options(&self, index: RawHandle) -> c_uint {
        self.global_options
            .borrow()
            .get(&index.addr())
            .copied()
            .unwrap_or(0)
    }

    unsafe fn set_index_global_options(&self, index: RawHandle, options: c_uint) {
        self.global_options.borrow_mut().insert(index.addr(), options);
    }

    unsafe fn default_editing_options(&self) -> c_uint {
        0x108
    }

    unsafe fn parse_translation_unit(
        &self,
        _index: RawHandle,
        source: *const c_char,
        args: *const *const c_char,
        num_args: c_int,
        unsaved: *mut CXUnsavedFile,
        num_unsaved: c_uint,
        options: c_uint,
        out: *mut RawHandle,
    ) -> c_int {
        unsafe { self.parse(source, args, num_args, unsaved, num_unsaved, options, out, false) }
    }

    unsafe fn parse_translation_unit_full_argv(
        &self,
        _index: RawHandle,
        source: *const c_char,
        args: *const *const c_char,
        num_args: c_int,
        unsaved: *mut CXUnsavedFile,
        num_unsaved: c_uint,
        options: c_uint,
        out: *mut RawHandle,
    ) -> c_int {
        unsafe { self.parse(source, args, num_args, unsaved, num_unsaved, options, out, true) }
    }

    unsafe fn create_translation_unit(
        &self,
        _index: RawHandle,
        ast_file: *const c_char,
        out: *mut RawHandle,
    ) -> c_int {
        let result = self.parse_result.get();
        if result != 0 {
            unsafe { *out = ptr::null_mut() };
            return result;
        }
        let unit = self.handle();
        let name = unsafe { opt_str(ast_file) }.unwrap_or_default();
        self.units.borrow_mut().insert(unit.addr(), name);
        unsafe { *out = unit };
        0
    }

    unsafe fn dispose_translation_unit(&self, unit: RawHandle) {
        self.units.borrow_mut().remove(&unit.addr());
        self.released("translation_unit");
    }

    unsafe fn translation_unit_spelling(&self, unit: RawHandle) -> CXString {
        self.record("translation_unit_spelling");
        let name = self.units.borrow().get(&unit.addr()).cloned().unwrap_or_default();
        self.string(&name)
    }

    unsafe fn default_save_options(&self, _unit: RawHandle) -> c_uint {
        0
    }

    unsafe fn save_translation_unit(
        &self,
        _unit: RawHandle,
        path: *const c_char,
        options: c_uint,
    ) -> c_int {
        let path = unsafe { opt_str(path) }.unwrap_or_default();
        self.saved.borrow_mut().push((path, options));
        self.save_result.get()
    }

    unsafe fn resource_usage(&self, _unit: RawHandle) -> CXTUResourceUsage {
        self.record("resource_usage");
        let entries: Box<[CXTUResourceUsageEntry]> = self
            .usage_entries
            .borrow()
            .iter()
            .map(|&(kind, amount)| CXTUResourceUsageEntry {
                kind,
                amount: amount as c_ulong,
            })
            .collect();
        let count = entries.len() as c_uint;
        let entries = Box::into_raw(entries).cast::<CXTUResourceUsageEntry>();
        CXTUResourceUsage {
            data: entries.cast(),
            numEntries: count,
            entries,
        }
    }

    unsafe fn dispose_resource_usage(&self, usage: CXTUResourceUsage) {
        let slice = ptr::slice_from_raw_parts_mut(usage.entries, usage.numEntries as usize);
        drop(unsafe { Box::from_raw(slice) });
        self.released("resource_usage");
    }

    unsafe fn num_diagnostics(&self, _unit: RawHandle) -> c_uint {
        self.unit_diagnostics.borrow().len() as c_uint
    }

    unsafe fn diagnostic(&self, _unit: RawHandle, index: c_uint) -> RawHandle {
        let entry = self.unit_diagnostics.borrow().get(index as usize).cloned();
        match entry {
            Some(entry) => self.diagnostic_handle(entry),
            None => ptr::null_mut(),
        }
    }

    unsafe fn load_diagnostics(
        &self,
        _path: *const c_char,
        error: *mut c_int,
        message: *mut CXString,
    ) -> RawHandle {
        let loaded = self.diagnostic_file.borrow().clone();
        match loaded {
            Some(entries) => {
                unsafe {
                    *error = 0;
                    *message = self.string("");
                }
                let set = self.handle();
                self.diagnostic_sets.borrow_mut().insert(set.addr(), entries);
                set
            }
            None => {
                unsafe {
                    *error = 2;
                    *message = self.string("Failed to open diagnostics file");
                }
                ptr::null_mut()
            }
        }
    }

    unsafe fn num_diagnostics_in_set(&self, set: RawHandle) -> c_uint {
        self.diagnostic_sets
            .borrow()
            .get(&set.addr())
            .map_or(0, |entries| entries.len() as c_uint)
    }

    unsafe fn diagnostic_in_set(&self, set: RawHandle, index: c_uint) -> RawHandle {
        let entry = self
            .diagnostic_sets
            .borrow()
            .get(&set.addr())
            .and_then(|entries| entries.get(index as usize).cloned());
        match entry {
            Some(entry) => self.diagnostic_handle(entry),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dispose_diagnostic_set(&self, set: RawHandle) {
        self.diagnostic_sets.borrow_mut().remove(&set.addr());
        self.released("diagnostic_set");
    }

    unsafe fn diagnostic_spelling(&self, diagnostic: RawHandle) -> CXString {
        self.string(&self.diagnostic_entry(diagnostic).spelling)
    }

    unsafe fn diagnostic_severity(&self, diagnostic: RawHandle) -> c_int {
        self.diagnostic_entry(diagnostic).severity
    }

    unsafe fn dispose_diagnostic(&self, diagnostic: RawHandle) {
        self.diagnostics.borrow_mut().remove(&diagnostic.addr());
        self.released("diagnostic");
    }

    unsafe fn default_diagnostic_display_options(&self) -> c_uint {
        0x0b
    }

    unsafe fn format_diagnostic(&self, diagnostic: RawHandle, options: c_uint) -> CXString {
        self.format_options.borrow_mut().push(options);
        let entry = self.diagnostic_entry(diagnostic);
        let mut text = format!("main.c:1:1: {}", entry.spelling);
        if options & 0x08 != 0 && !entry.enable_option.is_empty() {
            text.push_str(&format!(" [{}]", entry.enable_option));
        }
        self.string(&text)
    }

    unsafe fn diagnostic_option(&self, diagnostic: RawHandle, disable: *mut CXString) -> CXString {
        let entry = self.diagnostic_entry(diagnostic);
        if !disable.is_null() {
            unsafe { *disable = self.string(&entry.disable_option) };
        }
        self.string(&entry.enable_option)
    }

    unsafe fn diagnostic_category(&self, diagnostic: RawHandle) -> c_uint {
        self.diagnostic_entry(diagnostic).category.0
    }

    unsafe fn diagnostic_category_text(&self, diagnostic: RawHandle) -> CXString {
        self.string(&self.diagnostic_entry(diagnostic).category.1)
    }

    unsafe fn child_diagnostics(&self, diagnostic: RawHandle) -> RawHandle {
        self.record("child_diagnostics");
        if let Some(set) = self.child_sets.borrow().get(&diagnostic.addr()) {
            return *set;
        }
        let children = self.diagnostic_entry(diagnostic).children;
        if children.is_empty() {
            return ptr::null_mut();
        }
        let set = self.handle();
        self.diagnostic_sets.borrow_mut().insert(set.addr(), children);
        self.child_sets.borrow_mut().insert(diagnostic.addr(), set);
        set
    }

    unsafe fn compilation_database_from_directory(
        &self,
        _directory: *const c_char,
        error: *mut c_int,
    ) -> RawHandle {
        self.record("compilation_database_from_directory");
        if self.database.borrow().is_some() {
            unsafe { *error = 0 };
            self.handle()
        } else {
            unsafe { *error = 1 };
            ptr::null_mut()
        }
    }

    unsafe fn dispose_compilation_database(&self, _database: RawHandle) {
        self.released("database");
    }

    unsafe fn all_compile_commands(&self, _database: RawHandle) -> RawHandle {
        let commands = self.database.borrow().clone().unwrap_or_default();
        let list = self.handle();
        self.command_lists.borrow_mut().insert(list.addr(), commands);
        list
    }

    unsafe fn compile_commands(&self, _database: RawHandle, filename: *const c_char) -> RawHandle {
        let filename = unsafe { opt_str(filename) }.unwrap_or_default();
        let matching: Vec<_> = self
            .database
            .borrow()
            .iter()
            .flatten()
            .filter(|command| command.filename == filename)
            .cloned()
            .collect();
        if matching.is_empty() {
            return ptr::null_mut();
        }
        let list = self.handle();
        self.command_lists.borrow_mut().insert(list.addr(), matching);
        list
    }

    unsafe fn dispose_compile_commands(&self, commands: RawHandle) {
        self.command_lists.borrow_mut().remove(&commands.addr());
        self.released("commands");
    }

    unsafe fn compile_commands_size(&self, commands: RawHandle) -> c_uint {
        self.command_lists
            .borrow()
            .get(&commands.addr())
            .map_or(0, |list| list.len() as c_uint)
    }

    unsafe fn compile_command(&self, commands: RawHandle, index: c_uint) -> RawHandle {
        self.record("compile_command");
        let command = self
            .command_lists
            .borrow()
            .get(&commands.addr())
            .and_then(|list| list.get(index as usize).cloned());
        match command {
            Some(command) => {
                let handle = self.handle();
                self.commands.borrow_mut().insert(handle.addr(), command);
                handle
            }
            None => ptr::null_mut(),
        }
    }

    unsafe fn compile_command_directory(&self, command: RawHandle) -> CXString {
        self.record("compile_command_directory");
        self.string(&self.command(command).directory)
    }

    unsafe fn compile_command_filename(&self, command: RawHandle) -> CXString {
        self.string(&self.command(command).filename)
    }

    unsafe fn compile_command_num_args(&self, command: RawHandle) -> c_uint {
        self.command(command).arguments.len() as c_uint
    }

    unsafe fn compile_command_arg(&self, command: RawHandle, index: c_uint) -> CXString {
        let command = self.command(command);
        self.string(command.arguments.get(index as usize).map_or("", String::as_str))
    }

    unsafe fn compile_command_num_mapped_sources(&self, command: RawHandle) -> c_uint {
        self.command(command).mapped_sources.len() as c_uint
    }

    unsafe fn compile_command_mapped_source_path(
        &self,
        command: RawHandle,
        index: c_uint,
    ) -> CXString {
        let command = self.command(command);
        self.string(command.mapped_sources.get(index as usize).map_or("", |m| &m.0))
    }

    unsafe fn compile_command_mapped_source_content(
        &self,
        command: RawHandle,
        index: c_uint,
    ) -> CXString {
        let command = self.command(command);
        self.string(command.mapped_sources.get(index as usize).map_or("", |m| &m.1))
    }

    unsafe fn module_map_create(&self) -> RawHandle {
        let descriptor = self.handle();
        self.module_maps
            .borrow_mut()
            .insert(descriptor.addr(), (None, None));
        descriptor
    }

    unsafe fn module_map_set_framework_module_name(
        &self,
        descriptor: RawHandle,
        name: *const c_char,
    ) -> c_int {
        let name = unsafe { opt_str(name) };
        match self.module_maps.borrow_mut().get_mut(&descriptor.addr()) {
            Some(entry) if name.is_some() => {
                entry.0 = name;
                0
            }
            _ => 3,
        }
    }

    unsafe fn module_map_set_umbrella_header(
        &self,
        descriptor: RawHandle,
        name: *const c_char,
    ) -> c_int {
        let name = unsafe { opt_str(name) };
        match self.module_maps.borrow_mut().get_mut(&descriptor.addr()) {
            Some(entry) if name.is_some() => {
                entry.1 = name;
                0
            }
            _ => 3,
        }
    }

    unsafe fn module_map_write_to_buffer(
        &self,
        descriptor: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int {
        let (module, header) = self
            .module_maps
            .borrow()
            .get(&descriptor.addr())
            .cloned()
            .unwrap_or_default();
        let text = format!(
            "framework module {} {{\n  umbrella header \"{}\"\n\n  export *\n  \
             module * {{ export * }}\n}}\n",
            module.unwrap_or_default(),
            header.unwrap_or_default()
        );
        self.buffer(text.as_bytes(), buffer, size)
    }

    unsafe fn module_map_dispose(&self, descriptor: RawHandle) {
        self.module_maps.borrow_mut().remove(&descriptor.addr());
        self.released("module_map");
    }

    unsafe fn overlay_create(&self) -> RawHandle {
        let overlay = self.handle();
        self.overlays
            .borrow_mut()
            .insert(overlay.addr(), Overlay::default());
        overlay
    }

    unsafe fn overlay_add_file_mapping(
        &self,
        overlay: RawHandle,
        virtual_path: *const c_char,
        real_path: *const c_char,
    ) -> c_int {
        let virtual_path = unsafe { opt_str(virtual_path) }.unwrap_or_default();
        let real_path = unsafe { opt_str(real_path) }.unwrap_or_default();
        self.mapped_paths
            .borrow_mut()
            .push((virtual_path.clone(), real_path.clone()));
        if !virtual_path.starts_with('/') {
            return 3;
        }
        match self.overlays.borrow_mut().get_mut(&overlay.addr()) {
            Some(entry) => {
                entry.mappings.push((virtual_path, real_path));
                0
            }
            None => 3,
        }
    }

    unsafe fn overlay_set_case_sensitivity(
        &self,
        overlay: RawHandle,
        case_sensitive: c_int,
    ) -> c_int {
        self.record("overlay_set_case_sensitivity");
        match self.overlays.borrow_mut().get_mut(&overlay.addr()) {
            Some(entry) => {
                entry.case_sensitive = Some(case_sensitive != 0);
                0
            }
            None => 3,
        }
    }

    unsafe fn overlay_write_to_buffer(
        &self,
        overlay: RawHandle,
        buffer: *mut *mut c_char,
        size: *mut c_uint,
    ) -> c_int {
        let text = match self.overlays.borrow().get(&overlay.addr()) {
            Some(entry) => {
                let mut text = String::from("{\n  'version': 0,\n");
                if let Some(case_sensitive) = entry.case_sensitive {
                    text.push_str(&format!("  'case-sensitive': '{case_sensitive}',\n"));
                }
                text.push_str("  'roots': [\n");
                for (virtual_path, real_path) in &entry.mappings {
                    text.push_str(&format!(
                        "    {{ 'name': \"{virtual_path}\", \
                         'external-contents': \"{real_path}\" }},\n"
                    ));
                }
                text.push_str("  ]\n}\n");
                text
            }
            None => return 3,
        };
        self.buffer(text.as_bytes(), buffer, size)
    }

    unsafe fn overlay_dispose(&self, overlay: RawHandle) {
        self.overlays.borrow_mut().remove(&overlay.addr());
        self.released("overlay");
    }

    unsafe fn remappings(&self, path: *const c_char) -> RawHandle {
        let path = unsafe { opt_str(path) }.unwrap_or_default();
        self.remapping_sources.borrow_mut().push(path);
        let pairs = self.remappings.borrow().clone();
        match pairs {
            Some(pairs) => {
                let handle = self.handle();
                self.remapping_lists.borrow_mut().insert(handle.addr(), pairs);
                handle
            }
            None => ptr::null_mut(),
        }
    }

    unsafe fn remappings_from_file_list(
        &self,
        paths: *mut *const c_char,
        count: c_uint,
    ) -> RawHandle {
        for i in 0..count as usize {
            let path = unsafe { opt_str(*paths.add(i)) }.unwrap_or_default();
            self.remapping_sources.borrow_mut().push(path);
        }
        let pairs = self.remappings.borrow().clone();
        match pairs {
            Some(pairs) => {
                let handle = self.handle();
                self.remapping_lists.borrow_mut().insert(handle.addr(), pairs);
                handle
            }
            None => ptr::null_mut(),
        }
    }

    unsafe fn remap_num_files(&self, remapping: RawHandle) -> c_uint {
        self.remapping_lists
            .borrow()
            .get(&remapping.addr())
            .map_or(0, |pairs| pairs.len() as c_uint)
    }

    unsafe fn remap_filenames(
        &self,
        remapping: RawHandle,
        index: c_uint,
        original: *mut CXString,
        transformed: *mut CXString,
    ) {
        let pair = self
            .remapping_lists
            .borrow()
            .get(&remapping.addr())
            .and_then(|pairs| pairs.get(index as usize).cloned())
            .unwrap_or_default();
        unsafe {
            *original = self.string(&pair.0);
            *transformed = self.string(&pair.1);
        }
    }

    unsafe fn remap_dispose(&self, remapping: RawHandle) {
        self.remapping_lists.borrow_mut().remove(&remapping.addr());
        self.released("remapping");
    }

    unsafe fn string_data(&self, string: CXString) -> *const c_char {
        string.data.cast()
    }

    unsafe fn dispose_string(&self, string: CXString) {
        if string.data.is_null() {
            return;
        }
        drop(unsafe { CString::from_raw(string.data.cast_mut().cast()) });
        self.strings_disposed.set(self.strings_disposed.get() + 1);
    }

    unsafe fn free(&self, buffer: *mut c_void) {
        self.buffers_freed.set(self.buffers_freed.get() + 1);
        if buffer.is_null() {
            return;
        }
        if let Some(len) = self.buffers.borrow_mut().remove(&buffer.addr()) {
            let slice = ptr::slice_from_raw_parts_mut(buffer.cast::<u8>(), len);
            drop(unsafe { Box::from_raw(slice) });
        }
    }

    unsafe fn version(&self) -> CXString {
        self.record("version");
        self.string("clang version 17.0.6 (fake)")
    }

    unsafe fn build_session_timestamp(&self) -> u64 {
        1_700_000_000
    }

    unsafe fn toggle_crash_recovery(&self, enabled: c_uint) {
        self.crash_recovery.borrow_mut().push(enabled);
    }
}

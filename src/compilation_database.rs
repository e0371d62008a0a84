//! JSON compilation databases (`compile_commands.json`).
//!
//! libclang's own loader does not cope well with malformed input, so the file is
//! checked with serde before the native loader sees it. A database that fails
//! the check never reaches native code.

use crate::collection::LazyList;
use crate::error::{ClangError, Result};
use crate::handle::{CompilationDatabaseKind, CompileCommandsKind, SafeHandle};
use crate::native::{Native, RawHandle};
use crate::status::CompilationDatabaseLoadErrorCode;
use crate::util::{native_index, path_to_cstring, take_string, to_cstring};
use libc::c_int;
use serde::Deserialize;
use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// One entry of a JSON compilation database.
#[derive(Debug, Deserialize)]
struct CompileCommandEntry {
    directory: String,
    file: String,
    command: Option<String>,
    arguments: Option<Vec<String>>,
}

impl CompileCommandEntry {
    fn check(&self) -> std::result::Result<(), &'static str> {
        if self.directory.is_empty() {
            return Err("`directory` is empty");
        }
        if self.file.is_empty() {
            return Err("`file` is empty");
        }
        match (&self.command, &self.arguments) {
            (None, None) => Err("entry has neither `command` nor `arguments`"),
            _ => Ok(()),
        }
    }
}

/// Check `directory/compile_commands.json` if it exists.
///
/// A missing file is left for libclang to report.
fn validate_database_file(directory: &Path) -> Result<()> {
    let path = directory.join(DATABASE_FILE_NAME);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(database_error(&path, err)),
    };
    let entries: Vec<CompileCommandEntry> =
        serde_json::from_str(&contents).map_err(|err| database_error(&path, err))?;
    for (position, entry) in entries.iter().enumerate() {
        entry
            .check()
            .map_err(|reason| database_error(&path, format!("entry {position}: {reason}")))?;
    }
    Ok(())
}

fn database_error(path: &Path, reason: impl fmt::Display) -> ClangError {
    warn!(path = %path.display(), %reason, "rejected compilation database");
    ClangError::CompilationDatabaseLoad {
        code: CompilationDatabaseLoadErrorCode::CAN_NOT_LOAD_DATABASE,
        message: format!("{}: {reason}", path.display()),
    }
}

/// A compilation database loaded from a build directory.
pub struct CompilationDatabase {
    handle: SafeHandle<CompilationDatabaseKind>,
}

impl CompilationDatabase {
    pub(crate) fn from_directory(native: Rc<dyn Native>, directory: &Path) -> Result<Self> {
        let c_directory = path_to_cstring(directory, "directory")?;
        validate_database_file(directory)?;

        let mut code: c_int = 0;
        // SAFETY: `c_directory` outlives the call.
        let raw =
            unsafe { native.compilation_database_from_directory(c_directory.as_ptr(), &mut code) };
        let code = CompilationDatabaseLoadErrorCode::from_raw(code);
        if code != CompilationDatabaseLoadErrorCode::NO_ERROR {
            // A handle may come back alongside the error; it is still ours to free.
            drop(SafeHandle::<CompilationDatabaseKind>::acquire(Rc::clone(&native), raw));
            return Err(ClangError::compilation_database_load(code));
        }
        debug!(directory = %directory.display(), "loaded compilation database");
        Ok(Self {
            handle: SafeHandle::acquire(native, raw)?,
        })
    }

    /// Every compile command in the database.
    pub fn compile_commands(&self) -> Result<CompileCommandCollection> {
        let raw = self.handle.raw()?;
        // SAFETY: `raw` is live.
        let commands = unsafe { self.handle.native().all_compile_commands(raw) };
        CompileCommandCollection::new(SafeHandle::acquire(self.handle.native_rc(), commands)?)
    }

    /// The compile commands for one source file.
    pub fn compile_commands_for(&self, filename: &str) -> Result<CompileCommandCollection> {
        let raw = self.handle.raw()?;
        let c_filename = to_cstring(filename, "filename")?;
        // SAFETY: `raw` is live and `c_filename` outlives the call.
        let commands = unsafe {
            self.handle
                .native()
                .compile_commands(raw, c_filename.as_ptr())
        };
        CompileCommandCollection::new(SafeHandle::acquire(self.handle.native_rc(), commands)?)
    }

    pub fn dispose(&mut self) {
        self.handle.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl fmt::Debug for CompilationDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationDatabase")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Compile commands returned by a database query.
///
/// Independent of the database it came from: the database may be disposed
/// while the collection is still in use.
pub struct CompileCommandCollection {
    handle: SafeHandle<CompileCommandsKind>,
    items: LazyList<CompileCommand>,
}

impl CompileCommandCollection {
    fn new(handle: SafeHandle<CompileCommandsKind>) -> Result<Self> {
        let raw = handle.raw()?;
        let len = if raw.is_null() {
            0
        } else {
            // SAFETY: `raw` is a live, non-null command list.
            unsafe { handle.native().compile_commands_size(raw) as usize }
        };
        Ok(Self {
            handle,
            items: LazyList::new(len),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<&CompileCommand> {
        let raw = self.handle.raw()?;
        self.items.get_or_load(index, |index| {
            let position = native_index(index, self.len())?;
            // SAFETY: `raw` is live and `index` is in range.
            let command = unsafe { self.handle.native().compile_command(raw, position) };
            if command.is_null() {
                return Err(ClangError::OutOfRange {
                    index,
                    len: self.len(),
                });
            }
            CompileCommand::new(self.handle.share()?, command)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&CompileCommand>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    /// Release the command list and every command loaded from it.
    pub fn dispose(&mut self) {
        self.handle.release();
        self.items.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl fmt::Debug for CompileCommandCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileCommandCollection")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A source file overridden in memory for one compile command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceMapping {
    pub path: String,
    pub content: String,
}

/// A single compile command.
///
/// Borrowed from its command list, which it keeps alive.
pub struct CompileCommand {
    owner: SafeHandle<CompileCommandsKind>,
    command: RawHandle,
    filename: OnceCell<String>,
    directory: OnceCell<String>,
    arguments: LazyList<String>,
    source_mappings: LazyList<SourceMapping>,
}

impl CompileCommand {
    fn new(owner: SafeHandle<CompileCommandsKind>, command: RawHandle) -> Result<Self> {
        let native = owner.native();
        // SAFETY: `command` belongs to the live list held by `owner`.
        let (arguments, mappings) = unsafe {
            (
                native.compile_command_num_args(command) as usize,
                native.compile_command_num_mapped_sources(command) as usize,
            )
        };
        Ok(Self {
            owner,
            command,
            filename: OnceCell::new(),
            directory: OnceCell::new(),
            arguments: LazyList::new(arguments),
            source_mappings: LazyList::new(mappings),
        })
    }

    fn live(&self) -> Result<RawHandle> {
        self.owner.raw()?;
        Ok(self.command)
    }

    pub fn filename(&self) -> Result<&str> {
        let command = self.live()?;
        if let Some(filename) = self.filename.get() {
            return Ok(filename);
        }
        let native = self.owner.native();
        // SAFETY: `command` is live; the string is taken over.
        let filename = unsafe { take_string(native, native.compile_command_filename(command)) };
        Ok(self.filename.get_or_init(|| filename))
    }

    /// The working directory the command runs in.
    pub fn directory(&self) -> Result<&str> {
        let command = self.live()?;
        if let Some(directory) = self.directory.get() {
            return Ok(directory);
        }
        let native = self.owner.native();
        // SAFETY: `command` is live; the string is taken over.
        let directory = unsafe { take_string(native, native.compile_command_directory(command)) };
        Ok(self.directory.get_or_init(|| directory))
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn argument(&self, index: usize) -> Result<&str> {
        let command = self.live()?;
        self.arguments
            .get_or_load(index, |index| {
                let native = self.owner.native();
                let position = native_index(index, self.argument_count())?;
                // SAFETY: `command` is live and `index` is in range.
                Ok(unsafe { take_string(native, native.compile_command_arg(command, position)) })
            })
            .map(String::as_str)
    }

    /// The full command line, compiler executable first.
    pub fn arguments(&self) -> impl Iterator<Item = Result<&str>> + '_ {
        (0..self.argument_count()).map(move |index| self.argument(index))
    }

    pub fn source_mapping_count(&self) -> usize {
        self.source_mappings.len()
    }

    pub fn source_mapping(&self, index: usize) -> Result<&SourceMapping> {
        let command = self.live()?;
        self.source_mappings.get_or_load(index, |index| {
            let native = self.owner.native();
            let index = native_index(index, self.source_mapping_count())?;
            // SAFETY: `command` is live and `index` is in range.
            unsafe {
                Ok(SourceMapping {
                    path: take_string(
                        native,
                        native.compile_command_mapped_source_path(command, index),
                    ),
                    content: take_string(
                        native,
                        native.compile_command_mapped_source_content(command, index),
                    ),
                })
            }
        })
    }

    pub fn source_mappings(&self) -> impl Iterator<Item = Result<&SourceMapping>> + '_ {
        (0..self.source_mapping_count()).map(move |index| self.source_mapping(index))
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filename().unwrap_or_default())
    }
}

impl fmt::Debug for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileCommand")
            .field("command", &self.command)
            .field("arguments", &self.argument_count())
            .finish()
    }
}

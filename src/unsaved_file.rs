//! In-memory file contents supplied to a parse.

use crate::error::Result;
use crate::util::{native_count, to_cstring};
use clang_sys::CXUnsavedFile;
use libc::{c_uint, c_ulong};
use std::ffi::CString;
use std::ptr;

/// A file whose contents come from memory instead of disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsavedFile {
    pub filename: String,
    pub content: String,
}

impl UnsavedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read the contents from any reader.
    pub fn from_reader(
        filename: impl Into<String>,
        mut reader: impl std::io::Read,
    ) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(Self::new(filename, content))
    }
}

/// Native view of a set of unsaved files, valid while this value lives.
pub(crate) struct NativeUnsavedFiles {
    _filenames: Vec<CString>,
    entries: Vec<CXUnsavedFile>,
    len: c_uint,
}

impl NativeUnsavedFiles {
    pub fn new(files: &[UnsavedFile]) -> Result<Self> {
        let filenames = files
            .iter()
            .map(|file| to_cstring(&file.filename, "unsaved_files"))
            .collect::<Result<Vec<_>>>()?;
        // Contents are passed with an explicit length, so they need no terminator.
        let entries = files
            .iter()
            .zip(&filenames)
            .map(|(file, filename)| {
                Ok(CXUnsavedFile {
                    Filename: filename.as_ptr(),
                    Contents: file.content.as_ptr().cast(),
                    Length: native_count::<c_ulong>(file.content.len(), "unsaved_files")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let len = native_count(entries.len(), "unsaved_files")?;
        Ok(Self {
            _filenames: filenames,
            entries,
            len,
        })
    }

    pub fn len(&self) -> c_uint {
        self.len
    }

    pub fn as_mut_ptr(&mut self) -> *mut CXUnsavedFile {
        if self.entries.is_empty() {
            ptr::null_mut()
        } else {
            self.entries.as_mut_ptr()
        }
    }
}

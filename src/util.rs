//! Marshaling helpers for the native boundary.
//!
//! Strings cross the boundary as UTF-8. Anything libclang allocates on our
//! behalf (strings, serialized buffers) is copied into Rust-owned memory by a
//! guard that releases the native allocation on every exit path.

use crate::error::{ClangError, Result};
use crate::native::Native;
use clang_sys::CXString;
use libc::{c_char, c_uint};
use std::ffi::{CStr, CString};
use std::path::{Component, Path, PathBuf};
use std::ptr;

/// Convert a Rust string to a C string.
///
/// Returns an error if the string contains an interior NUL byte.
pub fn to_cstring(value: &str, param_name: &'static str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| ClangError::invalid_argument(param_name, "contains an interior NUL byte"))
}

/// Convert a path to a UTF-8 C string.
///
/// Returns an error if the path is not valid UTF-8 or contains a NUL byte.
pub fn path_to_cstring(path: &Path, param_name: &'static str) -> Result<CString> {
    let s = path
        .to_str()
        .ok_or_else(|| ClangError::invalid_argument(param_name, "path is not valid UTF-8"))?;
    to_cstring(s, param_name)
}

/// Resolve a path to an absolute, lexically normalized form.
///
/// The path does not need to exist. `.` components are dropped and `..`
/// components remove their parent; symlinks are not resolved.
pub fn canonicalize(path: &Path, param_name: &'static str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ClangError::invalid_argument(param_name, "path is empty"));
    }
    let absolute = std::path::absolute(path)?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root leaves the root in place.
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Convert a length for a native call, rejecting values the C type cannot hold.
pub fn native_count<T: TryFrom<usize>>(len: usize, param_name: &'static str) -> Result<T> {
    T::try_from(len).map_err(|_| {
        ClangError::invalid_argument(param_name, format!("{len} exceeds the native limit"))
    })
}

/// Convert a collection index for a native call.
pub fn native_index(index: usize, len: usize) -> Result<c_uint> {
    c_uint::try_from(index).map_err(|_| ClangError::OutOfRange { index, len })
}

/// Owned native string (`CXString`), disposed on drop.
pub struct NativeString<'a> {
    native: &'a dyn Native,
    string: CXString,
}

impl<'a> NativeString<'a> {
    /// Take ownership of a string returned by a native call.
    ///
    /// # Safety
    ///
    /// `string` must come from `native` and must not be disposed elsewhere.
    pub unsafe fn new(native: &'a dyn Native, string: CXString) -> Self {
        Self { native, string }
    }

    /// Copy the string into Rust memory. Invalid UTF-8 is replaced lossily and a
    /// null string becomes empty.
    pub fn to_string_lossy(&self) -> String {
        // SAFETY: the string is live until drop.
        let data = unsafe { self.native.string_data(self.string) };
        if data.is_null() {
            return String::new();
        }
        // SAFETY: libclang strings are NUL-terminated.
        unsafe { CStr::from_ptr(data) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for NativeString<'_> {
    fn drop(&mut self) {
        // SAFETY: this guard is the only owner of the string.
        unsafe { self.native.dispose_string(self.string) };
    }
}

/// Copy and dispose a native string in one step.
///
/// # Safety
///
/// Same as [`NativeString::new`].
pub unsafe fn take_string(native: &dyn Native, string: CXString) -> String {
    unsafe { NativeString::new(native, string) }.to_string_lossy()
}

/// Native-allocated byte buffer, freed on drop.
pub struct NativeBuffer<'a> {
    native: &'a dyn Native,
    data: *mut c_char,
    len: c_uint,
}

impl<'a> NativeBuffer<'a> {
    /// Take ownership of a buffer returned by a `write_to_buffer` call.
    ///
    /// # Safety
    ///
    /// `data` must be null or point to `len` bytes allocated by `native` that are
    /// freed nowhere else.
    pub unsafe fn new(native: &'a dyn Native, data: *mut c_char, len: c_uint) -> Self {
        Self { native, data, len }
    }

    /// Copy the buffer into a Rust vector. Zero-length buffers yield an empty
    /// vector.
    pub fn to_vec(&self) -> Vec<u8> {
        if self.data.is_null() || self.len == 0 {
            return Vec::new();
        }
        // SAFETY: the buffer holds `len` initialized bytes until drop.
        unsafe { std::slice::from_raw_parts(self.data.cast::<u8>(), self.len as usize) }.to_vec()
    }
}

impl Drop for NativeBuffer<'_> {
    fn drop(&mut self) {
        // SAFETY: this guard is the only owner of the buffer; `clang_free`
        // accepts null.
        unsafe { self.native.free(self.data.cast()) };
    }
}

/// Run a native `write_to_buffer` style call and copy its output.
///
/// The native buffer is freed whether or not the call reports success.
pub fn read_native_buffer(
    native: &dyn Native,
    write: impl FnOnce(*mut *mut c_char, *mut c_uint) -> libc::c_int,
) -> Result<Vec<u8>> {
    let mut data: *mut c_char = ptr::null_mut();
    let mut len: c_uint = 0;
    let code = write(&mut data, &mut len);
    // SAFETY: the write call hands ownership of `data` to us.
    let buffer = unsafe { NativeBuffer::new(native, data, len) };
    ClangError::check(code)?;
    Ok(buffer.to_vec())
}

/// An argv-style array of C strings kept alive for the duration of a call.
pub struct CStringArray {
    _strings: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl CStringArray {
    pub fn new<I, S>(items: I, param_name: &'static str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings = items
            .into_iter()
            .map(|item| to_cstring(item.as_ref(), param_name))
            .collect::<Result<Vec<_>>>()?;
        let pointers = strings.iter().map(|s| s.as_ptr()).collect();
        Ok(Self {
            _strings: strings,
            pointers,
        })
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Pointer to the first element, or null for an empty array.
    pub fn as_ptr(&self) -> *const *const c_char {
        if self.pointers.is_empty() {
            ptr::null()
        } else {
            self.pointers.as_ptr()
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut *const c_char {
        if self.pointers.is_empty() {
            ptr::null_mut()
        } else {
            self.pointers.as_mut_ptr()
        }
    }
}

/// Convert an optional C string to a pointer, null for `None`.
pub fn optional_ptr(value: Option<&CString>) -> *const c_char {
    value.map_or(ptr::null(), |s| s.as_ptr())
}

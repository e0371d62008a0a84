//! File remappings recorded by a previous run.

use crate::collection::LazyList;
use crate::error::Result;
use crate::handle::{RemappingKind, SafeHandle};
use crate::util::{native_index, take_string};
use clang_sys::CXString;
use std::fmt;
use std::ptr;

/// One original-to-transformed file pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remapping {
    original: String,
    transformed: String,
}

impl Remapping {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn transformed(&self) -> &str {
        &self.transformed
    }
}

/// Read-only list of remappings.
///
/// libclang returns no handle when there was nothing to load; that is exposed as
/// an empty collection.
pub struct RemappingCollection {
    handle: SafeHandle<RemappingKind>,
    items: LazyList<Remapping>,
}

impl RemappingCollection {
    pub(crate) fn new(handle: SafeHandle<RemappingKind>) -> Result<Self> {
        let raw = handle.raw()?;
        let len = if raw.is_null() {
            0
        } else {
            // SAFETY: `raw` is a live, non-null remapping.
            unsafe { handle.native().remap_num_files(raw) as usize }
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

    pub fn get(&self, index: usize) -> Result<&Remapping> {
        self.handle.raw()?;
        self.items.get_or_load(index, |index| self.load(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&Remapping>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    /// Release the native collection and drop every loaded remapping.
    pub fn dispose(&mut self) {
        self.items.clear();
        self.handle.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }

    fn load(&self, index: usize) -> Result<Remapping> {
        let raw = self.handle.raw()?;
        let index = native_index(index, self.len())?;
        let native = self.handle.native();
        let mut original = CXString {
            data: ptr::null(),
            private_flags: 0,
        };
        let mut transformed = original;
        // SAFETY: the index was range checked against `remap_num_files`, and both
        // returned strings are taken over by `take_string`.
        unsafe {
            native.remap_filenames(raw, index, &mut original, &mut transformed);
            Ok(Remapping {
                original: take_string(native, original),
                transformed: take_string(native, transformed),
            })
        }
    }
}

impl fmt::Debug for RemappingCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemappingCollection")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

//! Lazily materialized, fixed-length collections.

use crate::error::{ClangError, Result};
use std::cell::OnceCell;

/// Fixed-length list whose elements are loaded from native code on first access.
///
/// Each slot is filled at most once; later reads return the same reference.
pub(crate) struct LazyList<T> {
    slots: Box<[OnceCell<T>]>,
}

impl<T> LazyList<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Return the element at `index`, running `load` if it is not cached yet.
    ///
    /// A failed load leaves the slot empty so the next access retries.
    pub fn get_or_load(&self, index: usize, load: impl FnOnce(usize) -> Result<T>) -> Result<&T> {
        let slot = self.slots.get(index).ok_or(ClangError::OutOfRange {
            index,
            len: self.slots.len(),
        })?;
        if let Some(value) = slot.get() {
            return Ok(value);
        }
        let value = load(index)?;
        Ok(slot.get_or_init(|| value))
    }

    /// Drop every loaded element. The length is unchanged.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.take();
        }
    }
}

//! Virtual file system overlays.

use crate::document::{self, NativeDocument};
use crate::error::{ClangError, Result};
use crate::handle::{OverlayKind, SafeHandle};
use crate::native::Native;
use crate::util::{canonicalize, path_to_cstring, read_native_buffer};
use libc::c_int;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// A VFS overlay mapping virtual paths onto real files.
pub struct VirtualFileOverlay {
    handle: SafeHandle<OverlayKind>,
    case_sensitive: bool,
}

impl VirtualFileOverlay {
    pub(crate) fn create(native: Rc<dyn Native>) -> Result<Self> {
        // SAFETY: plain factory call.
        let raw = unsafe { native.overlay_create() };
        Ok(Self {
            handle: SafeHandle::acquire(native, raw)?,
            case_sensitive: true,
        })
    }

    /// Map `virtual_path` onto `physical_path`.
    ///
    /// Both paths are made absolute and normalized first; libclang rejects or
    /// mishandles anything else.
    pub fn add_file_mapping(
        &self,
        virtual_path: impl AsRef<Path>,
        physical_path: impl AsRef<Path>,
    ) -> Result<()> {
        let raw = self.handle.raw()?;
        let virtual_path = canonicalize(virtual_path.as_ref(), "virtual_path")?;
        let physical_path = canonicalize(physical_path.as_ref(), "physical_path")?;
        let c_virtual = path_to_cstring(&virtual_path, "virtual_path")?;
        let c_physical = path_to_cstring(&physical_path, "physical_path")?;

        // SAFETY: `raw` is live and both strings outlive the call.
        let code = unsafe {
            self.handle
                .native()
                .overlay_add_file_mapping(raw, c_virtual.as_ptr(), c_physical.as_ptr())
        };
        ClangError::check(code)?;
        debug!(
            virtual_path = %virtual_path.display(),
            physical_path = %physical_path.display(),
            "added file mapping"
        );
        Ok(())
    }

    /// Whether path lookups are case sensitive. Defaults to `true`.
    pub fn case_sensitive(&self) -> Result<bool> {
        self.handle.raw()?;
        Ok(self.case_sensitive)
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: `raw` is live.
        let code = unsafe {
            self.handle
                .native()
                .overlay_set_case_sensitivity(raw, c_int::from(case_sensitive))
        };
        ClangError::check(code)?;
        self.case_sensitive = case_sensitive;
        Ok(())
    }

    pub fn dispose(&mut self) {
        self.handle.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl NativeDocument for VirtualFileOverlay {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let raw = self.handle.raw()?;
        let native = self.handle.native();
        // SAFETY: `raw` is live; the buffer is freed by `read_native_buffer`.
        read_native_buffer(native, |buffer, size| unsafe {
            native.overlay_write_to_buffer(raw, buffer, size)
        })
    }
}

impl fmt::Display for VirtualFileOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        document::display(self, f)
    }
}

impl fmt::Debug for VirtualFileOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileOverlay")
            .field("handle", &self.handle)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

//! Framework module map descriptors.

use crate::document::{self, NativeDocument};
use crate::error::{ClangError, Result};
use crate::handle::{ModuleMapKind, SafeHandle};
use crate::native::Native;
use crate::util::{read_native_buffer, to_cstring};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Builder for a framework `module.modulemap`.
///
/// The framework module name and umbrella header are cached on this side; libclang
/// offers no getters for them.
pub struct ModuleMapDescriptor {
    handle: SafeHandle<ModuleMapKind>,
    framework_module: String,
    umbrella_header: String,
}

impl ModuleMapDescriptor {
    pub(crate) fn create(
        native: Rc<dyn Native>,
        framework_module: &str,
        umbrella_header: &str,
    ) -> Result<Self> {
        // SAFETY: plain factory call.
        let raw = unsafe { native.module_map_create() };
        let mut descriptor = Self {
            handle: SafeHandle::acquire(native, raw)?,
            framework_module: String::new(),
            umbrella_header: String::new(),
        };
        if !framework_module.is_empty() {
            descriptor.set_framework_module(framework_module)?;
        }
        if !umbrella_header.is_empty() {
            descriptor.set_umbrella_header(umbrella_header)?;
        }
        Ok(descriptor)
    }

    pub fn framework_module(&self) -> Result<&str> {
        self.handle.raw()?;
        Ok(&self.framework_module)
    }

    pub fn set_framework_module(&mut self, name: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        let c_name = to_cstring(name, "framework_module")?;
        // SAFETY: `raw` is live and `c_name` outlives the call.
        let code = unsafe {
            self.handle
                .native()
                .module_map_set_framework_module_name(raw, c_name.as_ptr())
        };
        ClangError::check(code)?;
        trace!(name, "set framework module name");
        self.framework_module = name.to_string();
        Ok(())
    }

    pub fn umbrella_header(&self) -> Result<&str> {
        self.handle.raw()?;
        Ok(&self.umbrella_header)
    }

    pub fn set_umbrella_header(&mut self, header: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        let c_header = to_cstring(header, "umbrella_header")?;
        // SAFETY: `raw` is live and `c_header` outlives the call.
        let code = unsafe {
            self.handle
                .native()
                .module_map_set_umbrella_header(raw, c_header.as_ptr())
        };
        ClangError::check(code)?;
        trace!(header, "set umbrella header");
        self.umbrella_header = header.to_string();
        Ok(())
    }

    pub fn dispose(&mut self) {
        self.handle.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}

impl NativeDocument for ModuleMapDescriptor {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let raw = self.handle.raw()?;
        let native = self.handle.native();
        // SAFETY: `raw` is live; the buffer is freed by `read_native_buffer`.
        read_native_buffer(native, |buffer, size| unsafe {
            native.module_map_write_to_buffer(raw, buffer, size)
        })
    }
}

impl fmt::Display for ModuleMapDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        document::display(self, f)
    }
}

impl fmt::Debug for ModuleMapDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMapDescriptor")
            .field("handle", &self.handle)
            .field("framework_module", &self.framework_module)
            .field("umbrella_header", &self.umbrella_header)
            .finish()
    }
}

//! Exclusive-ownership wrapper for native handles.
//!
//! A [`SafeHandle`] owns one native resource and guarantees that the paired
//! native release function runs exactly once. Ownership can be shared with
//! child objects through [`SafeHandle::share`]; the native release then runs
//! when the last owner lets go, so a parent outlives every child derived from it.
//!
//! # Thread Safety
//!
//! `SafeHandle` is NOT `Send` or `Sync`. libclang objects must be used from the
//! thread that created them, or external synchronization must be used.

use crate::error::{ClangError, Result};
use crate::native::{Native, RawHandle};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace};

/// A native resource kind and its release function.
pub(crate) trait ResourceKind: 'static {
    /// Name used in diagnostics and `Disposed` errors.
    const NAME: &'static str;

    /// Whether a null handle is a valid (empty) resource of this kind.
    const NULLABLE: bool = false;

    /// Release a live, non-null handle of this kind.
    ///
    /// # Safety
    ///
    /// `raw` must be a live handle of this kind that nobody releases afterwards.
    unsafe fn release(native: &dyn Native, raw: RawHandle);
}

struct Owned<K: ResourceKind> {
    raw: RawHandle,
    native: Rc<dyn Native>,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> Drop for Owned<K> {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        debug!(kind = K::NAME, handle = ?self.raw, "releasing native handle");
        // SAFETY: the handle was live when acquired and this is its only release.
        unsafe { K::release(&*self.native, self.raw) };
    }
}

/// Owner of one native handle of kind `K`.
pub(crate) struct SafeHandle<K: ResourceKind> {
    native: Rc<dyn Native>,
    owned: Option<Rc<Owned<K>>>,
}

impl<K: ResourceKind> SafeHandle<K> {
    /// Take ownership of a handle returned by a native factory call.
    ///
    /// A null handle is rejected unless the kind is nullable. The rejected null
    /// handle is never released.
    pub fn acquire(native: Rc<dyn Native>, raw: RawHandle) -> Result<Self> {
        if raw.is_null() && !K::NULLABLE {
            return Err(ClangError::invalid_argument(
                "handle",
                format!("native {} handle is null", K::NAME),
            ));
        }
        trace!(kind = K::NAME, handle = ?raw, "acquired native handle");
        let owned = Owned {
            raw,
            native: Rc::clone(&native),
            kind: PhantomData,
        };
        Ok(Self {
            native,
            owned: Some(Rc::new(owned)),
        })
    }

    /// The raw handle for passing into native calls.
    pub fn raw(&self) -> Result<RawHandle> {
        self.owned
            .as_ref()
            .map(|owned| owned.raw)
            .ok_or(ClangError::Disposed(K::NAME))
    }

    /// The native function table this handle was created with.
    pub fn native(&self) -> &dyn Native {
        &*self.native
    }

    /// The native function table as a shareable reference.
    pub fn native_rc(&self) -> Rc<dyn Native> {
        Rc::clone(&self.native)
    }

    /// Another owner of the same native resource.
    pub fn share(&self) -> Result<Self> {
        let owned = self.owned.as_ref().ok_or(ClangError::Disposed(K::NAME))?;
        Ok(Self {
            native: Rc::clone(&self.native),
            owned: Some(Rc::clone(owned)),
        })
    }

    /// Give up this owner's claim on the handle. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(owned) = self.owned.take() {
            trace!(
                kind = K::NAME,
                handle = ?owned.raw,
                owners = Rc::strong_count(&owned),
                "releasing handle owner"
            );
        }
    }

    pub fn is_released(&self) -> bool {
        self.owned.is_none()
    }
}

impl<K: ResourceKind> fmt::Debug for SafeHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeHandle")
            .field("kind", &K::NAME)
            .field("raw", &self.owned.as_ref().map(|owned| owned.raw))
            .finish()
    }
}

/// `CXIndex`
pub(crate) enum IndexKind {}

impl ResourceKind for IndexKind {
    const NAME: &'static str = "Index";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_index(raw) }
    }
}

/// `CXTranslationUnit`
pub(crate) enum TranslationUnitKind {}

impl ResourceKind for TranslationUnitKind {
    const NAME: &'static str = "TranslationUnit";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_translation_unit(raw) }
    }
}

/// `CXCompilationDatabase`
pub(crate) enum CompilationDatabaseKind {}

impl ResourceKind for CompilationDatabaseKind {
    const NAME: &'static str = "CompilationDatabase";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_compilation_database(raw) }
    }
}

/// `CXCompileCommands`; libclang may hand back null for an empty result.
pub(crate) enum CompileCommandsKind {}

impl ResourceKind for CompileCommandsKind {
    const NAME: &'static str = "CompileCommandCollection";
    const NULLABLE: bool = true;

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_compile_commands(raw) }
    }
}

/// `CXModuleMapDescriptor`
pub(crate) enum ModuleMapKind {}

impl ResourceKind for ModuleMapKind {
    const NAME: &'static str = "ModuleMapDescriptor";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.module_map_dispose(raw) }
    }
}

/// `CXVirtualFileOverlay`
pub(crate) enum OverlayKind {}

impl ResourceKind for OverlayKind {
    const NAME: &'static str = "VirtualFileOverlay";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.overlay_dispose(raw) }
    }
}

/// `CXRemapping`; null when libclang found nothing to load.
pub(crate) enum RemappingKind {}

impl ResourceKind for RemappingKind {
    const NAME: &'static str = "RemappingCollection";
    const NULLABLE: bool = true;

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.remap_dispose(raw) }
    }
}

/// `CXDiagnosticSet`
pub(crate) enum DiagnosticSetKind {}

impl ResourceKind for DiagnosticSetKind {
    const NAME: &'static str = "DiagnosticSet";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_diagnostic_set(raw) }
    }
}

/// `CXDiagnostic`
pub(crate) enum DiagnosticKind {}

impl ResourceKind for DiagnosticKind {
    const NAME: &'static str = "Diagnostic";

    unsafe fn release(native: &dyn Native, raw: RawHandle) {
        unsafe { native.dispose_diagnostic(raw) }
    }
}

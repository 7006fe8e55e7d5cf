//! The capability interface of a loaded module

use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use magick_abi::{DestroyFn, ModuleError, NativeValue, ValueKind};

use crate::error::LoadError;

/// A module loaded into the process.
///
/// This is the only surface the rest of the crate sees; how types are found
/// and constructed (symbol tables, manifests) stays behind it.
pub trait NativeModule: Send + Sync {
    /// Look up a type by fully qualified name.
    fn resolve_type(&self, name: &str) -> Option<TypeHandle>;

    /// Construct an instance using the overload whose parameters are `params`.
    fn construct(
        &self,
        ty: &TypeHandle,
        params: &[ValueKind],
        args: &[NativeValue],
    ) -> Result<Instance, ModuleError>;

    /// Invoke a static method of a type.
    fn invoke_static(
        &self,
        ty: &TypeHandle,
        method: &str,
        args: &[NativeValue],
    ) -> Result<(), ModuleError>;
}

/// Loads a module file and runs its initialization entry point.
pub trait ModuleLoader: Send + Sync {
    /// Load `file` and initialize it with `cache_directory`.
    fn load(&self, file: &Path, cache_directory: &Path) -> Result<Arc<dyn NativeModule>, LoadError>;
}

/// A type resolved inside a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    name: Arc<str>,
    slot: usize,
}

impl TypeHandle {
    /// `slot` is the module's own index for the type.
    pub fn new(name: impl Into<Arc<str>>, slot: usize) -> Self {
        Self {
            name: name.into(),
            slot,
        }
    }

    /// Fully qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An object living inside a loaded module.
///
/// Dropping the instance hands it back to the module's destroy callback.
pub struct Instance {
    ptr: NonNull<c_void>,
    type_name: Arc<str>,
    destroy: Option<DestroyFn>,
}

// Ownership of module objects may move between threads; shared access is not assumed.
unsafe impl Send for Instance {}

impl Instance {
    /// Take ownership of an object created by a module.
    ///
    /// # Safety
    /// `ptr` must be a live object of `type_name`, and `destroy` (if any) must
    /// be the matching destructor. The instance must not be freed elsewhere.
    pub unsafe fn from_raw(
        ptr: NonNull<c_void>,
        type_name: impl Into<Arc<str>>,
        destroy: Option<DestroyFn>,
    ) -> Self {
        Self {
            ptr,
            type_name: type_name.into(),
            destroy,
        }
    }

    /// Raw pointer to the object, for calls into the module.
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Name of the type this instance was constructed from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Release ownership without destroying the object.
    pub fn into_raw(self) -> NonNull<c_void> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy {
            unsafe { destroy(self.ptr.as_ptr()) }
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("ptr", &self.ptr)
            .finish()
    }
}

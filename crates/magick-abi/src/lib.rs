//! Magick ABI - types shared between the loader and a loadable module
//!
//! A loadable module exports a single symbol, [`MANIFEST_SYMBOL`], returning
//! a pointer to a static [`ModuleManifest`]. The manifest describes every
//! type the module makes available by name: its constructors (with their
//! parameter kinds), an optional dispatcher for static methods, and the
//! callback that destroys an instance.
//!
//! # Example
//!
//! ```ignore
//! static CONSTRUCTORS: [ConstructorDescriptor; 1] = [ConstructorDescriptor {
//!     params: std::ptr::null(),
//!     param_count: 0,
//!     construct: image_new,
//! }];
//!
//! static TYPES: [TypeDescriptor; 1] = [TypeDescriptor {
//!     name: c"GraphicsMagick.MagickImage".as_ptr(),
//!     constructors: CONSTRUCTORS.as_ptr(),
//!     constructor_count: 1,
//!     invoke_static: None,
//!     destroy: Some(image_free),
//! }];
//!
//! static MANIFEST: ModuleManifest = ModuleManifest {
//!     abi_version: ABI_VERSION,
//!     types: TYPES.as_ptr(),
//!     type_count: 1,
//!     last_error: Some(last_error),
//! };
//!
//! #[no_mangle]
//! pub extern "C" fn magick_module_manifest() -> *const ModuleManifest {
//!     &MANIFEST
//! }
//! ```

#![deny(missing_docs)]

mod error;
mod value;

pub use error::{
    ModuleError, STATUS_ABI_MISMATCH, STATUS_BAD_ARGUMENTS, STATUS_ERROR, STATUS_OK,
    STATUS_UNKNOWN_METHOD,
};
pub use value::{NativeValue, ValueKind};

use std::ffi::{c_char, c_void, CStr};

/// ABI version spoken by this crate. Bumped on any layout change.
pub const ABI_VERSION: u32 = 1;

/// Name of the symbol every loadable module exports.
pub const MANIFEST_SYMBOL: &str = "magick_module_manifest";

/// Status code returned by module calls. Zero is success.
pub type AbiStatus = i32;

/// `magick_module_manifest` signature.
pub type ManifestFn = unsafe extern "C" fn() -> *const ModuleManifest;

/// Constructor entry point. Writes the new instance to `out` on success.
pub type ConstructFn =
    unsafe extern "C" fn(args: *const NativeValue, argc: usize, out: *mut *mut c_void) -> AbiStatus;

/// Static method dispatcher of a type.
pub type InvokeStaticFn =
    unsafe extern "C" fn(method: *const c_char, args: *const NativeValue, argc: usize) -> AbiStatus;

/// Frees an instance created by one of the type's constructors.
pub type DestroyFn = unsafe extern "C" fn(instance: *mut c_void);

/// Returns the message of the last failed call on the calling thread.
pub type LastErrorFn = unsafe extern "C" fn() -> *const c_char;

// ============================================================================
// Manifest
// ============================================================================

/// Root descriptor exported by a loadable module.
#[repr(C)]
#[derive(Debug)]
pub struct ModuleManifest {
    /// Must equal [`ABI_VERSION`]
    pub abi_version: u32,
    /// Array of `type_count` type descriptors
    pub types: *const TypeDescriptor,
    /// Number of entries in `types`
    pub type_count: usize,
    /// Error message accessor for failed calls
    pub last_error: Option<LastErrorFn>,
}

/// A type the module exposes by fully qualified name.
#[repr(C)]
#[derive(Debug)]
pub struct TypeDescriptor {
    /// NUL-terminated fully qualified name
    pub name: *const c_char,
    /// Array of `constructor_count` constructors
    pub constructors: *const ConstructorDescriptor,
    /// Number of entries in `constructors`
    pub constructor_count: usize,
    /// Static method dispatcher, if the type has static methods
    pub invoke_static: Option<InvokeStaticFn>,
    /// Instance destructor
    pub destroy: Option<DestroyFn>,
}

/// One constructor overload.
#[repr(C)]
#[derive(Debug)]
pub struct ConstructorDescriptor {
    /// Array of `param_count` [`ValueKind`] tags
    pub params: *const u8,
    /// Number of parameters
    pub param_count: usize,
    /// Entry point
    pub construct: ConstructFn,
}

// Manifests are immutable statics inside the module.
unsafe impl Send for ModuleManifest {}
unsafe impl Sync for ModuleManifest {}
unsafe impl Send for TypeDescriptor {}
unsafe impl Sync for TypeDescriptor {}
unsafe impl Send for ConstructorDescriptor {}
unsafe impl Sync for ConstructorDescriptor {}

/// Build a slice from a possibly-null pointer and a length.
///
/// # Safety
/// If non-null, `ptr` must point to `len` initialized elements living for `'a`.
unsafe fn slice_or_empty<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

impl ModuleManifest {
    /// Type descriptors of the module.
    ///
    /// # Safety
    /// `types` must point to `type_count` valid descriptors.
    pub unsafe fn types(&self) -> &[TypeDescriptor] {
        slice_or_empty(self.types, self.type_count)
    }

    /// Message of the last failed call, if the module reports one.
    ///
    /// # Safety
    /// `last_error` must return null or a valid NUL-terminated string.
    pub unsafe fn last_error_message(&self) -> Option<String> {
        let ptr = (self.last_error?)();
        if ptr.is_null() {
            return None;
        }
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

impl TypeDescriptor {
    /// Fully qualified name.
    ///
    /// # Safety
    /// `name` must be a valid NUL-terminated string.
    pub unsafe fn name(&self) -> &CStr {
        if self.name.is_null() {
            c""
        } else {
            CStr::from_ptr(self.name)
        }
    }

    /// Constructor overloads.
    ///
    /// # Safety
    /// `constructors` must point to `constructor_count` valid descriptors.
    pub unsafe fn constructors(&self) -> &[ConstructorDescriptor] {
        slice_or_empty(self.constructors, self.constructor_count)
    }
}

impl ConstructorDescriptor {
    /// Parameter kinds, `None` for tags this crate does not know.
    ///
    /// # Safety
    /// `params` must point to `param_count` bytes.
    pub unsafe fn params(&self) -> impl Iterator<Item = Option<ValueKind>> + '_ {
        slice_or_empty(self.params, self.param_count)
            .iter()
            .map(|&tag| ValueKind::from_tag(tag))
    }

    /// Whether this overload accepts exactly `kinds`.
    ///
    /// # Safety
    /// See [`ConstructorDescriptor::params`].
    pub unsafe fn accepts(&self, kinds: &[ValueKind]) -> bool {
        self.param_count == kinds.len()
            && self.params().zip(kinds).all(|(param, kind)| param == Some(*kind))
    }
}

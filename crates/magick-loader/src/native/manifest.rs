//! `NativeModule` over an exported [`ModuleManifest`]

use std::ffi::{c_void, CString};
use std::ptr::{self, NonNull};

use magick_abi::{
    ModuleError, ModuleManifest, NativeValue, TypeDescriptor, ValueKind, ABI_VERSION,
    STATUS_ABI_MISMATCH, STATUS_ERROR, STATUS_OK, STATUS_UNKNOWN_METHOD,
};

use super::library::Library;
use super::module::{Instance, NativeModule, TypeHandle};

/// A module whose types are described by a static manifest.
#[derive(Debug)]
pub struct ManifestModule {
    manifest: &'static ModuleManifest,
    // Never unloaded; kept so the handle is reachable from the module.
    library: Option<&'static Library>,
}

impl ManifestModule {
    /// Wrap a manifest, checking its ABI version.
    ///
    /// # Safety
    /// Every pointer in the manifest must be valid for `'static`, and every
    /// function pointer must have the declared signature.
    pub unsafe fn new(
        manifest: &'static ModuleManifest,
        library: Option<&'static Library>,
    ) -> Result<Self, ModuleError> {
        if manifest.abi_version != ABI_VERSION {
            return Err(ModuleError::new(
                STATUS_ABI_MISMATCH,
                format!(
                    "module speaks ABI version {}, loader expects {}",
                    manifest.abi_version, ABI_VERSION
                ),
            ));
        }
        Ok(Self { manifest, library })
    }

    /// Library the manifest was read from, if any.
    pub fn library(&self) -> Option<&'static Library> {
        self.library
    }

    /// Names of every type the module exposes.
    pub fn type_names(&self) -> Vec<String> {
        self.types()
            .iter()
            .map(|ty| unsafe { ty.name() }.to_string_lossy().into_owned())
            .collect()
    }

    fn types(&self) -> &'static [TypeDescriptor] {
        // Validity of the manifest is the contract of `new`.
        unsafe { self.manifest.types() }
    }

    /// Descriptor behind `ty`. Slot and name must both match, so a handle
    /// from another module never reaches a different type's callbacks.
    fn descriptor(&self, ty: &TypeHandle) -> Result<&'static TypeDescriptor, ModuleError> {
        self.types()
            .get(ty.slot())
            .filter(|descriptor| unsafe { descriptor.name() }.to_bytes() == ty.name().as_bytes())
            .ok_or_else(|| {
                ModuleError::new(STATUS_ERROR, format!("type {} is not part of this module", ty))
            })
    }

    /// Turn a failed status into an error carrying the module's message.
    fn check(&self, status: i32, context: &str) -> Result<(), ModuleError> {
        if status == STATUS_OK {
            return Ok(());
        }
        let message = unsafe { self.manifest.last_error_message() }
            .unwrap_or_else(|| format!("{} failed", context));
        Err(ModuleError::new(status, message))
    }
}

fn describe(kinds: &[ValueKind]) -> String {
    let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
    format!("({})", names.join(", "))
}

impl NativeModule for ManifestModule {
    fn resolve_type(&self, name: &str) -> Option<TypeHandle> {
        self.types()
            .iter()
            .position(|ty| unsafe { ty.name() }.to_bytes() == name.as_bytes())
            .map(|slot| TypeHandle::new(name, slot))
    }

    fn construct(
        &self,
        ty: &TypeHandle,
        params: &[ValueKind],
        args: &[NativeValue],
    ) -> Result<Instance, ModuleError> {
        if params.len() != args.len() {
            return Err(ModuleError::bad_arguments(format!(
                "{} parameter types given for {} arguments",
                params.len(),
                args.len()
            )));
        }
        if let Some(index) = params
            .iter()
            .zip(args)
            .position(|(param, arg)| arg.kind() != Some(*param))
        {
            return Err(ModuleError::bad_arguments(format!(
                "argument {} is not of type {}",
                index, params[index]
            )));
        }

        let descriptor = self.descriptor(ty)?;
        let constructor = unsafe { descriptor.constructors() }
            .iter()
            .find(|ctor| unsafe { ctor.accepts(params) })
            .ok_or_else(|| {
                ModuleError::bad_arguments(format!(
                    "no constructor of {} takes {}",
                    ty,
                    describe(params)
                ))
            })?;

        let mut out: *mut c_void = ptr::null_mut();
        let status = unsafe { (constructor.construct)(args.as_ptr(), args.len(), &mut out) };
        self.check(status, &format!("constructor of {}", ty))?;

        let ptr = NonNull::new(out).ok_or_else(|| {
            ModuleError::new(STATUS_ERROR, format!("constructor of {} returned null", ty))
        })?;
        Ok(unsafe { Instance::from_raw(ptr, ty.name(), descriptor.destroy) })
    }

    fn invoke_static(
        &self,
        ty: &TypeHandle,
        method: &str,
        args: &[NativeValue],
    ) -> Result<(), ModuleError> {
        let descriptor = self.descriptor(ty)?;
        let dispatch = descriptor.invoke_static.ok_or_else(|| {
            ModuleError::new(
                STATUS_UNKNOWN_METHOD,
                format!("{} has no static methods", ty),
            )
        })?;
        let c_method = CString::new(method)
            .map_err(|_| ModuleError::bad_arguments(format!("invalid method name {:?}", method)))?;

        let status = unsafe { dispatch(c_method.as_ptr(), args.as_ptr(), args.len()) };
        self.check(status, &format!("{}.{}", ty, method))
    }
}

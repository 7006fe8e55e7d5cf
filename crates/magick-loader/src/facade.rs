//! Façade over the loaded module

use std::sync::Arc;

use magick_abi::{NativeValue, ValueKind};

use crate::bootstrap::{Bootstrapper, LoadOutcome};
use crate::error::MagickError;
use crate::native::{Instance, TypeHandle};

/// Type lookup and instance construction against the embedded module.
///
/// Every call forces the bootstrap. Construction failures are fresh per call;
/// only the bootstrap outcome is memoized.
#[derive(Debug, Clone)]
pub struct Magick {
    bootstrap: Arc<Bootstrapper>,
}

impl Magick {
    pub fn new(bootstrap: Arc<Bootstrapper>) -> Self {
        Self { bootstrap }
    }

    pub fn bootstrapper(&self) -> &Arc<Bootstrapper> {
        &self.bootstrap
    }

    /// The loaded module, or the stored bootstrap failure.
    pub fn module(&self) -> LoadOutcome {
        self.bootstrap.module()
    }

    /// Look up a type by fully qualified name. Unknown names yield `Ok(None)`.
    pub fn resolve_type(&self, name: &str) -> Result<Option<TypeHandle>, MagickError> {
        Ok(self.module()?.resolve_type(name))
    }

    /// Construct an instance with the parameterless constructor.
    pub fn construct(&self, ty: &TypeHandle) -> Result<Instance, MagickError> {
        self.construct_with(ty, &[], &[])
    }

    /// Construct an instance with the constructor taking `params`.
    pub fn construct_with(
        &self,
        ty: &TypeHandle,
        params: &[ValueKind],
        args: &[NativeValue],
    ) -> Result<Instance, MagickError> {
        self.module()?
            .construct(ty, params, args)
            .map_err(|source| MagickError::Construction {
                type_name: ty.name().to_string(),
                source,
            })
    }
}

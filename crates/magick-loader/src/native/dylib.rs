//! Loading the extracted module file

use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;

use magick_abi::{ManifestFn, NativeValue, MANIFEST_SYMBOL};
use tracing::{debug, info};

use super::library::Library;
use super::manifest::ManifestModule;
use super::module::{ModuleLoader, NativeModule};
use crate::error::LoadError;

/// Type whose static `Initialize(cacheDirectory)` must run before anything else.
pub const INITIALIZER_TYPE: &str = "GraphicsMagick.GraphicsMagickNET";

/// Static method invoked on [`INITIALIZER_TYPE`].
pub const INITIALIZER_METHOD: &str = "Initialize";

/// Loads the module with the platform's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl ModuleLoader for DylibLoader {
    fn load(&self, file: &Path, cache_directory: &Path) -> Result<Arc<dyn NativeModule>, LoadError> {
        let library = Library::open(file)
            .map_err(|source| LoadError::Load {
                path: file.to_path_buf(),
                source,
            })?
            .into_static();
        debug!(path = library.path(), "module library loaded");

        let manifest_fn: ManifestFn = unsafe { library.get(MANIFEST_SYMBOL) }
            .map_err(|e| LoadError::initialization(MANIFEST_SYMBOL, e.to_string()))?;
        let manifest = unsafe { manifest_fn() };
        if manifest.is_null() {
            return Err(LoadError::initialization(
                MANIFEST_SYMBOL,
                "module returned a null manifest",
            ));
        }

        let module = unsafe { ManifestModule::new(&*manifest, Some(library)) }.map_err(|source| {
            LoadError::Initialization {
                target: MANIFEST_SYMBOL.to_string(),
                reason: "incompatible module".to_string(),
                source: Some(source),
            }
        })?;

        initialize(&module, cache_directory)?;
        Ok(Arc::new(module))
    }
}

/// Run `GraphicsMagick.GraphicsMagickNET.Initialize(cache_directory)` inside `module`.
pub fn initialize(module: &dyn NativeModule, cache_directory: &Path) -> Result<(), LoadError> {
    let ty = module
        .resolve_type(INITIALIZER_TYPE)
        .ok_or_else(|| LoadError::initialization(INITIALIZER_TYPE, "type not found in module"))?;

    let directory = cache_directory
        .to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| {
            LoadError::initialization(
                INITIALIZER_TYPE,
                format!("cache directory {:?} cannot be passed to the module", cache_directory),
            )
        })?;

    module
        .invoke_static(&ty, INITIALIZER_METHOD, &[NativeValue::str(&directory)])
        .map_err(|source| LoadError::Initialization {
            target: INITIALIZER_TYPE.to_string(),
            reason: format!("{} failed", INITIALIZER_METHOD),
            source: Some(source),
        })?;

    info!(directory = %cache_directory.display(), "module initialized");
    Ok(())
}

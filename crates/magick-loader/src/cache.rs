//! Cache materialization
//!
//! Writes the module and its auxiliary data files into a versioned cache
//! directory, skipping anything that already exists.
//!
//! Directory structure:
//! ```text
//! <cache root>/
//! └── GraphicsMagick.NET.<version>/
//!     ├── GraphicsMagick.NET-<Q8|Q16>-<x86|x64>.<dll|so|dylib>
//!     ├── colors.mgk
//!     ├── delegates.mgk
//!     ├── modules.mgk
//!     ├── type.mgk
//!     └── type-ghostscript.mgk
//! ```
//!
//! An existing file is trusted as-is: there is no size or checksum
//! verification, so a truncated earlier extraction is reused.

use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::payload::{ModuleDescriptor, AUXILIARY_FILES, PRODUCT_NAME};
use crate::resources::Resources;

/// Result of a full materialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Versioned cache directory
    pub directory: PathBuf,
    /// Extracted module file
    pub module_file: PathBuf,
    /// Whether the module was extracted by this pass
    pub extracted_module: bool,
    /// Auxiliary files written by this pass
    pub written_auxiliary: Vec<String>,
}

/// Writes resources into the cache root.
#[derive(Debug, Clone)]
pub struct CacheMaterializer {
    root: PathBuf,
    resources: Arc<Resources>,
}

impl CacheMaterializer {
    pub fn new(root: impl Into<PathBuf>, resources: Arc<Resources>) -> Self {
        Self {
            root: root.into(),
            resources,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the versioned cache directory, without touching the filesystem.
    pub fn cache_directory(&self, version: &str) -> PathBuf {
        self.root.join(format!("{}.{}", PRODUCT_NAME, version))
    }

    /// Create `root/GraphicsMagick.NET.<version>` if it does not exist.
    pub fn ensure_cache_directory(&self, version: &str) -> Result<PathBuf, LoadError> {
        let path = self.cache_directory(version);
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|source| LoadError::CacheDirectory {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "created cache directory");
        }
        Ok(path)
    }

    /// Decompress the module payload into `cache_path` unless it is already there.
    pub fn ensure_module_file(
        &self,
        descriptor: &ModuleDescriptor,
        cache_path: &Path,
    ) -> Result<PathBuf, LoadError> {
        self.ensure_module_file_inner(descriptor, cache_path)
            .map(|(path, _)| path)
    }

    fn ensure_module_file_inner(
        &self,
        descriptor: &ModuleDescriptor,
        cache_path: &Path,
    ) -> Result<(PathBuf, bool), LoadError> {
        let target = cache_path.join(descriptor.library_file_name());
        if target.exists() {
            debug!(path = %target.display(), "module already extracted");
            return Ok((target, false));
        }

        let written = self.write_resource(descriptor.payload_key(), &target, true)?;
        if written {
            info!(path = %target.display(), "extracted module");
        }
        Ok((target, written))
    }

    /// Write every auxiliary data file that is missing from `cache_path`.
    ///
    /// Returns the names of the files written. Stops at the first failure;
    /// files written before it remain.
    pub fn ensure_auxiliary_files(&self, cache_path: &Path) -> Result<Vec<String>, LoadError> {
        let mut written = Vec::new();

        for file_name in AUXILIARY_FILES {
            let target = cache_path.join(file_name);
            if target.exists() {
                continue;
            }

            let key = ModuleDescriptor::auxiliary_key(file_name);
            if self.write_resource(&key, &target, false)? {
                written.push(file_name.to_string());
            }
        }

        if !written.is_empty() {
            debug!(count = written.len(), "wrote auxiliary files");
        }
        Ok(written)
    }

    /// Run the whole materialization for `descriptor`.
    pub fn materialize(
        &self,
        descriptor: &ModuleDescriptor,
        version: &str,
    ) -> Result<Materialized, LoadError> {
        let directory = self.ensure_cache_directory(version)?;
        let (module_file, extracted_module) =
            self.ensure_module_file_inner(descriptor, &directory)?;
        let written_auxiliary = self.ensure_auxiliary_files(&directory)?;

        Ok(Materialized {
            directory,
            module_file,
            extracted_module,
            written_auxiliary,
        })
    }

    /// Remove the versioned cache directory. Returns whether anything was removed.
    pub fn clean(&self, version: &str) -> io::Result<bool> {
        let path = self.cache_directory(version);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&path)?;
        info!(path = %path.display(), "removed cache directory");
        Ok(true)
    }

    /// Stream resource `key` into a new file at `target`.
    ///
    /// The file is opened create-new. If that fails because another process
    /// created it in the meantime, the file is left alone and `Ok(false)` is
    /// returned. A failure while streaming leaves the partial file behind.
    fn write_resource(&self, key: &str, target: &Path, gzip: bool) -> Result<bool, LoadError> {
        let extraction_error = |source: io::Error| LoadError::Extraction {
            resource: key.to_string(),
            path: target.to_path_buf(),
            source,
        };

        let mut reader: Box<dyn Read + '_> = self.resources.open(key).map_err(extraction_error)?;
        if gzip {
            reader = Box::new(GzDecoder::new(reader));
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && target.exists() => {
                debug!(path = %target.display(), "created concurrently by another process");
                return Ok(false);
            }
            Err(e) => return Err(extraction_error(e)),
        };

        io::copy(&mut reader, &mut file).map_err(extraction_error)?;
        file.sync_all().map_err(extraction_error)?;
        Ok(true)
    }
}

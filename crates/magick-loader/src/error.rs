//! Loader error types.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use magick_abi::ModuleError;
use thiserror::Error;

use crate::native::LibraryError;
use crate::payload::Architecture;

/// Pipeline stage a [`LoadError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Creating the versioned cache directory
    CacheDirectory,
    /// Writing the module or an auxiliary file into the cache
    Extraction,
    /// Loading the module file into the process
    Load,
    /// Running the module's initialization entry point
    Initialization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::CacheDirectory => "cache directory",
            Stage::Extraction => "extraction",
            Stage::Load => "load",
            Stage::Initialization => "initialization",
        })
    }
}

/// Errors that can occur while materializing or loading the module
#[derive(Debug, Error)]
pub enum LoadError {
    /// Cache directory creation failed
    #[error("unable to create cache directory \"{}\"", path.display())]
    CacheDirectory {
        /// Directory that was attempted
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A resource could not be written into the cache
    #[error("unable to write \"{resource}\" to \"{}\"", path.display())]
    Extraction {
        /// Resource key being written
        resource: String,
        /// Target file
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The module file could not be loaded into the process
    #[error("unable to load file \"{}\"", path.display())]
    Load {
        /// Module file
        path: PathBuf,
        #[source]
        source: LibraryError,
    },

    /// The module loaded but its initialization entry point failed
    #[error("unable to initialize {target}: {reason}")]
    Initialization {
        /// Type or symbol being initialized
        target: String,
        /// What went wrong
        reason: String,
        #[source]
        source: Option<ModuleError>,
    },
}

impl LoadError {
    /// Stage this error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            LoadError::CacheDirectory { .. } => Stage::CacheDirectory,
            LoadError::Extraction { .. } => Stage::Extraction,
            LoadError::Load { .. } => Stage::Load,
            LoadError::Initialization { .. } => Stage::Initialization,
        }
    }

    pub(crate) fn initialization(target: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Initialization {
            target: target.into(),
            reason: reason.into(),
            source: None,
        }
    }
}

/// The memoized bootstrap failure, as every caller observes it.
#[derive(Debug, Error)]
#[error("Failed to load embedded {architecture} module: {error}")]
pub struct BootstrapError {
    architecture: Architecture,
    #[source]
    error: LoadError,
}

impl BootstrapError {
    pub(crate) fn new(architecture: Architecture, error: LoadError) -> Self {
        Self {
            architecture,
            error,
        }
    }

    /// Architecture of the module that failed to load.
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Stage-specific error.
    pub fn error(&self) -> &LoadError {
        &self.error
    }

    /// Stage the pipeline failed in.
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}

/// Errors surfaced by the [`Magick`](crate::Magick) façade
#[derive(Debug, Error)]
pub enum MagickError {
    /// The module could not be bootstrapped
    #[error(transparent)]
    Load(#[from] Arc<BootstrapError>),

    /// The module raised an error while constructing an instance
    #[error("unable to construct {type_name}: {source}")]
    Construction {
        /// Type being constructed
        type_name: String,
        source: ModuleError,
    },
}

impl MagickError {
    /// The stored bootstrap failure, if the module never came up.
    pub fn bootstrap(&self) -> Option<&Arc<BootstrapError>> {
        match self {
            MagickError::Load(error) => Some(error),
            MagickError::Construction { .. } => None,
        }
    }
}

/// Invalid loader configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache root must not be empty")]
    EmptyCacheRoot,

    #[error("module version must not be empty")]
    EmptyVersion,
}

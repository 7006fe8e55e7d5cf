//! Embedded GraphicsMagick module loader
//!
//! Materializes the architecture-matching build of the native module from a
//! resource bundle into a versioned cache directory, loads it into the
//! process, runs its `Initialize(cacheDirectory)` entry point once, and
//! exposes type lookup and construction through [`Magick`].
//!
//! - **payload**: picks module name and resource keys for this process
//! - **resources**: embedded or disk-backed resource bundle
//! - **cache**: versioned cache directory, skip-if-exists extraction
//! - **native**: dynamic loading and the `NativeModule` capability
//! - **bootstrap**: the one-time, remembered pipeline
//! - **facade**: the `Magick` entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use magick_loader::{Bootstrapper, LoaderConfig, Magick, Resources};
//!
//! static PAYLOAD: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/module.gz"));
//!
//! let resources = Resources::embedded(&[(
//!     "GraphicsMagick.Resources.ReleaseQ16.GraphicsMagick.NET-x64.gz",
//!     PAYLOAD,
//! )]);
//! let bootstrap = Bootstrapper::new(LoaderConfig::from_env(), Arc::new(resources));
//! let magick = Magick::new(Arc::new(bootstrap));
//!
//! let image = magick.resolve_type("GraphicsMagick.MagickImage")?.unwrap();
//! let instance = magick.construct(&image)?;
//! ```

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod native;
pub mod payload;
pub mod resources;

pub use bootstrap::{BootstrapState, Bootstrapper, LoadOutcome};
pub use cache::{CacheMaterializer, Materialized};
pub use config::{LoaderConfig, CACHE_DIR_ENV};
pub use error::{BootstrapError, ConfigError, LoadError, MagickError, Stage};
pub use facade::Magick;
pub use native::{Instance, ModuleLoader, NativeModule, TypeHandle};
pub use payload::{Architecture, ModuleDescriptor, Variant};
pub use resources::{ResourceEntry, Resources};

pub use magick_abi::{ModuleError, NativeValue, ValueKind};

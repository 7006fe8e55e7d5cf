//! Native module loading
//!
//! - **library**: platform dynamic loader (`dlopen` / `LoadLibraryW`)
//! - **module**: the `NativeModule` / `ModuleLoader` capability traits
//! - **manifest**: `NativeModule` over the manifest a module exports
//! - **dylib**: the default loader and the `Initialize` bootstrap call

pub mod dylib;
pub mod library;
pub mod manifest;
pub mod module;

pub use dylib::{initialize, DylibLoader, INITIALIZER_METHOD, INITIALIZER_TYPE};
pub use library::{Library, LibraryError};
pub use manifest::ManifestModule;
pub use module::{Instance, ModuleLoader, NativeModule, TypeHandle};

//! `magick-cache describe`: show what the loader would extract and where.

use std::sync::Arc;

use magick_loader::payload::AUXILIARY_FILES;
use magick_loader::{
    Architecture, CacheMaterializer, LoaderConfig, ModuleDescriptor, Resources, Variant,
    CACHE_DIR_ENV,
};

pub fn execute(arch: Architecture, variant: Variant, config: &LoaderConfig) -> anyhow::Result<()> {
    let descriptor = ModuleDescriptor::new(arch, variant);
    let directory = CacheMaterializer::new(config.cache_root(), Arc::new(Resources::empty()))
        .cache_directory(config.version());

    println!("Module:       {}", descriptor.module_name());
    println!("Architecture: {}", descriptor.architecture());
    println!("Variant:      {}", descriptor.variant());
    println!("Payload:      {}", descriptor.payload_key());
    println!("File:         {}", descriptor.library_file_name());
    println!();
    println!("Cache:        {}", directory.display());
    if directory.is_dir() {
        let module_file = directory.join(descriptor.library_file_name());
        let state = if module_file.is_file() { "extracted" } else { "missing" };
        println!("Module file:  {}", state);
    } else {
        println!("Module file:  no cache directory");
    }

    println!();
    println!("Auxiliary files:");
    for name in AUXILIARY_FILES {
        println!("  {:<22} {}", name, ModuleDescriptor::auxiliary_key(name));
    }

    println!();
    match std::env::var(CACHE_DIR_ENV) {
        Ok(value) => println!("{}={}", CACHE_DIR_ENV, value),
        Err(_) => println!("{} (not set)", CACHE_DIR_ENV),
    }

    Ok(())
}

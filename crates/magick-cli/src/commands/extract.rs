//! `magick-cache extract`: materialize the cache without loading the module.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use magick_loader::{CacheMaterializer, LoaderConfig, ModuleDescriptor, Resources};

pub fn execute(resources: &Path, config: &LoaderConfig) -> anyhow::Result<()> {
    let resources = Resources::from_dir(resources)
        .with_context(|| format!("failed to read resources from {}", resources.display()))?;
    let descriptor = ModuleDescriptor::current();
    let cache = CacheMaterializer::new(config.cache_root(), Arc::new(resources));

    let materialized = cache.materialize(&descriptor, config.version())?;

    println!("Cache: {}", materialized.directory.display());
    if materialized.extracted_module {
        println!("Extracted {}", descriptor.library_file_name());
    } else {
        println!("Kept existing {}", descriptor.library_file_name());
    }
    for name in &materialized.written_auxiliary {
        println!("Wrote {}", name);
    }
    Ok(())
}

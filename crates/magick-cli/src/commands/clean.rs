//! `magick-cache clean`: remove the versioned cache directory.

use anyhow::Context;
use magick_loader::{CacheMaterializer, LoaderConfig, Resources};
use std::sync::Arc;

pub fn execute(config: &LoaderConfig) -> anyhow::Result<()> {
    let cache = CacheMaterializer::new(config.cache_root(), Arc::new(Resources::empty()));
    let directory = cache.cache_directory(config.version());

    let removed = cache
        .clean(config.version())
        .with_context(|| format!("failed to remove {}", directory.display()))?;

    if removed {
        println!("Removed {}", directory.display());
    } else {
        println!("No cache directory found.");
    }
    Ok(())
}

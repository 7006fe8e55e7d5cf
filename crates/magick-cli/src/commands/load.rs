//! `magick-cache load`: run the bootstrap and resolve the requested types.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use magick_loader::{Bootstrapper, LoaderConfig, Magick, Resources};
use tracing::debug;

pub fn execute(resources: &Path, types: &[String], config: LoaderConfig) -> anyhow::Result<()> {
    let resources = Resources::from_dir(resources)
        .with_context(|| format!("failed to read resources from {}", resources.display()))?;
    let bootstrap = Bootstrapper::new(config, Arc::new(resources));
    let module_name = bootstrap.descriptor().module_name().to_string();
    let magick = Magick::new(Arc::new(bootstrap));

    magick.module()?;
    println!("Loaded {}", module_name);

    let mut missing = 0;
    for name in types {
        match magick.resolve_type(name)? {
            Some(ty) => {
                debug!(slot = ty.slot(), "resolved {}", ty);
                println!("  found    {}", name);
            }
            None => {
                missing += 1;
                println!("  missing  {}", name);
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{} of {} types not found", missing, types.len());
    }
    Ok(())
}

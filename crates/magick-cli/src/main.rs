//! GraphicsMagick module cache tool
//!
//! Inspects and manages the versioned cache the loader extracts the native
//! module into:
//!
//! - `describe`: module name, resource keys and cache location
//! - `extract`: materialize the cache from a directory of resources
//! - `load`: run the full bootstrap and resolve types
//! - `clean`: remove the versioned cache directory

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use magick_loader::{Architecture, LoaderConfig, Variant};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "magick-cache")]
#[command(about = "Inspect and manage the GraphicsMagick module cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the module descriptor and cache location
    Describe {
        /// Architecture to describe instead of the running process
        #[arg(long, value_enum)]
        arch: Option<ArchArg>,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Extract the module and its data files into the cache
    Extract {
        /// Directory holding the resource files, one file per key
        #[arg(short, long)]
        resources: PathBuf,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Extract, load and initialize the module
    Load {
        /// Directory holding the resource files, one file per key
        #[arg(short, long)]
        resources: PathBuf,

        /// Types to resolve after loading
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Remove the versioned cache directory
    Clean {
        #[command(flatten)]
        cache: CacheArgs,
    },
}

/// Cache location overrides shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
struct CacheArgs {
    /// Cache root (default: $MAGICK_CACHE_DIR, then the platform cache directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Version naming the cache directory
    #[arg(long = "cache-version")]
    cache_version: Option<String>,
}

impl CacheArgs {
    fn config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = match &self.root {
            Some(root) => LoaderConfig::new(root)?,
            None => LoaderConfig::from_env(),
        };
        if let Some(version) = &self.cache_version {
            config = config.with_version(version)?;
        }
        Ok(config)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ArchArg {
    X86,
    X64,
}

impl From<ArchArg> for Architecture {
    fn from(arch: ArchArg) -> Self {
        match arch {
            ArchArg::X86 => Architecture::X86,
            ArchArg::X64 => Architecture::X64,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Describe { arch, cache } => {
            let arch = arch.map(Architecture::from).unwrap_or_else(Architecture::current);
            commands::describe::execute(arch, Variant::BUILD, &cache.config()?)
        }
        Commands::Extract { resources, cache } => {
            commands::extract::execute(&resources, &cache.config()?)
        }
        Commands::Load {
            resources,
            types,
            cache,
        } => commands::load::execute(&resources, &types, cache.config()?),
        Commands::Clean { cache } => commands::clean::execute(&cache.config()?),
    }
}

//! Loader configuration

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "MAGICK_CACHE_DIR";

/// Where the module is cached and which version directory it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    cache_root: PathBuf,
    version: String,
}

impl LoaderConfig {
    /// Configuration rooted at `cache_root`, versioned with this crate's version.
    pub fn new(cache_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let cache_root = cache_root.into();
        if cache_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyCacheRoot);
        }
        Ok(Self {
            cache_root,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Configuration from the environment.
    ///
    /// Root resolution order:
    /// 1. `$MAGICK_CACHE_DIR` if set and non-empty
    /// 2. The platform cache directory (`~/.cache`, `%LOCALAPPDATA%`, ...)
    /// 3. The system temporary directory
    pub fn from_env() -> Self {
        let cache_root = std::env::var_os(CACHE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            cache_root,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version that names the cache directory.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        if version.is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        self.version = version;
        Ok(self)
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_crate_version() {
        let config = LoaderConfig::new("/var/cache/app").unwrap();
        assert_eq!(config.cache_root(), Path::new("/var/cache/app"));
        assert_eq!(config.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_empty_root_rejected() {
        assert_eq!(LoaderConfig::new("").unwrap_err(), ConfigError::EmptyCacheRoot);
    }

    #[test]
    fn test_with_version() {
        let config = LoaderConfig::new("/tmp").unwrap().with_version("1.3.20.0").unwrap();
        assert_eq!(config.version(), "1.3.20.0");

        let err = LoaderConfig::new("/tmp").unwrap().with_version("").unwrap_err();
        assert_eq!(err, ConfigError::EmptyVersion);
    }

    #[test]
    fn test_from_env_has_a_root() {
        let config = LoaderConfig::from_env();
        assert!(!config.cache_root().as_os_str().is_empty());
    }
}

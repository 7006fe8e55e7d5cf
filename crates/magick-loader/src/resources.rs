//! Resource bundle
//!
//! Unified access to the payloads the loader materializes:
//! - **Embedded**: bytes compiled into the binary (`include_bytes!`)
//! - **DiskBacked**: a file on disk, read on demand (development, `magick-cache`)
//!
//! Keys are the dotted resource names, e.g.
//! `GraphicsMagick.Resources.xml.colors.mgk`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// A single entry in the bundle.
#[derive(Debug, Clone)]
pub enum ResourceEntry {
    /// File lives on disk, read on demand.
    DiskBacked(PathBuf),

    /// Data embedded in the binary or held in memory.
    Embedded(Cow<'static, [u8]>),
}

/// Maps resource keys to their data.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    entries: HashMap<String, ResourceEntry>,
}

impl Resources {
    /// Create a bundle from a map of entries.
    pub fn new(entries: HashMap<String, ResourceEntry>) -> Self {
        Self { entries }
    }

    /// Create an empty bundle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a bundle from a static `(key, bytes)` table.
    pub fn embedded(table: &[(&str, &'static [u8])]) -> Self {
        let entries = table
            .iter()
            .map(|&(key, data)| (key.to_string(), ResourceEntry::Embedded(Cow::Borrowed(data))))
            .collect();
        Self { entries }
    }

    /// Create a disk-backed bundle from a directory whose file names are resource keys.
    ///
    /// Subdirectories are ignored.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut entries = HashMap::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(key) = path.file_name().and_then(|n| n.to_str()) {
                entries.insert(key.to_string(), ResourceEntry::DiskBacked(path.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: ResourceEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Builder-style [`Resources::insert`] for in-memory data.
    pub fn with_bytes(mut self, key: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(key, ResourceEntry::Embedded(Cow::Owned(data.into())));
        self
    }

    /// Open a resource for streaming.
    ///
    /// A missing key is reported as [`io::ErrorKind::NotFound`].
    pub fn open(&self, key: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.entries.get(key) {
            Some(ResourceEntry::DiskBacked(path)) => Ok(Box::new(fs::File::open(path)?)),
            Some(ResourceEntry::Embedded(data)) => Ok(Box::new(Cursor::new(&data[..]))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("embedded resource \"{}\" not found", key),
            )),
        }
    }

    /// Check if a key exists in the bundle.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// List all keys in the bundle.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Number of entries in the bundle.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bundle is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! File sources consumed by the digest core
//!
//! The calculators only need a path identity, the current size and
//! modification time, and a way to read the bytes. [`HashSource`]
//! captures exactly that so callers can plug in their own file
//! abstraction; [`LocalFile`] is the on-disk implementation.

use crate::cache::CacheKey;
use crate::config::HashAlgorithm;
use crate::error::{IoResultExt, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Size and modification time observed at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// Something whose bytes can be hashed
pub trait HashSource {
    /// Path identity, used as the cache key
    fn path(&self) -> &Path;

    /// Current size and modification time
    fn metadata(&self) -> Result<SourceMetadata>;

    /// Open a streaming reader over the content
    fn open(&self) -> Result<Box<dyn Read + Send>>;

    /// Read the whole content into memory
    fn content(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.open()?
            .read_to_end(&mut buffer)
            .with_path(self.path())?;
        Ok(buffer)
    }

    /// Cache key for this source under `algorithm`
    fn cache_key(&self, algorithm: HashAlgorithm) -> CacheKey {
        CacheKey::new(self.path(), algorithm)
    }
}

impl<T: HashSource + ?Sized> HashSource for &T {
    fn path(&self) -> &Path {
        (**self).path()
    }

    fn metadata(&self) -> Result<SourceMetadata> {
        (**self).metadata()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        (**self).open()
    }

    fn content(&self) -> Result<Vec<u8>> {
        (**self).content()
    }
}

impl<T: HashSource + ?Sized> HashSource for std::sync::Arc<T> {
    fn path(&self) -> &Path {
        (**self).path()
    }

    fn metadata(&self) -> Result<SourceMetadata> {
        (**self).metadata()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        (**self).open()
    }

    fn content(&self) -> Result<Vec<u8>> {
        (**self).content()
    }
}

/// A regular file on the local file system
///
/// Metadata is read fresh on every call so cache validation always sees
/// the file's current modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    /// Wrap a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Consume and return the path
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl From<PathBuf> for LocalFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for LocalFile {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl HashSource for LocalFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn metadata(&self) -> Result<SourceMetadata> {
        let metadata = std::fs::metadata(&self.path).with_path(&self.path)?;
        Ok(SourceMetadata {
            size: metadata.len(),
            modified: metadata.modified().with_path(&self.path)?,
        })
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path).with_path(&self.path)?;
        Ok(Box::new(file))
    }

    fn content(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).with_path(&self.path)
    }
}

//! Cache manager interface
//!
//! A cache manager stores [`HashResult`]s under a [`CacheKey`], the pair
//! of a path and an algorithm. Implementations must be safe to share
//! between the submitting thread and every worker of a threaded
//! calculator.

use crate::config::HashAlgorithm;
use crate::hash::HashResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity under which one digest is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Path the digest belongs to
    pub path: PathBuf,
    /// Algorithm of the digest
    pub algorithm: HashAlgorithm,
}

impl CacheKey {
    /// Key for a bare path
    pub fn new(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            algorithm,
        }
    }
}

/// A result is keyed by its own path and algorithm
impl From<&HashResult> for CacheKey {
    fn from(result: &HashResult) -> Self {
        Self::new(&result.path, result.algorithm)
    }
}

/// Pluggable store of computed digests
pub trait CacheManager: Send + Sync {
    /// Look up a stored result
    fn get(&self, key: &CacheKey) -> Option<HashResult>;

    /// Store `result` under `key`, replacing any previous entry
    fn set(&self, key: CacheKey, result: HashResult);

    /// Number of stored entries
    fn len(&self) -> usize;

    /// Whether nothing is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    fn clear(&self);

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

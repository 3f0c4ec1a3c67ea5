use super::manager::{CacheKey, CacheManager};
use crate::hash::HashResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Bounded cache evicting the least recently used entry
///
/// Both `get` hits and `set` mark an entry as most recently used. The
/// map and its recency order live behind one mutex. A capacity of zero
/// retains nothing.
#[derive(Debug)]
pub struct LruHashCache {
    entries: Option<Mutex<LruCache<CacheKey, HashResult>>>,
    max_size: usize,
}

impl LruHashCache {
    /// Create a cache holding at most `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(max_size).map(|cap| Mutex::new(LruCache::new(cap))),
            max_size,
        }
    }

    /// Configured capacity
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Whether `key` is stored, without touching its recency
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().map(|c| c.contains(key)).unwrap_or(false)
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<CacheKey, HashResult>>> {
        self.entries
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CacheManager for LruHashCache {
    fn get(&self, key: &CacheKey) -> Option<HashResult> {
        self.lock()?.get(key).cloned()
    }

    fn set(&self, key: CacheKey, result: HashResult) {
        let Some(mut entries) = self.lock() else {
            return;
        };
        if let Some((evicted, _)) = entries.push(key.clone(), result) {
            if evicted != key {
                tracing::debug!(
                    "Evicted {} ({}) from LRU cache",
                    evicted.path.display(),
                    evicted.algorithm
                );
            }
        }
    }

    fn len(&self) -> usize {
        self.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

use super::manager::{CacheKey, CacheManager};
use crate::hash::HashResult;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Unbounded in-memory cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, HashResult>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheManager for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<HashResult> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: CacheKey, result: HashResult) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result);
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

use super::manager::{CacheKey, CacheManager};
use crate::hash::HashResult;

/// A cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl NullCache {
    /// Create a null cache
    pub fn new() -> Self {
        Self
    }
}

impl CacheManager for NullCache {
    fn get(&self, _key: &CacheKey) -> Option<HashResult> {
        None
    }

    fn set(&self, _key: CacheKey, _result: HashResult) {}

    fn len(&self) -> usize {
        0
    }

    fn clear(&self) {}

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_result;
    use crate::config::HashAlgorithm;

    #[test]
    fn test_null_never_hits() {
        let cache = NullCache::new();
        let result = test_result("/a", HashAlgorithm::Md5, "00");
        cache.set(CacheKey::from(&result), result.clone());
        assert!(cache.get(&CacheKey::from(&result)).is_none());
        assert!(cache.is_empty());
    }
}

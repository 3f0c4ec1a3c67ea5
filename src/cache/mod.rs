//! Result caching module
//!
//! Stores computed digests keyed by path and algorithm, with three
//! interchangeable backends (null, unbounded memory, bounded LRU) and
//! the validator that decides when a stored digest may be trusted.

mod lru;
mod manager;
mod memory;
mod null;
mod validator;

pub use self::lru::LruHashCache;
pub use manager::{CacheKey, CacheManager};
pub use memory::MemoryCache;
pub use null::NullCache;
pub use validator::CacheValidator;

#[cfg(test)]
pub(crate) fn test_result(
    path: &str,
    algorithm: crate::config::HashAlgorithm,
    hash: &str,
) -> crate::hash::HashResult {
    let now = std::time::SystemTime::now();
    crate::hash::HashResult {
        hash: hash.to_string(),
        algorithm,
        path: path.into(),
        mtime: now,
        calc_time: now,
    }
}

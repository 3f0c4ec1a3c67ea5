use crate::config::RecalcMode;
use crate::hash::HashResult;
use std::time::SystemTime;

/// Decides whether a cached digest may be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheValidator {
    mode: RecalcMode,
}

impl CacheValidator {
    /// Create a validator for `mode`
    pub fn new(mode: RecalcMode) -> Self {
        Self { mode }
    }

    /// The policy in force
    pub fn mode(&self) -> RecalcMode {
        self.mode
    }

    /// Whether `cached` is still usable for a file last modified at `current_mtime`
    ///
    /// Under `TimeTag` the comparison is `cached.mtime >= current_mtime`,
    /// so a write landing in the same timestamp tick as the cached
    /// computation goes unnoticed on coarse-resolution file systems.
    pub fn is_valid(&self, cached: Option<&HashResult>, current_mtime: SystemTime) -> bool {
        let Some(cached) = cached else {
            return false;
        };
        match self.mode {
            RecalcMode::TimeTag => cached.mtime >= current_mtime,
            RecalcMode::Always => false,
            RecalcMode::Never => true,
        }
    }
}

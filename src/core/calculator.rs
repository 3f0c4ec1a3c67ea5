//! Synchronous, cache-aware calculator
//!
//! Looks every requested digest up in the cache first. When all of them
//! are present and still valid the file is not touched. A single miss
//! recomputes the whole requested set in one read pass and overwrites
//! every cache entry.

use crate::cache::{CacheManager, CacheValidator, LruHashCache, MemoryCache, NullCache};
use crate::config::{CalculatorConfig, HashAlgorithm};
use crate::error::{HashCalcError, Result};
use crate::fs::HashSource;
use crate::hash::{multiple_file_hash, HashResult, MultipleHashResult};
use crate::progress::ProgressController;
use rayon::prelude::*;
use std::sync::Arc;

/// Build the cache a calculator uses when none is injected
pub fn default_cache(config: &CalculatorConfig) -> Arc<dyn CacheManager> {
    match (config.cache_enabled, config.cache_size) {
        (false, _) => Arc::new(NullCache::new()),
        (true, Some(max_size)) => Arc::new(LruHashCache::new(max_size)),
        (true, None) => Arc::new(MemoryCache::new()),
    }
}

/// Remove duplicates, keeping the first occurrence
pub(crate) fn dedup_algorithms(algorithms: &[HashAlgorithm]) -> Vec<HashAlgorithm> {
    let mut unique = Vec::with_capacity(algorithms.len());
    for &algorithm in algorithms {
        if !unique.contains(&algorithm) {
            unique.push(algorithm);
        }
    }
    unique
}

/// Pull one algorithm's result out of a pass
pub(crate) fn take_result<S: HashSource + ?Sized>(
    mut results: MultipleHashResult,
    algorithm: HashAlgorithm,
    source: &S,
) -> Result<HashResult> {
    results.remove(&algorithm).ok_or_else(|| {
        HashCalcError::config(format!(
            "no {} digest produced for {}",
            algorithm,
            source.path().display()
        ))
    })
}

/// Cache-aware digest calculator
///
/// Cloning is cheap and every clone shares the same cache.
#[derive(Clone)]
pub struct Calculator {
    config: CalculatorConfig,
    cache: Arc<dyn CacheManager>,
    validator: CacheValidator,
}

impl Calculator {
    /// Create a calculator with the cache its configuration asks for
    pub fn new(config: CalculatorConfig) -> Self {
        let cache = default_cache(&config);
        Self::with_cache(config, cache)
    }

    /// Create a calculator sharing an existing cache
    pub fn with_cache(config: CalculatorConfig, cache: Arc<dyn CacheManager>) -> Self {
        let validator = CacheValidator::new(config.recalc_mode);
        tracing::debug!(
            "Calculator using {} cache, recalc mode {:?}",
            cache.name(),
            config.recalc_mode
        );
        Self {
            config,
            cache,
            validator,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Shared cache
    pub fn cache(&self) -> &Arc<dyn CacheManager> {
        &self.cache
    }

    /// Cache validator in force
    pub fn validator(&self) -> CacheValidator {
        self.validator
    }

    /// One digest, from the cache when valid
    ///
    /// `None` selects the configured default algorithm.
    pub fn get<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithm: Option<HashAlgorithm>,
    ) -> Result<HashResult> {
        let algorithm = algorithm.unwrap_or(self.config.default_algorithm);
        let results = self.multiple_get(source, &[algorithm])?;
        take_result(results, algorithm, source)
    }

    /// Several digests, from the cache only if every one of them is valid
    pub fn multiple_get<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithms: &[HashAlgorithm],
    ) -> Result<MultipleHashResult> {
        self.multiple_get_with_progress(source, algorithms, None)
    }

    /// [`multiple_get`](Self::multiple_get) reporting into `progress` on a miss
    pub fn multiple_get_with_progress<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithms: &[HashAlgorithm],
        progress: Option<&ProgressController>,
    ) -> Result<MultipleHashResult> {
        let algorithms = dedup_algorithms(algorithms);
        if algorithms.is_empty() {
            return Ok(MultipleHashResult::new());
        }

        if let Some(cached) = self.find_all_cached(source, &algorithms) {
            tracing::debug!("Cache hit for {}", source.path().display());
            return Ok(cached);
        }

        tracing::debug!(
            "Cache miss for {}, computing {} algorithm(s)",
            source.path().display(),
            algorithms.len()
        );
        self.multiple_calc(source, &algorithms, progress)
    }

    /// A valid cached result for one algorithm
    ///
    /// Unreadable metadata counts as a miss.
    pub fn find_cache<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithm: HashAlgorithm,
    ) -> Option<HashResult> {
        let mtime = source.metadata().ok()?.modified;
        self.lookup(source, algorithm, mtime)
    }

    /// Valid cached results for every algorithm, or `None` on any miss
    pub fn find_all_cached<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithms: &[HashAlgorithm],
    ) -> Option<MultipleHashResult> {
        let mtime = source.metadata().ok()?.modified;
        algorithms
            .iter()
            .map(|&algorithm| {
                self.lookup(source, algorithm, mtime)
                    .map(|result| (algorithm, result))
            })
            .collect()
    }

    fn lookup<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithm: HashAlgorithm,
        mtime: std::time::SystemTime,
    ) -> Option<HashResult> {
        let cached = self.cache.get(&source.cache_key(algorithm));
        if self.validator.is_valid(cached.as_ref(), mtime) {
            cached
        } else {
            None
        }
    }

    /// Compute one digest unconditionally and store it
    pub fn calc<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithm: HashAlgorithm,
        progress: Option<&ProgressController>,
    ) -> Result<HashResult> {
        let results = self.multiple_calc(source, &[algorithm], progress)?;
        take_result(results, algorithm, source)
    }

    /// Compute every digest unconditionally and store them
    pub fn multiple_calc<S: HashSource + ?Sized>(
        &self,
        source: &S,
        algorithms: &[HashAlgorithm],
        progress: Option<&ProgressController>,
    ) -> Result<MultipleHashResult> {
        let results = multiple_file_hash(
            source,
            algorithms,
            self.config.chunk_size,
            self.config.io_threshold,
            progress,
        )?;

        for result in results.values() {
            self.cache
                .set(source.cache_key(result.algorithm), result.clone());
        }
        Ok(results)
    }

    /// [`multiple_get`](Self::multiple_get) over a batch, in parallel
    ///
    /// Results come back in input order.
    pub fn get_many<S: HashSource + Sync>(
        &self,
        sources: &[S],
        algorithms: &[HashAlgorithm],
    ) -> Vec<Result<MultipleHashResult>> {
        sources
            .par_iter()
            .map(|source| self.multiple_get(source, algorithms))
            .collect()
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("config", &self.config)
            .field("cache", &self.cache.name())
            .finish()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(CalculatorConfig::default())
    }
}

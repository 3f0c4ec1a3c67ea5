//! Thread-pool backed calculator
//!
//! Cache checks run on the calling thread. A full hit comes back as an
//! already completed future; a miss becomes one job on the worker pool
//! with its own progress controller, mirrored by the returned future.

use super::calculator::{dedup_algorithms, take_result, Calculator};
use super::pool::{panic_message, WorkerPool};
use crate::cache::CacheManager;
use crate::config::{CalculatorConfig, HashAlgorithm};
use crate::error::{HashCalcError, Result};
use crate::fs::HashSource;
use crate::hash::{HashResult, MultipleHashResult};
use crate::progress::{task_channel, FutureWithProgress, ProgressController};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Calculator that hashes on a pool of worker threads
///
/// Owns its pool outright. Dropping it stops accepting work without
/// waiting for running jobs; call [`shutdown(true)`](Self::shutdown) or
/// wait on every future to be sure all of them finished.
#[derive(Debug)]
pub struct ThreadedCalculator {
    calculator: Calculator,
    pool: WorkerPool,
}

impl ThreadedCalculator {
    /// Create a calculator and start its workers
    pub fn new(config: CalculatorConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.effective_threads())?;
        Ok(Self {
            calculator: Calculator::new(config),
            pool,
        })
    }

    /// Create a calculator sharing an existing cache
    pub fn with_cache(config: CalculatorConfig, cache: Arc<dyn CacheManager>) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.effective_threads())?;
        Ok(Self {
            calculator: Calculator::with_cache(config, cache),
            pool,
        })
    }

    /// The synchronous calculator sharing this one's cache
    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// One digest in the background
    ///
    /// `None` selects the configured default algorithm.
    pub fn threaded_get<S>(
        &self,
        source: S,
        algorithm: Option<HashAlgorithm>,
    ) -> Result<FutureWithProgress<HashResult>>
    where
        S: HashSource + Send + 'static,
    {
        let algorithm = algorithm.unwrap_or(self.calculator.config().default_algorithm);
        if let Some(hit) = self.calculator.find_cache(&source, algorithm) {
            tracing::debug!("Cache hit for {}", source.path().display());
            return Ok(FutureWithProgress::completed(hit));
        }

        self.submit(source, move |calculator, source, progress| {
            let results = calculator.multiple_calc(source, &[algorithm], Some(progress))?;
            take_result(results, algorithm, source)
        })
    }

    /// Several digests of one source in the background
    pub fn threaded_multiple_get<S>(
        &self,
        source: S,
        algorithms: &[HashAlgorithm],
    ) -> Result<FutureWithProgress<MultipleHashResult>>
    where
        S: HashSource + Send + 'static,
    {
        let algorithms = dedup_algorithms(algorithms);
        if algorithms.is_empty() {
            return Ok(FutureWithProgress::completed(MultipleHashResult::new()));
        }
        if let Some(hit) = self.calculator.find_all_cached(&source, &algorithms) {
            tracing::debug!("Cache hit for {}", source.path().display());
            return Ok(FutureWithProgress::completed(hit));
        }

        self.submit(source, move |calculator, source, progress| {
            calculator.multiple_calc(source, &algorithms, Some(progress))
        })
    }

    /// [`threaded_multiple_get`](Self::threaded_multiple_get) for each source
    pub fn threaded_get_many<S>(
        &self,
        sources: Vec<S>,
        algorithms: &[HashAlgorithm],
    ) -> Result<Vec<FutureWithProgress<MultipleHashResult>>>
    where
        S: HashSource + Send + 'static,
    {
        sources
            .into_iter()
            .map(|source| self.threaded_multiple_get(source, algorithms))
            .collect()
    }

    /// Block on every future, keeping input order
    pub fn wait_all<T>(futures: Vec<FutureWithProgress<T>>) -> Vec<Result<T>> {
        futures.into_iter().map(FutureWithProgress::wait).collect()
    }

    /// Stop accepting work; with `wait`, block until queued work finished
    pub fn shutdown(&self, wait: bool) {
        self.pool.shutdown(wait);
    }

    fn submit<S, T, F>(&self, source: S, work: F) -> Result<FutureWithProgress<T>>
    where
        S: HashSource + Send + 'static,
        T: Send + 'static,
        F: FnOnce(&Calculator, &S, &ProgressController) -> Result<T> + Send + 'static,
    {
        let (promise, future) = task_channel(Arc::new(ProgressController::new()));
        let calculator = self.calculator.clone();

        tracing::debug!("Queued {}", source.path().display());
        self.pool.submit(move || {
            if !promise.start() {
                tracing::debug!("Skipping cancelled task for {}", source.path().display());
                promise.cancel();
                return;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                work(&calculator, &source, promise.progress().as_ref())
            }));
            let result = outcome.unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::warn!("Hashing {} panicked: {}", source.path().display(), message);
                Err(HashCalcError::TaskPanicked(message))
            });
            promise.complete(result);
        })?;

        Ok(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{LocalFile, SourceMetadata};
    use crate::progress::TaskStatus;
    use crossbeam::channel::{bounded, Receiver};
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Blocks in `open` until the gate receives a value
    struct GatedSource {
        file: LocalFile,
        gate: Receiver<()>,
    }

    impl HashSource for GatedSource {
        fn path(&self) -> &Path {
            self.file.path()
        }

        fn metadata(&self) -> Result<SourceMetadata> {
            self.file.metadata()
        }

        fn open(&self) -> Result<Box<dyn Read + Send>> {
            let _ = self.gate.recv_timeout(Duration::from_secs(10));
            self.file.open()
        }
    }

    struct PanickingSource(PathBuf);

    impl HashSource for PanickingSource {
        fn path(&self) -> &Path {
            &self.0
        }

        fn metadata(&self) -> Result<SourceMetadata> {
            LocalFile::new(&self.0).metadata()
        }

        fn open(&self) -> Result<Box<dyn Read + Send>> {
            panic!("source exploded")
        }
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config(threads: usize) -> CalculatorConfig {
        CalculatorConfig {
            threads,
            ..Default::default()
        }
    }

    fn wait_for_status<T>(future: &FutureWithProgress<T>, status: TaskStatus) {
        for _ in 0..500 {
            if future.status() == status {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("task never reached {}", status);
    }

    #[test]
    fn test_fan_out() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..25)
            .map(|i| {
                let content = format!("content {}", i);
                write_file(dir.path(), &format!("f{}.txt", i), content.as_bytes())
            })
            .collect();
        let calc = ThreadedCalculator::new(config(3)).unwrap();
        assert_eq!(calc.thread_count(), 3);

        let algorithms = [HashAlgorithm::Sha256, HashAlgorithm::Md5];
        let sources: Vec<LocalFile> = paths.iter().map(LocalFile::new).collect();
        let futures = calc.threaded_get_many(sources, &algorithms).unwrap();
        let results = ThreadedCalculator::wait_all(futures);

        assert_eq!(results.len(), 25);
        for (path, result) in paths.iter().zip(results) {
            let result = result.unwrap();
            assert_eq!(result.len(), 2);
            for (algorithm, hash) in &result {
                assert_eq!(&hash.path, path);
                assert_eq!(hash.algorithm, *algorithm);
            }
            let expected = calc
                .calculator()
                .calc(&LocalFile::new(path), HashAlgorithm::Md5, None)
                .unwrap();
            assert!(result[&HashAlgorithm::Md5].matches(&expected));
        }
        assert_eq!(calc.calculator().cache().len(), 50);
    }

    #[test]
    fn test_cache_hit_is_completed_immediately() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.txt", b"cached");
        let calc = ThreadedCalculator::new(config(1)).unwrap();

        let first = calc.threaded_get(LocalFile::new(&path), None).unwrap().wait().unwrap();
        calc.shutdown(true);

        // The pool is closed, so only a cache hit can succeed.
        let future = calc.threaded_get(LocalFile::new(&path), None).unwrap();
        assert!(future.is_done());
        assert_eq!(future.status(), TaskStatus::Completed);
        assert_eq!(future.wait().unwrap(), first);
    }

    #[test]
    fn test_threaded_get_checks_requested_algorithm() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.txt", b"data");
        let calc = ThreadedCalculator::new(config(1)).unwrap();

        calc.calculator().get(&LocalFile::new(&path), None).unwrap();
        let future = calc
            .threaded_get(LocalFile::new(&path), Some(HashAlgorithm::Sha1))
            .unwrap();
        let result = future.wait().unwrap();
        assert_eq!(result.algorithm, HashAlgorithm::Sha1);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.txt", b"data");
        let calc = ThreadedCalculator::new(config(2)).unwrap();
        calc.shutdown(false);

        let err = calc.threaded_get(LocalFile::new(&path), None).unwrap_err();
        assert!(matches!(err, HashCalcError::ThreadPoolError(_)));
    }

    #[test]
    fn test_error_surfaces_on_wait() {
        let calc = ThreadedCalculator::new(config(2)).unwrap();
        let future = calc.threaded_get(LocalFile::new("/no/such/file"), None).unwrap();
        let err = future.wait().unwrap_err();
        assert_eq!(err.path().unwrap(), &PathBuf::from("/no/such/file"));
    }

    #[test]
    fn test_progress_mirrors_task() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "big.bin", &vec![7u8; 200_000]);
        let calc = ThreadedCalculator::new(config(1)).unwrap();

        let future = calc.threaded_get(LocalFile::new(&path), None).unwrap();
        let progress = Arc::clone(future.progress());
        future.wait().unwrap();
        assert_eq!(progress.total(), 200_000);
        assert_eq!(progress.progress(), 200_000);
    }

    #[test]
    fn test_cancel_waiting_task_never_runs() {
        let dir = TempDir::new().unwrap();
        let blocker = write_file(dir.path(), "blocker.txt", b"blocker");
        let queued = write_file(dir.path(), "queued.txt", b"queued");
        let calc = ThreadedCalculator::new(config(1)).unwrap();
        let (release, gate) = bounded(1);

        let running = calc
            .threaded_get(GatedSource { file: LocalFile::new(&blocker), gate }, None)
            .unwrap();
        wait_for_status(&running, TaskStatus::Running);

        let waiting = calc.threaded_get(LocalFile::new(&queued), None).unwrap();
        assert_eq!(waiting.status(), TaskStatus::Waiting);
        assert!(waiting.cancel());

        release.send(()).unwrap();
        assert!(running.wait().is_ok());
        assert!(waiting.wait().unwrap_err().is_cancelled());

        calc.shutdown(true);
        assert!(calc
            .calculator()
            .find_cache(&LocalFile::new(&queued), HashAlgorithm::Sha256)
            .is_none());
    }

    #[test]
    fn test_cancel_running_task_still_caches() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "slow.txt", b"slow");
        let calc = ThreadedCalculator::new(config(1)).unwrap();
        let (release, gate) = bounded(1);

        let future = calc
            .threaded_get(GatedSource { file: LocalFile::new(&path), gate }, None)
            .unwrap();
        wait_for_status(&future, TaskStatus::Running);
        assert!(future.cancel());
        assert_eq!(future.status(), TaskStatus::Canceled);

        release.send(()).unwrap();
        assert!(future.wait().unwrap_err().is_cancelled());
        assert!(calc
            .calculator()
            .find_cache(&LocalFile::new(&path), HashAlgorithm::Sha256)
            .is_some());
    }

    #[test]
    fn test_panic_fails_only_that_task() {
        let dir = TempDir::new().unwrap();
        let bad = write_file(dir.path(), "bad.txt", b"bad");
        let good = write_file(dir.path(), "good.txt", b"good");
        let calc = ThreadedCalculator::new(config(1)).unwrap();

        let failing = calc.threaded_get(PanickingSource(bad), None).unwrap();
        let passing = calc.threaded_get(LocalFile::new(&good), None).unwrap();

        assert!(matches!(failing.wait(), Err(HashCalcError::TaskPanicked(_))));
        assert!(passing.wait().is_ok());
    }
}

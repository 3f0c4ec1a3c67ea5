//! Single-pass digest computation over files
//!
//! Small files are read into memory and hashed as one chunk; files above
//! the I/O threshold are streamed in fixed-size chunks. Either way every
//! requested algorithm sees the same bytes from one read pass, and a
//! progress controller (when given) receives the file size as its total
//! before the first byte and is advanced after every chunk.

use super::hasher::{Digests, MultiHasher};
use crate::config::HashAlgorithm;
use crate::error::{HashCalcError, IoResultExt, Result};
use crate::fs::HashSource;
use crate::progress::ProgressController;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

/// Digest of one file under one algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    /// Hash value as lowercase hex string
    pub hash: String,
    /// The hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Path the digest was computed for
    pub path: PathBuf,
    /// Modification time observed before reading
    pub mtime: SystemTime,
    /// When the computation started
    pub calc_time: SystemTime,
}

impl HashResult {
    /// Same algorithm and same digest
    pub fn matches(&self, other: &HashResult) -> bool {
        self.algorithm == other.algorithm && self.hash == other.hash
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Results of one pass, keyed by algorithm
pub type MultipleHashResult = BTreeMap<HashAlgorithm, HashResult>;

/// Hash an in-memory buffer as a single chunk
pub fn calc_bytes(
    data: &[u8],
    algorithms: &[HashAlgorithm],
    progress: Option<&ProgressController>,
) -> Digests {
    let mut hasher = MultiHasher::new(algorithms);
    hasher.update(data);
    if let Some(progress) = progress {
        progress.advance(data.len() as u64);
    }
    hasher.finalize()
}

/// Hash a reader in chunks of `chunk_size` bytes
pub fn calc<R: Read>(
    mut reader: R,
    algorithms: &[HashAlgorithm],
    chunk_size: usize,
    progress: Option<&ProgressController>,
) -> std::io::Result<Digests> {
    let mut hasher = MultiHasher::new(algorithms);
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        hasher.update(&buffer[..bytes_read]);
        if let Some(progress) = progress {
            progress.advance(bytes_read as u64);
        }
    }

    tracing::trace!(
        "Hashed {} bytes with {} algorithm(s)",
        hasher.bytes_processed(),
        algorithms.len()
    );
    Ok(hasher.finalize())
}

/// Compute every requested digest of `source` in one read pass
///
/// An empty algorithm list returns an empty map without touching the
/// source. No partial result is produced on failure.
pub fn multiple_file_hash<S: HashSource + ?Sized>(
    source: &S,
    algorithms: &[HashAlgorithm],
    chunk_size: usize,
    io_threshold: u64,
    progress: Option<&ProgressController>,
) -> Result<MultipleHashResult> {
    if algorithms.is_empty() {
        return Ok(MultipleHashResult::new());
    }

    let path = source.path();
    let metadata = source.metadata()?;
    if let Some(progress) = progress {
        progress.set_total(metadata.size);
    }

    let calc_time = SystemTime::now();
    let start = Instant::now();
    let digests = if metadata.size > io_threshold {
        let reader = source.open()?;
        calc(reader, algorithms, chunk_size, progress).with_path(path)?
    } else {
        let content = source.content()?;
        calc_bytes(&content, algorithms, progress)
    };

    tracing::debug!(
        "Computed {} digest(s) of {} ({} bytes) in {:?}",
        digests.len(),
        path.display(),
        metadata.size,
        start.elapsed()
    );

    Ok(digests
        .into_iter()
        .map(|(algorithm, hash)| {
            let result = HashResult {
                hash,
                algorithm,
                path: path.to_path_buf(),
                mtime: metadata.modified,
                calc_time,
            };
            (algorithm, result)
        })
        .collect())
}

/// Compute one digest of `source`
pub fn file_hash<S: HashSource + ?Sized>(
    source: &S,
    algorithm: HashAlgorithm,
    chunk_size: usize,
    io_threshold: u64,
    progress: Option<&ProgressController>,
) -> Result<HashResult> {
    multiple_file_hash(source, &[algorithm], chunk_size, io_threshold, progress)?
        .remove(&algorithm)
        .ok_or_else(|| {
            HashCalcError::config(format!(
                "no {} digest produced for {}",
                algorithm,
                source.path().display()
            ))
        })
}

/// Benchmark hash algorithms on synthetic data
///
/// Returns `(algorithm, time per pass, MiB/s)`, fastest first.
pub fn benchmark_algorithms(
    algorithms: &[HashAlgorithm],
    data_size: usize,
) -> Vec<(HashAlgorithm, Duration, f64)> {
    let data: Vec<u8> = (0..data_size).map(|i| (i % 256) as u8).collect();
    let iterations = 5u32;
    let mut results = Vec::with_capacity(algorithms.len());

    for &algorithm in algorithms {
        let start = Instant::now();
        for _ in 0..iterations {
            calc_bytes(&data, &[algorithm], None);
        }

        let duration = start.elapsed() / iterations;
        let secs = duration.as_secs_f64();
        let throughput = if secs > 0.0 {
            (data_size as f64) / secs / (1024.0 * 1024.0)
        } else {
            f64::INFINITY
        };

        results.push((algorithm, duration, throughput));
    }

    results.sort_by(|a, b| a.1.cmp(&b.1));
    results
}

//! # HashCalc - Concurrent, Cache-Aware File Digests
//!
//! HashCalc computes one or more digests per file in a single read pass,
//! remembers results keyed by path and algorithm, and can run the work
//! on a pool of worker threads while reporting live progress.
//!
//! ## Features
//!
//! - **Single-pass multi-algorithm hashing**: every requested algorithm
//!   sees the same bytes from one read of the file
//! - **Pluggable caches**: null, unbounded memory, or bounded LRU
//! - **Recalculation policies**: trust the cache by modification time,
//!   always recompute, or never recompute
//! - **Threaded calculator**: futures carrying status and a live
//!   progress controller with speed and ETA
//!
//! ## Quick Start
//!
//! ```no_run
//! use hashcalc::config::{CalculatorConfig, HashAlgorithm};
//! use hashcalc::core::Calculator;
//! use hashcalc::fs::LocalFile;
//!
//! let calculator = Calculator::new(CalculatorConfig::default());
//! let file = LocalFile::new("/data/archive.iso");
//!
//! let results = calculator
//!     .multiple_get(&file, &[HashAlgorithm::Sha256, HashAlgorithm::Md5])
//!     .unwrap();
//! for (algorithm, result) in &results {
//!     println!("{}  {}", algorithm, result.hash);
//! }
//! ```
//!
//! ## Background Hashing
//!
//! ```no_run
//! use hashcalc::config::CalculatorConfig;
//! use hashcalc::core::ThreadedCalculator;
//! use hashcalc::fs::LocalFile;
//!
//! let calculator = ThreadedCalculator::new(CalculatorConfig {
//!     threads: 8,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let future = calculator
//!     .threaded_get(LocalFile::new("/data/big.bin"), None)
//!     .unwrap();
//! println!("{:.1}% done", future.progress().percent());
//! println!("{}", future.wait().unwrap().hash);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod hash;
pub mod progress;

// Re-export commonly used types
pub use cache::{CacheKey, CacheManager};
pub use config::{CalculatorConfig, HashAlgorithm, RecalcMode};
pub use core::{Calculator, ThreadedCalculator};
pub use error::{HashCalcError, Result};
pub use hash::{HashResult, MultipleHashResult};
pub use progress::{FutureWithProgress, ProgressController, TaskStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use hashcalc::prelude::*;
    //! ```

    pub use crate::cache::{CacheKey, CacheManager, LruHashCache, MemoryCache, NullCache};
    pub use crate::config::{CalculatorConfig, HashAlgorithm, RecalcMode};
    pub use crate::core::{Calculator, ThreadedCalculator};
    pub use crate::error::{HashCalcError, Result};
    pub use crate::fs::{HashSource, LocalFile};
    pub use crate::hash::{file_hash, multiple_file_hash, HashResult, MultipleHashResult};
    pub use crate::progress::{FutureWithProgress, ProgressController, TaskStatus};
}

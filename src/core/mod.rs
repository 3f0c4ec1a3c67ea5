//! Core calculation engine module
//!
//! Provides the cache-aware synchronous calculator, the threaded
//! calculator built on top of it, and the worker pool both share.

mod calculator;
mod pool;
mod threaded;

pub use calculator::*;
pub use pool::WorkerPool;
pub use threaded::*;

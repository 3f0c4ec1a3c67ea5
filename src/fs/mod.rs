//! File system module
//!
//! Provides the file abstraction the calculators hash and the input
//! expansion used by the command line.

mod source;
mod walker;

pub use source::*;
pub use walker::*;

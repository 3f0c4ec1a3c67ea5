//! Configuration module for HashCalc
//!
//! Provides configuration management including CLI arguments,
//! algorithm selection, calculator settings, and the grouping of
//! command-line inputs into hash tasks.

mod groups;
mod settings;

pub use groups::*;
pub use settings::*;

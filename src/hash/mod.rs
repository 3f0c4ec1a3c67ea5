//! Digest computation module
//!
//! Computes any number of digests of a file in one read pass, buffering
//! small files and streaming large ones.

mod calculate;
mod hasher;

pub use calculate::*;
pub use hasher::*;

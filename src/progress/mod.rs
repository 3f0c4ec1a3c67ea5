//! Progress tracking module
//!
//! Provides the progress controller shared between a hashing task and
//! its observers, the future type that pairs a task's eventual result
//! with that progress, and the terminal display built on top of both.

mod controller;
mod future;
mod reporter;

pub use controller::*;
pub use future::*;
pub use reporter::*;

//! Error types for HashCalc
//!
//! This module defines all error types used throughout the crate,
//! providing detailed error information for debugging and user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for HashCalc operations
#[derive(Error, Debug)]
pub enum HashCalcError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A directory was given where a file was expected
    #[error("'{0}' is a directory (use --recursive to hash its contents)")]
    IsADirectory(PathBuf),

    /// One or more hash algorithms are not supported
    #[error("Unsupported hash algorithm(s): {}", .0.join(", "))]
    UnsupportedAlgorithms(Vec<String>),

    /// Recalculation mode value is not recognized
    #[error("Invalid recalculation mode: {0}")]
    InvalidRecalcMode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// A worker panicked while running a task
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// Task was cancelled before a result was produced
    #[error("Operation cancelled")]
    Cancelled,

    /// Result serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Multiple errors occurred
    #[error("Multiple errors occurred ({count} errors)")]
    MultipleErrors {
        count: usize,
        errors: Vec<HashCalcError>,
    },
}

impl HashCalcError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error reports a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::NotFound(path) | Self::IsADirectory(path) => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for HashCalc operations
pub type Result<T> = std::result::Result<T, HashCalcError>;

impl From<std::io::Error> for HashCalcError {
    fn from(err: std::io::Error) -> Self {
        HashCalcError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for HashCalcError {
    fn from(err: serde_json::Error) -> Self {
        HashCalcError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| HashCalcError::io(path, e))
    }
}

/// Collects multiple results into a single result
pub fn collect_errors<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => errors.push(e),
        }
    }

    match errors.len() {
        0 => Ok(successes),
        1 => Err(errors.remove(0)),
        count => Err(HashCalcError::MultipleErrors { count, errors }),
    }
}

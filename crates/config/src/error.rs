//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The configuration file exists but could not be read.
    #[display("could not read configuration file: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The configuration document does not have the expected shape.
    #[display("invalid configuration document: {_0}")]
    InvalidDocument(#[error(not(source))] String),
    /// Tool settings could not be resolved from their sources.
    #[display("invalid settings: {_0}")]
    InvalidSettings(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

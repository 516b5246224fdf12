//! Generator Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures deep inside a group are
//! raised under a frame naming that group, so the rendered tree reads from
//! "which group" down to "which pattern" and finally the root cause.

use derive_more::{Display, Error};

/// A generator error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a generator failure.
///
/// ### Configuration Errors
/// - [`ErrorKind::Config`]
/// - [`ErrorKind::InvalidDuration`]
/// - [`ErrorKind::InvalidGlob`]
///
/// ### Collaborator Errors
/// - [`ErrorKind::Listing`]
/// - [`ErrorKind::Hashing`]
///
/// ### Context Frames
/// - [`ErrorKind::AssetGroup`], [`ErrorKind::DataGroup`] and
///   [`ErrorKind::NavigationUrl`] wrap one of the above.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deprecated or unsupported configuration shape.
    #[display("invalid configuration: {_0}")]
    Config(#[error(not(source))] String),
    /// Malformed duration text or unknown unit suffix.
    #[display("invalid duration: {_0:?}")]
    InvalidDuration(#[error(not(source))] String),
    /// Malformed glob pattern.
    #[display("invalid glob: {_0:?}")]
    InvalidGlob(#[error(not(source))] String),
    /// Something inside the named asset group is invalid.
    #[display("asset group '{_0}'")]
    AssetGroup(#[error(not(source))] String),
    /// Something inside the named data group is invalid.
    #[display("data group '{_0}'")]
    DataGroup(#[error(not(source))] String),
    /// The navigation URL pattern is invalid.
    #[display("navigation URL {_0:?}")]
    NavigationUrl(#[error(not(source))] String),
    /// The storage backend could not list the build output.
    #[display("failed to list files of storage backend '{_0}'")]
    Listing(#[error(not(source))] String),
    /// The storage backend could not hash a file.
    #[display("failed to hash file: {_0}")]
    Hashing(#[error(not(source))] String),
    /// The manifest could not be serialized.
    #[display("failed to serialize manifest")]
    Serialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Listing(_) | Self::Hashing(_))
    }
}

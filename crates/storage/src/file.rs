//! File metadata reported by storage backends.

use crate::error::Result;
use std::path::PathBuf;

/// File metadata returned by storage backends.
///
/// Only the information the generator needs to partition the build output is
/// carried here; content hashes are computed on demand through
/// [`StorageBackend::hash`](crate::StorageBackend::hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}
impl FileInfo {
    /// Create a new FileInfo from a listing operation.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self { path: path.into(), size }
    }

    /// Root-anchored, forward-slash separated form of [`path`](Self::path),
    /// e.g. `assets/logo.svg` becomes `/assets/logo.svg`. Fails for file
    /// names that are not valid UTF-8.
    pub fn url_path(&self) -> Result<String> {
        crate::path::to_url_path(&self.path)
    }
}

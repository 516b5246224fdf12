//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the capability interface
//! through which the manifest generator sees a build output tree: listing
//! every file, hashing file contents, and writing the finished manifest back.
//!

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use crate::file::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for build output storage.
///
/// All storage operations are asynchronous so that listing and hashing can be
/// backed by the local filesystem, an in-memory tree for tests, or remote
/// object storage without changes to the generator.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation. Root-anchored paths (`/main.js`) are accepted and
/// treated as root-relative.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use swgen_storage::{backend::StorageBackend, error::Result};
///
/// async fn hash_of_index(backend: &dyn StorageBackend) -> Result<String> {
///     backend.hash(Path::new("/index.html")).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List every file of the build output.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning. No ordering is guaranteed.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream metadata of every file of the build output.
    ///
    /// Yields results incrementally as a [`Stream`].
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use swgen_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    ///
    /// let mut files = backend.list_stream();
    /// while let Some(info) = files.try_next().await? {
    ///     println!("{}: {} bytes", info.url_path()?, info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Deterministic content hash of a file.
    ///
    /// The default implementation reads the whole file and returns the
    /// lowercase hex BLAKE3 digest of its contents. Backends that can hash
    /// without buffering (or that already store digests) should override it.
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn hash(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path).await?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Implementations should create parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}

//! Read-only storage backend.
//!
//! This module provides a storage backend implementation that wraps other
//! implementations and prevents write operations from executing, but
//! indicating success on return. Used for dry runs of the generator.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, FileInfo, StorageBackend, backend::FileInfoStream, error::Result};

/// Read-only storage backend.
///
/// Wraps another backend and silently drops all write operations, logging an
/// [`info event`](tracing::Event). Listing and hashing are delegated.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        self.inner.list_stream()
    }

    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.inner.list().await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn hash(&self, path: &Path) -> Result<String> {
        self.inner.hash(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(path = %path.display(), bytes = data.len(), "Skipping write during read-only mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_writes_are_dropped() {
        let inner: BackendHandle = Arc::new(MockBackend::with_files([("index.html", b"<html>")]));
        let backend = ReadOnlyBackend::new(inner.clone());
        backend.write(Path::new("ngsw.json"), b"{}").await.unwrap();
        assert!(inner.read(Path::new("ngsw.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_reads_are_delegated() {
        let inner: BackendHandle = Arc::new(MockBackend::with_files([("index.html", b"<html>")]));
        let backend = ReadOnlyBackend::new(inner.clone());
        assert_eq!(backend.list().await.unwrap().len(), 1);
        assert_eq!(
            backend.hash(Path::new("index.html")).await.unwrap(),
            inner.hash(Path::new("index.html")).await.unwrap()
        );
    }
}

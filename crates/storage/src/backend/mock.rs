//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::StorageBackend;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. On top of plain
/// storage the mock records how it was used (listing calls, hash calls in
/// issue order, peak number of concurrent hash calls) and can be told to fail
/// specific operations.
///
/// # Examples
///
/// Requires the `mock` feature.
///
/// ```ignore
/// use swgen_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("index.html", b"<html>...</html>"),
/// ]);
/// assert_eq!(backend.list().await?.len(), 1);
/// assert_eq!(backend.hash(Path::new("/index.html")).await?.len(), 64);
/// assert_eq!(backend.hash_calls(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
    failing_hashes: HashSet<PathBuf>,
    failing_list: bool,
    list_calls: AtomicUsize,
    hashed: Mutex<Vec<PathBuf>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use swgen_storage::backend::MockBackend;
    ///
    /// let backend = MockBackend::with_files([
    ///     ("index.html", b"data file 1"),
    ///     ("assets/logo.svg", b"data file 2"),
    /// ]);
    /// ```
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failing_hashes: HashSet::new(),
            failing_list: false,
            list_calls: AtomicUsize::new(0),
            hashed: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make [`hash`](StorageBackend::hash) fail for the given path.
    ///
    /// Panics if the path fails validation.
    pub fn with_failing_hash(mut self, path: impl AsRef<Path>) -> Self {
        let Ok(validated) = validate_path(path.as_ref()) else {
            panic!("MockBackend::with_failing_hash: invalid path {}", path.as_ref().display());
        };
        self.failing_hashes.insert(validated);
        self
    }

    /// Make every listing fail.
    pub fn with_failing_list(mut self) -> Self {
        self.failing_list = true;
        self
    }

    /// Number of listings started so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of hash calls issued so far.
    pub fn hash_calls(&self) -> usize {
        self.hashed().len()
    }

    /// Paths passed to [`hash`](StorageBackend::hash), in issue order.
    pub fn hashed(&self) -> Vec<PathBuf> {
        self.hashed.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Highest number of hash calls that were in progress at the same time.
    pub fn peak_concurrent_hashes(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn file_info(&self, path: &Path, size: u64) -> FileInfo {
        FileInfo::new(path, size)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_list {
            let err = exn::Exn::from(ErrorKind::BackendError("listing failed".to_string()));
            return Box::pin(futures::stream::once(async { Err(err) }));
        }

        Box::pin(stream! {
            // Snapshot entries under the read lock, then drop it before
            // yielding to avoid holding the lock across yield points.
            let entries: Vec<(PathBuf, u64)> = {
                let guard = self.storage.read().await;
                guard.iter().map(|(path, data)| (path.clone(), data.len() as u64)).collect()
            };
            for (path, size) in entries {
                yield Ok(self.file_info(&path, size));
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let data =
            self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn hash(&self, path: &Path) -> Result<String> {
        let path = validate_path(path)?;
        if let Ok(mut hashed) = self.hashed.lock() {
            hashed.push(path.clone());
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        // Give sibling hash calls the chance to start before this one ends.
        tokio::task::yield_now().await;
        let result = match self.failing_hashes.contains(&path) {
            true => Err(exn::Exn::from(ErrorKind::BackendError(format!("hash failed: {}", path.display())))),
            false => self.read(&path).await.map(|data| blake3::hash(&data).to_hex().to_string()),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, data.to_vec());
        Ok(())
    }
}

//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for a build output
//! directory on the local filesystem. Files are accessed using `tokio::fs`
//! for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tokio::io::AsyncReadExt;

/// Read buffer size used while hashing file contents.
const HASH_CHUNK_BYTES: usize = 64 * 1024;

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// Serves files from a build output directory on the local filesystem. All
/// paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use swgen_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("dist", "/path/to/dist")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the build output
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or is not a directory, and [`NotFound`](ErrorKind::NotFound)
    /// if it does not exist. Build output is never created on demand.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if !root.exists() {
            exn::bail!(ErrorKind::NotFound(root));
        }
        if !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        if !absolute.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!(
                "attempting to get relative path of non-absolute path `{:?}`",
                absolute
            )))
        }
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        // Validate path will also canonicalize it.
        Ok(validate_path(relative)?)
    }

    fn metadata(path: &Path, metadata: Metadata) -> FileInfo {
        FileInfo::new(PathBuf::from(path), metadata.len())
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Classifies a single directory entry so the walk loop inside the
    /// stream only has to yield or push. Symlinks are followed; a link whose
    /// target does not exist is skipped.
    async fn process_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Skipping dangling symlink");
                return Ok(WalkEntry::Skip);
            },
            Err(err) => exn::bail!(Self::map_io_error(err, &path)),
        };
        let relative = self.relative_path(&path)?;
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)));
        }
        // Sockets, FIFOs and devices are not build output.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        // Each pending directory carries the canonical paths of the
        // directories above it, so a symlink pointing back up the tree is
        // not walked again. Aliases elsewhere in the tree are still listed.
        let mut stack: Vec<(PathBuf, Vec<PathBuf>)> = vec![(self.root.clone(), Vec::new())];

        Box::pin(stream! {
            'dirs: while let Some((current, mut ancestors)) = stack.pop() {
                let canonical = match fs::canonicalize(&current).await {
                    Ok(canonical) => canonical,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };
                if ancestors.contains(&canonical) {
                    tracing::warn!(path = %current.display(), "Skipping symlink cycle");
                    continue 'dirs;
                }
                ancestors.push(canonical);

                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push((d, ancestors.clone())),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn hash(&self, path: &Path) -> Result<String> {
        let abs_path = self.absolute_path(path)?;
        let mut file = fs::File::open(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; HASH_CHUNK_BYTES];
        loop {
            let read = file.read(&mut buffer).await.map_err(|e| Self::map_io_error(e, path))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("dist", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("dist", "relative/path").is_err());
        assert!(LocalBackend::new("dist", "./relative").is_err());
    }

    #[test]
    fn test_new_requires_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = LocalBackend::new("dist", &missing).err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(!missing.exists());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, b"data").unwrap();
        let err = LocalBackend::new("dist", &file).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("assets/logo.svg");
        assert_eq!(backend.absolute_path(Path::new("assets/logo.svg")).unwrap(), expected);
        assert_eq!(backend.absolute_path(Path::new("/assets/logo.svg")).unwrap(), expected);
        // Path traversal is prevented
        assert!(backend.absolute_path(Path::new("../etc/passwd")).is_err());
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        let abs = temp_dir.path().join("assets/logo.svg");
        assert_eq!(backend.relative_path(&abs).unwrap(), Path::new("assets/logo.svg"));
        // Path outside root fails
        let outside = PathBuf::from("/other/file.html");
        assert!(backend.relative_path(&outside).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        let data = b"Hello, world!";
        backend.write(Path::new("ngsw.json"), data).await.unwrap();
        let read_data = backend.read(Path::new("ngsw.json")).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        backend.write(Path::new("a/b/c/file.txt"), b"data").await.unwrap();
        assert!(temp_dir.path().join("a/b/c/file.txt").is_file());
    }

    #[tokio::test]
    async fn test_hash_matches_in_memory_digest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        // Larger than one read chunk to exercise the streaming loop.
        let data: Vec<u8> = (0..(HASH_CHUNK_BYTES * 2 + 17)).map(|i| (i % 251) as u8).collect();
        backend.write(Path::new("main.js"), &data).await.unwrap();
        let hash = backend.hash(Path::new("/main.js")).await.unwrap();
        assert_eq!(hash, blake3::hash(&data).to_hex().to_string());
        assert_eq!(hash.len(), 64);
    }

    #[tokio::test]
    async fn test_hash_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        let err = backend.hash(Path::new("missing.js")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        let files = backend.list().await.unwrap();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_list_returns_all_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        backend.write(Path::new("index.html"), b"data").await.unwrap();
        backend.write(Path::new("main.js"), b"data").await.unwrap();
        backend.write(Path::new("assets/logo.svg"), b"data").await.unwrap();
        backend.write(Path::new("assets/i18n/en.json"), b"data").await.unwrap();
        let mut urls: Vec<_> = backend.list().await.unwrap().iter().map(|f| f.url_path().unwrap()).collect();
        urls.sort();
        assert_eq!(urls, ["/assets/i18n/en.json", "/assets/logo.svg", "/index.html", "/main.js"]);
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        // Attempts to escape the root should fail
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.hash(Path::new("etc/../../passwd")).await.is_err());
        assert!(backend.write(Path::new("../etc/passwd"), b"data").await.is_err());
    }

    #[cfg(unix)]
    async fn listed_urls(backend: &LocalBackend) -> Vec<String> {
        let mut urls: Vec<_> = backend.list().await.unwrap().iter().map(|f| f.url_path().unwrap()).collect();
        urls.sort();
        urls
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_follows_symlinked_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (dist, shared) = (temp_dir.path().join("dist"), temp_dir.path().join("shared"));
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(dist.join("main.js"), b"main").unwrap();
        std::fs::write(shared.join("vendor.js"), b"vendor").unwrap();
        std::os::unix::fs::symlink(shared.join("vendor.js"), dist.join("vendor.js")).unwrap();

        let backend = LocalBackend::new("dist", &dist).unwrap();
        assert_eq!(listed_urls(&backend).await, ["/main.js", "/vendor.js"]);
        let files = backend.list().await.unwrap();
        let vendor = files.iter().find(|f| f.path == Path::new("vendor.js")).unwrap();
        assert_eq!(vendor.size, 6);
        assert_eq!(backend.hash(Path::new("/vendor.js")).await.unwrap(), blake3::hash(b"vendor").to_hex().to_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_follows_symlinked_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (dist, shared) = (temp_dir.path().join("dist"), temp_dir.path().join("shared"));
        std::fs::create_dir_all(dist.join("assets")).unwrap();
        std::fs::create_dir_all(shared.join("icons")).unwrap();
        std::fs::write(dist.join("assets/logo.svg"), b"<svg/>").unwrap();
        std::fs::write(shared.join("lib.js"), b"lib").unwrap();
        std::fs::write(shared.join("icons/star.svg"), b"<svg/>").unwrap();
        std::os::unix::fs::symlink(&shared, dist.join("lib")).unwrap();
        // Second name for a directory that is already part of the tree.
        std::os::unix::fs::symlink(dist.join("assets"), dist.join("static")).unwrap();

        let backend = LocalBackend::new("dist", &dist).unwrap();
        assert_eq!(
            listed_urls(&backend).await,
            ["/assets/logo.svg", "/lib/icons/star.svg", "/lib/lib.js", "/static/logo.svg"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_symlink_cycles() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dist = temp_dir.path().to_path_buf();
        std::fs::create_dir_all(dist.join("a/b")).unwrap();
        std::fs::write(dist.join("a/b/file.js"), b"data").unwrap();
        std::os::unix::fs::symlink(&dist, dist.join("a/b/root")).unwrap();
        std::os::unix::fs::symlink(dist.join("a"), dist.join("a/b/up")).unwrap();

        let backend = LocalBackend::new("dist", &dist).unwrap();
        assert_eq!(listed_urls(&backend).await, ["/a/b/file.js"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_dangling_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("dist", temp_dir.path()).unwrap();
        backend.write(Path::new("index.html"), b"data").await.unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("gone.js"), temp_dir.path().join("broken.js")).unwrap();
        assert_eq!(listed_urls(&backend).await, ["/index.html"]);
    }
}

//! Path validation and conversion utilities.
//!
//! This module provides functions to validate storage paths, preventing path
//! traversal out of the build output root, and to convert storage paths into
//! the root-anchored URL form used in manifests.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use swgen_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("assets/logo.svg").is_ok());
/// assert!(validate_path("/main.js").is_ok()); // (root-anchored URL form)
/// assert!(validate_path("a/../file.html").is_ok()); // (never leaves output root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err()); // (leaves output root)
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("wrong/../still-wrong/.././correct//./path.html/").unwrap(),
///     Path::new("correct/path.html")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    // Use Rust's built-in path component parser for robust handling. Means we
    // don't have to deal with non-UTF8, or the maniacs on Unix that use
    // backslashes in their filenames.
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            // Manifest URLs are root-anchored; treat them as root-relative.
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Converts a storage path into its root-anchored URL form.
///
/// Components are joined with `/` regardless of platform and the result always
/// starts with a single `/`. Current-directory components are dropped; no
/// traversal resolution happens here, so validate first when the input is
/// untrusted. Returns [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// for a path that is not valid UTF-8, since it has no URL form.
///
/// ```
/// use swgen_storage::to_url_path;
/// assert_eq!(to_url_path("assets/logo.svg").unwrap(), "/assets/logo.svg");
/// assert_eq!(to_url_path("./index.html").unwrap(), "/index.html");
/// ```
pub fn to_url_path(path: impl AsRef<Path>) -> Result<String> {
    let mut url = String::new();
    for component in path.as_ref().components() {
        if let Component::Normal(segment) = component {
            let Some(segment) = segment.to_str() else {
                exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
            };
            url.push('/');
            url.push_str(segment);
        }
    }
    if url.is_empty() {
        url.push('/');
    }
    Ok(url)
}

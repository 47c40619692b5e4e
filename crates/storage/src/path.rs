//! Keeping rendered paths inside the store root.
//!
//! Artifact paths come out of a user-supplied pattern and staging segments
//! come from callers, so neither is joined onto the root until [`validate`]
//! has normalized it.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a rendered artifact path or staging subpath so it can be
/// joined onto the store root.
///
/// `.` segments and repeated separators disappear and `..` cancels the
/// segment before it. A leading `/` is dropped rather than honoured, so the
/// result is always relative. Fails with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) when nothing is left,
/// when `..` would climb above the root, on a drive or UNC prefix, or on an
/// embedded NUL.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use depot_storage::validate_path;
///
/// assert_eq!(
///     validate_path("org.example//lib/./1.0/jar/").unwrap(),
///     Path::new("org.example/lib/1.0/jar")
/// );
/// assert!(validate_path("org.example/../../outside").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            // A NUL would silently cut the path short at the syscall.
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir => {
                if !normalized.pop() {
                    exn::bail!(invalid());
                }
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
        }
    }
    if normalized.as_os_str().is_empty() {
        exn::bail!(invalid());
    }
    Ok(normalized)
}

/// Joins caller-supplied segments into a validated relative path. Zero
/// segments produce an empty path (the directory the segments are relative
/// to).
pub(crate) fn join_segments<I, S>(segments: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let joined: PathBuf = segments.into_iter().collect();
    if joined.as_os_str().is_empty() {
        return Ok(joined);
    }
    validate(joined)
}

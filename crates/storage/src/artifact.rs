//! Snapshots of files already in the store.

use crate::error::{ErrorKind, Result};
use crate::hash::ContentHash;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Metadata of a stored artifact file, read once at construction.
///
/// Nothing is refreshed afterwards: if the file changes on disk, the
/// descriptor is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// Absolute path the snapshot was taken from
    origin: PathBuf,
    /// SHA-1 of the file content
    sha1: ContentHash,
    /// File size in bytes
    content_length: u64,
    /// Last modified timestamp
    last_modified: OffsetDateTime,
}

impl CachedArtifact {
    /// Snapshot the file at `path`, hashing its full contents.
    ///
    /// # Errors
    /// [`NotFound`](ErrorKind::NotFound) if the path doesn't exist or isn't a
    /// regular file; other I/O failures carry the path.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let origin = path.into();
        let metadata = fs::metadata(&origin).map_err(|e| ErrorKind::io(e, &origin))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotFound(origin));
        }
        let last_modified = metadata.modified().map_err(|e| ErrorKind::io(e, &origin))?.into();
        let sha1 = ContentHash::of_file(&origin)?;
        Ok(Self {
            origin,
            sha1,
            content_length: metadata.len(),
            last_modified,
        })
    }

    pub fn sha1(&self) -> &ContentHash {
        &self.sha1
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn last_modified(&self) -> OffsetDateTime {
        self.last_modified
    }

    /// Whether this artifact's content matches an externally known hash.
    pub fn matches(&self, hash: &ContentHash) -> bool {
        &self.sha1 == hash
    }
}

//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Underlying [`std::io::Error`]s and
//! pattern errors are kept as children in the tree; the top-level kind always
//! names the path (or input) that was being worked on.

use derive_more::{Display, Error};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The artifact pattern is unusable, or couldn't be rendered for a
    /// coordinate. A setup bug: fix the configuration, don't retry.
    #[display("unusable store pattern: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A coordinate field is empty or contains characters that can't appear
    /// in a single path segment.
    #[display("invalid coordinate: {_0}")]
    InvalidCoordinate(#[error(not(source))] String),
    /// Text that was supposed to be a hex-encoded content hash.
    #[display("invalid content hash: {_0}")]
    InvalidHash(#[error(not(source))] String),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// File does not exist (or isn't a regular file)
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// File already exists (for operations that require new files)
    #[display("file already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Underlying I/O error while working on the given path
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// A staged file could not be relocated to the given destination. The
    /// staged file may or may not still exist.
    #[display("failed to publish artifact into store: {}", _0.display())]
    Publish(#[error(not(source))] PathBuf),
    /// A blocking task backing an async operation panicked or was cancelled.
    #[display("background task failed")]
    Background,
}

impl ErrorKind {
    /// Map an [`IoError`] encountered on `path` to the most specific kind,
    /// keeping the original error as a child frame.
    #[track_caller]
    pub(crate) fn io(err: IoError, path: impl Into<PathBuf>) -> Error {
        let path = path.into();
        let kind = match err.kind() {
            IoErrorKind::NotFound => ErrorKind::NotFound(path),
            IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path),
            IoErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path),
            _ => ErrorKind::Io(path),
        };
        exn::Exn::from(err).raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Publish(_) | Self::Background)
    }
}

//! Pattern Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Syntax errors carry the byte offset into the pattern
//! source where parsing gave up.

use derive_more::{Display, Error};

/// A pattern error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pattern operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is a configuration problem: either the pattern text is
/// malformed, or the token source handed to the renderer cannot satisfy it.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `[` was never closed.
    #[display("unterminated token starting at offset {_0}")]
    UnterminatedToken(#[error(not(source))] usize),
    /// A token was written as `[]`.
    #[display("empty token name at offset {_0}")]
    EmptyToken(#[error(not(source))] usize),
    /// A `(` appeared inside an optional group, or a group delimiter
    /// appeared inside a token.
    #[display("nested group at offset {_0}")]
    NestedGroup(#[error(not(source))] usize),
    /// A `)` appeared without a matching `(`.
    #[display("unbalanced group close at offset {_0}")]
    UnbalancedGroup(#[error(not(source))] usize),
    /// A `(` was never closed.
    #[display("unterminated group starting at offset {_0}")]
    UnterminatedGroup(#[error(not(source))] usize),
    /// Literal text passed to [`replace_token`](crate::PathPattern::replace_token)
    /// contains pattern syntax.
    #[display("replacement contains pattern syntax: {_0}")]
    InvalidReplacement(#[error(not(source))] String),
    /// A required token (outside any optional group) had no value.
    #[display("missing value for required token [{_0}]")]
    MissingToken(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The same pattern and the same tokens always fail the same way.
        false
    }
}

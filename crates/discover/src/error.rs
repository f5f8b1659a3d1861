//! Discovery Error Types
//!
//! Nothing here reaches the caller of a discovery pass: providers log these
//! and contribute no workspaces instead.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A discovery error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source exists but could not be read (locked, permission denied).
    #[display("unable to read {}", _0.display())]
    Unavailable(#[error(not(source))] PathBuf),
    /// The source was read but isn't in the expected format.
    #[display("malformed source {}", _0.display())]
    Malformed(#[error(not(source))] PathBuf),
    /// An executable was found but could not be started.
    #[display("unable to start {}", _0.display())]
    Launch(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Editors hold their state files open while writing them.
        matches!(self, Self::Unavailable(_) | Self::Malformed(_))
    }
}

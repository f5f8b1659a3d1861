//! Hive Error Types
//!
//! Structured errors using `exn` for automatic location tracking. None of
//! these escape a scan: [`HiveScanner`](crate::HiveScanner) logs them and
//! skips the branch that failed.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A hive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file could not be loaded as an application hive (missing, locked
    /// by the owning tool, not a hive, or hives are unsupported here).
    #[display("unable to load hive {} (status {status})", path.display())]
    Load { path: PathBuf, status: u32 },
    /// A subkey could not be opened.
    #[display("unable to open registry key: {_0}")]
    Open(#[error(not(source))] String),
    /// Subkeys or values of an opened key could not be listed.
    #[display("unable to enumerate registry key")]
    Enumerate,
    /// A companion settings file could not be read.
    #[display("unable to read settings file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A hive locked by a running IDE becomes loadable once it exits.
        matches!(self, Self::Load { .. } | Self::Read(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Load { path: PathBuf::from("privateregistry.bin"), status: 32 }.is_retryable());
        assert!(ErrorKind::Read(PathBuf::from("ApplicationPrivateSettings.xml")).is_retryable());
        assert!(!ErrorKind::Open("Software".to_string()).is_retryable());
        assert!(!ErrorKind::Enumerate.is_retryable());
    }
}

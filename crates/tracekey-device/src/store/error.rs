//! Store error types.
//!
//! Defines errors that can occur while persisting the secret key:
//! - `Io`: Underlying file system errors
//! - `Corrupt`: The stored record cannot be decoded
//! - `UnsupportedVersion`: The record was written by a newer format
//! - `Poisoned`: A thread panicked while holding the store lock

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// I/O error (file system)
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored record could not be decoded
    #[error("corrupt identity record: {reason}")]
    Corrupt {
        /// What failed to decode
        reason: String,
    },

    /// Record format this build cannot read
    #[error("unsupported identity record version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the record
        found: u32,
        /// Version this build writes
        supported: u32,
    },

    /// Store lock poisoned by a panicking thread
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Returns true if retrying the operation cannot help.
    ///
    /// I/O errors may be transient (full disk, locked file). Everything else
    /// needs the record replaced.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_retryable() {
        let err = StoreError::from(std::io::Error::other("disk full"));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "I/O error: disk full");
    }

    #[test]
    fn version_mismatch_is_fatal() {
        let err = StoreError::UnsupportedVersion { found: 9, supported: 1 };
        assert!(err.is_fatal());
    }
}

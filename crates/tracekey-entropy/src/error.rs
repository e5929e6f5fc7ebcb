//! Error types for entropy sources

use thiserror::Error;

use crate::provision::EntropyKind;

/// Errors from entropy source construction and use.
///
/// Exhaustion of the OS pool is not represented here: blocking sources
/// suspend the caller until entropy is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntropyError {
    /// No entropy source could be constructed, not even the fallback
    #[error("entropy unavailable: {reason}")]
    Unavailable {
        /// Why the last attempt failed
        reason: String,
    },

    /// A source could not draw its seed material
    #[error("failed to seed {kind} source: {reason}")]
    SeedFailed {
        /// The source being seeded
        kind: EntropyKind,
        /// Underlying failure
        reason: String,
    },

    /// A thread panicked while holding the source's internal state
    #[error("entropy source state poisoned")]
    Poisoned,

    /// Configuration named a source that does not exist
    #[error("unknown entropy source: {name}")]
    UnknownKind {
        /// The name that failed to parse
        name: String,
    },
}

impl EntropyError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Seed failures are recoverable by falling back to another source.
    /// Everything else means no usable randomness remains.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Poisoned => true,

            Self::SeedFailed { .. } => false,
            Self::UnknownKind { .. } => false,
        }
    }
}

//! Error types for key derivation

use thiserror::Error;
use tracekey_entropy::EntropyError;

/// Malformed input to a hash-chain primitive.
///
/// Primitives fail fast rather than pad or clip: a plausible but wrong key
/// would silently corrupt every key derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Operation applied to empty key material
    #[error("{operation} on empty key material")]
    Empty {
        /// The primitive that was called
        operation: &'static str,
    },

    /// XOR of keys with different lengths
    #[error("xor of mismatched key lengths: {left} and {right}")]
    LengthMismatch {
        /// Length of the left operand
        left: usize,
        /// Length of the right operand
        right: usize,
    },

    /// Truncation target that would not discard anything, or nothing would
    /// remain
    #[error("cannot truncate {key_len}-byte key to {length} bytes")]
    TruncateLength {
        /// Requested length
        length: usize,
        /// Length of the key being truncated
        key_len: usize,
    },
}

/// Errors from the key schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Instant falls on a day with no matching key
    #[error("day {day} outside schedule range 0..={max}")]
    DayOutOfRange {
        /// Day offset from epoch (negative before epoch)
        day: i64,
        /// Last day the schedule covers
        max: u32,
    },

    /// Period index with no contact key
    #[error("period {period} outside schedule range 0..={max}")]
    PeriodOutOfRange {
        /// Requested period
        period: i64,
        /// Last period the schedule covers
        max: u32,
    },

    /// Validated index applied to a key array of a different size
    #[error("index {index} outside key array of {len} slots")]
    IndexOutOfRange {
        /// Slot requested
        index: usize,
        /// Slots available
        len: usize,
    },

    /// Secret key material of the wrong size
    #[error("invalid secret key length: expected {expected}, got {actual}")]
    SecretKeyLength {
        /// Required length
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Schedule parameters that cannot produce a valid key hierarchy
    #[error("invalid schedule config: {reason}")]
    InvalidConfig {
        /// What is wrong
        reason: String,
    },

    /// A primitive rejected its input
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),

    /// The entropy source failed during secret key generation
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl ScheduleError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Fatal errors cannot be fixed by retrying at this layer. Entropy
    /// errors defer to the entropy classification.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::DayOutOfRange { .. } => true,
            Self::PeriodOutOfRange { .. } => true,
            Self::IndexOutOfRange { .. } => true,
            Self::SecretKeyLength { .. } => true,
            Self::InvalidConfig { .. } => true,
            Self::Primitive(_) => true,

            Self::Entropy(e) => e.is_fatal(),
        }
    }

    /// Returns true if the schedule has run past its last day.
    ///
    /// The identity must be re-provisioned with a new secret key. Instants
    /// before epoch indicate a wrong clock instead and return false.
    pub fn requires_new_secret(&self) -> bool {
        matches!(self, Self::DayOutOfRange { day, .. } if *day >= 0)
    }
}

//! Device error types

use thiserror::Error;
use tracekey_crypto::ScheduleError;
use tracekey_entropy::EntropyError;

use crate::store::StoreError;

/// Errors from the device identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The store holds no identity
    #[error("device has no secret key; provision one first")]
    NotProvisioned,

    /// Persisting or loading the identity failed
    #[error("identity store error: {0}")]
    Store(#[from] StoreError),

    /// Key derivation or time mapping failed
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// No usable entropy source
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl DeviceError {
    /// Returns true if this error is fatal (unrecoverable)
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::NotProvisioned => false,
            Self::Store(e) => e.is_fatal(),
            Self::Schedule(e) => e.is_fatal(),
            Self::Entropy(e) => e.is_fatal(),
        }
    }

    /// Returns true if the identity has expired and must be rotated.
    pub fn requires_new_secret(&self) -> bool {
        match self {
            Self::NotProvisioned => true,
            Self::Schedule(e) => e.requires_new_secret(),
            Self::Store(_) | Self::Entropy(_) => false,
        }
    }
}

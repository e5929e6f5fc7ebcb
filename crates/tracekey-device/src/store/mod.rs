//! Persistence for the device secret key.
//!
//! The secret key is the only long-lived secret of a device: every matching
//! key, contact key and identifier is re-derived from it. The trait is
//! synchronous; a store holds at most one identity.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
use tracekey_crypto::SecretKey;
use tracekey_entropy::EntropyKind;

/// A provisioned identity as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIdentity {
    /// Root secret of the key schedule
    pub secret_key: SecretKey,
    /// Unix timestamp (seconds) when the secret key was drawn
    pub created_at_secs: i64,
    /// Source the secret key was drawn from
    pub entropy_kind: EntropyKind,
}

/// Storage for the device identity.
///
/// Implementations must be `Send + Sync`; callers serialize writes
/// themselves (one identity per device).
pub trait SecretKeyStore: Send + Sync {
    /// Load the stored identity.
    ///
    /// Returns `None` if the device was never provisioned (or was cleared).
    fn load(&self) -> Result<Option<StoredIdentity>, StoreError>;

    /// Persist `identity`, replacing any previous one.
    ///
    /// # Invariants
    ///
    /// - Post: a subsequent `load` returns `identity`, or the previous
    ///   identity if this call failed. Never a mix of both.
    fn save(&self, identity: &StoredIdentity) -> Result<(), StoreError>;

    /// Remove the stored identity. Idempotent.
    fn clear(&self) -> Result<(), StoreError>;
}

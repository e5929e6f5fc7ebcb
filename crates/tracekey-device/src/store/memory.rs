#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex};

use super::{SecretKeyStore, StoreError, StoredIdentity};

/// In-memory store for tests and ephemeral identities.
///
/// Clones share the same slot, so a test can keep a handle and inspect what
/// the identity persisted. Lock poisoning is reported as
/// [`StoreError::Poisoned`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Option<StoredIdentity>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `identity`
    pub fn with_identity(identity: StoredIdentity) -> Self {
        Self { inner: Arc::new(Mutex::new(Some(identity))) }
    }
}

impl SecretKeyStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredIdentity>, StoreError> {
        let slot = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, identity: &StoredIdentity) -> Result<(), StoreError> {
        let mut slot = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

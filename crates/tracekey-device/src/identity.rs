//! The device identity: one secret key and the keys derived from it.
//!
//! Matching keys for the whole schedule are expanded once, when the identity
//! is opened, and the secret key is dropped right after. Contact keys are
//! expanded for one day at a time and replaced wholesale when the day
//! changes.

use std::{sync::Arc, time::SystemTime};

use tracekey_crypto::{
    ContactIdentifier, ContactKeys, DayIndex, KeySchedule, MatchingKey, MatchingKeys,
    PeriodIndex,
};
use tracekey_entropy::{EntropyKind, EntropySource};

use crate::{
    clock::Clock,
    error::DeviceError,
    store::{SecretKeyStore, StoredIdentity},
};

/// The identifier to broadcast at an instant, with its position in the
/// schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentIdentifier {
    /// Day since epoch
    pub day: DayIndex,
    /// Period within the day
    pub period: PeriodIndex,
    /// Value to broadcast
    pub identifier: ContactIdentifier,
}

/// Contact keys of one day.
struct DayKeys {
    day: DayIndex,
    contacts: Arc<ContactKeys>,
}

/// A provisioned device.
pub struct DeviceIdentity<S: SecretKeyStore, C: Clock> {
    store: S,
    clock: C,
    schedule: KeySchedule,
    created_at_secs: i64,
    entropy_kind: EntropyKind,
    matching: Arc<MatchingKeys>,
    today: Option<DayKeys>,
}

impl<S: SecretKeyStore, C: Clock> DeviceIdentity<S, C> {
    /// Load the stored identity, or provision and persist a new one.
    ///
    /// Provisioning draws the secret key from `source`, which may block.
    pub fn open(
        store: S,
        clock: C,
        schedule: KeySchedule,
        source: &EntropySource,
    ) -> Result<Self, DeviceError> {
        let stored = match store.load()? {
            Some(stored) => stored,
            None => provision(&store, &clock, &schedule, source)?,
        };
        Self::from_stored(store, clock, schedule, stored)
    }

    /// Load the stored identity.
    ///
    /// # Errors
    ///
    /// - `DeviceError::NotProvisioned` if the store is empty
    pub fn load(store: S, clock: C, schedule: KeySchedule) -> Result<Self, DeviceError> {
        let stored = store.load()?.ok_or(DeviceError::NotProvisioned)?;
        Self::from_stored(store, clock, schedule, stored)
    }

    fn from_stored(
        store: S,
        clock: C,
        schedule: KeySchedule,
        stored: StoredIdentity,
    ) -> Result<Self, DeviceError> {
        let matching = schedule.matching_keys(&stored.secret_key)?;

        Ok(Self {
            store,
            clock,
            schedule,
            created_at_secs: stored.created_at_secs,
            entropy_kind: stored.entropy_kind,
            matching: Arc::new(matching),
            today: None,
        })
    }

    /// Replace the secret key with a fresh one from `source`.
    ///
    /// The new key is persisted before any cache is replaced, so a failed
    /// save leaves the identity unchanged.
    pub fn rotate(&mut self, source: &EntropySource) -> Result<(), DeviceError> {
        let stored = provision(&self.store, &self.clock, &self.schedule, source)?;
        let matching = self.schedule.matching_keys(&stored.secret_key)?;

        self.created_at_secs = stored.created_at_secs;
        self.entropy_kind = stored.entropy_kind;
        self.matching = Arc::new(matching);
        self.today = None;
        Ok(())
    }

    /// Identifier to broadcast now.
    pub fn contact_identifier(&mut self) -> Result<CurrentIdentifier, DeviceError> {
        let now = self.clock.now();
        self.contact_identifier_at(now)
    }

    /// Identifier to broadcast at `time`.
    ///
    /// # Errors
    ///
    /// - `DeviceError::Schedule` if `time` is outside the schedule. Check
    ///   [`DeviceError::requires_new_secret`] to tell expiry from a clock set
    ///   before epoch.
    pub fn contact_identifier_at(
        &mut self,
        time: SystemTime,
    ) -> Result<CurrentIdentifier, DeviceError> {
        let day = self.schedule.day(time)?;
        let period = self.schedule.period(time)?;

        let contacts = self.contact_keys(day)?;
        let identifier = self.schedule.contact_identifier(contacts.get(period)?)?;

        Ok(CurrentIdentifier { day, period, identifier })
    }

    /// Matching key for `day`, to disclose to the coordinating party.
    pub fn matching_key(&self, day: i64) -> Result<MatchingKey, DeviceError> {
        let day = self.schedule.day_index(day)?;
        Ok(self.matching.get(day)?.clone())
    }

    /// Every matching key of this identity.
    pub fn matching_keys(&self) -> Arc<MatchingKeys> {
        Arc::clone(&self.matching)
    }

    /// The schedule this identity derives keys with.
    pub fn schedule(&self) -> &KeySchedule {
        &self.schedule
    }

    /// Unix timestamp (seconds) when the current secret key was drawn.
    pub fn created_at_secs(&self) -> i64 {
        self.created_at_secs
    }

    /// Source the current secret key was drawn from.
    pub fn entropy_kind(&self) -> EntropyKind {
        self.entropy_kind
    }

    fn contact_keys(&mut self, day: DayIndex) -> Result<Arc<ContactKeys>, DeviceError> {
        if let Some(today) = &self.today
            && today.day == day
        {
            return Ok(Arc::clone(&today.contacts));
        }

        let contacts = Arc::new(self.schedule.contact_keys(self.matching.get(day)?)?);
        tracing::debug!(day = %day, "Refreshed contact keys");
        self.today = Some(DayKeys { day, contacts: Arc::clone(&contacts) });
        Ok(contacts)
    }
}

fn provision<S: SecretKeyStore, C: Clock>(
    store: &S,
    clock: &C,
    schedule: &KeySchedule,
    source: &EntropySource,
) -> Result<StoredIdentity, DeviceError> {
    let stored = StoredIdentity {
        secret_key: schedule.secret_key(source)?,
        created_at_secs: clock.unix_secs(),
        entropy_kind: source.kind(),
    };
    store.save(&stored)?;

    tracing::info!(
        entropy = %stored.entropy_kind,
        created_at_secs = stored.created_at_secs,
        "Provisioned new secret key"
    );
    Ok(stored)
}

//! Property-based tests for the device identity
//!
//! These tests verify that the cached path agrees with direct derivation:
//!
//! 1. **Consistency**: the identifier at any instant equals the one derived
//!    straight from the schedule
//! 2. **Cache order**: querying instants in any order gives the same answers
//! 3. **Expiry**: every instant past the last day requires a new secret

use proptest::prelude::*;
use tracekey_crypto::{
    DEFAULT_EPOCH_SECS, KeySchedule, SECONDS_PER_DAY, SECRET_KEY_LEN, ScheduleConfig, SecretKey,
};
use tracekey_device::{DeviceIdentity, FixedClock, MemoryStore, StoredIdentity};
use tracekey_entropy::EntropyKind;

const DAYS: u32 = 6;

fn schedule() -> KeySchedule {
    KeySchedule::new(ScheduleConfig { days: DAYS, ..ScheduleConfig::default() }).unwrap()
}

fn stored(fill: u8) -> StoredIdentity {
    StoredIdentity {
        secret_key: SecretKey::from_bytes(vec![fill; SECRET_KEY_LEN]),
        created_at_secs: DEFAULT_EPOCH_SECS,
        entropy_kind: EntropyKind::Secure,
    }
}

/// Instants inside the schedule.
fn instant() -> impl Strategy<Value = i64> {
    (0..=i64::from(DAYS) * SECONDS_PER_DAY + SECONDS_PER_DAY - 1)
        .prop_map(|offset| DEFAULT_EPOCH_SECS + offset)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_identifier_matches_direct_derivation(fill in any::<u8>(), secs in instant()) {
        let schedule = schedule();
        let store = MemoryStore::with_identity(stored(fill));
        let mut identity =
            DeviceIdentity::load(store, FixedClock::at_secs(secs), schedule).unwrap();

        let current = identity.contact_identifier().unwrap();

        let secret = schedule.import_secret_key(vec![fill; SECRET_KEY_LEN]).unwrap();
        let matching = schedule.matching_keys(&secret).unwrap();
        let day = schedule.day_at_secs(secs).unwrap();
        let period = schedule.period_at_secs(secs).unwrap();
        let contacts = schedule.contact_keys(matching.get(day).unwrap()).unwrap();
        let expected = schedule.contact_identifier(contacts.get(period).unwrap()).unwrap();

        prop_assert_eq!(current.day, day);
        prop_assert_eq!(current.period, period);
        prop_assert_eq!(current.identifier, expected);
    }

    #[test]
    fn prop_query_order_does_not_matter(
        instants in prop::collection::vec(instant(), 1..12),
    ) {
        let clock = FixedClock::at_secs(DEFAULT_EPOCH_SECS);
        let mut forward =
            DeviceIdentity::load(MemoryStore::with_identity(stored(7)), clock.clone(), schedule())
                .unwrap();
        let mut backward =
            DeviceIdentity::load(MemoryStore::with_identity(stored(7)), clock.clone(), schedule())
                .unwrap();

        let mut seen = Vec::new();
        for &secs in &instants {
            clock.set_secs(secs);
            seen.push(forward.contact_identifier().unwrap());
        }
        for (&secs, expected) in instants.iter().zip(&seen).rev() {
            clock.set_secs(secs);
            prop_assert_eq!(&backward.contact_identifier().unwrap(), expected);
        }
    }

    #[test]
    fn prop_past_schedule_requires_new_secret(extra in 0i64..10 * SECONDS_PER_DAY) {
        let secs = DEFAULT_EPOCH_SECS + i64::from(DAYS + 1) * SECONDS_PER_DAY + extra;
        let store = MemoryStore::with_identity(stored(1));
        let mut identity =
            DeviceIdentity::load(store, FixedClock::at_secs(secs), schedule()).unwrap();

        let err = identity.contact_identifier().unwrap_err();
        prop_assert!(err.requires_new_secret());
    }
}

//! Property-based tests for the key schedule
//!
//! These tests verify the invariants every derivation must hold:
//!
//! 1. **Determinism**: the same key always expands to the same keys
//! 2. **Forward secrecy**: truncation always discards material
//! 3. **Identifier size**: every identifier is exactly 16 bytes
//! 4. **Time mapping**: day and period agree with the seconds they came from
//! 5. **Fail fast**: malformed primitive input is rejected, never repaired

use proptest::prelude::*;
use tracekey_crypto::{
    CONTACT_IDENTIFIER_LEN, ContactKey, HASH_LEN, KeySchedule, MatchingKey, MatchingKeySeed,
    PrimitiveError, SECONDS_PER_DAY, SECRET_KEY_LEN, ScheduleConfig, ScheduleError, truncate,
    truncate_to, xor,
};

fn short_schedule(days: u32, periods: u32) -> KeySchedule {
    KeySchedule::new(ScheduleConfig { days, periods, ..ScheduleConfig::default() }).unwrap()
}

/// Period counts that divide a day evenly.
fn period_count() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![1u32, 2, 24, 96, 144, 240, 288, 1440])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_contact_keys_deterministic(
        bytes in prop::collection::vec(any::<u8>(), HASH_LEN),
        periods in period_count(),
    ) {
        let schedule = short_schedule(1, periods);
        let matching = MatchingKey::from_bytes(bytes);

        let first = schedule.contact_keys(&matching).unwrap();
        let second = schedule.contact_keys(&matching).unwrap();

        prop_assert_eq!(first.len(), periods as usize + 1);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_matching_keys_deterministic(
        fill in any::<u8>(),
        days in 1u32..50,
    ) {
        let schedule = short_schedule(days, 240);
        let secret = schedule.import_secret_key(vec![fill; SECRET_KEY_LEN]).unwrap();

        let first = schedule.matching_keys(&secret).unwrap();
        let second = schedule.matching_keys(&secret).unwrap();

        prop_assert_eq!(first.len(), days as usize + 1);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_truncate_always_shortens(bytes in prop::collection::vec(any::<u8>(), 2..256)) {
        let seed = MatchingKeySeed::from_bytes(bytes.clone());
        let truncated = truncate(&seed).unwrap();

        prop_assert!(truncated.len() < seed.len());
        prop_assert_eq!(truncated.as_bytes(), &bytes[..bytes.len() / 2]);
    }

    #[test]
    fn prop_truncate_to_bounds(
        bytes in prop::collection::vec(any::<u8>(), 1..64),
        length in 0usize..80,
    ) {
        let seed = MatchingKeySeed::from_bytes(bytes.clone());
        let result = truncate_to(&seed, length);

        if length > 0 && length < bytes.len() {
            prop_assert_eq!(result.unwrap().len(), length);
        } else {
            prop_assert_eq!(
                result.unwrap_err(),
                PrimitiveError::TruncateLength { length, key_len: bytes.len() }
            );
        }
    }

    #[test]
    fn prop_identifier_is_sixteen_bytes(bytes in prop::collection::vec(any::<u8>(), 1..128)) {
        let schedule = short_schedule(1, 1);
        let identifier = schedule.contact_identifier(&ContactKey::from_bytes(bytes)).unwrap();

        prop_assert_eq!(identifier.as_bytes().len(), CONTACT_IDENTIFIER_LEN);
        prop_assert_eq!(identifier.to_string().len(), CONTACT_IDENTIFIER_LEN * 2);
    }

    #[test]
    fn prop_xor_is_involutive(
        (a, b) in (1usize..64).prop_flat_map(|len| (
            prop::collection::vec(any::<u8>(), len),
            prop::collection::vec(any::<u8>(), len),
        )),
    ) {
        let a = MatchingKeySeed::from_bytes(a);
        let b = MatchingKeySeed::from_bytes(b);

        let combined = xor(&a, &b).unwrap();
        prop_assert_eq!(xor(&combined, &b).unwrap(), a);
    }

    #[test]
    fn prop_xor_rejects_mismatch(left in 1usize..64, right in 1usize..64) {
        prop_assume!(left != right);
        let a = MatchingKeySeed::from_bytes(vec![0; left]);
        let b = MatchingKeySeed::from_bytes(vec![0; right]);

        prop_assert_eq!(xor(&a, &b).unwrap_err(), PrimitiveError::LengthMismatch { left, right });
    }

    #[test]
    fn prop_time_mapping_inverts(day in 0u32..=2000, seconds in 0i64..SECONDS_PER_DAY) {
        let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
        let config = schedule.config();
        let secs = config.epoch_secs + i64::from(day) * SECONDS_PER_DAY + seconds;

        prop_assert_eq!(schedule.day_at_secs(secs).unwrap().get(), day);
        prop_assert_eq!(
            i64::from(schedule.period_at_secs(secs).unwrap().get()),
            seconds / config.period_secs()
        );
    }

    #[test]
    fn prop_out_of_range_days_rejected(offset in 1i64..1_000_000_000) {
        let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
        let config = schedule.config();
        let after = config.epoch_secs + (i64::from(config.days) + 1) * SECONDS_PER_DAY + offset - 1;
        let before = config.epoch_secs - offset;

        let late = schedule.day_at_secs(after).unwrap_err();
        prop_assert!(late.requires_new_secret());
        let early = schedule.period_at_secs(before).unwrap_err();
        prop_assert!(matches!(early, ScheduleError::DayOutOfRange { day, .. } if day < 0), "expected DayOutOfRange with negative day");
    }
}

//! Reference vectors for the key schedule
//!
//! Pins the derivation for an all-zero secret key so any change to the hash
//! chains, the truncation or the identifier encoding is caught:
//!
//! 1. **Matching keys**: days 0, 1 and D against known digests
//! 2. **Contact keys**: periods 0, 1, P-1 and P of day 0
//! 3. **Identifier**: the broadcast value for day 0, period 0
//! 4. **Boundaries**: matching keys at `i ∈ {0, 1, D-1, D}` and contact keys
//!    at `i ∈ {0, 1, P-1, P}` against a recomputation with raw SHA-256,
//!    including `seed[-1]`

use sha2::{Digest as _, Sha256};
use tracekey_crypto::{
    Key, KeySchedule, MatchingSeed, SECRET_KEY_LEN, ScheduleConfig, SecretKey, chain, hash,
};

const MATCHING_KEY_0: &str = "38fc2e6a58a6208cb376e79f46b6dcd646a8eef492c07bdeccde63448aea4b51";
const MATCHING_KEY_1: &str = "445694f67798589de764c512ae0a95730ca724dcf410483245bc08a76eb73e59";
const MATCHING_KEY_1999: &str = "08e0e9a629a0b7d0289c3f57d02052f050b953236a328596090dbedbd581bc67";
const MATCHING_KEY_2000: &str = "c12eb8ced309befb0c8abf12bd7958f784499254a8266f35772009629b482221";

const CONTACT_KEY_0: &str = "e2cfbeb32de932c9171c658b5f57a337794e1be5659877ff3f973144b929a39d";
const CONTACT_KEY_1: &str = "d7f8ef992e35091fed00b9c47dcfe398afbfbfcae9bfc3a48c7e922035c6b731";
const CONTACT_KEY_239: &str = "8c9a22759b2a87ff41a9391e8d390f35da0e8769465cc48ef2e76f54919a3060";
const CONTACT_KEY_240: &str = "fb4681d8d4864b887a03a7999a7ff6c697d1ebd9448ecec4bbc83fa2f405fa0d";

const CONTACT_IDENTIFIER_0: &str = "50e0a0e4f7bd727a9943973d22918679";

fn zero_secret(schedule: &KeySchedule) -> SecretKey {
    schedule.import_secret_key(vec![0u8; SECRET_KEY_LEN]).unwrap()
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(bytes));
    out
}

/// Seeds `seed[-1] ..= seed[last]` computed without the crate, so
/// `seeds[i + 1]` is `seed[i]`.
fn raw_seeds(top: [u8; 32], last: usize) -> Vec<[u8; 32]> {
    let mut seeds = vec![top];
    for _ in 0..=last {
        let previous = seeds[seeds.len() - 1];
        seeds.push(sha256(&previous[..16]));
    }
    seeds.reverse();
    seeds
}

fn raw_key(seeds: &[[u8; 32]], i: usize) -> [u8; 32] {
    let mut combined = [0u8; 32];
    for (out, (a, b)) in combined.iter_mut().zip(seeds[i + 1].iter().zip(&seeds[i])) {
        *out = a ^ b;
    }
    sha256(&combined)
}

#[test]
fn matching_keys_match_reference() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let keys = schedule.matching_keys(&zero_secret(&schedule)).unwrap();

    assert_eq!(keys.len(), 2001);
    let expected = [
        (0, MATCHING_KEY_0),
        (1, MATCHING_KEY_1),
        (1999, MATCHING_KEY_1999),
        (2000, MATCHING_KEY_2000),
    ];
    for (day, expected) in expected {
        let index = schedule.day_index(day).unwrap();
        assert_eq!(hex::encode(keys.get(index).unwrap().as_bytes()), expected, "day {day}");
    }
}

#[test]
fn contact_keys_match_reference() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let matching = schedule.matching_keys(&zero_secret(&schedule)).unwrap();
    let day_zero = matching.get(schedule.day_index(0).unwrap()).unwrap();
    let keys = schedule.contact_keys(day_zero).unwrap();

    assert_eq!(keys.len(), 241);
    let expected = [
        (0, CONTACT_KEY_0),
        (1, CONTACT_KEY_1),
        (239, CONTACT_KEY_239),
        (240, CONTACT_KEY_240),
    ];
    for (period, expected) in expected {
        let index = schedule.period_index(period).unwrap();
        assert_eq!(hex::encode(keys.get(index).unwrap().as_bytes()), expected, "period {period}");
    }
}

#[test]
fn contact_identifier_matches_reference() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let matching = schedule.matching_keys(&zero_secret(&schedule)).unwrap();
    let day_zero = matching.get(schedule.day_index(0).unwrap()).unwrap();
    let contacts = schedule.contact_keys(day_zero).unwrap();
    let contact = contacts.get(schedule.period_index(0).unwrap()).unwrap();

    let identifier = schedule.contact_identifier(contact).unwrap();

    assert_eq!(identifier.as_bytes().len(), 16);
    assert_eq!(identifier.to_string(), CONTACT_IDENTIFIER_0);
}

#[test]
fn chain_boundaries_match_raw_recomputation() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let secret = zero_secret(&schedule);
    let keys = schedule.matching_keys(&secret).unwrap();

    let seeds = raw_seeds(sha256(secret.as_bytes()), 2000);
    for day in [0usize, 1, 1999, 2000] {
        let index = schedule.day_index(day as i64).unwrap();
        assert_eq!(keys.get(index).unwrap().as_bytes(), &raw_key(&seeds, day), "day {day}");
    }
}

#[test]
fn contact_chain_boundaries_match_raw_recomputation() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let matching = schedule.matching_keys(&zero_secret(&schedule)).unwrap();
    let day_zero = matching.get(schedule.day_index(0).unwrap()).unwrap();
    let keys = schedule.contact_keys(day_zero).unwrap();

    let seeds = raw_seeds(sha256(day_zero.as_bytes()), 240);
    for period in [0usize, 1, 239, 240] {
        let index = schedule.period_index(period as i64).unwrap();
        let expected = raw_key(&seeds, period);
        assert_eq!(keys.get(index).unwrap().as_bytes(), &expected, "period {period}");
    }
}

#[test]
fn seed_before_day_zero_uses_the_common_step() {
    let schedule = KeySchedule::new(ScheduleConfig::default()).unwrap();
    let secret = zero_secret(&schedule);
    let seeds = raw_seeds(sha256(secret.as_bytes()), 2000);

    // Walk the crate's step function from the top down to seed[-1]
    let mut seed = Key::<MatchingSeed>::from_digest(hash(&secret).unwrap());
    for _ in 0..=2000 {
        seed = chain::step(&seed).unwrap();
    }

    assert_eq!(seed.as_bytes(), &seeds[0]);
}

#[test]
fn chain_length_changes_every_key() {
    // Day 0 sits a different number of steps below the top
    let short = KeySchedule::new(ScheduleConfig { days: 10, ..ScheduleConfig::default() }).unwrap();
    let full = KeySchedule::new(ScheduleConfig::default()).unwrap();

    let short_keys = short.matching_keys(&zero_secret(&short)).unwrap();
    let full_keys = full.matching_keys(&zero_secret(&full)).unwrap();

    let day = short.day_index(0).unwrap();
    assert_ne!(short_keys.get(day).unwrap(), full_keys.get(day).unwrap());
}

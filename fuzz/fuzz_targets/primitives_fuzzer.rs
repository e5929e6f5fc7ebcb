//! Fuzz target for the hash-chain primitives and chain expansion
//!
//! Tests hash, truncate, xor and expand under adversarial inputs.
//!
//! # Strategy
//!
//! - Arbitrary key material (empty, one byte, hash-sized, large)
//! - Truncation targets on both sides of the key length
//! - XOR of equal and mismatched lengths
//! - Short chain expansions from arbitrary top seeds
//!
//! # Invariants
//!
//! - Primitives never panic; malformed input is an error
//! - Truncation output is strictly shorter than its input
//! - XOR is its own inverse
//! - Expansion is deterministic and yields `last + 1` hash-sized keys

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tracekey_crypto::{
    chain, hash, truncate, truncate_to, xor, Contact, ContactKeySeed, ContactSeed, HASH_LEN,
};

#[derive(Debug, Clone, Arbitrary)]
struct PrimitiveScenario {
    /// Left key material
    left: KeyBytes,
    /// Right key material
    right: KeyBytes,
    /// Explicit truncation target
    length: u16,
    /// Chain length (clamped)
    last: u8,
}

#[derive(Debug, Clone, Arbitrary)]
enum KeyBytes {
    Empty,
    Single(u8),
    Digest([u8; 32]),
    Large([u8; 64]),
    Arbitrary(Vec<u8>),
}

impl KeyBytes {
    fn to_vec(&self) -> Vec<u8> {
        match self {
            KeyBytes::Empty => Vec::new(),
            KeyBytes::Single(b) => vec![*b],
            KeyBytes::Digest(b) => b.to_vec(),
            KeyBytes::Large(b) => b.to_vec(),
            KeyBytes::Arbitrary(b) => b.clone(),
        }
    }
}

fuzz_target!(|scenario: PrimitiveScenario| {
    let left = ContactKeySeed::from_bytes(scenario.left.to_vec());
    let right = ContactKeySeed::from_bytes(scenario.right.to_vec());

    // INVARIANT 1: hash accepts any non-empty input and yields 32 bytes
    match hash(&left) {
        Ok(digest) => assert_eq!(digest.as_bytes().len(), HASH_LEN),
        Err(_) => assert!(left.is_empty(), "only empty input may fail to hash"),
    }

    // INVARIANT 2: truncation output is strictly shorter
    if let Ok(half) = truncate(&left) {
        assert!(half.len() < left.len());
        assert_eq!(half.as_bytes(), &left.as_bytes()[..left.len() / 2]);
    }
    let length = usize::from(scenario.length);
    match truncate_to(&left, length) {
        Ok(prefix) => {
            assert_eq!(prefix.len(), length);
            assert!(prefix.len() < left.len());
        },
        Err(_) => assert!(length == 0 || length >= left.len()),
    }

    // INVARIANT 3: xor succeeds exactly on equal non-empty lengths
    match xor(&left, &right) {
        Ok(combined) => {
            assert_eq!(left.len(), right.len());
            let restored = xor(&combined, &right).expect("lengths already match");
            assert_eq!(restored, left, "xor must be its own inverse");
        },
        Err(_) => assert!(left.is_empty() || right.is_empty() || left.len() != right.len()),
    }

    // INVARIANT 4: expansion is deterministic with last + 1 keys
    if let Ok(top) = hash(&left) {
        let again = hash(&left).expect("hash is deterministic");
        let last = usize::from(scenario.last % 32);

        let keys = chain::expand::<ContactSeed, Contact>(top, last).expect("top is hash-sized");
        let repeat = chain::expand::<ContactSeed, Contact>(again, last).expect("top is hash-sized");

        assert_eq!(keys.len(), last + 1);
        assert!(keys.iter().all(|k| k.len() == HASH_LEN));
        assert_eq!(keys, repeat, "expansion must be deterministic");
    }
});

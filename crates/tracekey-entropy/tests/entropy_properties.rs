//! Property-based tests for entropy mixing
//!
//! Whatever an observer feeds into `add_entropy`, sources stay usable and
//! two sources in the same state diverge once they absorb different input.

use std::sync::Arc;

use proptest::prelude::*;
use tracekey_entropy::{
    BlockingSecureRandomNist, Entropy, EntropyError, NonBlockingCsprng, RandomSource, SeedSource,
    stats::consecutive_duplicates,
};

/// Deterministic seed material so two sources start identical
struct PatternSeed(u8);

impl SeedSource for PatternSeed {
    fn fill_seed(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.0.wrapping_add(i as u8);
        }
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_arbitrary_tokens_never_degenerate_nist(
        tokens in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..20),
    ) {
        let source = BlockingSecureRandomNist::new(Arc::new(PatternSeed(9))).unwrap();
        for token in &tokens {
            source.add_entropy(Entropy::Token(token)).unwrap();
        }

        let duplicates = consecutive_duplicates(100, || source.next_u32()).unwrap();
        prop_assert!(duplicates < 90);
    }

    #[test]
    fn prop_different_observations_diverge(
        seed in any::<u8>(),
        a in any::<i64>(),
        b in any::<i64>(),
    ) {
        prop_assume!(a != b);

        let left = NonBlockingCsprng::new(Arc::new(PatternSeed(seed))).unwrap();
        let right = NonBlockingCsprng::new(Arc::new(PatternSeed(seed))).unwrap();
        left.add_entropy(Entropy::Int(a)).unwrap();
        right.add_entropy(Entropy::Int(b)).unwrap();

        prop_assert_ne!(left.next_u64().unwrap(), right.next_u64().unwrap());
    }

    #[test]
    fn prop_same_observation_is_reproducible(seed in any::<u8>(), value in any::<i64>()) {
        let left = NonBlockingCsprng::new(Arc::new(PatternSeed(seed))).unwrap();
        let right = NonBlockingCsprng::new(Arc::new(PatternSeed(seed))).unwrap();
        left.add_entropy(Entropy::Int(value)).unwrap();
        right.add_entropy(Entropy::Int(value)).unwrap();

        prop_assert_eq!(left.next_u64().unwrap(), right.next_u64().unwrap());
    }
}

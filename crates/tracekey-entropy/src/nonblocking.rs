//! Sources that never suspend the caller after construction.

#![allow(clippy::disallowed_types, reason = "Generator state is locked only for synchronous fills")]

use std::sync::{Arc, Mutex};

use rand::{
    RngCore, SeedableRng,
    rngs::{OsRng, SmallRng, StdRng},
};
use rand_chacha::ChaCha20Rng;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::EntropyError,
    provision::EntropyKind,
    reseeding::{ReseedingChaCha, draw_seed},
    source::{Entropy, RandomSource, SeedSource, lock, mix},
};

/// Fast pseudo-random source. NOT cryptographically secure.
///
/// Suitable where statistical rather than adversarial unpredictability is
/// required, e.g. jittering broadcast timing. Never use it for key material.
pub struct NonBlockingPrng {
    rng: Mutex<SmallRng>,
}

impl NonBlockingPrng {
    /// Create a generator seeded once from `seed_source`.
    pub fn new(seed_source: &dyn SeedSource) -> Result<Self, EntropyError> {
        let seed = draw_seed(seed_source, EntropyKind::Prng)?;
        Ok(Self { rng: Mutex::new(small_rng_from(*seed)?) })
    }
}

fn small_rng_from(seed: [u8; 32]) -> Result<SmallRng, EntropyError> {
    SmallRng::from_rng(ChaCha20Rng::from_seed(seed))
        .map_err(|e| EntropyError::SeedFailed { kind: EntropyKind::Prng, reason: e.to_string() })
}

impl RandomSource for NonBlockingPrng {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        lock(&self.rng)?.fill_bytes(buffer);
        Ok(())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        let mut rng = lock(&self.rng)?;
        let mut current = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *current);

        let mut seed = mix(&*current, &entropy);
        *rng = small_rng_from(seed)?;
        seed.zeroize();
        Ok(())
    }
}

/// Cryptographically secure source fed from the OS non-blocking pool.
///
/// ChaCha20 keystream, reseeded from the pool every
/// [`RESEED_INTERVAL`](Self::RESEED_INTERVAL) bytes of output.
pub struct NonBlockingCsprng {
    state: Mutex<ReseedingChaCha>,
    seed_source: Arc<dyn SeedSource>,
}

impl NonBlockingCsprng {
    /// Output volume (bytes) between reseeds.
    pub const RESEED_INTERVAL: u64 = 1 << 20;

    /// Create a generator seeded from `seed_source`.
    pub fn new(seed_source: Arc<dyn SeedSource>) -> Result<Self, EntropyError> {
        let seed = draw_seed(seed_source.as_ref(), EntropyKind::Csprng)?;
        Ok(Self {
            state: Mutex::new(ReseedingChaCha::new(&seed, Self::RESEED_INTERVAL)),
            seed_source,
        })
    }
}

impl RandomSource for NonBlockingCsprng {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        lock(&self.state)?.fill(buffer, self.seed_source.as_ref())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        lock(&self.state)?.absorb(&entropy);
        Ok(())
    }
}

/// General secure source with the rand library's default seeding.
///
/// This is also the fallback when a requested source cannot be built, so it
/// seeds straight from [`OsRng`] rather than an injected seed source.
pub struct NonBlockingSecureRandom {
    rng: Mutex<StdRng>,
}

impl NonBlockingSecureRandom {
    /// Create a generator seeded from the OS.
    pub fn new() -> Result<Self, EntropyError> {
        let rng = StdRng::from_rng(OsRng).map_err(|e| EntropyError::SeedFailed {
            kind: EntropyKind::Secure,
            reason: e.to_string(),
        })?;
        Ok(Self { rng: Mutex::new(rng) })
    }
}

impl RandomSource for NonBlockingSecureRandom {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        lock(&self.rng)?.fill_bytes(buffer);
        Ok(())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        let mut rng = lock(&self.rng)?;
        let mut current = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *current);

        let mut seed = mix(&*current, &entropy);
        *rng = StdRng::from_seed(seed);
        seed.zeroize();
        Ok(())
    }
}

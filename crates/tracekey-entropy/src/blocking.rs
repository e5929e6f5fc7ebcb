//! Sources that may suspend the caller while the OS pool is replenished.
//!
//! Blocking is acceptable only at secret key generation, which is rare and
//! not latency critical. Never put these on the contact identifier path.

#![allow(
    clippy::disallowed_types,
    reason = "Whitener and reseed state are locked only for synchronous fills"
)]

use std::sync::{Arc, Mutex};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::EntropyError,
    provision::EntropyKind,
    reseeding::{ReseedingChaCha, draw_seed},
    source::{Entropy, RandomSource, SeedSource, lock, mix},
};

/// Chunk size for whitening keystream generation
const WHITEN_CHUNK: usize = 64;

/// Secure source that draws every byte from the OS pool.
///
/// OS output is XORed with a ChaCha20 keystream that `add_entropy` feeds.
/// The XOR of uniform OS bytes with an independent stream stays uniform, so
/// external observations can only add unpredictability.
pub struct BlockingSecureRandom {
    seed_source: Arc<dyn SeedSource>,
    whitener: Mutex<ChaCha20Rng>,
}

impl BlockingSecureRandom {
    /// Create a source, waiting on `seed_source` for the whitening key.
    pub fn new(seed_source: Arc<dyn SeedSource>) -> Result<Self, EntropyError> {
        let seed = draw_seed(seed_source.as_ref(), EntropyKind::Blocking)?;
        Ok(Self { seed_source, whitener: Mutex::new(ChaCha20Rng::from_seed(*seed)) })
    }
}

impl RandomSource for BlockingSecureRandom {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        self.seed_source.fill_seed(buffer)?;

        let mut whitener = lock(&self.whitener)?;
        let mut keystream = Zeroizing::new([0u8; WHITEN_CHUNK]);
        for chunk in buffer.chunks_mut(WHITEN_CHUNK) {
            let stream = &mut keystream[..chunk.len()];
            whitener.fill_bytes(stream);
            for (byte, mask) in chunk.iter_mut().zip(stream.iter()) {
                *byte ^= mask;
            }
        }
        Ok(())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        let mut whitener = lock(&self.whitener)?;
        let mut current = Zeroizing::new([0u8; 32]);
        whitener.fill_bytes(&mut *current);

        let mut seed = mix(&*current, &entropy);
        *whitener = ChaCha20Rng::from_seed(seed);
        seed.zeroize();
        Ok(())
    }
}

/// When a [`SharedBlockingSecureRandom`] goes back to the OS pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReseedPolicy {
    /// Bytes of output between reseeds
    pub every_bytes: u64,
}

impl Default for ReseedPolicy {
    fn default() -> Self {
        Self { every_bytes: 1 << 16 }
    }
}

struct SharedInner {
    state: Mutex<ReseedingChaCha>,
    seed_source: Arc<dyn SeedSource>,
}

/// Process-wide secure source, shared explicitly by cloning.
///
/// Reseeds from the blocking OS pool on the fixed cadence of its
/// [`ReseedPolicy`] instead of per call, so consecutive first-byte samples
/// come from one stream rather than independent draws.
///
/// # Lifecycle
///
/// - Construction: [`new`](Self::new) draws the initial seed (may block)
/// - Reseeding: automatic per policy, or forced with
///   [`reseed_now`](Self::reseed_now)
/// - Teardown: dropping the last clone releases the state
#[derive(Clone)]
pub struct SharedBlockingSecureRandom {
    inner: Arc<SharedInner>,
}

impl SharedBlockingSecureRandom {
    /// Create a shared source with the given reseed cadence.
    pub fn new(
        seed_source: Arc<dyn SeedSource>,
        policy: ReseedPolicy,
    ) -> Result<Self, EntropyError> {
        let seed = draw_seed(seed_source.as_ref(), EntropyKind::Shared)?;
        let state = ReseedingChaCha::new(&seed, policy.every_bytes);
        Ok(Self { inner: Arc::new(SharedInner { state: Mutex::new(state), seed_source }) })
    }

    /// Reseed from the OS pool immediately, blocking if it is depleted.
    pub fn reseed_now(&self) -> Result<(), EntropyError> {
        lock(&self.inner.state)?.reseed(self.inner.seed_source.as_ref())
    }

    /// Number of reseeds performed since construction.
    pub fn reseeds(&self) -> Result<u64, EntropyError> {
        Ok(lock(&self.inner.state)?.reseeds())
    }
}

impl RandomSource for SharedBlockingSecureRandom {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        lock(&self.inner.state)?.fill(buffer, self.inner.seed_source.as_ref())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        lock(&self.inner.state)?.absorb(&entropy);
        Ok(())
    }
}

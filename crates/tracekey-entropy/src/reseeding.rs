//! ChaCha20 stream that reseeds from a seed source after a fixed output volume

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::EntropyError,
    provision::EntropyKind,
    source::{Entropy, SeedSource, mix},
};

/// Draw a 32-byte seed, attributing failure to the source being built.
pub(crate) fn draw_seed(
    seed_source: &dyn SeedSource,
    kind: EntropyKind,
) -> Result<Zeroizing<[u8; 32]>, EntropyError> {
    let mut seed = Zeroizing::new([0u8; 32]);
    seed_source
        .fill_seed(&mut *seed)
        .map_err(|e| EntropyError::SeedFailed { kind, reason: e.to_string() })?;
    Ok(seed)
}

pub(crate) struct ReseedingChaCha {
    rng: ChaCha20Rng,
    /// Bytes emitted since the last reseed
    emitted: u64,
    /// Reseed once `emitted` reaches this many bytes
    interval: u64,
    reseeds: u64,
}

impl ReseedingChaCha {
    pub(crate) fn new(seed: &[u8; 32], interval: u64) -> Self {
        Self { rng: ChaCha20Rng::from_seed(*seed), emitted: 0, interval, reseeds: 0 }
    }

    pub(crate) fn fill(
        &mut self,
        buffer: &mut [u8],
        seed_source: &dyn SeedSource,
    ) -> Result<(), EntropyError> {
        if self.emitted >= self.interval {
            self.reseed(seed_source)?;
        }
        self.rng.fill_bytes(buffer);
        self.emitted = self.emitted.saturating_add(buffer.len() as u64);
        Ok(())
    }

    /// Replace the stream with one keyed by both the current state and fresh
    /// seed material.
    pub(crate) fn reseed(&mut self, seed_source: &dyn SeedSource) -> Result<(), EntropyError> {
        let mut fresh = Zeroizing::new([0u8; 32]);
        seed_source.fill_seed(&mut *fresh)?;
        self.absorb(&Entropy::Token(&*fresh));
        self.emitted = 0;
        self.reseeds = self.reseeds.saturating_add(1);
        Ok(())
    }

    pub(crate) fn absorb(&mut self, entropy: &Entropy<'_>) {
        let mut current = Zeroizing::new([0u8; 32]);
        self.rng.fill_bytes(&mut *current);

        let mut seed = mix(&*current, entropy);
        self.rng = ChaCha20Rng::from_seed(seed);
        seed.zeroize();
    }

    pub(crate) fn reseeds(&self) -> u64 {
        self.reseeds
    }
}

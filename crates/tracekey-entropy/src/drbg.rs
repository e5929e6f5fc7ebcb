//! HMAC_DRBG (NIST SP 800-90A, HMAC-SHA-256) and the blocking source built
//! on it.
//!
//! # Seeding
//!
//! - 55 bytes (440 bits) of entropy input from the blocking seed source, the
//!   seed length SP 800-90A specifies for SHA-256 based DRBGs
//! - 16 byte nonce from the same source
//! - Fixed personalization string for domain separation
//!
//! After instantiation the generator discards `256 + (n mod 1024)` bytes,
//! with `n` drawn from the generator itself, so the first bytes ever handed
//! out are not the first bytes following the seeded state.

#![allow(clippy::disallowed_types, reason = "Generator state is locked only for synchronous fills")]

use std::sync::{Arc, Mutex};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::EntropyError,
    provision::EntropyKind,
    source::{Entropy, RandomSource, SeedSource, lock},
};

type HmacSha256 = Hmac<Sha256>;

/// Entropy input length in bytes (440 bits)
pub const SEED_LEN: usize = 55;

/// Nonce length in bytes
const NONCE_LEN: usize = 16;

/// Personalization string
const PERSONALIZATION: &[u8] = b"tracekeyDrbgV1";

/// Largest single generate request (2^19 bits)
const MAX_REQUEST_BYTES: usize = 1 << 16;

/// Generate requests between reseeds
const RESEED_INTERVAL: u64 = 1 << 16;

/// Minimum number of bytes skipped after instantiation
const SKIP_BASE: usize = 256;

/// Range of the random component of the skip
const SKIP_RANGE: u32 = 1024;

/// HMAC_DRBG working state.
pub(crate) struct HmacDrbg {
    key: [u8; 32],
    value: [u8; 32],
    reseed_counter: u64,
}

impl HmacDrbg {
    /// Instantiate from entropy input, nonce and personalization string.
    pub(crate) fn instantiate(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Self {
        let mut drbg = Self { key: [0x00; 32], value: [0x01; 32], reseed_counter: 1 };
        drbg.update(&[entropy, nonce, personalization]);
        drbg
    }

    /// Mix fresh entropy input and optional additional input into the state.
    pub(crate) fn reseed(&mut self, entropy: &[u8], additional: &[u8]) {
        self.update(&[entropy, additional]);
        self.reseed_counter = 1;
    }

    /// Mix additional input into the state without resetting the counter.
    pub(crate) fn absorb(&mut self, additional: &[u8]) {
        self.update(&[additional]);
    }

    pub(crate) fn needs_reseed(&self) -> bool {
        self.reseed_counter > RESEED_INTERVAL
    }

    /// Fill `out` (at most [`MAX_REQUEST_BYTES`]) with generator output.
    pub(crate) fn generate(&mut self, out: &mut [u8]) {
        debug_assert!(out.len() <= MAX_REQUEST_BYTES);

        for block in out.chunks_mut(32) {
            self.value = hmac(&self.key, &[self.value.as_slice()]);
            block.copy_from_slice(&self.value[..block.len()]);
        }
        self.update(&[]);
        self.reseed_counter = self.reseed_counter.saturating_add(1);
    }

    /// The HMAC_DRBG_Update function.
    fn update(&mut self, provided: &[&[u8]]) {
        let mut round = |separator: u8| {
            let mut parts: Vec<&[u8]> = Vec::with_capacity(provided.len() + 2);
            parts.push(self.value.as_slice());
            parts.push(std::slice::from_ref(&separator));
            parts.extend_from_slice(provided);
            self.key = hmac(&self.key, &parts);
            self.value = hmac(&self.key, &[self.value.as_slice()]);
        };

        round(0x00);
        if provided.iter().any(|part| !part.is_empty()) {
            round(0x01);
        }
    }
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.value.zeroize();
    }
}

fn hmac(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Blocking secure source modelled on SP 800-90A.
///
/// Seeds from a dedicated high-entropy seed source with a 440-bit seed,
/// advances past a random offset before first use, and reseeds from the
/// seed source every 2^16 generate requests.
pub struct BlockingSecureRandomNist {
    drbg: Mutex<HmacDrbg>,
    seed_source: Arc<dyn SeedSource>,
}

impl BlockingSecureRandomNist {
    /// Instantiate, blocking on `seed_source` for the seed and nonce.
    pub fn new(seed_source: Arc<dyn SeedSource>) -> Result<Self, EntropyError> {
        let seed_failed = |e: EntropyError| EntropyError::SeedFailed {
            kind: EntropyKind::Nist,
            reason: e.to_string(),
        };

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        let mut nonce = Zeroizing::new([0u8; NONCE_LEN]);
        seed_source.fill_seed(&mut *seed).map_err(seed_failed)?;
        seed_source.fill_seed(&mut *nonce).map_err(seed_failed)?;

        let mut drbg = HmacDrbg::instantiate(&*seed, &*nonce, PERSONALIZATION);

        let mut offset = [0u8; 4];
        drbg.generate(&mut offset);
        let skip = SKIP_BASE + (u32::from_be_bytes(offset) % SKIP_RANGE) as usize;
        let mut discard = Zeroizing::new(vec![0u8; skip]);
        drbg.generate(&mut discard);
        offset.zeroize();

        Ok(Self { drbg: Mutex::new(drbg), seed_source })
    }
}

impl RandomSource for BlockingSecureRandomNist {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        let mut drbg = lock(&self.drbg)?;
        for request in buffer.chunks_mut(MAX_REQUEST_BYTES) {
            if drbg.needs_reseed() {
                let mut entropy = Zeroizing::new([0u8; SEED_LEN]);
                self.seed_source.fill_seed(&mut *entropy)?;
                drbg.reseed(&*entropy, &[]);
            }
            drbg.generate(request);
        }
        Ok(())
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        let additional = Zeroizing::new(entropy.encode());
        lock(&self.drbg)?.absorb(&additional);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSeed;

    impl SeedSource for FixedSeed {
        fn fill_seed(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
            Ok(())
        }
    }

    struct FailingSeed;

    impl SeedSource for FailingSeed {
        fn fill_seed(&self, _buffer: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError::Unavailable { reason: "pool closed".into() })
        }
    }

    #[test]
    fn drbg_is_deterministic() {
        let mut a = HmacDrbg::instantiate(b"entropy", b"nonce", b"");
        let mut b = HmacDrbg::instantiate(b"entropy", b"nonce", b"");

        let mut out_a = [0u8; 100];
        let mut out_b = [0u8; 100];
        a.generate(&mut out_a);
        b.generate(&mut out_b);

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn drbg_output_advances() {
        let mut drbg = HmacDrbg::instantiate(b"entropy", b"nonce", b"");
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        drbg.generate(&mut first);
        drbg.generate(&mut second);

        assert_ne!(first, second);
    }

    #[test]
    fn personalization_separates_instances() {
        let mut a = HmacDrbg::instantiate(b"entropy", b"nonce", b"one");
        let mut b = HmacDrbg::instantiate(b"entropy", b"nonce", b"two");

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.generate(&mut out_a);
        b.generate(&mut out_b);

        assert_ne!(out_a, out_b);
    }

    #[test]
    fn reseed_required_after_interval() {
        let mut drbg = HmacDrbg::instantiate(b"entropy", b"nonce", b"");
        let mut out = [0u8; 1];
        for _ in 0..RESEED_INTERVAL {
            assert!(!drbg.needs_reseed());
            drbg.generate(&mut out);
        }
        assert!(drbg.needs_reseed());

        drbg.reseed(b"fresh", b"");
        assert!(!drbg.needs_reseed());
    }

    #[test]
    fn source_skips_initial_output() {
        // The source must not hand out the bytes that directly follow
        // instantiation.
        let source = BlockingSecureRandomNist::new(Arc::new(FixedSeed)).unwrap();
        let mut seed = [0u8; SEED_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        FixedSeed.fill_seed(&mut seed).unwrap();
        FixedSeed.fill_seed(&mut nonce).unwrap();
        let mut raw = HmacDrbg::instantiate(&seed, &nonce, PERSONALIZATION);

        let mut raw_first = [0u8; 32];
        raw.generate(&mut raw_first);
        let mut served = [0u8; 32];
        source.fill_bytes(&mut served).unwrap();

        assert_ne!(raw_first, served);
    }

    #[test]
    fn seed_failure_is_attributed() {
        let result = BlockingSecureRandomNist::new(Arc::new(FailingSeed));

        match result {
            Err(EntropyError::SeedFailed { kind, .. }) => assert_eq!(kind, EntropyKind::Nist),
            _ => unreachable!("expected SeedFailed error"),
        }
    }

    #[test]
    fn add_entropy_changes_output() {
        let a = BlockingSecureRandomNist::new(Arc::new(FixedSeed)).unwrap();
        let b = BlockingSecureRandomNist::new(Arc::new(FixedSeed)).unwrap();
        b.add_entropy(Entropy::Int(-1)).unwrap();

        assert_ne!(a.next_u64().unwrap(), b.next_u64().unwrap());
    }
}

//! The capability every entropy source implements.
//!
//! Sources take `&self` so a single instance can be shared between threads.
//! Implementations with mutable state serialize access behind their own lock.

#![allow(clippy::disallowed_types, reason = "Lock helper shared by every source")]

use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use crate::error::EntropyError;

/// Domain separation label for entropy mixing
const MIX_LABEL: &[u8] = b"tracekeyMixV1";

/// Externally observed randomness folded into a source's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entropy<'a> {
    /// An integer observation (timer jitter, signal strength, counters)
    Int(i64),
    /// An opaque token (received payload, device identifier, string)
    Token(&'a [u8]),
}

impl Entropy<'_> {
    /// Tagged, length-prefixed encoding so that `Int(1)` and
    /// `Token(&1i64.to_be_bytes())` never collide.
    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            Self::Int(value) => {
                let mut out = Vec::with_capacity(9);
                out.push(0);
                out.extend_from_slice(&value.to_be_bytes());
                out
            },
            Self::Token(token) => {
                let mut out = Vec::with_capacity(9 + token.len());
                out.push(1);
                out.extend_from_slice(&(token.len() as u64).to_be_bytes());
                out.extend_from_slice(token);
                out
            },
        }
    }
}

impl From<i64> for Entropy<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Entropy<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl<'a> From<&'a [u8]> for Entropy<'a> {
    fn from(token: &'a [u8]) -> Self {
        Self::Token(token)
    }
}

impl<'a> From<&'a str> for Entropy<'a> {
    fn from(token: &'a str) -> Self {
        Self::Token(token.as_bytes())
    }
}

/// Pluggable provider of random integers and byte buffers.
///
/// # Invariants
///
/// - Output is indistinguishable from uniform over the full byte range
/// - `add_entropy` never makes output statistically worse: observations are
///   mixed with the existing state, never substituted for it
/// - Safe to call concurrently from multiple threads without correlating
///   output across callers
pub trait RandomSource: Send + Sync {
    /// Fills the buffer with random bytes.
    ///
    /// Blocking sources may suspend the calling thread until the OS pool
    /// has entropy available.
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;

    /// Folds an external observation into the source's state.
    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError>;

    /// Generates a random `u32`.
    fn next_u32(&self) -> Result<u32, EntropyError> {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes)?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Generates a random `u64`.
    fn next_u64(&self) -> Result<u64, EntropyError> {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes)?;
        Ok(u64::from_be_bytes(bytes))
    }
}

/// Where sources draw their seed material from.
///
/// Production uses [`OsSeedSource`]. Tests substitute failing or scripted
/// implementations to exercise fallback paths.
pub trait SeedSource: Send + Sync {
    /// Fills the buffer with seed material, blocking until it is available.
    fn fill_seed(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;
}

/// Seed material from the operating system via getrandom.
///
/// On Linux this is the `getrandom(2)` syscall without `GRND_NONBLOCK`, so
/// the first draw after boot suspends until the kernel pool is initialised.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn fill_seed(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer)
            .map_err(|e| EntropyError::Unavailable { reason: format!("OS entropy pool: {e}") })
    }
}

/// SHA-256 of the current state output and an observation.
///
/// Used to derive a replacement seed that depends on both, so the new state
/// is at least as unpredictable as the old one.
pub(crate) fn mix(current: &[u8], entropy: &Entropy<'_>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(MIX_LABEL);
    hasher.update(current);
    hasher.update(entropy.encode());

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    seed
}

/// Acquire a source's state lock, mapping poisoning to an error.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, EntropyError> {
    mutex.lock().map_err(|_| EntropyError::Poisoned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_token_encodings_differ() {
        let value = 1i64;
        let bytes = value.to_be_bytes();
        assert_ne!(Entropy::Int(value).encode(), Entropy::Token(&bytes).encode());
    }

    #[test]
    fn mix_depends_on_state_and_observation() {
        let a = mix(&[0u8; 32], &Entropy::Int(1));
        let b = mix(&[0u8; 32], &Entropy::Int(2));
        let c = mix(&[1u8; 32], &Entropy::Int(1));

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, mix(&[0u8; 32], &Entropy::Int(1)), "mixing must be deterministic");
    }

    #[test]
    fn string_tokens_convert() {
        assert_eq!(Entropy::from("abc"), Entropy::Token(b"abc"));
        assert_eq!(Entropy::from(-5i32), Entropy::Int(-5));
    }

    #[test]
    fn os_seed_source_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsSeedSource.fill_seed(&mut a).unwrap();
        OsSeedSource.fill_seed(&mut b).unwrap();

        assert_ne!(a, b, "OS seed material should differ between draws");
    }
}

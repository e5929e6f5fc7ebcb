//! Tracekey Entropy Sources
//!
//! Randomness for secret key generation. Every source implements
//! [`RandomSource`]; which one is used is a configuration choice made once,
//! when the secret key is generated.
//!
//! # Sources
//!
//! ```text
//!   kind      type                          blocks  secure  reseed
//!   prng      NonBlockingPrng               no      no      never
//!   csprng    NonBlockingCsprng             no      yes     every 1 MiB
//!   secure    NonBlockingSecureRandom       no      yes     never
//!   blocking  BlockingSecureRandom          yes     yes     every call
//!   shared    SharedBlockingSecureRandom    yes     yes     per ReseedPolicy
//!   nist      BlockingSecureRandomNist      yes     yes     every 2^16 requests
//! ```
//!
//! # Failure Model
//!
//! - Entropy exhaustion suspends blocking sources; it is never an error and
//!   there is no timeout at this layer
//! - A source that cannot be seeded is replaced by [`EntropyKind::Secure`]
//!   through [`EntropySource::provision`], which logs the substitution and
//!   reports it as [`Origin::Fallback`]
//! - There is no fixed or static fallback seed under any circumstances
//!
//! # Testing
//!
//! [`stats`] holds the histogram and duplicate canaries every source must
//! pass. Seed material comes through [`SeedSource`] so tests can script or
//! break it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod blocking;
mod drbg;
mod error;
mod nonblocking;
mod provision;
mod reseeding;
mod source;
pub mod stats;

pub use blocking::{BlockingSecureRandom, ReseedPolicy, SharedBlockingSecureRandom};
pub use drbg::{BlockingSecureRandomNist, SEED_LEN};
pub use error::EntropyError;
pub use nonblocking::{NonBlockingCsprng, NonBlockingPrng, NonBlockingSecureRandom};
pub use provision::{EntropyKind, EntropySource, Origin, Provisioned};
pub use source::{Entropy, OsSeedSource, RandomSource, SeedSource};

//! Source selection and provisioning with explicit fallback.

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    blocking::{BlockingSecureRandom, ReseedPolicy, SharedBlockingSecureRandom},
    drbg::BlockingSecureRandomNist,
    error::EntropyError,
    nonblocking::{NonBlockingCsprng, NonBlockingPrng, NonBlockingSecureRandom},
    source::{Entropy, RandomSource, SeedSource},
};

/// Which entropy source to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntropyKind {
    /// [`NonBlockingPrng`]
    Prng,
    /// [`NonBlockingCsprng`]
    Csprng,
    /// [`NonBlockingSecureRandom`]
    Secure,
    /// [`BlockingSecureRandom`]
    Blocking,
    /// [`SharedBlockingSecureRandom`]
    Shared,
    /// [`BlockingSecureRandomNist`]
    Nist,
}

impl EntropyKind {
    /// Every kind, weakest first.
    pub const ALL: [Self; 6] =
        [Self::Prng, Self::Csprng, Self::Secure, Self::Blocking, Self::Shared, Self::Nist];

    /// Whether output is suitable for key material.
    pub fn is_cryptographic(self) -> bool {
        !matches!(self, Self::Prng)
    }

    /// Whether draws may suspend the caller.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Blocking | Self::Shared | Self::Nist)
    }

    /// Configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prng => "prng",
            Self::Csprng => "csprng",
            Self::Secure => "secure",
            Self::Blocking => "blocking",
            Self::Shared => "shared",
            Self::Nist => "nist",
        }
    }
}

impl fmt::Display for EntropyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntropyKind {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EntropyError::UnknownKind { name: s.to_string() })
    }
}

/// One of the concrete sources, dispatched by tag.
pub enum EntropySource {
    /// Fast, insecure
    Prng(NonBlockingPrng),
    /// ChaCha20 from the OS non-blocking pool
    Csprng(NonBlockingCsprng),
    /// Library-default secure generator
    Secure(NonBlockingSecureRandom),
    /// Every byte from the OS pool
    Blocking(BlockingSecureRandom),
    /// Explicitly shared, schedule-reseeded
    Shared(SharedBlockingSecureRandom),
    /// HMAC_DRBG with 440-bit seed
    Nist(BlockingSecureRandomNist),
}

impl EntropySource {
    /// Build the requested source, failing if it cannot be seeded.
    ///
    /// A `Shared` request builds a fresh instance with the default policy.
    /// To share one instance, clone it and wrap it with `From`.
    pub fn new(kind: EntropyKind, seed_source: Arc<dyn SeedSource>) -> Result<Self, EntropyError> {
        Ok(match kind {
            EntropyKind::Prng => Self::Prng(NonBlockingPrng::new(seed_source.as_ref())?),
            EntropyKind::Csprng => Self::Csprng(NonBlockingCsprng::new(seed_source)?),
            EntropyKind::Secure => Self::Secure(NonBlockingSecureRandom::new()?),
            EntropyKind::Blocking => Self::Blocking(BlockingSecureRandom::new(seed_source)?),
            EntropyKind::Shared => Self::Shared(SharedBlockingSecureRandom::new(
                seed_source,
                ReseedPolicy::default(),
            )?),
            EntropyKind::Nist => Self::Nist(BlockingSecureRandomNist::new(seed_source)?),
        })
    }

    /// Build the requested source, or fall back to [`EntropyKind::Secure`].
    ///
    /// The fallback is logged and reported through [`Provisioned::origin`]
    /// so callers can tell a degraded source from the one they asked for.
    /// There is never a fixed-seed fallback: if the secure source cannot be
    /// seeded either, this fails with [`EntropyError::Unavailable`].
    pub fn provision(
        kind: EntropyKind,
        seed_source: Arc<dyn SeedSource>,
    ) -> Result<Provisioned, EntropyError> {
        let error = match Self::new(kind, seed_source) {
            Ok(source) => return Ok(Provisioned { source, origin: Origin::Requested }),
            Err(e) => e,
        };

        if kind == EntropyKind::Secure {
            return Err(EntropyError::Unavailable { reason: error.to_string() });
        }

        tracing::warn!(
            requested = %kind,
            fallback = %EntropyKind::Secure,
            error = %error,
            "Entropy source unavailable, falling back"
        );

        let source = NonBlockingSecureRandom::new()
            .map_err(|e| EntropyError::Unavailable { reason: e.to_string() })?;

        Ok(Provisioned {
            source: Self::Secure(source),
            origin: Origin::Fallback { requested: kind, reason: error.to_string() },
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> EntropyKind {
        match self {
            Self::Prng(_) => EntropyKind::Prng,
            Self::Csprng(_) => EntropyKind::Csprng,
            Self::Secure(_) => EntropyKind::Secure,
            Self::Blocking(_) => EntropyKind::Blocking,
            Self::Shared(_) => EntropyKind::Shared,
            Self::Nist(_) => EntropyKind::Nist,
        }
    }

    fn as_source(&self) -> &dyn RandomSource {
        match self {
            Self::Prng(source) => source,
            Self::Csprng(source) => source,
            Self::Secure(source) => source,
            Self::Blocking(source) => source,
            Self::Shared(source) => source,
            Self::Nist(source) => source,
        }
    }
}

impl From<SharedBlockingSecureRandom> for EntropySource {
    fn from(shared: SharedBlockingSecureRandom) -> Self {
        Self::Shared(shared)
    }
}

impl fmt::Debug for EntropySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntropySource").field(&self.kind()).finish()
    }
}

impl RandomSource for EntropySource {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        self.as_source().fill_bytes(buffer)
    }

    fn add_entropy(&self, entropy: Entropy<'_>) -> Result<(), EntropyError> {
        self.as_source().add_entropy(entropy)
    }

    fn next_u32(&self) -> Result<u32, EntropyError> {
        self.as_source().next_u32()
    }

    fn next_u64(&self) -> Result<u64, EntropyError> {
        self.as_source().next_u64()
    }
}

/// How a provisioned source came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The requested kind was built
    Requested,
    /// The requested kind failed and [`EntropyKind::Secure`] was built instead
    Fallback {
        /// The kind that was asked for
        requested: EntropyKind,
        /// Why it could not be built
        reason: String,
    },
}

/// Result of [`EntropySource::provision`].
#[derive(Debug)]
pub struct Provisioned {
    /// The source to use
    pub source: EntropySource,
    /// Whether it is the requested source or a fallback
    pub origin: Origin,
}

impl Provisioned {
    /// True when the requested source could not be built.
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback { .. })
    }
}

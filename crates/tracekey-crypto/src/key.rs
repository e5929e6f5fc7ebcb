//! Role-typed key buffers.
//!
//! Every key in the hierarchy is an opaque byte buffer. The role type
//! parameter keeps a matching key seed from being passed where a matching
//! key is expected; moving between roles always goes through
//! [`Key::from_digest`] at an explicit derivation step.

use std::{fmt, marker::PhantomData};

use zeroize::{Zeroize, Zeroizing};

/// SHA-256 output length
pub const HASH_LEN: usize = 32;

/// Secret key length in bytes
pub const SECRET_KEY_LEN: usize = 2048;

/// Broadcast identifier length in bytes
pub const CONTACT_IDENTIFIER_LEN: usize = 16;

mod sealed {
    pub trait Sealed {}
}

/// Role of a key in the hierarchy.
pub trait Role: sealed::Sealed + 'static {
    /// Display name used in `Debug` output
    const NAME: &'static str;
}

macro_rules! role {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {}

        impl sealed::Sealed for $name {}

        impl Role for $name {
            const NAME: &'static str = $label;
        }
    };
}

role!(
    /// Root material of one device identity
    Secret,
    "SecretKey"
);
role!(
    /// Private element of the day chain
    MatchingSeed,
    "MatchingKeySeed"
);
role!(
    /// Day-scoped key shared with the coordinating party
    Matching,
    "MatchingKey"
);
role!(
    /// Private element of a period chain
    ContactSeed,
    "ContactKeySeed"
);
role!(
    /// Period-scoped key, used once to derive an identifier
    Contact,
    "ContactKey"
);
role!(
    /// Material on its way to becoming a broadcast identifier
    Identifier,
    "IdentifierKey"
);

/// Opaque key material with role `R`. Zeroized on drop.
pub struct Key<R: Role> {
    bytes: Zeroizing<Vec<u8>>,
    role: PhantomData<fn() -> R>,
}

/// Root secret, [`SECRET_KEY_LEN`] bytes
pub type SecretKey = Key<Secret>;
/// Day chain seed (never leaves the schedule)
pub type MatchingKeySeed = Key<MatchingSeed>;
/// Per-day matching key
pub type MatchingKey = Key<Matching>;
/// Period chain seed (never leaves the schedule)
pub type ContactKeySeed = Key<ContactSeed>;
/// Per-period contact key
pub type ContactKey = Key<Contact>;

impl<R: Role> Key<R> {
    /// Wrap raw key material.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Zeroizing::new(bytes), role: PhantomData }
    }

    /// Promote a hash output into this role.
    pub fn from_digest(digest: Digest) -> Self {
        Self::from_bytes(digest.as_bytes().to_vec())
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for zero-length material (always rejected by primitives).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<R: Role> Clone for Key<R> {
    fn clone(&self) -> Self {
        Self::from_bytes(self.bytes.to_vec())
    }
}

impl<R: Role> PartialEq for Key<R> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<R: Role> Eq for Key<R> {}

// Key bytes never appear in logs
impl<R: Role> fmt::Debug for Key<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} bytes)", R::NAME, self.bytes.len())
    }
}

/// One SHA-256 output, not yet assigned a role.
pub struct Digest([u8; HASH_LEN]);

impl Digest {
    pub(crate) fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl Drop for Digest {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Digest(..)")
    }
}

/// The 16-byte value broadcast during one period.
///
/// Broadcast in the clear. It is `Copy` and prints as hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactIdentifier([u8; CONTACT_IDENTIFIER_LEN]);

impl ContactIdentifier {
    /// Wrap identifier bytes, e.g. ones received from another device.
    pub fn from_bytes(bytes: [u8; CONTACT_IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes, the payload for the advertisement layer.
    pub fn as_bytes(&self) -> &[u8; CONTACT_IDENTIFIER_LEN] {
        &self.0
    }
}

impl fmt::Display for ContactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContactIdentifier({self})")
    }
}

//! Hash-chain primitives.
//!
//! The three building blocks of every derivation: a one-way hash, a lossy
//! truncation, and a combining XOR. All of them reject malformed input
//! instead of repairing it.

use sha2::{Digest as _, Sha256};

use crate::{
    error::PrimitiveError,
    key::{Digest, HASH_LEN, Key, Role},
};

/// SHA-256 of the key bytes.
///
/// # Errors
///
/// - `PrimitiveError::Empty` if the key has no bytes
pub fn hash<R: Role>(key: &Key<R>) -> Result<Digest, PrimitiveError> {
    if key.is_empty() {
        return Err(PrimitiveError::Empty { operation: "hash" });
    }

    let output = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; HASH_LEN];
    bytes.copy_from_slice(&output);
    Ok(Digest::new(bytes))
}

/// First half of the key.
///
/// Odd lengths round down, so the output is always strictly shorter.
///
/// # Errors
///
/// - `PrimitiveError::Empty` if the key has no bytes
/// - `PrimitiveError::TruncateLength` for a one-byte key
pub fn truncate<R: Role>(key: &Key<R>) -> Result<Key<R>, PrimitiveError> {
    if key.is_empty() {
        return Err(PrimitiveError::Empty { operation: "truncate" });
    }
    truncate_to(key, key.len() / 2)
}

/// First `length` bytes of the key.
///
/// # Errors
///
/// - `PrimitiveError::Empty` if the key has no bytes
/// - `PrimitiveError::TruncateLength` unless `0 < length < key.len()`
pub fn truncate_to<R: Role>(key: &Key<R>, length: usize) -> Result<Key<R>, PrimitiveError> {
    if key.is_empty() {
        return Err(PrimitiveError::Empty { operation: "truncate" });
    }
    if length == 0 || length >= key.len() {
        return Err(PrimitiveError::TruncateLength { length, key_len: key.len() });
    }

    Ok(Key::from_bytes(key.as_bytes()[..length].to_vec()))
}

/// Byte-wise XOR of two equal-length keys.
///
/// # Errors
///
/// - `PrimitiveError::Empty` if either key has no bytes
/// - `PrimitiveError::LengthMismatch` if the lengths differ
pub fn xor<R: Role>(left: &Key<R>, right: &Key<R>) -> Result<Key<R>, PrimitiveError> {
    if left.is_empty() || right.is_empty() {
        return Err(PrimitiveError::Empty { operation: "xor" });
    }
    if left.len() != right.len() {
        return Err(PrimitiveError::LengthMismatch { left: left.len(), right: right.len() });
    }

    let bytes = left.as_bytes().iter().zip(right.as_bytes()).map(|(a, b)| a ^ b).collect();
    Ok(Key::from_bytes(bytes))
}

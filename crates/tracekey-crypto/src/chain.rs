//! Reversed truncated hash chain.
//!
//! Both levels of the hierarchy (days under a secret key, periods under a
//! matching key) are the same construction over different roles:
//!
//! ```text
//!   seed[last] = top
//!   seed[k]    = step(seed[k + 1])            k = last-1 .. -1
//!   key[i]     = hash(seed[i] XOR seed[i-1])  i = 0 ..= last
//! ```
//!
//! Seeds are generated from the end backwards, so a seed for day `i` reveals
//! nothing about seeds after `i`: recovering them would require inverting the
//! truncation.

use crate::{
    error::PrimitiveError,
    key::{Digest, Key, Role},
    primitives::{hash, truncate, xor},
};

/// One backwards step along the seed chain: `hash(truncate(seed))`.
pub fn step<S: Role>(seed: &Key<S>) -> Result<Key<S>, PrimitiveError> {
    let shortened = truncate(seed)?;
    Ok(Key::from_digest(hash(&shortened)?))
}

/// Expand `top` into `last + 1` keys.
///
/// `top` becomes `seed[last]`. Seeds are held as `Key<S>` and are zeroized
/// when this function returns; only the combined keys leave it.
pub fn expand<S: Role, K: Role>(top: Digest, last: usize) -> Result<Box<[Key<K>]>, PrimitiveError> {
    // seed[last] down to seed[-1]
    let mut seeds: Vec<Key<S>> = Vec::with_capacity(last + 2);
    seeds.push(Key::from_digest(top));
    for _ in 0..=last {
        let Some(previous) = seeds.last() else {
            unreachable!("seed chain starts non-empty");
        };
        let next = step(previous)?;
        seeds.push(next);
    }
    seeds.reverse();

    seeds
        .windows(2)
        .map(|pair| -> Result<Key<K>, PrimitiveError> {
            let combined = xor(&pair[1], &pair[0])?;
            Ok(Key::from_digest(hash(&combined)?))
        })
        .collect()
}

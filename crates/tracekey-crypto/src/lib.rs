//! Tracekey Key Schedule
//!
//! Forward-secure derivation of short-lived broadcast identifiers. Pure
//! functions with deterministic outputs; randomness enters only when a
//! secret key is drawn, through a caller-provided
//! [`RandomSource`](tracekey_entropy::RandomSource).
//!
//! # Key Hierarchy
//!
//! ```text
//! Secret Key (2048 random bytes, per device)
//!        │
//!        ▼
//! Reversed hash chain → Matching Keys (one per day, 0..=D)
//!        │
//!        ▼
//! Reversed hash chain → Contact Keys (one per period, 0..=P)
//!        │
//!        ▼
//! hash, truncate to 16 bytes → Contact Identifier
//! ```
//!
//! Contact identifiers are broadcast. A matching key is disclosed to the
//! coordinating party when a day must be matched; it lets that party
//! recompute every identifier of that day and of no other day.
//!
//! # Security
//!
//! Forward Secrecy:
//! - Each chain is generated backwards from its top seed, and every step
//!   truncates before hashing, so a disclosed seed cannot be walked forward
//! - Seeds never leave [`chain::expand`] and are zeroized when it returns
//! - Keys are zeroized on drop and never printed by `Debug`
//!
//! Day Isolation:
//! - A matching key is the hash of two adjacent seeds; disclosing it reveals
//!   no seed and therefore no other day's key
//!
//! Expiry:
//! - A secret key covers `D + 1` days after the epoch. Instants outside that
//!   range fail with [`ScheduleError::DayOutOfRange`] and a new secret key
//!   must be provisioned

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chain;
mod error;
mod key;
mod primitives;
mod schedule;

pub use error::{PrimitiveError, ScheduleError};
pub use key::{
    CONTACT_IDENTIFIER_LEN, Contact, ContactIdentifier, ContactKey, ContactKeySeed, ContactSeed,
    Digest, HASH_LEN, Identifier, Key, Matching, MatchingKey, MatchingKeySeed, MatchingSeed, Role,
    SECRET_KEY_LEN, Secret, SecretKey,
};
pub use primitives::{hash, truncate, truncate_to, xor};
pub use schedule::{
    ContactKeys, DEFAULT_DAYS, DEFAULT_EPOCH_SECS, DEFAULT_PERIODS, DayIndex, KeyArena,
    KeySchedule, MAX_DAYS, MatchingKeys, PeriodIndex, SECONDS_PER_DAY, ScheduleConfig, unix_secs,
};

//! Tracekey Device
//!
//! Everything a device needs around the key schedule: a persisted secret
//! key, a clock, and the per-day caches that turn "now" into the identifier
//! to broadcast.
//!
//! # Lifecycle
//!
//! ```text
//! open ──▶ load stored secret ──or──▶ draw from EntropySource, persist
//!   │
//!   ▼
//! expand matching keys once (secret key dropped)
//!   │
//!   ▼
//! contact_identifier() ── day changed? ──▶ expand that day's contact keys
//!   │
//!   ▼
//! day past the schedule ──▶ DeviceError::requires_new_secret ──▶ rotate
//! ```
//!
//! The store and the clock are traits so tests run against
//! [`MemoryStore`] and [`FixedClock`] while the `tracekey` binary uses
//! [`FileStore`] and [`SystemClock`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod clock;
mod error;
mod identity;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::DeviceError;
pub use identity::{CurrentIdentifier, DeviceIdentity};
pub use store::{FileStore, MemoryStore, SecretKeyStore, StoreError, StoredIdentity};

//! Wall-clock abstraction.
//!
//! Identifiers are selected by wall-clock time, so the identity reads time
//! through [`Clock`]. Production uses [`SystemClock`]; tests pin or advance
//! a [`FixedClock`].

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    ///
    /// Unlike a monotonic clock this may jump backwards (manual adjustment,
    /// NTP correction).
    fn now(&self) -> SystemTime;

    /// Current time as whole Unix seconds, rounded down the same way the
    /// schedule maps instants to days.
    fn unix_secs(&self) -> i64 {
        tracekey_crypto::unix_secs(self.now())
    }
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock.
///
/// Clones share the same time, so a test can hand one to an identity and
/// advance it from outside.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    secs: Arc<AtomicI64>,
}

impl FixedClock {
    /// Clock reading `secs` seconds since the Unix epoch.
    pub fn at_secs(secs: i64) -> Self {
        Self { secs: Arc::new(AtomicI64::new(secs)) }
    }

    /// Jump to `secs`.
    pub fn set_secs(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// Move forward by `by` (whole seconds).
    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        let Ok(_) = self.secs.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |secs| {
            Some(secs.saturating_add(delta))
        }) else {
            unreachable!("update closure always returns Some")
        };
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        let secs = self.secs.load(Ordering::SeqCst);
        let magnitude = Duration::from_secs(secs.unsigned_abs());
        if secs >= 0 { UNIX_EPOCH + magnitude } else { UNIX_EPOCH - magnitude }
    }

    fn unix_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

//! The key schedule: secret key to matching keys to contact keys to
//! broadcast identifiers, plus the mapping from wall-clock time to the
//! day and period that select them.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use tracekey_entropy::RandomSource;
use zeroize::Zeroizing;

use crate::{
    chain,
    error::ScheduleError,
    key::{
        CONTACT_IDENTIFIER_LEN, Contact, ContactIdentifier, ContactKey, ContactSeed, Identifier,
        Key, Matching, MatchingKey, MatchingSeed, Role, SECRET_KEY_LEN, SecretKey,
    },
    primitives::{hash, truncate_to},
};

/// Seconds in one schedule day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// 2020-09-24T00:00:00Z
pub const DEFAULT_EPOCH_SECS: i64 = 1_600_905_600;

/// Days covered by one secret key
pub const DEFAULT_DAYS: u32 = 2000;

/// Periods per day (six minutes each)
pub const DEFAULT_PERIODS: u32 = 240;

/// Longest schedule one secret key may cover (about a century)
pub const MAX_DAYS: u32 = 36_525;

/// Schedule parameters.
///
/// The schedule covers days `0..=days`, each split into `periods` equal
/// periods. All devices that need to agree on identifiers must use the same
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Unix time of day 0, period 0
    pub epoch_secs: i64,
    /// Last day with a matching key
    pub days: u32,
    /// Periods per day
    pub periods: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { epoch_secs: DEFAULT_EPOCH_SECS, days: DEFAULT_DAYS, periods: DEFAULT_PERIODS }
    }
}

impl ScheduleConfig {
    /// Check that the parameters describe a usable schedule.
    ///
    /// `days` is capped at [`MAX_DAYS`]. `periods` must divide a day into
    /// whole seconds, which caps it at one period per second.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.days == 0 {
            return Err(ScheduleError::InvalidConfig { reason: "days must be non-zero".into() });
        }
        if self.days > MAX_DAYS {
            return Err(ScheduleError::InvalidConfig {
                reason: format!("{} days exceeds the maximum of {MAX_DAYS}", self.days),
            });
        }
        if self.periods == 0 {
            return Err(ScheduleError::InvalidConfig {
                reason: "periods must be non-zero".into(),
            });
        }
        if SECONDS_PER_DAY % i64::from(self.periods) != 0 {
            return Err(ScheduleError::InvalidConfig {
                reason: format!("{} periods do not divide a day evenly", self.periods),
            });
        }
        Ok(())
    }

    /// Length of one period in seconds.
    pub fn period_secs(&self) -> i64 {
        SECONDS_PER_DAY / i64::from(self.periods.max(1))
    }
}

/// A day the schedule has a matching key for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayIndex(u32);

impl DayIndex {
    /// Days since epoch.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A period the schedule has a contact key for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodIndex(u32);

impl PeriodIndex {
    /// Periods since the start of the day.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeriodIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable array of derived keys of one role.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyArena<R: Role> {
    keys: Box<[Key<R>]>,
}

/// Matching keys for days `0..=days`, indexed by [`DayIndex`]
pub type MatchingKeys = KeyArena<Matching>;

/// Contact keys for periods `0..=periods`, indexed by [`PeriodIndex`]
pub type ContactKeys = KeyArena<Contact>;

impl<R: Role> KeyArena<R> {
    /// Number of slots.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false for arenas built by a schedule.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Key<R>> {
        self.keys.iter()
    }

    fn slot(&self, index: usize) -> Result<&Key<R>, ScheduleError> {
        self.keys.get(index).ok_or(ScheduleError::IndexOutOfRange { index, len: self.keys.len() })
    }
}

impl KeyArena<Matching> {
    /// Matching key for `day`.
    pub fn get(&self, day: DayIndex) -> Result<&MatchingKey, ScheduleError> {
        self.slot(day.0 as usize)
    }
}

impl KeyArena<Contact> {
    /// Contact key for `period`.
    pub fn get(&self, period: PeriodIndex) -> Result<&ContactKey, ScheduleError> {
        self.slot(period.0 as usize)
    }
}

/// Derives every key of one identity and maps time onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySchedule {
    config: ScheduleConfig,
}

impl KeySchedule {
    /// Create a schedule from validated parameters.
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Schedule parameters.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Draw a fresh [`SECRET_KEY_LEN`]-byte secret key from `source`.
    ///
    /// The bytes are used as drawn. May block if `source` is a blocking
    /// source.
    pub fn secret_key(&self, source: &dyn RandomSource) -> Result<SecretKey, ScheduleError> {
        let mut bytes = Zeroizing::new(vec![0u8; SECRET_KEY_LEN]);
        source.fill_bytes(&mut bytes)?;
        Ok(SecretKey::from_bytes(std::mem::take(&mut *bytes)))
    }

    /// Wrap previously stored secret key bytes.
    ///
    /// # Errors
    ///
    /// - `ScheduleError::SecretKeyLength` unless exactly [`SECRET_KEY_LEN`]
    ///   bytes
    pub fn import_secret_key(&self, bytes: Vec<u8>) -> Result<SecretKey, ScheduleError> {
        let key = SecretKey::from_bytes(bytes);
        if key.len() != SECRET_KEY_LEN {
            return Err(ScheduleError::SecretKeyLength {
                expected: SECRET_KEY_LEN,
                actual: key.len(),
            });
        }
        Ok(key)
    }

    /// Matching keys for every day of the schedule.
    ///
    /// Deterministic in `secret`.
    pub fn matching_keys(&self, secret: &SecretKey) -> Result<MatchingKeys, ScheduleError> {
        if secret.len() != SECRET_KEY_LEN {
            return Err(ScheduleError::SecretKeyLength {
                expected: SECRET_KEY_LEN,
                actual: secret.len(),
            });
        }

        let top = hash(secret)?;
        let keys = chain::expand::<MatchingSeed, Matching>(top, self.config.days as usize)?;
        tracing::debug!(days = self.config.days, "Expanded matching keys");
        Ok(KeyArena { keys })
    }

    /// Contact keys for every period of the day `matching_key` belongs to.
    ///
    /// Deterministic in `matching_key`.
    pub fn contact_keys(&self, matching_key: &MatchingKey) -> Result<ContactKeys, ScheduleError> {
        let top = hash(matching_key)?;
        let keys = chain::expand::<ContactSeed, Contact>(top, self.config.periods as usize)?;
        tracing::debug!(periods = self.config.periods, "Expanded contact keys");
        Ok(KeyArena { keys })
    }

    /// The 16-byte identifier broadcast during the period of `contact_key`.
    pub fn contact_identifier(
        &self,
        contact_key: &ContactKey,
    ) -> Result<ContactIdentifier, ScheduleError> {
        let digest = Key::<Identifier>::from_digest(hash(contact_key)?);
        let truncated = truncate_to(&digest, CONTACT_IDENTIFIER_LEN)?;

        let mut bytes = [0u8; CONTACT_IDENTIFIER_LEN];
        bytes.copy_from_slice(truncated.as_bytes());
        Ok(ContactIdentifier::from_bytes(bytes))
    }

    /// Validate a day offset.
    pub fn day_index(&self, day: i64) -> Result<DayIndex, ScheduleError> {
        match u32::try_from(day) {
            Ok(day) if day <= self.config.days => Ok(DayIndex(day)),
            _ => Err(ScheduleError::DayOutOfRange { day, max: self.config.days }),
        }
    }

    /// Validate a period offset.
    pub fn period_index(&self, period: i64) -> Result<PeriodIndex, ScheduleError> {
        match u32::try_from(period) {
            Ok(period) if period <= self.config.periods => Ok(PeriodIndex(period)),
            _ => Err(ScheduleError::PeriodOutOfRange { period, max: self.config.periods }),
        }
    }

    /// Day containing Unix time `secs`.
    pub fn day_at_secs(&self, secs: i64) -> Result<DayIndex, ScheduleError> {
        let offset = secs.saturating_sub(self.config.epoch_secs);
        self.day_index(offset.div_euclid(SECONDS_PER_DAY))
    }

    /// Period containing Unix time `secs`.
    ///
    /// The day is validated first: a period of a day outside the schedule is
    /// reported as `DayOutOfRange`.
    pub fn period_at_secs(&self, secs: i64) -> Result<PeriodIndex, ScheduleError> {
        self.day_at_secs(secs)?;
        let offset = secs.saturating_sub(self.config.epoch_secs);
        self.period_index(offset.rem_euclid(SECONDS_PER_DAY) / self.config.period_secs())
    }

    /// Day containing `time`.
    pub fn day(&self, time: SystemTime) -> Result<DayIndex, ScheduleError> {
        self.day_at_secs(unix_secs(time))
    }

    /// Period containing `time`.
    pub fn period(&self, time: SystemTime) -> Result<PeriodIndex, ScheduleError> {
        self.period_at_secs(unix_secs(time))
    }
}

/// Whole seconds since the Unix epoch, rounded towards negative infinity.
///
/// Saturates at the ends of `i64`.
pub fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            let before = e.duration();
            let secs = before.as_secs() + u64::from(before.subsec_nanos() > 0);
            i64::try_from(secs).map_or(i64::MIN, |s| -s)
        },
    }
}

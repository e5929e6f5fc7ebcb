//! Fuzz target for the time-to-schedule mapping
//!
//! # Strategy
//!
//! - Arbitrary Unix seconds, including the extremes of `i64`
//! - Arbitrary schedule lengths and period counts
//!
//! # Invariants
//!
//! - Mapping never panics or overflows
//! - A valid config maps every instant to an in-range index or an error
//! - Period lookup never succeeds for a day that fails

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tracekey_crypto::{KeySchedule, ScheduleConfig, ScheduleError};

#[derive(Debug, Clone, Arbitrary)]
struct TimeScenario {
    epoch_secs: i64,
    days: u32,
    periods: u32,
    secs: i64,
}

fuzz_target!(|scenario: TimeScenario| {
    let config = ScheduleConfig {
        epoch_secs: scenario.epoch_secs,
        days: scenario.days,
        periods: scenario.periods,
    };

    // INVARIANT 1: invalid configs are rejected, never panic
    let Ok(schedule) = KeySchedule::new(config) else {
        return;
    };

    match schedule.day_at_secs(scenario.secs) {
        Ok(day) => {
            // INVARIANT 2: days stay within 0..=days
            assert!(day.get() <= config.days);

            let period = schedule.period_at_secs(scenario.secs).expect("day already valid");
            assert!(period.get() < config.periods, "time never maps to the spare period");
        },
        Err(ScheduleError::DayOutOfRange { .. }) => {
            // INVARIANT 3: period lookup fails when the day does
            assert!(schedule.period_at_secs(scenario.secs).is_err());
        },
        Err(e) => panic!("unexpected error: {e}"),
    }
});

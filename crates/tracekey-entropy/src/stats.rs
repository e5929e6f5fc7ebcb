//! Statistical self-tests for entropy sources.
//!
//! These are canaries, not a randomness certification: they catch a broken
//! generator (constant output, a stuck byte, a biased mapping) cheaply enough
//! to run in the test suite or at start-up.

use std::time::Instant;

use crate::{error::EntropyError, source::RandomSource};

/// Byte value frequency counts.
pub type Histogram = [u64; 256];

/// Bytes per draw when sampling a sequence
const SEQUENCE_CHUNK: usize = 256;

/// Histogram of `samples` bytes drawn in 256-byte buffers.
///
/// Tests that the byte sequence as a whole is uniform.
pub fn histogram_of_sequence(
    source: &dyn RandomSource,
    samples: u64,
) -> Result<Histogram, EntropyError> {
    let mut histogram = [0u64; 256];
    let mut buffer = [0u8; SEQUENCE_CHUNK];
    for _ in 0..samples / SEQUENCE_CHUNK as u64 {
        source.fill_bytes(&mut buffer)?;
        for &byte in &buffer {
            histogram[usize::from(byte)] += 1;
        }
    }
    Ok(histogram)
}

/// Histogram of the first byte of `samples` separate one-byte draws.
///
/// Tests that the value at a fixed position is uniform. This assumes
/// independent draws; a source reseeding on its own schedule serves
/// consecutive draws from one stream, so the two histograms measure
/// slightly different things for it.
pub fn histogram_of_value(
    source: &dyn RandomSource,
    samples: u64,
) -> Result<Histogram, EntropyError> {
    let mut histogram = [0u64; 256];
    let mut buffer = [0u8; 1];
    for _ in 0..samples {
        source.fill_bytes(&mut buffer)?;
        histogram[usize::from(buffer[0])] += 1;
    }
    Ok(histogram)
}

/// Mean absolute deviation from the mean bin count, as a fraction of it.
///
/// 0 means perfectly uniform. Empty histograms report 0.
pub fn uniformity_error(histogram: &Histogram) -> f64 {
    let samples: u64 = histogram.iter().sum();
    if samples == 0 {
        return 0.0;
    }

    let mean = samples as f64 / histogram.len() as f64;
    let deviation: f64 =
        histogram.iter().map(|&count| (count as f64 - mean).abs()).sum::<f64>()
            / histogram.len() as f64;
    deviation / mean
}

/// How often `draw` repeats its immediately previous value over `calls`
/// calls.
pub fn consecutive_duplicates<T, F>(calls: usize, mut draw: F) -> Result<usize, EntropyError>
where
    T: PartialEq,
    F: FnMut() -> Result<T, EntropyError>,
{
    let mut duplicates = 0;
    let mut last = draw()?;
    for _ in 0..calls {
        let value = draw()?;
        if value == last {
            duplicates += 1;
        }
        last = value;
    }
    Ok(duplicates)
}

/// Average wall time per call of `draw`, in nanoseconds.
#[allow(clippy::disallowed_methods)]
pub fn nanos_per_call<T, F>(samples: u64, mut draw: F) -> Result<u64, EntropyError>
where
    F: FnMut() -> Result<T, EntropyError>,
{
    if samples == 0 {
        return Ok(0);
    }

    let start = Instant::now();
    for _ in 0..samples {
        draw()?;
    }
    let elapsed = start.elapsed().as_nanos() / u128::from(samples);
    Ok(u64::try_from(elapsed).unwrap_or(u64::MAX))
}

/// Thresholds for [`SelfTest::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfTest {
    /// Bytes sampled for each histogram
    pub samples: u64,
    /// Largest acceptable [`uniformity_error`]
    pub max_uniformity_error: f64,
    /// Consecutive calls checked for repeats
    pub duplicate_calls: usize,
    /// Repeats tolerated before the source is called degenerate
    pub max_duplicates: usize,
}

impl Default for SelfTest {
    fn default() -> Self {
        Self {
            samples: 200_000,
            max_uniformity_error: 0.10,
            duplicate_calls: 1000,
            max_duplicates: 900,
        }
    }
}

/// Measurements from one [`SelfTest::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfTestReport {
    /// Uniformity error of the 256-byte sequence histogram
    pub sequence_error: f64,
    /// Uniformity error of the first-byte histogram
    pub value_error: f64,
    /// Repeats among consecutive `next_u32` values
    pub u32_duplicates: usize,
    /// Repeats among consecutive `next_u64` values
    pub u64_duplicates: usize,
    /// Average `next_u64` cost
    pub nanos_per_u64: u64,
    /// Thresholds the report is judged against
    pub thresholds: SelfTest,
}

impl SelfTestReport {
    /// Whether every measurement is within its threshold.
    pub fn passed(&self) -> bool {
        self.sequence_error < self.thresholds.max_uniformity_error
            && self.value_error < self.thresholds.max_uniformity_error
            && self.u32_duplicates < self.thresholds.max_duplicates
            && self.u64_duplicates < self.thresholds.max_duplicates
    }
}

impl SelfTest {
    /// Sample `source` and measure it against these thresholds.
    pub fn run(&self, source: &dyn RandomSource) -> Result<SelfTestReport, EntropyError> {
        let sequence_error = uniformity_error(&histogram_of_sequence(source, self.samples)?);
        let value_error = uniformity_error(&histogram_of_value(source, self.samples)?);
        let u32_duplicates = consecutive_duplicates(self.duplicate_calls, || source.next_u32())?;
        let u64_duplicates = consecutive_duplicates(self.duplicate_calls, || source.next_u64())?;
        let nanos_per_u64 = nanos_per_call(self.samples, || source.next_u64())?;

        tracing::debug!(
            sequence_error,
            value_error,
            u32_duplicates,
            u64_duplicates,
            nanos_per_u64,
            "Entropy self-test complete"
        );

        Ok(SelfTestReport {
            sequence_error,
            value_error,
            u32_duplicates,
            u64_duplicates,
            nanos_per_u64,
            thresholds: *self,
        })
    }
}

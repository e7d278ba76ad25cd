//! Time ranges used when fetching samples

use std::ops::Range;
use std::time::Duration;

/// Half-open range of media time `[start, end)`
pub type TimeRange = Range<Duration>;

/// Checks whether a sample covering `[time, time + duration)` overlaps `range`.
///
/// Samples without a duration are treated as instants and overlap a range
/// that contains their start time.
pub fn sample_overlaps(range: &TimeRange, time: Duration, duration: Duration) -> bool {
    if duration.is_zero() {
        return range.contains(&time);
    }

    let end = time.saturating_add(duration);
    range.start < end && time < range.end
}

/// Duration covered by `frames` audio frames at `sample_rate`
pub fn frames_duration(frames: u32, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros((frames as u64 * 1_000_000) / sample_rate as u64)
}

/// Scales a wall-clock interval by a playback rate.
///
/// Negative or non-finite rates yield zero; reverse playback is not supported.
pub fn scale_by_rate(delta: Duration, rate: f32) -> Duration {
    if !rate.is_finite() || rate <= 0.0 {
        return Duration::ZERO;
    }
    delta.mul_f64(rate as f64)
}

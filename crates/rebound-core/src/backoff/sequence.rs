//! Precomputed wait sequences for duration-list retry schedules.
//!
//! Every generator returns exactly `retries` durations. With `fast_first`
//! the first entry is zero, so the first retry happens immediately and the
//! progression starts from the second entry.

use std::time::Duration;

/// `retries` copies of `delay`.
///
/// ```rust
/// use rebound_core::backoff::constant;
/// use std::time::Duration;
///
/// let waits = constant(Duration::from_millis(50), 3, true);
/// assert_eq!(waits, vec![Duration::ZERO, Duration::from_millis(50), Duration::from_millis(50)]);
/// ```
pub fn constant(delay: Duration, retries: u32, fast_first: bool) -> Vec<Duration> {
    generate(delay, retries, fast_first, |current| current)
}

/// Waits growing by `initial * factor` each step: `initial`, `initial * (1 + factor)`, ...
///
/// Negative or non-finite factors are treated as zero (constant waits).
pub fn linear(initial: Duration, retries: u32, factor: f64, fast_first: bool) -> Vec<Duration> {
    let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
    let step = initial.as_secs_f64() * factor;
    generate(initial, retries, fast_first, |current| {
        saturating_secs(current.as_secs_f64() + step)
    })
}

/// Waits multiplied by `factor` each step: `initial`, `initial * factor`, ...
///
/// Factors below 1.0 (or non-finite) are treated as 1.0 so waits never shrink.
///
/// ```rust
/// use rebound_core::backoff::exponential;
/// use std::time::Duration;
///
/// let waits = exponential(Duration::from_millis(100), 3, 2.0, false);
/// assert_eq!(
///     waits,
///     vec![Duration::from_millis(100), Duration::from_millis(200), Duration::from_millis(400)]
/// );
/// ```
pub fn exponential(initial: Duration, retries: u32, factor: f64, fast_first: bool) -> Vec<Duration> {
    let factor = if factor.is_finite() { factor.max(1.0) } else { 1.0 };
    generate(initial, retries, fast_first, |current| {
        saturating_secs(current.as_secs_f64() * factor)
    })
}

fn generate<F>(initial: Duration, retries: u32, fast_first: bool, next: F) -> Vec<Duration>
where
    F: Fn(Duration) -> Duration,
{
    let mut waits = Vec::with_capacity(retries as usize);
    if fast_first && retries > 0 {
        waits.push(Duration::ZERO);
    }

    let mut current = initial;
    while waits.len() < retries as usize {
        waits.push(current);
        current = next(current);
    }
    waits
}

/// Seconds to a `Duration`, rounding to the nearest nanosecond.
///
/// Negative and NaN inputs become zero; overflow saturates.
pub(crate) fn saturating_secs(secs: f64) -> Duration {
    Duration::from_nanos((secs * 1e9).round() as u64)
}

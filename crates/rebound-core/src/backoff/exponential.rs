//! Exponential backoff with jitter.

use std::time::Duration;

use super::sequence::saturating_secs;

/// Exponential wait provider with configurable jitter.
///
/// Waits grow as `initial_delay * multiplier^(attempt - 1)` for 1-based
/// retry attempts, capped at `max_delay`. Jitter spreads each wait by up to
/// `±jitter` of its base value so concurrent callers do not retry in lockstep.
///
/// # Mathematical Formula
///
/// For retry attempt `n` (1 = first retry):
/// ```text
/// base_delay = initial_delay * (multiplier ^ (n - 1))
/// jittered   = base_delay + base_delay * jitter * random(-1.0, +1.0)
/// delay      = min(jittered, max_delay)
/// ```
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::ExponentialBackoff;
/// use std::time::Duration;
///
/// // Default configuration (initial=100ms, max=60s, multiplier=2.0, jitter=0.1)
/// let backoff = ExponentialBackoff::default();
/// assert!(backoff.delay(1) <= Duration::from_millis(110));
///
/// // Deterministic configuration
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(0.0)
///     .build();
///
/// assert_eq!(backoff.delay(3), Duration::from_millis(400));
/// assert_eq!(backoff.durations(3).len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Wait before retry number `attempt` (1-based; 0 is treated as 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();

        if !base_delay.is_finite() {
            return self.max_delay;
        }

        let jittered = if self.jitter > 0.0 {
            let jitter_amount = base_delay * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
            base_delay + jitter_amount
        } else {
            base_delay
        };

        saturating_secs(jittered.min(max_secs))
    }

    /// Waits for the first `retries` retry attempts.
    pub fn durations(&self, retries: u32) -> Vec<Duration> {
        (1..=retries).map(|attempt| self.delay(attempt)).collect()
    }

    /// Wait before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on every wait.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor between consecutive waits.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Jitter factor in `[0, 1]`.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl Default for ExponentialBackoff {
    /// Create an exponential backoff with sensible defaults.
    ///
    /// Defaults:
    /// - `initial_delay`: 100ms
    /// - `max_delay`: 60s
    /// - `multiplier`: 2.0 (doubles each time)
    /// - `jitter`: 0.1 (10% randomization)
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(0.1)
///     .build();
/// assert_eq!(backoff.max_delay(), Duration::from_secs(30));
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

impl ExponentialBackoffBuilder {
    /// Set the delay before the first retry.
    ///
    /// Default: 100ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the maximum delay between retries.
    ///
    /// Default: 60s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 means each wait can vary by ±10%.
    ///
    /// Default: 0.1
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        let defaults = ExponentialBackoff::default();
        ExponentialBackoff {
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

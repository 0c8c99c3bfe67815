//! Settings-driven retry configuration.
//!
//! [`RetrySettings`] describes a retry schedule as data so it can live in a
//! configuration file or the environment instead of code. Settings are
//! validated into exactly one [`BackoffPlan`] before any policy is built:
//!
//! ```rust
//! use rebound::config::{BackoffPlan, RetrySettings};
//!
//! let settings = RetrySettings::from_json(r#"{ "delays_ms": [100, 250, 500] }"#).unwrap();
//! assert!(matches!(settings.plan().unwrap(), BackoffPlan::Durations(ref d) if d.len() == 3));
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `REBOUND_MAX_RETRIES` | `max_retries` |
//! | `REBOUND_DELAYS_MS` | `delays_ms` (comma separated) |
//! | `REBOUND_INITIAL_DELAY_MS` | `exponential.initial_delay_ms` |
//! | `REBOUND_MAX_DELAY_MS` | `exponential.max_delay_ms` |
//! | `REBOUND_MULTIPLIER` | `exponential.multiplier` |
//! | `REBOUND_JITTER` | `exponential.jitter` |

use std::str::FromStr;
use std::time::Duration;

use rebound_core::backoff::{ExponentialBackoff, Schedule};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retry schedule described as data.
///
/// All fields are optional. With neither `delays_ms` nor `exponential` set,
/// retries happen immediately; without `max_retries` they are unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// Maximum number of retries; `None` retries until success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Explicit wait before each retry, in milliseconds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delays_ms: Vec<u64>,

    /// Exponential backoff parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponential: Option<ExponentialSettings>,
}

/// Exponential backoff parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExponentialSettings {
    /// Wait before the first retry (default: 100)
    pub initial_delay_ms: u64,
    /// Upper bound on every wait (default: 60000)
    pub max_delay_ms: u64,
    /// Growth factor between waits (default: 2.0)
    pub multiplier: f64,
    /// Random spread in `[0, 1]` (default: 0.1)
    pub jitter: f64,
}

impl Default for ExponentialSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 60_000,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

/// A validated retry schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffPlan {
    /// Retry without waiting; `None` means until success.
    Immediate {
        /// Permitted retries
        retries: Option<u32>,
    },
    /// One retry per listed wait.
    Durations(Vec<Duration>),
    /// Exponentially growing waits; `None` means until success.
    Exponential {
        /// Permitted retries
        retries: Option<u32>,
        /// Wait provider
        backoff: ExponentialBackoff,
    },
}

impl BackoffPlan {
    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        match self {
            BackoffPlan::Immediate { retries } | BackoffPlan::Exponential { retries, .. } => {
                *retries
            }
            BackoffPlan::Durations(delays) => Some(u32::try_from(delays.len()).unwrap_or(u32::MAX)),
        }
    }

    /// Convert into an engine schedule, turning the exponential backoff into
    /// the policy's wait provider type with `provider`.
    pub(crate) fn into_schedule<P, F>(self, provider: F) -> Schedule<P>
    where
        F: FnOnce(ExponentialBackoff) -> P,
    {
        match self {
            BackoffPlan::Immediate { retries: Some(retries) } => Schedule::immediate(retries),
            BackoffPlan::Immediate { retries: None } => Schedule::forever(),
            BackoffPlan::Durations(delays) => Schedule::durations(delays),
            BackoffPlan::Exponential {
                retries: Some(retries),
                backoff,
            } => Schedule::computed(retries, provider(backoff)),
            BackoffPlan::Exponential {
                retries: None,
                backoff,
            } => Schedule::computed_forever(provider(backoff)),
        }
    }
}

impl RetrySettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from `REBOUND_*` environment variables.
    ///
    /// Unset variables leave the field at its default. Any exponential
    /// variable enables exponential backoff with defaults for the rest.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(max_retries) = env_parse::<u32>("REBOUND_MAX_RETRIES")? {
            settings.max_retries = Some(max_retries);
        }

        if let Ok(raw) = std::env::var("REBOUND_DELAYS_MS") {
            settings.delays_ms =
                parse_delay_list(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                    var: "REBOUND_DELAYS_MS",
                    value: raw.clone(),
                })?;
        }

        let initial = env_parse::<u64>("REBOUND_INITIAL_DELAY_MS")?;
        let max = env_parse::<u64>("REBOUND_MAX_DELAY_MS")?;
        let multiplier = env_parse::<f64>("REBOUND_MULTIPLIER")?;
        let jitter = env_parse::<f64>("REBOUND_JITTER")?;

        if initial.is_some() || max.is_some() || multiplier.is_some() || jitter.is_some() {
            let defaults = ExponentialSettings::default();
            settings.exponential = Some(ExponentialSettings {
                initial_delay_ms: initial.unwrap_or(defaults.initial_delay_ms),
                max_delay_ms: max.unwrap_or(defaults.max_delay_ms),
                multiplier: multiplier.unwrap_or(defaults.multiplier),
                jitter: jitter.unwrap_or(defaults.jitter),
            });
        }

        Ok(settings)
    }

    /// Overlay `other` on top of `self`.
    ///
    /// Fields set in `other` win; unset fields keep the value from `self`.
    pub fn merge(mut self, other: RetrySettings) -> Self {
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if !other.delays_ms.is_empty() {
            self.delays_ms = other.delays_ms;
        }
        if other.exponential.is_some() {
            self.exponential = other.exponential;
        }
        self
    }

    /// Check the settings without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.plan().map(|_| ())
    }

    /// Resolve the settings into exactly one schedule.
    pub fn plan(&self) -> Result<BackoffPlan, ConfigError> {
        if !self.delays_ms.is_empty() {
            if self.exponential.is_some() {
                return Err(ConfigError::ConflictingBackoff);
            }
            if let Some(max_retries) = self.max_retries
                && max_retries as usize != self.delays_ms.len()
            {
                return Err(ConfigError::RetryCountMismatch {
                    max_retries,
                    delays: self.delays_ms.len(),
                });
            }
            return Ok(BackoffPlan::Durations(
                self.delays_ms.iter().copied().map(Duration::from_millis).collect(),
            ));
        }

        match &self.exponential {
            Some(exponential) => Ok(BackoffPlan::Exponential {
                retries: self.max_retries,
                backoff: exponential.backoff()?,
            }),
            None => Ok(BackoffPlan::Immediate {
                retries: self.max_retries,
            }),
        }
    }
}

impl ExponentialSettings {
    /// Validate and build the backoff provider.
    pub fn backoff(&self) -> Result<ExponentialBackoff, ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidJitter(self.jitter));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::InvalidDelayBounds {
                initial_ms: self.initial_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }

        Ok(ExponentialBackoff::builder()
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .multiplier(self.multiplier)
            .jitter(self.jitter)
            .build())
    }
}

fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
        Err(_) => Ok(None),
    }
}

fn parse_delay_list(raw: &str) -> Option<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

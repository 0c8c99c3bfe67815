//! Error types for policy execution and settings.
//!
//! Executing a policy never invents errors of its own: the error side of
//! every `execute` is either the fault the action (or fallback substitute)
//! raised, or the fact that the caller cancelled. Building a policy from
//! [`RetrySettings`](crate::config::RetrySettings) is the only fallible
//! construction path and reports [`ConfigError`].

use rebound_core::fault::Fault;
use thiserror::Error;

/// Result type alias for policy execution.
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Why an execution did not produce a value.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The last fault of the execution.
    ///
    /// This is an unhandled fault returned unchanged, the last handled fault
    /// once retries stopped, or the fault raised by a fallback substitute.
    #[error("{0}")]
    Faulted(Fault),

    /// Cancellation was requested before an attempt or during a wait.
    #[error("execution was cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// The fault, unless the execution was cancelled.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ExecutionError::Faulted(fault) => Some(fault),
            ExecutionError::Cancelled => None,
        }
    }

    /// Take the fault, unless the execution was cancelled.
    pub fn into_fault(self) -> Option<Fault> {
        match self {
            ExecutionError::Faulted(fault) => Some(fault),
            ExecutionError::Cancelled => None,
        }
    }

    /// Check if the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled)
    }
}

impl From<Fault> for ExecutionError {
    fn from(fault: Fault) -> Self {
        ExecutionError::Faulted(fault)
    }
}

/// Invalid retry settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Both an explicit delay list and exponential backoff were configured.
    #[error("delays_ms and exponential backoff are mutually exclusive")]
    ConflictingBackoff,

    /// `max_retries` disagrees with the number of listed delays.
    #[error("max_retries is {max_retries} but {delays} delays are listed")]
    RetryCountMismatch {
        /// Configured retry count
        max_retries: u32,
        /// Number of listed delays
        delays: usize,
    },

    /// Exponential multiplier below 1.0 or not finite.
    #[error("Invalid backoff multiplier {0}: must be finite and at least 1.0")]
    InvalidMultiplier(f64),

    /// Jitter outside `[0, 1]`.
    #[error("Invalid jitter {0}: must be between 0.0 and 1.0")]
    InvalidJitter(f64),

    /// Maximum delay shorter than the initial delay.
    #[error("max_delay_ms ({max_ms}) is shorter than initial_delay_ms ({initial_ms})")]
    InvalidDelayBounds {
        /// Initial delay in milliseconds
        initial_ms: u64,
        /// Maximum delay in milliseconds
        max_ms: u64,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// Settings document could not be deserialized.
    #[error("Failed to parse retry settings: {0}")]
    Parse(#[from] serde_json::Error),
}

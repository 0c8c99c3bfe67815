//! # rebound
//!
//! Declarative resilience policies for Rust:
//! - Retry with immediate, listed, computed or exponential waits
//! - Retry until success, with a callback that can stop early or change the wait
//! - Single-shot fallback substitution
//! - Fault matching by type, by predicate, and through wrapped causes or aggregates
//! - Result matching, so "returned a bad value" is handled like a fault
//! - Blocking and async execution with cooperative cancellation
//!
//! ## Quick Start
//!
//! ```rust
//! use rebound::{Fault, Policy};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("request timed out")]
//! struct Timeout;
//!
//! let policy = Policy::handle_fault::<Timeout>()
//!     .wait_and_retry_durations([Duration::from_millis(1), Duration::from_millis(2)]);
//!
//! let mut attempts = 0;
//! let body = policy
//!     .execute(|| {
//!         attempts += 1;
//!         if attempts < 3 { Err(Fault::new(Timeout)) } else { Ok("ok") }
//!     })
//!     .unwrap();
//!
//! assert_eq!(body, "ok");
//! assert_eq!(attempts, 3);
//! ```
//!
//! ## Async
//!
//! ```rust
//! use rebound::{CancellationToken, ExecutionError, Fault, Policy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = Policy::handle_all_faults().retry_until_succeeds_async();
//!
//! let token = CancellationToken::new();
//! token.cancel();
//!
//! let result: Result<(), _> = policy
//!     .execute_cancellable(|_token| async { Err(Fault::msg("unreachable")) }, token)
//!     .await;
//! assert!(matches!(result, Err(ExecutionError::Cancelled)));
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use builder::{Policy, PolicyBuilder, ResultPolicyBuilder};
pub use config::RetrySettings;
pub use engine::RetryDecision;
pub use error::{ConfigError, ExecutionError, Result};
pub use policy::{
    AsyncFallbackPolicy, AsyncResultFallbackPolicy, AsyncResultRetryPolicy, AsyncRetryPolicy,
    FallbackPolicy, IntoRetryDecision, ResultFallbackPolicy, ResultRetryPolicy, RetryPolicy,
};

// Module declarations
pub mod builder;
pub mod config;
pub mod error;
pub mod observability;
pub mod policy;

mod engine;

// Re-export core types for convenience
pub use rebound_core::backoff;
pub use rebound_core::classify;
pub use rebound_core::fault::{AggregateError, Fault};
pub use rebound_core::outcome::Outcome;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use rebound::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AsyncFallbackPolicy, AsyncResultFallbackPolicy, AsyncResultRetryPolicy, AsyncRetryPolicy,
        CancellationToken, ExecutionError, FallbackPolicy, Fault, Outcome, Policy,
        ResultFallbackPolicy, ResultRetryPolicy, RetryDecision, RetryPolicy, RetrySettings,
        backoff::ExponentialBackoff,
    };
}

/// Crate version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

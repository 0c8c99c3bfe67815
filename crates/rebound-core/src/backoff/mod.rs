//! Retry schedules and backoff computations.
//!
//! This module provides the [`Schedule`] that fixes a policy's retry budget
//! and wait resolution, an [`ExponentialBackoff`] wait provider with jitter,
//! and generators for precomputed wait sequences.
//!
//! # Key Types
//!
//! - [`Schedule`] - Retry budget plus one of the mutually exclusive wait strategies
//! - [`ExponentialBackoff`] - Exponential waits with jitter, capped at a maximum
//!
//! # Examples
//!
//! ```rust
//! use rebound_core::backoff::{exponential, ExponentialBackoff, Schedule};
//! use std::time::Duration;
//!
//! // A fixed list of waits
//! let listed: Schedule<()> = Schedule::durations(exponential(Duration::from_millis(50), 4, 2.0, true));
//! assert_eq!(listed.permitted_retries(), Some(4));
//!
//! // Waits computed per attempt
//! let backoff = ExponentialBackoff::builder().jitter(0.0).build();
//! let computed = Schedule::computed(5, backoff);
//! assert_eq!(computed.resolve(2, |b| b.delay(2)), Duration::from_millis(200));
//! ```

mod exponential;
mod schedule;
mod sequence;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use schedule::Schedule;
pub use sequence::{constant, exponential, linear};

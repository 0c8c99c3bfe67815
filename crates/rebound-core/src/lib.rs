#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core building blocks for the rebound resilience policies.
//!
//! This crate holds the pieces every policy shares, independent of how a
//! policy is executed:
//!
//! - **Faults** via [`Fault`]: an owned error tree with causes and aggregates
//! - **Outcomes** via [`Outcome`]: the value-or-fault result of one attempt
//! - **Classification** via [`FaultPredicates`] and [`ResultPredicates`]
//!   - ordered fault matching, first match wins
//!   - nested matching through cause chains and aggregate branches
//! - **Backoff** via [`Schedule`] and [`ExponentialBackoff`]
//!
//! [`Fault`]: fault::Fault
//! [`Outcome`]: outcome::Outcome
//! [`FaultPredicates`]: classify::FaultPredicates
//! [`ResultPredicates`]: classify::ResultPredicates
//! [`Schedule`]: backoff::Schedule
//! [`ExponentialBackoff`]: backoff::ExponentialBackoff
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use rebound_core::prelude::*;
//!
//! let predicates = FaultPredicates::new().with(any_fault());
//! let outcome: Outcome<u32> = Outcome::Faulted(Fault::msg("connection reset"));
//!
//! assert!(predicates.classify(outcome).is_handled());
//! ```

pub mod backoff;
pub mod classify;
pub mod fault;
pub mod outcome;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use rebound_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backoff::{ExponentialBackoff, ExponentialBackoffBuilder, Schedule};
    pub use crate::classify::{
        Classified, Classify, FaultPredicate, FaultPredicates, OutcomePredicates,
        ResultPredicate, ResultPredicates, any_fault, fault_of, fault_where, nested_fault_of,
        nested_fault_where,
    };
    pub use crate::fault::{AggregateError, Fault};
    pub use crate::outcome::Outcome;
}

#[cfg(test)]
mod property_tests;

//! Executable policy façades.
//!
//! A façade is the frozen result of a builder terminal call: predicates,
//! schedule and callbacks behind one `Arc`, so cloning is cheap and a single
//! policy can serve any number of concurrent executions.
//!
//! | | blocking | async |
//! |---|---|---|
//! | retry, faults only | [`RetryPolicy`] | [`AsyncRetryPolicy`] |
//! | retry, typed | [`ResultRetryPolicy`] | [`AsyncResultRetryPolicy`] |
//! | fallback, faults only | [`FallbackPolicy`] | [`AsyncFallbackPolicy`] |
//! | fallback, typed | [`ResultFallbackPolicy`] | [`AsyncResultFallbackPolicy`] |
//!
//! Fault-only retry façades accept actions of any return type. Fault-only
//! fallback façades only wrap `()` actions, since there is no value type to
//! substitute; typed façades are fixed to the `R` they were built for.

mod fallback;
mod retry;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

pub use crate::engine::RetryDecision;
pub use fallback::{
    AsyncFallbackPolicy, AsyncResultFallbackPolicy, FallbackPolicy, ResultFallbackPolicy,
};
pub use retry::{AsyncResultRetryPolicy, AsyncRetryPolicy, ResultRetryPolicy, RetryPolicy};

pub(crate) use fallback::FallbackConfig;
pub(crate) use retry::RetryConfig;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Retry callback of typed policies: `(outcome, wait, attempt)`.
pub type OnRetry<R> = Arc<dyn Fn(&Outcome<R>, Duration, u32) -> Option<RetryDecision> + Send + Sync>;

/// Retry callback of fault-only policies: `(fault, wait, attempt)`.
pub type OnFaultRetry = Arc<dyn Fn(&Fault, Duration, u32) -> Option<RetryDecision> + Send + Sync>;

/// Wait provider of typed policies: `(attempt, outcome) -> wait`.
pub type WaitProvider<R> = Arc<dyn Fn(u32, &Outcome<R>) -> Duration + Send + Sync>;

/// Wait provider of fault-only policies: `(attempt, fault) -> wait`.
pub type FaultWaitProvider = Arc<dyn Fn(u32, &Fault) -> Duration + Send + Sync>;

/// Fallback notification of typed policies.
pub type OnFallback<R> = Arc<dyn Fn(&Outcome<R>) + Send + Sync>;

/// Fallback notification of fault-only policies.
pub type OnFaultFallback = Arc<dyn Fn(&Fault) + Send + Sync>;

pub(crate) type Substitute<R> =
    Arc<dyn Fn(Outcome<R>, &CancellationToken) -> Result<R, Fault> + Send + Sync>;
pub(crate) type AsyncSubstitute<R> =
    Arc<dyn Fn(Outcome<R>, CancellationToken) -> BoxFuture<Result<R, Fault>> + Send + Sync>;
pub(crate) type FaultSubstitute =
    Arc<dyn Fn(Fault, &CancellationToken) -> Result<(), Fault> + Send + Sync>;
pub(crate) type AsyncFaultSubstitute =
    Arc<dyn Fn(Fault, CancellationToken) -> BoxFuture<Result<(), Fault>> + Send + Sync>;

/// Return types accepted from retry callbacks.
///
/// A callback that only observes retries returns `()`; one that wants to
/// stop early or change the wait returns a [`RetryDecision`] (or an
/// `Option` of one).
pub trait IntoRetryDecision {
    /// `None` keeps the scheduled behaviour.
    fn into_retry_decision(self) -> Option<RetryDecision>;
}

impl IntoRetryDecision for () {
    fn into_retry_decision(self) -> Option<RetryDecision> {
        None
    }
}

impl IntoRetryDecision for RetryDecision {
    fn into_retry_decision(self) -> Option<RetryDecision> {
        Some(self)
    }
}

impl IntoRetryDecision for Option<RetryDecision> {
    fn into_retry_decision(self) -> Option<RetryDecision> {
        self
    }
}

/// Adapt an async action that ignores cancellation.
pub(crate) fn ignore_token<A, Fut>(mut action: A) -> impl FnMut(CancellationToken) -> Fut
where
    A: FnMut() -> Fut,
{
    move |_| action()
}

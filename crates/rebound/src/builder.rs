//! Policy builders.
//!
//! Every policy starts at one of the [`Policy`] entry points, collects more
//! predicates through chained `handle_*` calls and ends with exactly one
//! terminal call that freezes it into a façade:
//!
//! ```rust
//! use rebound::{Fault, Policy};
//! use std::io;
//! use std::time::Duration;
//!
//! let policy = Policy::handle_fault::<io::Error>()
//!     .handle_nested_fault::<io::Error>()
//!     .wait_and_retry_with(
//!         3,
//!         |attempt, _fault| Duration::from_millis(u64::from(attempt)),
//!         |fault, wait, attempt| eprintln!("retry {attempt} in {wait:?}: {fault}"),
//!     );
//!
//! let result: Result<(), _> = policy.execute(|| Err(io::Error::other("reset").into()));
//! assert!(result.is_err());
//! ```
//!
//! [`PolicyBuilder`] only handles faults and produces fault-only façades
//! whose callbacks receive the [`Fault`]. Registering a result predicate, or
//! calling [`PolicyBuilder::returning`], switches to [`ResultPolicyBuilder`],
//! which produces façades typed to `R` whose callbacks receive the whole
//! [`Outcome`].

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rebound_core::backoff::{ExponentialBackoff, Schedule};
use rebound_core::classify::{
    FaultPredicates, OutcomePredicates, ResultPredicates, any_fault, fault_of, fault_where,
    nested_fault_of, nested_fault_where, result_eq, result_where,
};
use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

use crate::config::RetrySettings;
use crate::error::ConfigError;
use crate::policy::{
    AsyncFallbackPolicy, AsyncFaultSubstitute, AsyncResultFallbackPolicy, AsyncResultRetryPolicy,
    AsyncRetryPolicy, AsyncSubstitute, BoxFuture, FallbackConfig, FallbackPolicy,
    FaultSubstitute, FaultWaitProvider, IntoRetryDecision, OnFallback, OnFaultFallback,
    OnFaultRetry, OnRetry, ResultFallbackPolicy, ResultRetryPolicy, RetryConfig, RetryPolicy,
    Substitute, WaitProvider,
};

/// Entry points for building policies.
#[derive(Debug, Clone, Copy)]
pub struct Policy;

impl Policy {
    /// Handle every fault.
    pub fn handle_all_faults() -> PolicyBuilder {
        PolicyBuilder::default().handle_all_faults()
    }

    /// Handle faults whose own error is `E`.
    pub fn handle_fault<E>() -> PolicyBuilder
    where
        E: StdError + 'static,
    {
        PolicyBuilder::default().handle_fault::<E>()
    }

    /// Handle faults whose own error is `E` and satisfies `predicate`.
    pub fn handle_fault_where<E, P>(predicate: P) -> PolicyBuilder
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        PolicyBuilder::default().handle_fault_where(predicate)
    }

    /// Handle an `E` found anywhere in the raised fault's causes or aggregate branches.
    pub fn handle_nested_fault<E>() -> PolicyBuilder
    where
        E: StdError + 'static,
    {
        PolicyBuilder::default().handle_nested_fault::<E>()
    }

    /// Handle a nested `E` satisfying `predicate`.
    pub fn handle_nested_fault_where<E, P>(predicate: P) -> PolicyBuilder
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        PolicyBuilder::default().handle_nested_fault_where(predicate)
    }

    /// Handle returned values satisfying `predicate`.
    pub fn handle_result<R, P>(predicate: P) -> ResultPolicyBuilder<R>
    where
        R: 'static,
        P: Fn(&R) -> bool + Send + Sync + 'static,
    {
        ResultPolicyBuilder::default().handle_result(predicate)
    }

    /// Handle returned values equal to `value`.
    pub fn handle_result_value<R>(value: R) -> ResultPolicyBuilder<R>
    where
        R: PartialEq + Send + Sync + 'static,
    {
        ResultPolicyBuilder::default().handle_result_value(value)
    }

    /// A typed builder with no predicates yet.
    pub fn for_result<R: 'static>() -> ResultPolicyBuilder<R> {
        ResultPolicyBuilder::default()
    }
}

/// Accumulates fault predicates until a terminal call.
#[derive(Debug, Default)]
#[must_use = "a policy builder does nothing until a terminal call"]
pub struct PolicyBuilder {
    faults: FaultPredicates,
}

impl PolicyBuilder {
    /// Also handle every fault.
    pub fn handle_all_faults(mut self) -> Self {
        self.faults.push(any_fault());
        self
    }

    /// Also handle faults whose own error is `E`.
    pub fn handle_fault<E>(mut self) -> Self
    where
        E: StdError + 'static,
    {
        self.faults.push(fault_of::<E>());
        self
    }

    /// Also handle faults whose own error is `E` and satisfies `predicate`.
    pub fn handle_fault_where<E, P>(mut self, predicate: P) -> Self
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.faults.push(fault_where(predicate));
        self
    }

    /// Also handle a nested `E`.
    pub fn handle_nested_fault<E>(mut self) -> Self
    where
        E: StdError + 'static,
    {
        self.faults.push(nested_fault_of::<E>());
        self
    }

    /// Also handle a nested `E` satisfying `predicate`.
    pub fn handle_nested_fault_where<E, P>(mut self, predicate: P) -> Self
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.faults.push(nested_fault_where(predicate));
        self
    }

    /// Also handle returned values satisfying `predicate`.
    pub fn handle_result<R, P>(self, predicate: P) -> ResultPolicyBuilder<R>
    where
        R: 'static,
        P: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.returning::<R>().handle_result(predicate)
    }

    /// Also handle returned values equal to `value`.
    pub fn handle_result_value<R>(self, value: R) -> ResultPolicyBuilder<R>
    where
        R: PartialEq + Send + Sync + 'static,
    {
        self.returning::<R>().handle_result_value(value)
    }

    /// Type the policy to actions returning `R`, keeping the fault predicates.
    ///
    /// Needed for value-substituting fallbacks and for callbacks that want the
    /// full [`Outcome`].
    pub fn returning<R: 'static>(self) -> ResultPolicyBuilder<R> {
        ResultPolicyBuilder {
            predicates: OutcomePredicates::new(self.faults, ResultPredicates::new()),
        }
    }

    fn freeze(self, schedule: Schedule<FaultWaitProvider>, on_retry: Option<OnFaultRetry>) -> RetryPolicy {
        RetryPolicy::from_config(RetryConfig::new(self.faults, schedule, on_retry))
    }

    /// Retry up to `count` times without waiting.
    ///
    /// `retry(0)` runs the action once and never retries.
    pub fn retry(self, count: u32) -> RetryPolicy {
        self.freeze(Schedule::immediate(count), None)
    }

    /// Retry up to `count` times without waiting, calling `on_retry` before each retry.
    pub fn retry_with<F, D>(self, count: u32, on_retry: F) -> RetryPolicy
    where
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::immediate(count), Some(fault_callback(on_retry)))
    }

    /// Retry without waiting until the action succeeds.
    pub fn retry_until_succeeds(self) -> RetryPolicy {
        self.freeze(Schedule::forever(), None)
    }

    /// Retry without waiting until the action succeeds, calling `on_retry` before each retry.
    pub fn retry_until_succeeds_with<F, D>(self, on_retry: F) -> RetryPolicy
    where
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::forever(), Some(fault_callback(on_retry)))
    }

    /// Retry up to `count` times, waiting `backoff(attempt, fault)` first.
    pub fn wait_and_retry<B>(self, count: u32, backoff: B) -> RetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
    {
        self.freeze(Schedule::computed(count, fault_wait(backoff)), None)
    }

    /// [`wait_and_retry`](Self::wait_and_retry) with a retry callback.
    pub fn wait_and_retry_with<B, F, D>(self, count: u32, backoff: B, on_retry: F) -> RetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(
            Schedule::computed(count, fault_wait(backoff)),
            Some(fault_callback(on_retry)),
        )
    }

    /// Retry once per duration, waiting that long first.
    pub fn wait_and_retry_durations<I>(self, durations: I) -> RetryPolicy
    where
        I: IntoIterator<Item = Duration>,
    {
        self.freeze(Schedule::durations(durations), None)
    }

    /// [`wait_and_retry_durations`](Self::wait_and_retry_durations) with a retry callback.
    pub fn wait_and_retry_durations_with<I, F, D>(self, durations: I, on_retry: F) -> RetryPolicy
    where
        I: IntoIterator<Item = Duration>,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::durations(durations), Some(fault_callback(on_retry)))
    }

    /// Retry until the action succeeds, waiting `backoff(attempt, fault)` first.
    pub fn wait_and_retry_until_succeeds<B>(self, backoff: B) -> RetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
    {
        self.freeze(Schedule::computed_forever(fault_wait(backoff)), None)
    }

    /// [`wait_and_retry_until_succeeds`](Self::wait_and_retry_until_succeeds) with a retry callback.
    pub fn wait_and_retry_until_succeeds_with<B, F, D>(self, backoff: B, on_retry: F) -> RetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(
            Schedule::computed_forever(fault_wait(backoff)),
            Some(fault_callback(on_retry)),
        )
    }

    /// Retry as described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the settings do not describe exactly one
    /// valid schedule.
    pub fn retry_from_settings(self, settings: &RetrySettings) -> Result<RetryPolicy, ConfigError> {
        let schedule = settings.plan()?.into_schedule(|backoff: ExponentialBackoff| {
            Arc::new(move |attempt: u32, _: &Fault| backoff.delay(attempt)) as FaultWaitProvider
        });
        Ok(self.freeze(schedule, None))
    }

    /// Async [`retry`](Self::retry).
    pub fn retry_async(self, count: u32) -> AsyncRetryPolicy {
        self.retry(count).to_async()
    }

    /// Async [`retry_with`](Self::retry_with).
    pub fn retry_with_async<F, D>(self, count: u32, on_retry: F) -> AsyncRetryPolicy
    where
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.retry_with(count, on_retry).to_async()
    }

    /// Async [`retry_until_succeeds`](Self::retry_until_succeeds).
    pub fn retry_until_succeeds_async(self) -> AsyncRetryPolicy {
        self.retry_until_succeeds().to_async()
    }

    /// Async [`retry_until_succeeds_with`](Self::retry_until_succeeds_with).
    pub fn retry_until_succeeds_with_async<F, D>(self, on_retry: F) -> AsyncRetryPolicy
    where
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.retry_until_succeeds_with(on_retry).to_async()
    }

    /// Async [`wait_and_retry`](Self::wait_and_retry).
    pub fn wait_and_retry_async<B>(self, count: u32, backoff: B) -> AsyncRetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
    {
        self.wait_and_retry(count, backoff).to_async()
    }

    /// Async [`wait_and_retry_with`](Self::wait_and_retry_with).
    pub fn wait_and_retry_with_async<B, F, D>(
        self,
        count: u32,
        backoff: B,
        on_retry: F,
    ) -> AsyncRetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_with(count, backoff, on_retry).to_async()
    }

    /// Async [`wait_and_retry_durations`](Self::wait_and_retry_durations).
    pub fn wait_and_retry_durations_async<I>(self, durations: I) -> AsyncRetryPolicy
    where
        I: IntoIterator<Item = Duration>,
    {
        self.wait_and_retry_durations(durations).to_async()
    }

    /// Async [`wait_and_retry_durations_with`](Self::wait_and_retry_durations_with).
    pub fn wait_and_retry_durations_with_async<I, F, D>(
        self,
        durations: I,
        on_retry: F,
    ) -> AsyncRetryPolicy
    where
        I: IntoIterator<Item = Duration>,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_durations_with(durations, on_retry).to_async()
    }

    /// Async [`wait_and_retry_until_succeeds`](Self::wait_and_retry_until_succeeds).
    pub fn wait_and_retry_until_succeeds_async<B>(self, backoff: B) -> AsyncRetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
    {
        self.wait_and_retry_until_succeeds(backoff).to_async()
    }

    /// Async [`wait_and_retry_until_succeeds_with`](Self::wait_and_retry_until_succeeds_with).
    pub fn wait_and_retry_until_succeeds_with_async<B, F, D>(
        self,
        backoff: B,
        on_retry: F,
    ) -> AsyncRetryPolicy
    where
        B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
        F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_until_succeeds_with(backoff, on_retry)
            .to_async()
    }

    /// Async [`retry_from_settings`](Self::retry_from_settings).
    pub fn retry_from_settings_async(
        self,
        settings: &RetrySettings,
    ) -> Result<AsyncRetryPolicy, ConfigError> {
        Ok(self.retry_from_settings(settings)?.to_async())
    }

    /// On a handled fault call `on_fallback`, then return what `substitute` produces.
    pub fn fallback<S, N>(self, substitute: S, on_fallback: N) -> FallbackPolicy
    where
        S: Fn(Fault, &CancellationToken) -> Result<(), Fault> + Send + Sync + 'static,
        N: Fn(&Fault) + Send + Sync + 'static,
    {
        FallbackPolicy::from_config(FallbackConfig::new(
            self.faults,
            Arc::new(on_fallback) as OnFaultFallback,
            Arc::new(substitute) as FaultSubstitute,
        ))
    }

    /// Async [`fallback`](Self::fallback).
    pub fn fallback_async<S, Fut, N>(self, substitute: S, on_fallback: N) -> AsyncFallbackPolicy
    where
        S: Fn(Fault, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Fault>> + Send + 'static,
        N: Fn(&Fault) + Send + Sync + 'static,
    {
        let substitute: AsyncFaultSubstitute =
            Arc::new(move |fault: Fault, token: CancellationToken| -> BoxFuture<Result<(), Fault>> {
                Box::pin(substitute(fault, token))
            });
        AsyncFallbackPolicy::from_config(FallbackConfig::new(
            self.faults,
            Arc::new(on_fallback) as OnFaultFallback,
            substitute,
        ))
    }
}

fn fault_callback<F, D>(on_retry: F) -> OnFaultRetry
where
    F: Fn(&Fault, Duration, u32) -> D + Send + Sync + 'static,
    D: IntoRetryDecision,
{
    Arc::new(move |fault: &Fault, wait: Duration, attempt: u32| {
        on_retry(fault, wait, attempt).into_retry_decision()
    })
}

fn fault_wait<B>(backoff: B) -> FaultWaitProvider
where
    B: Fn(u32, &Fault) -> Duration + Send + Sync + 'static,
{
    Arc::new(backoff)
}

fn outcome_wait<R, B>(backoff: B) -> WaitProvider<R>
where
    R: 'static,
    B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
{
    Arc::new(backoff)
}

fn outcome_callback<R, F, D>(on_retry: F) -> OnRetry<R>
where
    R: 'static,
    F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
    D: IntoRetryDecision,
{
    Arc::new(move |outcome: &Outcome<R>, wait: Duration, attempt: u32| {
        on_retry(outcome, wait, attempt).into_retry_decision()
    })
}

/// Accumulates fault and result predicates for actions returning `R`.
#[must_use = "a policy builder does nothing until a terminal call"]
pub struct ResultPolicyBuilder<R> {
    predicates: OutcomePredicates<R>,
}

impl<R> Default for ResultPolicyBuilder<R> {
    fn default() -> Self {
        Self {
            predicates: OutcomePredicates::default(),
        }
    }
}

impl<R> fmt::Debug for ResultPolicyBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultPolicyBuilder")
            .field("predicates", &self.predicates)
            .finish()
    }
}

impl<R: 'static> ResultPolicyBuilder<R> {
    /// Also handle every fault.
    pub fn handle_all_faults(mut self) -> Self {
        self.predicates.faults.push(any_fault());
        self
    }

    /// Also handle faults whose own error is `E`.
    pub fn handle_fault<E>(mut self) -> Self
    where
        E: StdError + 'static,
    {
        self.predicates.faults.push(fault_of::<E>());
        self
    }

    /// Also handle faults whose own error is `E` and satisfies `predicate`.
    pub fn handle_fault_where<E, P>(mut self, predicate: P) -> Self
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicates.faults.push(fault_where(predicate));
        self
    }

    /// Also handle a nested `E`.
    pub fn handle_nested_fault<E>(mut self) -> Self
    where
        E: StdError + 'static,
    {
        self.predicates.faults.push(nested_fault_of::<E>());
        self
    }

    /// Also handle a nested `E` satisfying `predicate`.
    pub fn handle_nested_fault_where<E, P>(mut self, predicate: P) -> Self
    where
        E: StdError + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicates.faults.push(nested_fault_where(predicate));
        self
    }

    /// Also handle returned values satisfying `predicate`.
    pub fn handle_result<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.predicates.results.push(result_where(predicate));
        self
    }

    /// Also handle returned values equal to `value`.
    pub fn handle_result_value(mut self, value: R) -> Self
    where
        R: PartialEq + Send + Sync,
    {
        self.predicates.results.push(result_eq(value));
        self
    }

    fn freeze(self, schedule: Schedule<WaitProvider<R>>, on_retry: Option<OnRetry<R>>) -> ResultRetryPolicy<R> {
        ResultRetryPolicy::from_config(RetryConfig::new(self.predicates, schedule, on_retry))
    }

    /// Retry up to `count` times without waiting.
    pub fn retry(self, count: u32) -> ResultRetryPolicy<R> {
        self.freeze(Schedule::immediate(count), None)
    }

    /// Retry up to `count` times without waiting, calling `on_retry` before each retry.
    pub fn retry_with<F, D>(self, count: u32, on_retry: F) -> ResultRetryPolicy<R>
    where
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::immediate(count), Some(outcome_callback(on_retry)))
    }

    /// Retry without waiting until the outcome is no longer handled.
    pub fn retry_until_succeeds(self) -> ResultRetryPolicy<R> {
        self.freeze(Schedule::forever(), None)
    }

    /// [`retry_until_succeeds`](Self::retry_until_succeeds) with a retry callback.
    pub fn retry_until_succeeds_with<F, D>(self, on_retry: F) -> ResultRetryPolicy<R>
    where
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::forever(), Some(outcome_callback(on_retry)))
    }

    /// Retry up to `count` times, waiting `backoff(attempt, outcome)` first.
    pub fn wait_and_retry<B>(self, count: u32, backoff: B) -> ResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
    {
        self.freeze(Schedule::computed(count, outcome_wait(backoff)), None)
    }

    /// [`wait_and_retry`](Self::wait_and_retry) with a retry callback.
    pub fn wait_and_retry_with<B, F, D>(
        self,
        count: u32,
        backoff: B,
        on_retry: F,
    ) -> ResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(
            Schedule::computed(count, outcome_wait(backoff)),
            Some(outcome_callback(on_retry)),
        )
    }

    /// Retry once per duration, waiting that long first.
    pub fn wait_and_retry_durations<I>(self, durations: I) -> ResultRetryPolicy<R>
    where
        I: IntoIterator<Item = Duration>,
    {
        self.freeze(Schedule::durations(durations), None)
    }

    /// [`wait_and_retry_durations`](Self::wait_and_retry_durations) with a retry callback.
    pub fn wait_and_retry_durations_with<I, F, D>(
        self,
        durations: I,
        on_retry: F,
    ) -> ResultRetryPolicy<R>
    where
        I: IntoIterator<Item = Duration>,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(Schedule::durations(durations), Some(outcome_callback(on_retry)))
    }

    /// Retry until the outcome is no longer handled, waiting `backoff(attempt, outcome)` first.
    pub fn wait_and_retry_until_succeeds<B>(self, backoff: B) -> ResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
    {
        self.freeze(Schedule::computed_forever(outcome_wait(backoff)), None)
    }

    /// [`wait_and_retry_until_succeeds`](Self::wait_and_retry_until_succeeds) with a retry callback.
    pub fn wait_and_retry_until_succeeds_with<B, F, D>(
        self,
        backoff: B,
        on_retry: F,
    ) -> ResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.freeze(
            Schedule::computed_forever(outcome_wait(backoff)),
            Some(outcome_callback(on_retry)),
        )
    }

    /// Retry as described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the settings do not describe exactly one
    /// valid schedule.
    pub fn retry_from_settings(
        self,
        settings: &RetrySettings,
    ) -> Result<ResultRetryPolicy<R>, ConfigError> {
        let schedule = settings.plan()?.into_schedule(|backoff: ExponentialBackoff| {
            Arc::new(move |attempt: u32, _: &Outcome<R>| backoff.delay(attempt)) as WaitProvider<R>
        });
        Ok(self.freeze(schedule, None))
    }

    /// Async [`retry`](Self::retry).
    pub fn retry_async(self, count: u32) -> AsyncResultRetryPolicy<R> {
        self.retry(count).to_async()
    }

    /// Async [`retry_with`](Self::retry_with).
    pub fn retry_with_async<F, D>(self, count: u32, on_retry: F) -> AsyncResultRetryPolicy<R>
    where
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.retry_with(count, on_retry).to_async()
    }

    /// Async [`retry_until_succeeds`](Self::retry_until_succeeds).
    pub fn retry_until_succeeds_async(self) -> AsyncResultRetryPolicy<R> {
        self.retry_until_succeeds().to_async()
    }

    /// Async [`retry_until_succeeds_with`](Self::retry_until_succeeds_with).
    pub fn retry_until_succeeds_with_async<F, D>(self, on_retry: F) -> AsyncResultRetryPolicy<R>
    where
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.retry_until_succeeds_with(on_retry).to_async()
    }

    /// Async [`wait_and_retry`](Self::wait_and_retry).
    pub fn wait_and_retry_async<B>(self, count: u32, backoff: B) -> AsyncResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
    {
        self.wait_and_retry(count, backoff).to_async()
    }

    /// Async [`wait_and_retry_with`](Self::wait_and_retry_with).
    pub fn wait_and_retry_with_async<B, F, D>(
        self,
        count: u32,
        backoff: B,
        on_retry: F,
    ) -> AsyncResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_with(count, backoff, on_retry).to_async()
    }

    /// Async [`wait_and_retry_durations`](Self::wait_and_retry_durations).
    pub fn wait_and_retry_durations_async<I>(self, durations: I) -> AsyncResultRetryPolicy<R>
    where
        I: IntoIterator<Item = Duration>,
    {
        self.wait_and_retry_durations(durations).to_async()
    }

    /// Async [`wait_and_retry_durations_with`](Self::wait_and_retry_durations_with).
    pub fn wait_and_retry_durations_with_async<I, F, D>(
        self,
        durations: I,
        on_retry: F,
    ) -> AsyncResultRetryPolicy<R>
    where
        I: IntoIterator<Item = Duration>,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_durations_with(durations, on_retry).to_async()
    }

    /// Async [`wait_and_retry_until_succeeds`](Self::wait_and_retry_until_succeeds).
    pub fn wait_and_retry_until_succeeds_async<B>(self, backoff: B) -> AsyncResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
    {
        self.wait_and_retry_until_succeeds(backoff).to_async()
    }

    /// Async [`wait_and_retry_until_succeeds_with`](Self::wait_and_retry_until_succeeds_with).
    pub fn wait_and_retry_until_succeeds_with_async<B, F, D>(
        self,
        backoff: B,
        on_retry: F,
    ) -> AsyncResultRetryPolicy<R>
    where
        B: Fn(u32, &Outcome<R>) -> Duration + Send + Sync + 'static,
        F: Fn(&Outcome<R>, Duration, u32) -> D + Send + Sync + 'static,
        D: IntoRetryDecision,
    {
        self.wait_and_retry_until_succeeds_with(backoff, on_retry)
            .to_async()
    }

    /// Async [`retry_from_settings`](Self::retry_from_settings).
    pub fn retry_from_settings_async(
        self,
        settings: &RetrySettings,
    ) -> Result<AsyncResultRetryPolicy<R>, ConfigError> {
        Ok(self.retry_from_settings(settings)?.to_async())
    }

    /// On a handled outcome call `on_fallback`, then return what `substitute` produces.
    pub fn fallback<S, N>(self, substitute: S, on_fallback: N) -> ResultFallbackPolicy<R>
    where
        S: Fn(Outcome<R>, &CancellationToken) -> Result<R, Fault> + Send + Sync + 'static,
        N: Fn(&Outcome<R>) + Send + Sync + 'static,
    {
        ResultFallbackPolicy::from_config(FallbackConfig::new(
            self.predicates,
            Arc::new(on_fallback) as OnFallback<R>,
            Arc::new(substitute) as Substitute<R>,
        ))
    }

    /// Substitute a clone of `value` on a handled outcome.
    pub fn fallback_value(self, value: R) -> ResultFallbackPolicy<R>
    where
        R: Clone + Send + Sync,
    {
        self.fallback(move |_, _| Ok(value.clone()), |_| {})
    }

    /// Async [`fallback`](Self::fallback).
    pub fn fallback_async<S, Fut, N>(
        self,
        substitute: S,
        on_fallback: N,
    ) -> AsyncResultFallbackPolicy<R>
    where
        S: Fn(Outcome<R>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Fault>> + Send + 'static,
        N: Fn(&Outcome<R>) + Send + Sync + 'static,
    {
        let substitute: AsyncSubstitute<R> =
            Arc::new(move |outcome: Outcome<R>, token: CancellationToken| -> BoxFuture<Result<R, Fault>> {
                Box::pin(substitute(outcome, token))
            });
        AsyncResultFallbackPolicy::from_config(FallbackConfig::new(
            self.predicates,
            Arc::new(on_fallback) as OnFallback<R>,
            substitute,
        ))
    }

    /// Async [`fallback_value`](Self::fallback_value).
    pub fn fallback_value_async(self, value: R) -> AsyncResultFallbackPolicy<R>
    where
        R: Clone + Send + Sync,
    {
        self.fallback_async(
            move |_, _| std::future::ready(Ok(value.clone())),
            |_| {},
        )
    }
}

//! Retry façades.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rebound_core::backoff::Schedule;
use rebound_core::classify::{Classified, Classify, FaultPredicates, OutcomePredicates};
use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

use super::{FaultWaitProvider, OnFaultRetry, OnRetry, WaitProvider, ignore_token};
use crate::engine::RetryDecision;
use crate::engine::retry::{self, RetryHooks};
use crate::error::ExecutionError;

/// Frozen retry configuration shared by a sync/async façade pair.
pub(crate) struct RetryConfig<C, P, N> {
    pub(crate) classifier: C,
    pub(crate) schedule: Schedule<P>,
    pub(crate) on_retry: Option<N>,
}

impl<C, P, N> RetryConfig<C, P, N> {
    pub(crate) fn new(classifier: C, schedule: Schedule<P>, on_retry: Option<N>) -> Self {
        Self {
            classifier,
            schedule,
            on_retry,
        }
    }
}

pub(crate) type FaultRetryConfig = RetryConfig<FaultPredicates, FaultWaitProvider, OnFaultRetry>;
pub(crate) type ResultRetryConfig<R> = RetryConfig<OutcomePredicates<R>, WaitProvider<R>, OnRetry<R>>;

impl<R> RetryHooks<R> for FaultRetryConfig {
    fn classify(&self, outcome: Outcome<R>) -> Classified<R> {
        self.classifier.classify(outcome)
    }

    fn allows_retry(&self, retries_so_far: u32) -> bool {
        self.schedule.allows_retry(retries_so_far)
    }

    fn wait(&self, attempt: u32, outcome: &Outcome<R>) -> Duration {
        // Fault-only classification never hands a returned value to the hooks.
        match outcome.fault() {
            Some(fault) => self.schedule.resolve(attempt, |provider| provider(attempt, fault)),
            None => Duration::ZERO,
        }
    }

    fn on_retry(&self, outcome: &Outcome<R>, wait: Duration, attempt: u32) -> Option<RetryDecision> {
        let on_retry = self.on_retry.as_ref()?;
        on_retry(outcome.fault()?, wait, attempt)
    }
}

impl<R> RetryHooks<R> for ResultRetryConfig<R> {
    fn classify(&self, outcome: Outcome<R>) -> Classified<R> {
        self.classifier.classify(outcome)
    }

    fn allows_retry(&self, retries_so_far: u32) -> bool {
        self.schedule.allows_retry(retries_so_far)
    }

    fn wait(&self, attempt: u32, outcome: &Outcome<R>) -> Duration {
        self.schedule
            .resolve(attempt, |provider| provider(attempt, outcome))
    }

    fn on_retry(&self, outcome: &Outcome<R>, wait: Duration, attempt: u32) -> Option<RetryDecision> {
        let on_retry = self.on_retry.as_ref()?;
        on_retry(outcome, wait, attempt)
    }
}

/// Blocking retry policy for faults.
///
/// Any action return type is accepted; returned values are never retried.
///
/// ```rust
/// use rebound::{Fault, Policy};
///
/// let policy = Policy::handle_all_faults().retry(2);
///
/// let mut calls = 0;
/// let value = policy
///     .execute(|| {
///         calls += 1;
///         if calls < 3 { Err(Fault::msg("flaky")) } else { Ok(calls) }
///     })
///     .unwrap();
/// assert_eq!(value, 3);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    config: Arc<FaultRetryConfig>,
}

impl RetryPolicy {
    pub(crate) fn from_config(config: FaultRetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` until it succeeds, raises an unhandled fault, or retries stop.
    pub fn execute<R, A>(&self, mut action: A) -> Result<R, ExecutionError>
    where
        A: FnMut() -> Result<R, Fault>,
    {
        retry::run_blocking(&*self.config, None, |_| action())
    }

    /// Like [`execute`](Self::execute), passing `token` to the action and
    /// stopping with [`ExecutionError::Cancelled`] once it is cancelled.
    ///
    /// Waits are slept in slices of at most 10ms so a cancellation is
    /// noticed within one slice. [`execute`](Self::execute) sleeps each wait
    /// in one piece.
    pub fn execute_cancellable<R, A>(
        &self,
        action: A,
        token: &CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnMut(&CancellationToken) -> Result<R, Fault>,
    {
        retry::run_blocking(&*self.config, Some(token), action)
    }

    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        self.config.schedule.permitted_retries()
    }

    /// Async façade over the same configuration.
    pub fn to_async(&self) -> AsyncRetryPolicy {
        AsyncRetryPolicy {
            config: Arc::clone(&self.config),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("predicates", &self.config.classifier)
            .field("permitted_retries", &self.permitted_retries())
            .finish()
    }
}

/// Async retry policy for faults.
#[derive(Clone)]
pub struct AsyncRetryPolicy {
    config: Arc<FaultRetryConfig>,
}

impl AsyncRetryPolicy {
    /// Run `action` until it succeeds, raises an unhandled fault, or retries stop.
    pub async fn execute<R, A, Fut>(&self, action: A) -> Result<R, ExecutionError>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        retry::run_async(&*self.config, CancellationToken::new(), ignore_token(action)).await
    }

    /// Like [`execute`](Self::execute), handing a clone of `token` to each
    /// attempt and abandoning waits as soon as it is cancelled.
    pub async fn execute_cancellable<R, A, Fut>(
        &self,
        action: A,
        token: CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        retry::run_async(&*self.config, token, action).await
    }

    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        self.config.schedule.permitted_retries()
    }

    /// Blocking façade over the same configuration.
    pub fn to_blocking(&self) -> RetryPolicy {
        RetryPolicy {
            config: Arc::clone(&self.config),
        }
    }
}

impl fmt::Debug for AsyncRetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRetryPolicy")
            .field("predicates", &self.config.classifier)
            .field("permitted_retries", &self.permitted_retries())
            .finish()
    }
}

/// Blocking retry policy for faults and results of type `R`.
///
/// ```rust
/// use rebound::Policy;
/// use std::time::Duration;
///
/// let policy = Policy::handle_result(|status: &u16| *status >= 500)
///     .wait_and_retry_durations([Duration::from_millis(1), Duration::from_millis(2)]);
///
/// let mut statuses = vec![200, 503, 503].into_iter();
/// assert_eq!(policy.execute(|| Ok(statuses.next_back().unwrap())).unwrap(), 200);
/// ```
pub struct ResultRetryPolicy<R> {
    config: Arc<ResultRetryConfig<R>>,
}

impl<R> ResultRetryPolicy<R> {
    pub(crate) fn from_config(config: ResultRetryConfig<R>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` until it returns an unhandled value, raises an unhandled
    /// fault, or retries stop.
    ///
    /// A handled value still present after the last retry is returned as `Ok`.
    pub fn execute<A>(&self, mut action: A) -> Result<R, ExecutionError>
    where
        A: FnMut() -> Result<R, Fault>,
    {
        retry::run_blocking(&*self.config, None, |_| action())
    }

    /// Like [`execute`](Self::execute), observing `token`.
    ///
    /// Waits are slept in slices of at most 10ms so a cancellation is
    /// noticed within one slice.
    pub fn execute_cancellable<A>(
        &self,
        action: A,
        token: &CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnMut(&CancellationToken) -> Result<R, Fault>,
    {
        retry::run_blocking(&*self.config, Some(token), action)
    }

    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        self.config.schedule.permitted_retries()
    }

    /// Async façade over the same configuration.
    pub fn to_async(&self) -> AsyncResultRetryPolicy<R> {
        AsyncResultRetryPolicy {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> Clone for ResultRetryPolicy<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> fmt::Debug for ResultRetryPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRetryPolicy")
            .field("predicates", &self.config.classifier)
            .field("permitted_retries", &self.permitted_retries())
            .finish()
    }
}

/// Async retry policy for faults and results of type `R`.
pub struct AsyncResultRetryPolicy<R> {
    config: Arc<ResultRetryConfig<R>>,
}

impl<R> AsyncResultRetryPolicy<R> {
    /// Run `action` until it returns an unhandled value, raises an unhandled
    /// fault, or retries stop.
    pub async fn execute<A, Fut>(&self, action: A) -> Result<R, ExecutionError>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        retry::run_async(&*self.config, CancellationToken::new(), ignore_token(action)).await
    }

    /// Like [`execute`](Self::execute), observing `token`.
    pub async fn execute_cancellable<A, Fut>(
        &self,
        action: A,
        token: CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        retry::run_async(&*self.config, token, action).await
    }

    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        self.config.schedule.permitted_retries()
    }

    /// Blocking façade over the same configuration.
    pub fn to_blocking(&self) -> ResultRetryPolicy<R> {
        ResultRetryPolicy {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> Clone for AsyncResultRetryPolicy<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> fmt::Debug for AsyncResultRetryPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResultRetryPolicy")
            .field("predicates", &self.config.classifier)
            .field("permitted_retries", &self.permitted_retries())
            .finish()
    }
}

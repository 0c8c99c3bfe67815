//! Retry engine.
//!
//! The attempt loop is split in two. [`RetryRun`] owns every decision:
//! classification, the retry budget, wait resolution and the retry callback.
//! It consumes one outcome at a time and answers with a [`Step`]. The two
//! drivers, [`run_blocking`] and [`run_async`], only differ in how they invoke
//! the action and how they wait, so both execution modes share identical
//! retry semantics.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use rebound_core::classify::Classified;
use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

use super::suspend;
use crate::error::ExecutionError;
use crate::observability;

/// Answer of a retry callback.
///
/// Returning `None` from the callback keeps the configured behaviour;
/// returning a decision can stop retrying early or replace the wait.
///
/// ```rust
/// use rebound::RetryDecision;
/// use std::time::Duration;
///
/// assert!(RetryDecision::proceed().can_retry);
/// assert!(!RetryDecision::stop().can_retry);
/// assert_eq!(
///     RetryDecision::wait(Duration::from_secs(2)).wait_override,
///     Some(Duration::from_secs(2))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// `false` stops retrying and surfaces the current outcome.
    pub can_retry: bool,
    /// Wait to use instead of the one resolved from the schedule.
    pub wait_override: Option<Duration>,
}

impl RetryDecision {
    /// Retry as scheduled.
    pub fn proceed() -> Self {
        Self {
            can_retry: true,
            wait_override: None,
        }
    }

    /// Stop retrying.
    pub fn stop() -> Self {
        Self {
            can_retry: false,
            wait_override: None,
        }
    }

    /// Retry after `wait` instead of the scheduled wait.
    pub fn wait(wait: Duration) -> Self {
        Self {
            can_retry: true,
            wait_override: Some(wait),
        }
    }
}

impl Default for RetryDecision {
    fn default() -> Self {
        Self::proceed()
    }
}

/// Everything the retry loop needs from a frozen policy.
pub(crate) trait RetryHooks<R> {
    /// Classify one attempt's outcome.
    fn classify(&self, outcome: Outcome<R>) -> Classified<R>;

    /// Whether another retry fits after `retries_so_far` retries.
    fn allows_retry(&self, retries_so_far: u32) -> bool;

    /// Scheduled wait before retry number `attempt` (1-based).
    fn wait(&self, attempt: u32, outcome: &Outcome<R>) -> Duration;

    /// Notify the caller that retry number `attempt` is about to happen.
    fn on_retry(&self, outcome: &Outcome<R>, wait: Duration, attempt: u32) -> Option<RetryDecision>;
}

/// What the driver does next.
#[derive(Debug)]
pub(crate) enum Step<R> {
    /// Return this outcome to the caller.
    Finish(Outcome<R>),
    /// Wait, then attempt again.
    Wait(Duration),
}

/// Decision state of one execution.
pub(crate) struct RetryRun<'a, R, H: ?Sized> {
    hooks: &'a H,
    retries: u32,
    _result: PhantomData<fn() -> R>,
}

impl<'a, R, H> RetryRun<'a, R, H>
where
    H: RetryHooks<R> + ?Sized,
{
    pub(crate) fn new(hooks: &'a H) -> Self {
        Self {
            hooks,
            retries: 0,
            _result: PhantomData,
        }
    }

    /// Retries scheduled so far.
    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    /// Feed the outcome of the latest attempt.
    pub(crate) fn next(&mut self, outcome: Outcome<R>) -> Step<R> {
        let outcome = match self.hooks.classify(outcome) {
            Classified::Unhandled(outcome) => {
                observability::unhandled(&outcome);
                return Step::Finish(outcome);
            }
            Classified::Handled(outcome) => outcome,
        };

        if !self.hooks.allows_retry(self.retries) {
            observability::retry_exhausted(self.retries, &outcome);
            return Step::Finish(outcome);
        }

        self.retries = self.retries.saturating_add(1);
        let mut wait = self.hooks.wait(self.retries, &outcome);

        if let Some(decision) = self.hooks.on_retry(&outcome, wait, self.retries) {
            if !decision.can_retry {
                observability::retry_vetoed(self.retries, &outcome);
                return Step::Finish(outcome);
            }
            if let Some(wait_override) = decision.wait_override {
                wait = wait_override;
            }
        }

        observability::retrying(self.retries, wait, &outcome);
        Step::Wait(wait)
    }
}

/// Run `action` on the calling thread until the policy stops retrying.
///
/// Without a `token` the action receives a token nobody can cancel and
/// waits are slept in one piece.
pub(crate) fn run_blocking<R, H, A>(
    hooks: &H,
    token: Option<&CancellationToken>,
    mut action: A,
) -> Result<R, ExecutionError>
where
    H: RetryHooks<R> + ?Sized,
    A: FnMut(&CancellationToken) -> Result<R, Fault>,
{
    let detached;
    let observed = match token {
        Some(token) => token,
        None => {
            detached = CancellationToken::new();
            &detached
        }
    };

    let mut run = RetryRun::new(hooks);
    loop {
        if observed.is_cancelled() {
            observability::cancelled(run.retries());
            return Err(ExecutionError::Cancelled);
        }

        let outcome = Outcome::from_result(action(observed));
        match run.next(outcome) {
            Step::Finish(outcome) => return outcome.into_result().map_err(ExecutionError::Faulted),
            Step::Wait(wait) => {
                if let Err(cancelled) = suspend::blocking(wait, token) {
                    observability::cancelled(run.retries());
                    return Err(cancelled);
                }
            }
        }
    }
}

/// Run `action` as a future until the policy stops retrying.
pub(crate) async fn run_async<R, H, A, Fut>(
    hooks: &H,
    token: CancellationToken,
    mut action: A,
) -> Result<R, ExecutionError>
where
    H: RetryHooks<R> + ?Sized,
    A: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<R, Fault>>,
{
    let mut run = RetryRun::new(hooks);
    loop {
        if token.is_cancelled() {
            observability::cancelled(run.retries());
            return Err(ExecutionError::Cancelled);
        }

        let outcome = Outcome::from_result(action(token.clone()).await);
        match run.next(outcome) {
            Step::Finish(outcome) => return outcome.into_result().map_err(ExecutionError::Faulted),
            Step::Wait(wait) => {
                if let Err(cancelled) = suspend::delay(wait, &token).await {
                    observability::cancelled(run.retries());
                    return Err(cancelled);
                }
            }
        }
    }
}

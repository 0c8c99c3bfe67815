//! Fallback façades.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rebound_core::classify::{Classified, Classify, FaultPredicates, OutcomePredicates};
use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

use super::{
    AsyncFaultSubstitute, AsyncSubstitute, FaultSubstitute, OnFallback, OnFaultFallback,
    Substitute,
};
use crate::engine::fallback::{self, FallbackHooks};
use crate::error::ExecutionError;

/// Frozen fallback configuration.
pub(crate) struct FallbackConfig<C, N, S> {
    pub(crate) classifier: C,
    pub(crate) on_fallback: N,
    pub(crate) substitute: S,
}

impl<C, N, S> FallbackConfig<C, N, S> {
    pub(crate) fn new(classifier: C, on_fallback: N, substitute: S) -> Self {
        Self {
            classifier,
            on_fallback,
            substitute,
        }
    }
}

impl<S> FallbackHooks<()> for FallbackConfig<FaultPredicates, OnFaultFallback, S> {
    fn classify(&self, outcome: Outcome<()>) -> Classified<()> {
        self.classifier.classify(outcome)
    }

    fn on_fallback(&self, outcome: &Outcome<()>) {
        if let Some(fault) = outcome.fault() {
            (self.on_fallback)(fault);
        }
    }
}

impl<R, S> FallbackHooks<R> for FallbackConfig<OutcomePredicates<R>, OnFallback<R>, S> {
    fn classify(&self, outcome: Outcome<R>) -> Classified<R> {
        self.classifier.classify(outcome)
    }

    fn on_fallback(&self, outcome: &Outcome<R>) {
        (self.on_fallback)(outcome);
    }
}

pub(crate) type FaultFallbackConfig = FallbackConfig<FaultPredicates, OnFaultFallback, FaultSubstitute>;
pub(crate) type AsyncFaultFallbackConfig =
    FallbackConfig<FaultPredicates, OnFaultFallback, AsyncFaultSubstitute>;
pub(crate) type ResultFallbackConfig<R> = FallbackConfig<OutcomePredicates<R>, OnFallback<R>, Substitute<R>>;
pub(crate) type AsyncResultFallbackConfig<R> =
    FallbackConfig<OutcomePredicates<R>, OnFallback<R>, AsyncSubstitute<R>>;

/// Blocking fallback for `()` actions.
///
/// On a handled fault the notification runs, then the substitute, and the
/// substitute's own result becomes the result of the execution.
///
/// ```rust
/// use rebound::{Fault, Policy};
///
/// let policy = Policy::handle_all_faults().fallback(
///     |_fault, _token| Ok(()),
///     |fault| eprintln!("falling back after: {fault}"),
/// );
///
/// assert!(policy.execute(|| Err(Fault::msg("primary down"))).is_ok());
/// ```
#[derive(Clone)]
pub struct FallbackPolicy {
    config: Arc<FaultFallbackConfig>,
}

impl FallbackPolicy {
    pub(crate) fn from_config(config: FaultFallbackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` once, substituting on a handled fault.
    pub fn execute<A>(&self, action: A) -> Result<(), ExecutionError>
    where
        A: FnOnce() -> Result<(), Fault>,
    {
        self.execute_cancellable(|_| action(), &CancellationToken::new())
    }

    /// Like [`execute`](Self::execute), observing `token`.
    pub fn execute_cancellable<A>(
        &self,
        action: A,
        token: &CancellationToken,
    ) -> Result<(), ExecutionError>
    where
        A: FnOnce(&CancellationToken) -> Result<(), Fault>,
    {
        let substitute = &self.config.substitute;
        fallback::run_blocking(&*self.config, token, action, |outcome, token| match outcome {
            Outcome::Faulted(fault) => substitute(fault, token),
            Outcome::Ok(()) => Ok(()),
        })
    }
}

impl fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackPolicy")
            .field("predicates", &self.config.classifier)
            .finish_non_exhaustive()
    }
}

/// Async fallback for `()` actions.
#[derive(Clone)]
pub struct AsyncFallbackPolicy {
    config: Arc<AsyncFaultFallbackConfig>,
}

impl AsyncFallbackPolicy {
    pub(crate) fn from_config(config: AsyncFaultFallbackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` once, substituting on a handled fault.
    pub async fn execute<A, Fut>(&self, action: A) -> Result<(), ExecutionError>
    where
        A: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), Fault>>,
    {
        self.execute_cancellable(|_| action(), CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), observing `token`.
    pub async fn execute_cancellable<A, Fut>(
        &self,
        action: A,
        token: CancellationToken,
    ) -> Result<(), ExecutionError>
    where
        A: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), Fault>>,
    {
        let substitute = Arc::clone(&self.config.substitute);
        fallback::run_async(&*self.config, token, action, |outcome, token| async move {
            match outcome {
                Outcome::Faulted(fault) => substitute(fault, token).await,
                Outcome::Ok(()) => Ok(()),
            }
        })
        .await
    }
}

impl fmt::Debug for AsyncFallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFallbackPolicy")
            .field("predicates", &self.config.classifier)
            .finish_non_exhaustive()
    }
}

/// Blocking fallback for actions returning `R`.
///
/// ```rust
/// use rebound::{Fault, Policy};
///
/// let policy = Policy::handle_all_faults()
///     .returning::<String>()
///     .fallback(|_outcome, _token| Ok("cached".to_string()), |_| {});
///
/// let value = policy.execute(|| Err(Fault::msg("origin unreachable"))).unwrap();
/// assert_eq!(value, "cached");
/// ```
pub struct ResultFallbackPolicy<R> {
    config: Arc<ResultFallbackConfig<R>>,
}

impl<R> ResultFallbackPolicy<R> {
    pub(crate) fn from_config(config: ResultFallbackConfig<R>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` once, substituting on a handled fault or value.
    pub fn execute<A>(&self, action: A) -> Result<R, ExecutionError>
    where
        A: FnOnce() -> Result<R, Fault>,
    {
        self.execute_cancellable(|_| action(), &CancellationToken::new())
    }

    /// Like [`execute`](Self::execute), observing `token`.
    pub fn execute_cancellable<A>(
        &self,
        action: A,
        token: &CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnOnce(&CancellationToken) -> Result<R, Fault>,
    {
        let substitute = &self.config.substitute;
        fallback::run_blocking(&*self.config, token, action, |outcome, token| {
            substitute(outcome, token)
        })
    }
}

impl<R> Clone for ResultFallbackPolicy<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> fmt::Debug for ResultFallbackPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFallbackPolicy")
            .field("predicates", &self.config.classifier)
            .finish_non_exhaustive()
    }
}

/// Async fallback for actions returning `R`.
pub struct AsyncResultFallbackPolicy<R> {
    config: Arc<AsyncResultFallbackConfig<R>>,
}

impl<R> AsyncResultFallbackPolicy<R> {
    pub(crate) fn from_config(config: AsyncResultFallbackConfig<R>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run `action` once, substituting on a handled fault or value.
    pub async fn execute<A, Fut>(&self, action: A) -> Result<R, ExecutionError>
    where
        A: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        self.execute_cancellable(|_| action(), CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), observing `token`.
    pub async fn execute_cancellable<A, Fut>(
        &self,
        action: A,
        token: CancellationToken,
    ) -> Result<R, ExecutionError>
    where
        A: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, Fault>>,
    {
        let substitute = &self.config.substitute;
        fallback::run_async(&*self.config, token, action, |outcome, token| {
            substitute(outcome, token)
        })
        .await
    }
}

impl<R> Clone for AsyncResultFallbackPolicy<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> fmt::Debug for AsyncResultFallbackPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResultFallbackPolicy")
            .field("predicates", &self.config.classifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::classify::{ResultPredicates, fault_of, result_eq};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn io_fallback(counter: Arc<AtomicUsize>) -> FallbackPolicy {
        FallbackPolicy::from_config(FallbackConfig::new(
            FaultPredicates::new().with(fault_of::<io::Error>()),
            Arc::new(move |_: &Fault| {
                counter.fetch_add(1, Ordering::SeqCst);
            }) as OnFaultFallback,
            Arc::new(|_: Fault, _: &CancellationToken| -> Result<(), Fault> { Ok(()) })
                as FaultSubstitute,
        ))
    }

    #[test]
    fn test_unhandled_fault_skips_notification() {
        let notified = Arc::new(AtomicUsize::new(0));
        let policy = io_fallback(Arc::clone(&notified));

        let original = Fault::msg("not io");
        let error = policy.execute(|| Err(original.clone())).unwrap_err();

        assert!(error.fault().unwrap().ptr_eq(&original));
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handled_fault_notifies_once() {
        let notified = Arc::new(AtomicUsize::new(0));
        let policy = io_fallback(Arc::clone(&notified));

        policy
            .execute(|| Err(io::Error::other("disk").into()))
            .unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_typed_fallback_matches_value() {
        let config: ResultFallbackConfig<u8> = FallbackConfig::new(
            OutcomePredicates::new(FaultPredicates::new(), ResultPredicates::new().with(result_eq(0))),
            Arc::new(|_: &Outcome<u8>| {}) as OnFallback<u8>,
            Arc::new(|_: Outcome<u8>, _: &CancellationToken| -> Result<u8, Fault> { Ok(42) })
                as Substitute<u8>,
        );
        let policy = ResultFallbackPolicy::from_config(config);

        assert_eq!(policy.execute(|| Ok(0)).unwrap(), 42);
        assert_eq!(policy.execute(|| Ok(7)).unwrap(), 7);
        assert!(format!("{policy:?}").starts_with("ResultFallbackPolicy"));
    }
}

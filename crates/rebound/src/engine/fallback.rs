//! Fallback engine: one attempt, one substitution.

use std::future::Future;

use rebound_core::classify::Classified;
use rebound_core::fault::Fault;
use rebound_core::outcome::Outcome;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;
use crate::observability;

/// Everything the fallback path needs from a frozen policy.
pub(crate) trait FallbackHooks<R> {
    /// Classify the attempt's outcome.
    fn classify(&self, outcome: Outcome<R>) -> Classified<R>;

    /// Notify the caller before the substitute runs.
    fn on_fallback(&self, outcome: &Outcome<R>);
}

/// Invoke `action` once; on a handled outcome return what `substitute` produces.
pub(crate) fn run_blocking<R, H, A, S>(
    hooks: &H,
    token: &CancellationToken,
    action: A,
    substitute: S,
) -> Result<R, ExecutionError>
where
    H: FallbackHooks<R> + ?Sized,
    A: FnOnce(&CancellationToken) -> Result<R, Fault>,
    S: FnOnce(Outcome<R>, &CancellationToken) -> Result<R, Fault>,
{
    if token.is_cancelled() {
        observability::fallback_cancelled();
        return Err(ExecutionError::Cancelled);
    }

    match hooks.classify(Outcome::from_result(action(token))) {
        Classified::Unhandled(outcome) => {
            observability::fallback_unhandled(&outcome);
            outcome.into_result().map_err(ExecutionError::Faulted)
        }
        Classified::Handled(outcome) => {
            observability::fallback_engaged(&outcome);
            hooks.on_fallback(&outcome);
            substitute(outcome, token).map_err(ExecutionError::Faulted)
        }
    }
}

/// Async counterpart of [`run_blocking`].
pub(crate) async fn run_async<R, H, A, AFut, S, SFut>(
    hooks: &H,
    token: CancellationToken,
    action: A,
    substitute: S,
) -> Result<R, ExecutionError>
where
    H: FallbackHooks<R> + ?Sized,
    A: FnOnce(CancellationToken) -> AFut,
    AFut: Future<Output = Result<R, Fault>>,
    S: FnOnce(Outcome<R>, CancellationToken) -> SFut,
    SFut: Future<Output = Result<R, Fault>>,
{
    if token.is_cancelled() {
        observability::fallback_cancelled();
        return Err(ExecutionError::Cancelled);
    }

    match hooks.classify(Outcome::from_result(action(token.clone()).await)) {
        Classified::Unhandled(outcome) => {
            observability::fallback_unhandled(&outcome);
            outcome.into_result().map_err(ExecutionError::Faulted)
        }
        Classified::Handled(outcome) => {
            observability::fallback_engaged(&outcome);
            hooks.on_fallback(&outcome);
            substitute(outcome, token).await.map_err(ExecutionError::Faulted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::classify::{Classify, OutcomePredicates, ResultPredicates, result_where};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        predicates: OutcomePredicates<i32>,
        notified: AtomicUsize,
    }

    impl Counting {
        fn negative_results() -> Self {
            Self {
                predicates: OutcomePredicates::new(
                    Default::default(),
                    ResultPredicates::new().with(result_where(|r: &i32| *r < 0)),
                ),
                notified: AtomicUsize::new(0),
            }
        }
    }

    impl FallbackHooks<i32> for Counting {
        fn classify(&self, outcome: Outcome<i32>) -> Classified<i32> {
            self.predicates.classify(outcome)
        }

        fn on_fallback(&self, _outcome: &Outcome<i32>) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_handled_result_is_substituted() {
        let hooks = Counting::negative_results();
        let result = run_blocking(&hooks, &CancellationToken::new(), |_| Ok(-1), |outcome, _| {
            assert!(matches!(outcome, Outcome::Ok(-1)));
            Ok(0)
        });

        assert_eq!(result.unwrap(), 0);
        assert_eq!(hooks.notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unhandled_result_passes_through() {
        let hooks = Counting::negative_results();
        let result = run_blocking(&hooks, &CancellationToken::new(), |_| Ok(7), |_, _| {
            unreachable!("substitute must not run")
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(hooks.notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_substitute_fault_is_returned() {
        let hooks = Counting::negative_results();
        let result = run_blocking(&hooks, &CancellationToken::new(), |_| Ok(-5), |_, _| {
            Err(Fault::msg("substitute failed"))
        });

        let fault = result.unwrap_err().into_fault().unwrap();
        assert_eq!(fault.to_string(), "substitute failed");
    }

    #[tokio::test]
    async fn test_async_cancelled_before_attempt() {
        let hooks = Counting::negative_results();
        let token = CancellationToken::new();
        token.cancel();

        let result = run_async(
            &hooks,
            token,
            |_| async { Ok(-1) },
            |_, _| async { Ok(0) },
        )
        .await;

        assert!(matches!(result, Err(ExecutionError::Cancelled)));
        assert_eq!(hooks.notified.load(Ordering::SeqCst), 0);
    }
}

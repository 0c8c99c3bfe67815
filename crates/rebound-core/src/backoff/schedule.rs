//! Retry budgets and wait resolution.

use std::sync::Arc;
use std::time::Duration;

/// How many retries are permitted and how long to wait before each one.
///
/// The variants are mutually exclusive and fixed when a policy is built.
/// `P` is the wait provider used by [`Schedule::Computed`]; the schedule
/// never calls it directly, callers pass a closure to [`Schedule::resolve`]
/// that knows the provider's signature.
///
/// # Examples
///
/// ```rust
/// use rebound_core::backoff::Schedule;
/// use std::time::Duration;
///
/// let schedule: Schedule<()> = Schedule::durations([
///     Duration::from_millis(10),
///     Duration::from_millis(20),
/// ]);
///
/// assert_eq!(schedule.permitted_retries(), Some(2));
/// assert!(schedule.allows_retry(1));
/// assert!(!schedule.allows_retry(2));
/// assert_eq!(schedule.resolve(2, |_| Duration::ZERO), Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub enum Schedule<P> {
    /// Retry without waiting; `None` means no upper bound.
    Immediate {
        /// Permitted retries.
        retries: Option<u32>,
    },
    /// Retry once per listed duration, waiting that long first.
    Durations(Arc<[Duration]>),
    /// Retry with a wait computed by `provider`; `None` means no upper bound.
    Computed {
        /// Permitted retries.
        retries: Option<u32>,
        /// Wait provider.
        provider: P,
    },
}

impl<P> Schedule<P> {
    /// `retries` immediate retries.
    pub fn immediate(retries: u32) -> Self {
        Schedule::Immediate {
            retries: Some(retries),
        }
    }

    /// Unbounded immediate retries.
    pub fn forever() -> Self {
        Schedule::Immediate { retries: None }
    }

    /// One retry per duration, in order.
    pub fn durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        Schedule::Durations(durations.into_iter().collect())
    }

    /// `retries` retries with computed waits.
    pub fn computed(retries: u32, provider: P) -> Self {
        Schedule::Computed {
            retries: Some(retries),
            provider,
        }
    }

    /// Unbounded retries with computed waits.
    pub fn computed_forever(provider: P) -> Self {
        Schedule::Computed {
            retries: None,
            provider,
        }
    }

    /// Retry budget; `None` when unbounded.
    pub fn permitted_retries(&self) -> Option<u32> {
        match self {
            Schedule::Immediate { retries } | Schedule::Computed { retries, .. } => *retries,
            Schedule::Durations(durations) => {
                Some(u32::try_from(durations.len()).unwrap_or(u32::MAX))
            }
        }
    }

    /// Whether another retry fits after `retries_so_far` retries.
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        self.permitted_retries()
            .is_none_or(|permitted| retries_so_far < permitted)
    }

    /// Wait before retry number `attempt` (1-based).
    ///
    /// `compute` is only called for [`Schedule::Computed`].
    pub fn resolve<F>(&self, attempt: u32, compute: F) -> Duration
    where
        F: FnOnce(&P) -> Duration,
    {
        match self {
            Schedule::Immediate { .. } => Duration::ZERO,
            Schedule::Durations(durations) => attempt
                .checked_sub(1)
                .and_then(|index| durations.get(index as usize))
                .copied()
                .unwrap_or(Duration::ZERO),
            Schedule::Computed { provider, .. } => compute(provider),
        }
    }
}

impl<P: Clone> Clone for Schedule<P> {
    fn clone(&self) -> Self {
        match self {
            Schedule::Immediate { retries } => Schedule::Immediate { retries: *retries },
            Schedule::Durations(durations) => Schedule::Durations(Arc::clone(durations)),
            Schedule::Computed { retries, provider } => Schedule::Computed {
                retries: *retries,
                provider: provider.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, false)]
    #[case(3, 0, true)]
    #[case(3, 2, true)]
    #[case(3, 3, false)]
    fn test_immediate_budget(#[case] retries: u32, #[case] so_far: u32, #[case] allowed: bool) {
        let schedule: Schedule<()> = Schedule::immediate(retries);
        assert_eq!(schedule.allows_retry(so_far), allowed);
        assert_eq!(schedule.resolve(1, |_| Duration::from_secs(9)), Duration::ZERO);
    }

    #[test]
    fn test_forever_never_runs_out() {
        let schedule: Schedule<()> = Schedule::forever();
        assert_eq!(schedule.permitted_retries(), None);
        assert!(schedule.allows_retry(u32::MAX));
    }

    #[test]
    fn test_durations_index_by_attempt() {
        let schedule: Schedule<()> = Schedule::durations([
            Duration::from_millis(1),
            Duration::from_millis(2),
            Duration::from_millis(3),
        ]);

        for attempt in 1..=3u32 {
            assert_eq!(
                schedule.resolve(attempt, |_| Duration::ZERO),
                Duration::from_millis(u64::from(attempt))
            );
        }
        assert!(!schedule.allows_retry(3));
    }

    #[test]
    fn test_empty_durations_permit_no_retry() {
        let schedule: Schedule<()> = Schedule::durations(Vec::new());
        assert_eq!(schedule.permitted_retries(), Some(0));
        assert!(!schedule.allows_retry(0));
    }

    #[test]
    fn test_computed_uses_provider() {
        let schedule = Schedule::computed(2, |attempt: u32| Duration::from_millis(10 * u64::from(attempt)));
        assert_eq!(schedule.resolve(2, |provider| provider(2)), Duration::from_millis(20));
        assert!(!schedule.allows_retry(2));

        let unbounded = Schedule::computed_forever(Duration::from_millis(5));
        assert!(unbounded.allows_retry(1_000_000));
        assert_eq!(unbounded.resolve(7, |fixed| *fixed), Duration::from_millis(5));
    }
}

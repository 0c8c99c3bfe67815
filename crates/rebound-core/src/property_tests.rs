//! Property-based tests for rebound-core
//!
//! These cover aggregate flattening, retry budgets and wait generation over
//! generated inputs.

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::backoff::{ExponentialBackoff, Schedule, constant, exponential, linear};
    use crate::fault::Fault;

    #[derive(Debug, thiserror::Error)]
    #[error("leaf {0}")]
    struct Leaf(u32);

    /// Shape of an aggregate fault tree.
    #[derive(Debug, Clone)]
    enum Shape {
        Leaf(u32),
        Aggregate(Vec<Shape>),
    }

    impl Shape {
        fn build(&self) -> Fault {
            match self {
                Shape::Leaf(id) => Fault::new(Leaf(*id)),
                Shape::Aggregate(children) => Fault::aggregate(children.iter().map(Shape::build)),
            }
        }
    }

    /// Leaf ids in breadth-first order over nested aggregates.
    fn breadth_first_leaves(root: &[Shape]) -> Vec<u32> {
        let mut ids = Vec::new();
        let mut pending: VecDeque<&[Shape]> = VecDeque::from([root]);
        while let Some(children) = pending.pop_front() {
            for child in children {
                match child {
                    Shape::Leaf(id) => ids.push(*id),
                    Shape::Aggregate(nested) => pending.push_back(nested),
                }
            }
        }
        ids
    }

    // ===== Strategy Generators =====

    fn arb_shape() -> impl Strategy<Value = Shape> {
        let leaf = any::<u32>().prop_map(Shape::Leaf);
        leaf.prop_recursive(4, 32, 5, |inner| {
            prop::collection::vec(inner, 0..5).prop_map(Shape::Aggregate)
        })
    }

    fn arb_delays() -> impl Strategy<Value = Vec<Duration>> {
        prop::collection::vec((0u64..10_000).prop_map(Duration::from_millis), 0..16)
    }

    // ===== Fault Properties =====

    proptest! {
        /// Property: flatten yields leaves in breadth-first order
        /// Invariant: nested aggregates never appear in the result
        #[test]
        fn prop_flatten_is_breadth_first(branches in prop::collection::vec(arb_shape(), 0..6)) {
            let fault = Shape::Aggregate(branches.clone()).build();

            let flattened: Vec<u32> = fault
                .flatten()
                .iter()
                .map(|leaf| leaf.downcast_ref::<Leaf>().expect("only leaves are returned").0)
                .collect();

            prop_assert_eq!(flattened, breadth_first_leaves(&branches));
        }
    }

    // ===== Schedule Properties =====

    proptest! {
        /// Property: a bounded schedule allows exactly `budget` retries
        #[test]
        fn prop_budget_bounds_retries(budget in 0u32..1_000, retries_so_far in 0u32..2_000) {
            let immediate: Schedule<()> = Schedule::immediate(budget);
            let computed = Schedule::computed(budget, ());

            prop_assert_eq!(immediate.allows_retry(retries_so_far), retries_so_far < budget);
            prop_assert_eq!(computed.allows_retry(retries_so_far), retries_so_far < budget);
            prop_assert_eq!(immediate.permitted_retries(), Some(budget));
        }

        /// Property: unbounded schedules always allow another retry
        #[test]
        fn prop_forever_always_allows(retries_so_far in any::<u32>()) {
            prop_assert!(Schedule::<()>::forever().allows_retry(retries_so_far));
            prop_assert!(Schedule::computed_forever(()).allows_retry(retries_so_far));
        }

        /// Property: listed waits resolve by 1-based attempt, zero past the end
        #[test]
        fn prop_durations_resolve_by_attempt(delays in arb_delays(), extra in 1u32..10) {
            let schedule: Schedule<()> = Schedule::durations(delays.clone());
            let len = delays.len() as u32;

            prop_assert_eq!(schedule.permitted_retries(), Some(len));
            for (index, wait) in delays.iter().enumerate() {
                prop_assert_eq!(schedule.resolve(index as u32 + 1, |_| Duration::MAX), *wait);
            }
            prop_assert_eq!(schedule.resolve(len + extra, |_| Duration::MAX), Duration::ZERO);
            prop_assert!(!schedule.allows_retry(len));
        }
    }

    // ===== Backoff Properties =====

    proptest! {
        /// Property: exponential waits never exceed the configured maximum
        #[test]
        fn prop_exponential_capped(
            attempt in any::<u32>(),
            initial_ms in 0u64..5_000,
            max_ms in 0u64..120_000,
            multiplier in 1.0f64..10.0,
            jitter in 0.0f64..=1.0,
        ) {
            let max = Duration::from_millis(max_ms);
            let backoff = ExponentialBackoff::builder()
                .initial_delay(Duration::from_millis(initial_ms))
                .max_delay(max)
                .multiplier(multiplier)
                .jitter(jitter)
                .build();

            prop_assert!(backoff.delay(attempt) <= max);
        }

        /// Property: without jitter, waits never shrink from one attempt to the next
        #[test]
        fn prop_exponential_non_decreasing(
            attempt in 1u32..40,
            initial_ms in 1u64..1_000,
            multiplier in 1.1f64..4.0,
        ) {
            let backoff = ExponentialBackoff::builder()
                .initial_delay(Duration::from_millis(initial_ms))
                .max_delay(Duration::from_secs(600))
                .multiplier(multiplier)
                .jitter(0.0)
                .build();

            prop_assert!(backoff.delay(attempt) <= backoff.delay(attempt + 1));
        }

        /// Property: generators return exactly `retries` waits, zero first when fast
        #[test]
        fn prop_sequences_have_requested_length(
            retries in 0u32..64,
            initial_ms in 0u64..1_000,
            factor in 0.0f64..3.0,
            fast_first in any::<bool>(),
        ) {
            let initial = Duration::from_millis(initial_ms);
            let sequences = [
                constant(initial, retries, fast_first),
                linear(initial, retries, factor, fast_first),
                exponential(initial, retries, factor, fast_first),
            ];

            for waits in sequences {
                prop_assert_eq!(waits.len(), retries as usize);
                if fast_first && retries > 0 {
                    prop_assert_eq!(waits[0], Duration::ZERO);
                }
            }
        }
    }
}

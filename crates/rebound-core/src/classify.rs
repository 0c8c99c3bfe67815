//! Fault and result classification.
//!
//! A policy only acts on outcomes its predicates *handle*. Fault predicates
//! are ordered and the first match wins; a match may also choose which fault
//! is reported as the handled one (nested matching reports the inner fault it
//! found, not the wrapper that was raised). Result predicates are a flat OR.
//!
//! Predicates are plain closures with the concrete error type already bound
//! by the generic constructor that built them:
//!
//! ```rust
//! use rebound_core::classify::{fault_of, nested_fault_of, FaultPredicates};
//! use rebound_core::fault::Fault;
//! use std::io;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("timed out")]
//! struct Timeout;
//!
//! let predicates = FaultPredicates::new()
//!     .with(fault_of::<io::Error>())
//!     .with(nested_fault_of::<Timeout>());
//!
//! let raised = Fault::aggregate([Fault::msg("unrelated"), Fault::new(Timeout)]);
//! let handled = predicates.first_match(&raised).expect("timeout is nested in the aggregate");
//! assert!(handled.is::<Timeout>());
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::fault::Fault;
use crate::outcome::Outcome;

/// Decides whether a fault is handled, returning the fault to report.
pub type FaultPredicate = Arc<dyn Fn(&Fault) -> Option<Fault> + Send + Sync>;

/// Decides whether a returned value is handled.
pub type ResultPredicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Match every fault.
pub fn any_fault() -> FaultPredicate {
    Arc::new(|fault: &Fault| Some(fault.clone()))
}

/// Match faults whose own error is `E`.
pub fn fault_of<E>() -> FaultPredicate
where
    E: StdError + 'static,
{
    Arc::new(|fault: &Fault| fault.is::<E>().then(|| fault.clone()))
}

/// Match faults whose own error is `E` and satisfies `predicate`.
pub fn fault_where<E, P>(predicate: P) -> FaultPredicate
where
    E: StdError + 'static,
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(move |fault: &Fault| match fault.downcast_ref::<E>() {
        Some(error) if predicate(error) => Some(fault.clone()),
        _ => None,
    })
}

/// Match an `E` found anywhere inside the raised fault.
pub fn nested_fault_of<E>() -> FaultPredicate
where
    E: StdError + 'static,
{
    nested_fault_where::<E, _>(|_| true)
}

/// Match an `E` satisfying `predicate` found anywhere inside the raised fault.
///
/// See [`find_nested`] for the search order. The nested fault that matched is
/// reported as the handled fault.
pub fn nested_fault_where<E, P>(predicate: P) -> FaultPredicate
where
    E: StdError + 'static,
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(move |fault: &Fault| {
        find_nested(fault, |candidate| {
            candidate
                .downcast_ref::<E>()
                .is_some_and(|error| predicate(error))
        })
    })
}

/// Search a fault tree for the first node accepted by `matches`.
///
/// If `fault` is an aggregate, every leaf of [`Fault::flatten`] is tried in
/// order, each by walking its own [`Fault::chain`]. Only when no leaf chain
/// matched is the chain of `fault` itself walked, starting with `fault`.
pub fn find_nested<M>(fault: &Fault, matches: M) -> Option<Fault>
where
    M: Fn(&Fault) -> bool,
{
    if fault.is_aggregate() {
        for leaf in fault.flatten() {
            if let Some(found) = leaf.chain().find(|candidate| matches(candidate)) {
                #[cfg(feature = "tracing")]
                tracing::trace!(fault = %found, "nested fault matched inside aggregate");
                return Some(found.clone());
            }
        }
    }

    fault
        .chain()
        .find(|candidate| matches(candidate))
        .cloned()
}

/// Match results satisfying `predicate`.
pub fn result_where<R, P>(predicate: P) -> ResultPredicate<R>
where
    P: Fn(&R) -> bool + Send + Sync + 'static,
{
    Arc::new(predicate)
}

/// Match results equal to `value`.
pub fn result_eq<R>(value: R) -> ResultPredicate<R>
where
    R: PartialEq + Send + Sync + 'static,
{
    Arc::new(move |result: &R| *result == value)
}

/// Ordered fault predicates; first match wins.
#[derive(Clone, Default)]
pub struct FaultPredicates {
    predicates: Vec<FaultPredicate>,
}

impl FaultPredicates {
    /// An empty set, which handles nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn push(&mut self, predicate: FaultPredicate) {
        self.predicates.push(predicate);
    }

    /// Append a predicate, builder style.
    pub fn with(mut self, predicate: FaultPredicate) -> Self {
        self.push(predicate);
        self
    }

    /// Number of registered predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether no predicate is registered.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The handled fault reported by the first matching predicate.
    pub fn first_match(&self, fault: &Fault) -> Option<Fault> {
        self.predicates.iter().find_map(|predicate| predicate(fault))
    }
}

impl fmt::Debug for FaultPredicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultPredicates")
            .field("len", &self.predicates.len())
            .finish()
    }
}

/// Result predicates combined with OR.
pub struct ResultPredicates<R> {
    predicates: Vec<ResultPredicate<R>>,
}

impl<R> ResultPredicates<R> {
    /// An empty set, which handles no result.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Append a predicate.
    pub fn push(&mut self, predicate: ResultPredicate<R>) {
        self.predicates.push(predicate);
    }

    /// Append a predicate, builder style.
    pub fn with(mut self, predicate: ResultPredicate<R>) -> Self {
        self.push(predicate);
        self
    }

    /// Number of registered predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether no predicate is registered.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether any predicate accepts `result`.
    pub fn any_match(&self, result: &R) -> bool {
        self.predicates.iter().any(|predicate| predicate(result))
    }
}

impl<R> Default for ResultPredicates<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ResultPredicates<R> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
        }
    }
}

impl<R> fmt::Debug for ResultPredicates<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultPredicates")
            .field("len", &self.predicates.len())
            .finish()
    }
}

/// An outcome after classification.
#[derive(Debug, Clone)]
pub enum Classified<R> {
    /// A predicate matched. Faults are replaced by the fault the predicate reported.
    Handled(Outcome<R>),
    /// Nothing matched; the outcome is untouched.
    Unhandled(Outcome<R>),
}

impl<R> Classified<R> {
    /// Whether a predicate matched.
    pub fn is_handled(&self) -> bool {
        matches!(self, Classified::Handled(_))
    }

    /// The outcome, handled or not.
    pub fn into_outcome(self) -> Outcome<R> {
        match self {
            Classified::Handled(outcome) | Classified::Unhandled(outcome) => outcome,
        }
    }
}

/// Something that can classify an attempt's outcome.
pub trait Classify<R> {
    /// Classify `outcome`, consuming it.
    fn classify(&self, outcome: Outcome<R>) -> Classified<R>;
}

impl<R> Classify<R> for FaultPredicates {
    /// Faults only: returned values are never handled.
    fn classify(&self, outcome: Outcome<R>) -> Classified<R> {
        match outcome {
            Outcome::Faulted(fault) => match self.first_match(&fault) {
                Some(handled) => Classified::Handled(Outcome::Faulted(handled)),
                None => Classified::Unhandled(Outcome::Faulted(fault)),
            },
            ok => Classified::Unhandled(ok),
        }
    }
}

/// Fault predicates plus result predicates for a value type `R`.
pub struct OutcomePredicates<R> {
    /// Predicates applied to raised faults.
    pub faults: FaultPredicates,
    /// Predicates applied to returned values.
    pub results: ResultPredicates<R>,
}

impl<R> OutcomePredicates<R> {
    /// Combine both predicate sets.
    pub fn new(faults: FaultPredicates, results: ResultPredicates<R>) -> Self {
        Self { faults, results }
    }
}

impl<R> Default for OutcomePredicates<R> {
    fn default() -> Self {
        Self::new(FaultPredicates::new(), ResultPredicates::new())
    }
}

impl<R> Clone for OutcomePredicates<R> {
    fn clone(&self) -> Self {
        Self::new(self.faults.clone(), self.results.clone())
    }
}

impl<R> fmt::Debug for OutcomePredicates<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomePredicates")
            .field("faults", &self.faults)
            .field("results", &self.results)
            .finish()
    }
}

impl<R> Classify<R> for OutcomePredicates<R> {
    fn classify(&self, outcome: Outcome<R>) -> Classified<R> {
        match outcome {
            Outcome::Ok(value) if self.results.any_match(&value) => {
                Classified::Handled(Outcome::Ok(value))
            }
            other => self.faults.classify(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("timed out after {0}ms")]
    struct Timeout(u64);

    #[derive(Debug, thiserror::Error)]
    #[error("refused")]
    struct Refused;

    fn wrap(message: &str, cause: Fault) -> Fault {
        Fault::wrap(io::Error::other(message.to_string()), cause)
    }

    #[test]
    fn test_any_fault_matches_everything() {
        let fault = Fault::new(Refused);
        let handled = any_fault()(&fault).unwrap();
        assert!(handled.ptr_eq(&fault));
    }

    #[test]
    fn test_fault_of_ignores_causes() {
        let wrapped = wrap("outer", Fault::new(Timeout(10)));

        assert!(fault_of::<Timeout>()(&wrapped).is_none());
        assert!(fault_of::<io::Error>()(&wrapped).is_some());
    }

    #[rstest]
    #[case(10, false)]
    #[case(500, true)]
    fn test_fault_where_applies_predicate(#[case] millis: u64, #[case] expected: bool) {
        let predicate = fault_where::<Timeout, _>(|t| t.0 >= 100);
        assert_eq!(predicate(&Fault::new(Timeout(millis))).is_some(), expected);
    }

    #[test]
    fn test_first_matching_predicate_wins() {
        let fault = Fault::new(Timeout(1));
        let inner_only = Fault::msg("never reported");
        let rewritten = inner_only.clone();

        let predicates = FaultPredicates::new()
            .with(Arc::new(move |_: &Fault| Some(rewritten.clone())))
            .with(any_fault());

        let handled = predicates.first_match(&fault).unwrap();
        assert!(handled.ptr_eq(&inner_only));
    }

    #[test]
    fn test_empty_set_handles_nothing() {
        assert!(FaultPredicates::new().first_match(&Fault::new(Refused)).is_none());
    }

    #[test]
    fn test_nested_match_reports_inner_fault() {
        let timeout = Fault::new(Timeout(5));
        let raised = wrap("outer", wrap("middle", timeout.clone()));

        let handled = nested_fault_of::<Timeout>()(&raised).unwrap();
        assert!(handled.ptr_eq(&timeout));
    }

    #[test]
    fn test_nested_match_includes_raised_fault_itself() {
        let raised = Fault::new(Timeout(5));
        let handled = nested_fault_of::<Timeout>()(&raised).unwrap();
        assert!(handled.ptr_eq(&raised));
    }

    #[test]
    fn test_nested_match_searches_aggregate_branches_before_own_chain() {
        let in_second_branch = Fault::new(Timeout(2));
        let aggregate = Fault::aggregate([
            wrap("first", Fault::new(Refused)),
            wrap("second", in_second_branch.clone()),
        ]);

        let handled = nested_fault_of::<Timeout>()(&aggregate).unwrap();
        assert!(handled.ptr_eq(&in_second_branch));
    }

    #[test]
    fn test_nested_match_first_leaf_wins() {
        let first = Fault::new(Timeout(1));
        let second = Fault::new(Timeout(2));
        let aggregate = Fault::aggregate([
            Fault::aggregate([wrap("deep", second.clone())]),
            first.clone(),
        ]);

        // Direct branches are flattened ahead of nested aggregates.
        let handled = nested_fault_of::<Timeout>()(&aggregate).unwrap();
        assert!(handled.ptr_eq(&first));
    }

    #[test]
    fn test_nested_match_with_predicate() {
        let slow = Fault::new(Timeout(900));
        let aggregate = Fault::aggregate([Fault::new(Timeout(1)), slow.clone()]);

        let handled = nested_fault_where::<Timeout, _>(|t| t.0 > 100)(&aggregate).unwrap();
        assert!(handled.ptr_eq(&slow));
        assert!(nested_fault_where::<Timeout, _>(|t| t.0 > 1000)(&aggregate).is_none());
    }

    #[test]
    fn test_result_predicates_are_ored() {
        let predicates = ResultPredicates::new()
            .with(result_where(|r: &i32| *r < 0))
            .with(result_eq(42));

        assert!(predicates.any_match(&-1));
        assert!(predicates.any_match(&42));
        assert!(!predicates.any_match(&7));
    }

    #[test]
    fn test_fault_predicates_never_handle_results() {
        let classified = FaultPredicates::new()
            .with(any_fault())
            .classify(Outcome::Ok(1));
        assert!(!classified.is_handled());
    }

    #[test]
    fn test_outcome_predicates_classify_both_sides() {
        let predicates = OutcomePredicates::new(
            FaultPredicates::new().with(fault_of::<Refused>()),
            ResultPredicates::new().with(result_where(|r: &i32| *r < 0)),
        );

        assert!(predicates.classify(Outcome::Ok(-3)).is_handled());
        assert!(!predicates.classify(Outcome::Ok(3)).is_handled());
        assert!(predicates.classify(Outcome::Faulted(Fault::new(Refused))).is_handled());
        assert!(!predicates.classify(Outcome::Faulted(Fault::new(Timeout(1)))).is_handled());
    }

    #[test]
    fn test_classification_replaces_fault_with_handled_one() {
        let timeout = Fault::new(Timeout(3));
        let raised = wrap("outer", timeout.clone());
        let predicates = FaultPredicates::new().with(nested_fault_of::<Timeout>());

        match predicates.classify(Outcome::<()>::Faulted(raised)) {
            Classified::Handled(Outcome::Faulted(fault)) => assert!(fault.ptr_eq(&timeout)),
            other => panic!("expected handled fault, got {other:?}"),
        }
    }
}

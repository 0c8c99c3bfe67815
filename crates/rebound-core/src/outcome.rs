//! Two-case result of a single attempt.

use crate::fault::Fault;

/// What one invocation of a wrapped action produced.
///
/// Classification, retry callbacks and fallback callbacks all consume an
/// `Outcome`, so "the action failed" and "the action returned a bad value"
/// travel through the same code path.
#[derive(Debug, Clone)]
pub enum Outcome<R> {
    /// The action returned a value.
    Ok(R),
    /// The action raised a fault.
    Faulted(Fault),
}

impl<R> Outcome<R> {
    /// Capture an action's return value.
    pub fn from_result(result: Result<R, Fault>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(fault) => Outcome::Faulted(fault),
        }
    }

    /// Convert back into a `Result`.
    pub fn into_result(self) -> Result<R, Fault> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Faulted(fault) => Err(fault),
        }
    }

    /// Whether the action returned a value.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Whether the action raised a fault.
    pub fn is_faulted(&self) -> bool {
        matches!(self, Outcome::Faulted(_))
    }

    /// The returned value, if any.
    pub fn result(&self) -> Option<&R> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Faulted(_) => None,
        }
    }

    /// The raised fault, if any.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Faulted(fault) => Some(fault),
        }
    }

    /// Map the success value, keeping faults untouched.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(R) -> U,
    {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Faulted(fault) => Outcome::Faulted(fault),
        }
    }
}

impl<R> From<Result<R, Fault>> for Outcome<R> {
    fn from(result: Result<R, Fault>) -> Self {
        Outcome::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_outcome_accessors() {
        let outcome: Outcome<u32> = Outcome::from_result(Ok(7));

        assert!(outcome.is_ok());
        assert!(!outcome.is_faulted());
        assert_eq!(outcome.result(), Some(&7));
        assert!(outcome.fault().is_none());
        assert_eq!(outcome.map(|v| v * 2).into_result().unwrap(), 14);
    }

    #[test]
    fn test_faulted_outcome_keeps_fault_identity() {
        let fault = Fault::msg("broken pipe");
        let outcome: Outcome<u32> = Err(fault.clone()).into();

        assert!(outcome.is_faulted());
        assert!(outcome.result().is_none());
        assert!(outcome.fault().is_some_and(|f| f.ptr_eq(&fault)));

        let mapped = outcome.map(|v| v.to_string());
        assert!(mapped.into_result().unwrap_err().ptr_eq(&fault));
    }
}

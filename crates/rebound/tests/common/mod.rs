//! Common test utilities and helpers

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rebound::Fault;

/// Transient timeout raised by flaky test actions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("operation timed out")]
pub struct Timeout;

/// Permanent failure that policies in these tests never handle
#[allow(dead_code)]
#[derive(Debug, thiserror::Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

/// Shared attempt counter usable from `Fn` callbacks and async actions
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicU32>);

#[allow(dead_code)]
impl Counter {
    /// Increment and return the new count
    pub fn bump(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current count
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fail with `Timeout` until the `succeed_on`-th call, then return `value`
#[allow(dead_code)]
pub fn flaky<T: Clone>(counter: &Counter, succeed_on: u32, value: T) -> Result<T, Fault> {
    if counter.bump() < succeed_on {
        Err(Fault::new(Timeout))
    } else {
        Ok(value)
    }
}

//! Execution engines shared by every policy façade.
//!
//! Façades own the frozen configuration; the engines own the control flow.
//! Each engine exposes a blocking and an async driver over the same hooks.

pub(crate) mod fallback;
pub(crate) mod retry;
pub(crate) mod suspend;

pub use retry::RetryDecision;

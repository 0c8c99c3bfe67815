//! Structured tracing events emitted by the retry and fallback engines.
//!
//! Retry events use the `rebound::retry` target and fallback events use
//! `rebound::fallback`, so they can be filtered independently:
//!
//! ```text
//! RUST_LOG=info,rebound::retry=debug
//! ```
//!
//! With the `trace` feature, [`init_subscriber`] installs a ready-made fmt
//! subscriber honouring `RUST_LOG`.

use std::time::Duration;

use rebound_core::outcome::Outcome;
use tracing::{debug, field, info, trace, warn};

/// Log a retry that is about to wait and re-attempt.
pub(crate) fn retrying<R>(attempt: u32, delay: Duration, outcome: &Outcome<R>) {
    debug!(
        target: "rebound::retry",
        attempt,
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        faulted = outcome.is_faulted(),
        fault = outcome.fault().map(field::display),
        "retrying handled outcome"
    );
}

/// Log that the retry budget ran out.
pub(crate) fn retry_exhausted<R>(retries: u32, outcome: &Outcome<R>) {
    warn!(
        target: "rebound::retry",
        attempts = retries.saturating_add(1),
        faulted = outcome.is_faulted(),
        fault = outcome.fault().map(field::display),
        "retry budget exhausted"
    );
}

/// Log that the retry callback refused another attempt.
pub(crate) fn retry_vetoed<R>(attempt: u32, outcome: &Outcome<R>) {
    warn!(
        target: "rebound::retry",
        attempts = attempt,
        faulted = outcome.is_faulted(),
        "retry vetoed by callback"
    );
}

/// Log a fault no retry predicate handled.
///
/// Successful outcomes are the common case and stay silent.
pub(crate) fn unhandled<R>(outcome: &Outcome<R>) {
    if let Some(fault) = outcome.fault() {
        trace!(
            target: "rebound::retry",
            fault = %fault,
            "fault not handled by policy"
        );
    }
}

/// Log a cancelled retry execution.
pub(crate) fn cancelled(retries: u32) {
    debug!(target: "rebound::retry", retries, "execution cancelled");
}

/// Log a fault no fallback predicate handled.
pub(crate) fn fallback_unhandled<R>(outcome: &Outcome<R>) {
    if let Some(fault) = outcome.fault() {
        trace!(
            target: "rebound::fallback",
            fault = %fault,
            "fault not handled by policy"
        );
    }
}

/// Log a fallback execution cancelled before its attempt.
pub(crate) fn fallback_cancelled() {
    debug!(target: "rebound::fallback", "execution cancelled");
}

/// Log that a fallback substitute is about to run.
pub(crate) fn fallback_engaged<R>(outcome: &Outcome<R>) {
    info!(
        target: "rebound::fallback",
        faulted = outcome.is_faulted(),
        fault = outcome.fault().map(field::display),
        "fallback engaged"
    );
}

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info,rebound=debug` when `RUST_LOG` is unset or invalid.
/// Returns `false` if a global subscriber was already installed.
///
/// ```rust,no_run
/// rebound::observability::init_subscriber();
/// ```
#[cfg(feature = "trace")]
pub fn init_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,rebound=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use rebound_core::fault::Fault;
    use tokio_util::sync::CancellationToken;

    use crate::Policy;

    /// In-memory sink for a fmt subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with every event at any level written to the returned lines.
    fn capture<F: FnOnce()>(f: F) -> Vec<String> {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_events_without_subscriber_are_noops() {
        let outcome: Outcome<u8> = Outcome::Faulted(Fault::msg("boom"));
        retrying(1, Duration::from_millis(5), &outcome);
        retry_exhausted(3, &outcome);
        retry_vetoed(2, &Outcome::Ok(1u8));
        unhandled(&outcome);
        cancelled(0);
        fallback_unhandled(&outcome);
        fallback_cancelled();
        fallback_engaged(&outcome);
    }

    #[test]
    fn test_successful_executions_are_silent() {
        let lines = capture(|| {
            let retry = Policy::handle_all_faults().retry(3);
            assert_eq!(retry.execute(|| Ok(1)).unwrap(), 1);

            let fallback = Policy::handle_all_faults().fallback(|_, _| Ok(()), |_| {});
            fallback.execute(|| Ok(())).unwrap();
        });

        assert!(lines.is_empty(), "unexpected events: {lines:?}");
    }

    #[test]
    fn test_fallback_events_use_fallback_target() {
        let lines = capture(|| {
            let policy = Policy::handle_fault::<io::Error>().fallback(|_, _| Ok(()), |_| {});

            let _ = policy.execute(|| Err(Fault::msg("not io")));
            policy.execute(|| Err(io::Error::other("disk").into())).unwrap();

            let token = CancellationToken::new();
            token.cancel();
            let _ = policy.execute_cancellable(|_| Ok(()), &token);
        });

        assert_eq!(lines.len(), 3, "{lines:?}");
        assert!(lines.iter().all(|line| line.contains("rebound::fallback")), "{lines:?}");
        assert!(lines[0].contains("TRACE") && lines[0].contains("fault not handled by policy"));
        assert!(lines[1].contains("INFO") && lines[1].contains("fallback engaged"));
        assert!(lines[2].contains("DEBUG") && lines[2].contains("execution cancelled"));
    }

    #[test]
    fn test_retry_events_use_retry_target() {
        let lines = capture(|| {
            let policy = Policy::handle_fault::<io::Error>().retry(1);
            let _: Result<(), _> = policy.execute(|| Err(io::Error::other("reset").into()));
        });

        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines.iter().all(|line| line.contains("rebound::retry")), "{lines:?}");
        assert!(lines[0].contains("retrying handled outcome"));
        assert!(lines[1].contains("retry budget exhausted"));
    }

    #[test]
    fn test_oversized_delay_saturates() {
        let lines = capture(|| {
            retrying(1, Duration::MAX, &Outcome::Ok(()));
        });

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(&format!("delay_ms={}", u64::MAX)), "{lines:?}");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn test_init_subscriber_only_once() {
        let _ = init_subscriber();
        assert!(!init_subscriber());
    }
}

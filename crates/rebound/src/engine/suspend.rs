//! Waiting between attempts while observing cancellation.

use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;

/// Longest uninterrupted blocking sleep; cancellation is re-checked after each slice.
pub(crate) const CANCELLATION_POLL: Duration = Duration::from_millis(10);

/// Block the calling thread for `delay`, returning early if `token` is cancelled.
///
/// Without a token the delay is slept in one piece.
pub(crate) fn blocking(
    delay: Duration,
    token: Option<&CancellationToken>,
) -> Result<(), ExecutionError> {
    if delay.is_zero() {
        return Ok(());
    }
    let Some(token) = token else {
        thread::sleep(delay);
        return Ok(());
    };

    // `None` when the deadline is beyond what `Instant` can represent.
    let deadline = Instant::now().checked_add(delay);
    loop {
        if token.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        let slice = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(());
                }
                remaining.min(CANCELLATION_POLL)
            }
            None => CANCELLATION_POLL,
        };
        thread::sleep(slice);
    }
}

/// Yield for `delay`, returning early if `token` is cancelled.
pub(crate) async fn delay(delay: Duration, token: &CancellationToken) -> Result<(), ExecutionError> {
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ExecutionError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_zero_delay_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        // Zero waits never observe the token; the engine checks it before each attempt.
        assert!(blocking(Duration::ZERO, Some(&token)).is_ok());
    }

    #[test]
    fn test_blocking_sleeps_for_delay() {
        let started = Instant::now();
        blocking(Duration::from_millis(25), Some(&CancellationToken::new())).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_blocking_without_token_sleeps_whole_delay() {
        let started = Instant::now();
        blocking(Duration::from_millis(35), None).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_blocking_stops_on_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        let result = blocking(Duration::from_secs(30), Some(&token));
        handle.join().unwrap();

        assert!(matches!(result, Err(ExecutionError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_sleeps_for_delay() {
        let started = tokio::time::Instant::now();
        delay(Duration::from_millis(100), &CancellationToken::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_stops_on_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = tokio::time::Instant::now();
        let result = delay(Duration::from_secs(3600), &token).await;

        assert!(matches!(result, Err(ExecutionError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(3600));
    }
}

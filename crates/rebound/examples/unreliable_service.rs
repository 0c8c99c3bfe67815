//! Example: Wrapping an unreliable service in retry and fallback policies
//!
//! This example demonstrates:
//! 1. Retrying a transient fault with listed waits
//! 2. Retrying on a bad returned value with exponential backoff from settings
//! 3. Falling back to a cached value
//! 4. Cancelling an unbounded retry loop
//!
//! Run with:
//! ```bash
//! cargo run -p rebound --example unreliable_service --features trace
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use rebound::prelude::*;

#[derive(Debug, thiserror::Error)]
#[error("service unavailable (attempt {0})")]
struct Unavailable(u32);

/// A simulated service that fails the first few calls
struct UnreliableService {
    calls: Arc<AtomicU32>,
    fail_count: u32,
}

impl UnreliableService {
    fn new(fail_count: u32) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            fail_count,
        }
    }

    async fn fetch(&self) -> Result<String, Fault> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_count {
            println!("  Call {call}: FAILED");
            Err(Fault::new(Unavailable(call)))
        } else {
            println!("  Call {call}: SUCCESS");
            Ok("fresh data".to_string())
        }
    }

    /// HTTP-like status: 503 until the service warms up
    async fn status(&self) -> Result<u16, Fault> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(if call <= self.fail_count { 503 } else { 200 })
    }

    fn total_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Example 1: Listed waits for a transient fault
async fn example_listed_waits() -> anyhow::Result<()> {
    println!("\n=== Example 1: Retry with Listed Waits ===\n");

    let policy = Policy::handle_fault::<Unavailable>().wait_and_retry_durations_with_async(
        [Duration::from_millis(50), Duration::from_millis(100), Duration::from_millis(200)],
        |fault, wait, attempt| println!("  retry {attempt} in {wait:?} after: {fault}"),
    );

    let service = UnreliableService::new(2);
    let start = Instant::now();
    let body = policy.execute(|| service.fetch()).await?;

    println!(
        "\nGot {body:?} after {} calls in {:?}",
        service.total_calls(),
        start.elapsed()
    );
    Ok(())
}

/// Example 2: Exponential backoff on a bad status, configured from JSON
async fn example_result_retry() -> anyhow::Result<()> {
    println!("\n=== Example 2: Retry on Returned Value ===\n");

    let settings = RetrySettings::from_json(
        r#"{ "max_retries": 4, "exponential": { "initial_delay_ms": 20, "jitter": 0.0 } }"#,
    )?;
    let policy = Policy::handle_result(|status: &u16| *status >= 500)
        .retry_from_settings_async(&settings)?;

    let service = UnreliableService::new(3);
    let status = policy.execute(|| service.status()).await?;

    println!("Final status {status} after {} calls", service.total_calls());
    Ok(())
}

/// Example 3: Cached value when the service stays down
async fn example_fallback() -> anyhow::Result<()> {
    println!("\n=== Example 3: Fallback ===\n");

    let policy = Policy::handle_fault::<Unavailable>()
        .returning::<String>()
        .fallback_async(
            |_outcome, _token| async { Ok("cached data".to_string()) },
            |outcome| println!("  falling back after: {:?}", outcome.fault()),
        );

    let service = UnreliableService::new(u32::MAX);
    let body = policy.execute(|| service.fetch()).await?;

    println!("Served {body:?}");
    Ok(())
}

/// Example 4: Cancelling a policy that would retry forever
async fn example_cancellation() -> anyhow::Result<()> {
    println!("\n=== Example 4: Cancellation ===\n");

    let policy = Policy::handle_all_faults()
        .wait_and_retry_until_succeeds_async(|_, _| Duration::from_millis(100));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        canceller.cancel();
    });

    let service = UnreliableService::new(u32::MAX);
    let result = policy
        .execute_cancellable(|_token| service.fetch(), token)
        .await;

    match result {
        Err(ExecutionError::Cancelled) => {
            println!("Cancelled after {} calls", service.total_calls())
        }
        other => anyhow::bail!("expected cancellation, got {other:?}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "trace")]
    rebound::observability::init_subscriber();

    example_listed_waits().await?;
    example_result_retry().await?;
    example_fallback().await?;
    example_cancellation().await?;

    println!("\n=== All examples completed ===");
    Ok(())
}

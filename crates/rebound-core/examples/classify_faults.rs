//! Example: Classifying faults and previewing backoff schedules
//!
//! This example demonstrates:
//! 1. Ordered fault predicates, first match wins
//! 2. Nested matching through cause chains and aggregates
//! 3. Precomputed wait sequences
//!
//! Run with:
//! ```bash
//! cargo run -p rebound-core --example classify_faults
//! ```

use std::io;
use std::time::Duration;

use rebound_core::backoff::{constant, exponential, linear};
use rebound_core::prelude::*;

#[derive(Debug, thiserror::Error)]
#[error("shard {0} timed out")]
struct ShardTimeout(u8);

fn describe(label: &str, classified: Classified<()>) {
    let handled = classified.is_handled();
    match classified.into_outcome() {
        Outcome::Faulted(fault) => println!("  {label}: handled={handled} fault={fault:#}"),
        Outcome::Ok(()) => println!("  {label}: handled={handled} ok"),
    }
}

fn main() {
    println!("\n=== Example 1: Ordered predicates ===\n");

    let predicates = FaultPredicates::new()
        .with(fault_where(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut))
        .with(fault_of::<ShardTimeout>());

    describe(
        "io timeout",
        predicates.classify(Outcome::Faulted(Fault::new(io::Error::from(io::ErrorKind::TimedOut)))),
    );
    describe(
        "permission denied",
        predicates.classify(Outcome::Faulted(Fault::new(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )))),
    );

    println!("\n=== Example 2: Nested matching ===\n");

    let nested = FaultPredicates::new().with(nested_fault_of::<ShardTimeout>());
    let scatter = Fault::aggregate([
        Fault::msg("shard 1 ok"),
        Fault::wrap(io::Error::other("gather failed"), ShardTimeout(2)),
        Fault::new(ShardTimeout(3)),
    ]);
    // Reports the first shard timeout, unwrapped from its context.
    describe("scatter/gather", nested.classify(Outcome::Faulted(scatter)));

    println!("\n=== Example 3: Wait sequences ===\n");

    let base = Duration::from_millis(100);
    println!("  constant:    {:?}", constant(base, 4, false));
    println!("  linear:      {:?}", linear(base, 4, 1.0, true));
    println!("  exponential: {:?}", exponential(base, 4, 2.0, false));

    let backoff = ExponentialBackoff::builder()
        .initial_delay(base)
        .max_delay(Duration::from_secs(1))
        .jitter(0.0)
        .build();
    println!("  capped:      {:?}", backoff.durations(6));
}

//! Example: driving retries with backoff and cancellation
//!
//! This example demonstrates:
//! 1. Retrying a flaky call with exponential backoff
//! 2. Retrying only some errors with `retry_if`
//! 3. Cutting retries short with a deadline
//! 4. Jitter impact on computed delays
//!
//! Run with:
//! ```bash
//! RUST_LOG=retry_backoff=debug cargo run -p retry-backoff --example retry_example
//! ```

use retry_backoff::prelude::*;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: AtomicU32,
    fail_count: u32,
    failure: std::io::ErrorKind,
}

impl UnreliableApi {
    fn new(fail_count: u32, failure: std::io::ErrorKind) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
            failure,
        }
    }

    async fn call(&self) -> Result<String, std::io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED ({:?})", attempt + 1, self.failure);
            Err(std::io::Error::new(
                self.failure,
                format!("transient error on attempt {}", attempt + 1),
            ))
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

fn fast_backoff() -> ExponentialBackoff {
    ExponentialBackoff::builder()
        .base_delay(Duration::from_millis(100))
        .multiplier(2.0)
        .jitter(0.0) // No jitter for predictable output
        .build()
}

/// Example 1: Simple retry with exponential backoff
async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Simple Retry with Exponential Backoff ===\n");

    let api = UnreliableApi::new(2, std::io::ErrorKind::ConnectionReset);
    let retryer = BackoffRetryer::new(fast_backoff()).max_retries(3);

    let start = Instant::now();
    let result = invoke(&CancelSignal::new(), || api.call(), retryer).await?;

    println!("\nResult: {}", result);
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Only retry connection errors
async fn example_retry_if() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Retry Predicate (Connection Errors Only) ===\n");

    let driver = RetryDriver::with_retryer(
        BackoffRetryer::new(fast_backoff())
            .max_retries(3)
            .retry_if(|err: &std::io::Error| err.kind() == std::io::ErrorKind::ConnectionReset),
    );

    println!("Test 1: Permission error (should NOT retry)");
    let api = UnreliableApi::new(2, std::io::ErrorKind::PermissionDenied);
    let result = driver.invoke(&CancelSignal::new(), || api.call()).await;
    assert!(result.is_err());
    println!("  Gave up after {} attempt(s)", api.total_attempts());

    println!("\nTest 2: Connection reset (should retry)");
    let api = UnreliableApi::new(2, std::io::ErrorKind::ConnectionReset);
    let result = driver.invoke(&CancelSignal::new(), || api.call()).await;
    assert!(result.is_ok());
    println!("  Succeeded after {} attempt(s)", api.total_attempts());

    Ok(())
}

/// Example 3: A deadline that expires before the retries are done
async fn example_deadline() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Deadline Shorter Than Backoff ===\n");

    let api = UnreliableApi::new(10, std::io::ErrorKind::TimedOut);
    let retryer = BackoffRetryer::new(fast_backoff());
    let signal = CancelSignal::with_timeout(Duration::from_millis(250));

    match invoke(&signal, || api.call(), retryer).await {
        Err(RetryError::Cancelled(reason)) => {
            println!("\nStopped: {} after {} attempt(s)", reason, api.total_attempts());
        }
        other => println!("\nUnexpected outcome: {:?}", other),
    }

    Ok(())
}

/// Example 4: Jitter demonstration
fn example_jitter_impact() {
    println!("\n=== Example 4: Jitter Impact (10 Samples per Attempt) ===\n");

    let no_jitter = BackoffConfig::builder().jitter(0.0).build();
    let with_jitter = BackoffConfig::default();

    for (label, config) in [("without jitter", no_jitter), ("with 20% jitter", with_jitter)] {
        let backoff = ExponentialBackoff::new(config);
        println!("Delays {}:", label);
        for retries in 0..4 {
            let samples: Vec<String> = (0..10)
                .map(|_| format!("{}ms", backoff.delay(retries).as_millis()))
                .collect();
            println!("  attempt {}: {}", retries, samples.join(", "));
        }
    }

    println!("\nAttempt 0 is never jittered; later attempts vary by up to ±20%.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   retry-backoff: Retry Examples");
    println!("==============================================");

    example_simple_retry().await?;
    example_retry_if().await?;
    example_deadline().await?;
    example_jitter_impact();

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}

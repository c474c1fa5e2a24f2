//! Backoff policies and retry decisions.
//!
//! # Key Types
//!
//! - [`Backoff`] - maps a failed-attempt count to a delay
//! - [`ExponentialBackoff`] - exponential growth, capped, with jitter
//! - [`Retryer`] - decides whether and when to retry a failed attempt
//! - [`BackoffRetryer`] - a `Retryer` driven by a `Backoff` and a retry limit
//!
//! # Examples
//!
//! ```rust
//! use retry_backoff::cancel::CancelSignal;
//! use retry_backoff::driver::invoke;
//! use retry_backoff::retry::{BackoffRetryer, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retryer = BackoffRetryer::new(
//!     ExponentialBackoff::builder()
//!         .base_delay(Duration::from_millis(100))
//!         .build(),
//! )
//! .max_retries(3);
//!
//! let value = invoke(&CancelSignal::new(), || async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(42)
//! }, &retryer).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

mod exponential;
mod retryer;
mod strategy;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use retryer::{BackoffRetryer, RetryFn, RetryIf, retry_fn};
pub use strategy::{Backoff, RetryDecision, Retryer};

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Exponential backoff and a cancellable retry driver.
//!
//! This crate provides two pieces that compose but do not depend on each
//! other:
//!
//! - **Backoff policies** via the [`Backoff`](retry::Backoff) trait
//!   - [`ExponentialBackoff`](retry::ExponentialBackoff): capped exponential
//!     growth with multiplicative jitter
//!   - injectable random sources for reproducible delays
//! - **A retry driver** via [`invoke`](driver::invoke) and
//!   [`RetryDriver`](driver::RetryDriver)
//!   - caller-supplied retry decisions ([`Retryer`](retry::Retryer))
//!   - cancellation by explicit signal or deadline
//!     ([`CancelSignal`](cancel::CancelSignal))
//!
//! The driver only knows about the `Retryer` capability. A retryer usually
//! asks a backoff policy for the delay, as [`BackoffRetryer`](retry::BackoffRetryer)
//! does, but any closure will do.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use retry_backoff::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = ExponentialBackoff::builder()
//!     .base_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(5))
//!     .build();
//! let retryer = BackoffRetryer::new(backoff).max_retries(3);
//!
//! let signal = CancelSignal::with_timeout(Duration::from_secs(10));
//! let result = invoke(&signal, || async {
//!     Ok::<_, std::io::Error>(42)
//! }, retryer).await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod jitter;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use retry_backoff::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cancel::{CancelSignal, sleep};
    pub use crate::config::{BackoffConfig, BackoffConfigBuilder, BackoffSettings};
    pub use crate::driver::{RetryDriver, invoke};
    pub use crate::error::{Cancelled, RetryError};
    pub use crate::jitter::{FixedSequence, JitterSource, SeededRandom, ThreadRandom};
    pub use crate::retry::{
        Backoff, BackoffRetryer, ExponentialBackoff, ExponentialBackoffBuilder, RetryDecision,
        Retryer, retry_fn,
    };
}

//! The retry loop.
//!
//! [`invoke`] and [`RetryDriver::invoke`] call an operation until it
//! succeeds, until retrying is refused, or until the cancellation signal
//! interrupts a pause. Attempts are strictly sequential: attempt `n + 1`
//! starts only after attempt `n` and the pause that follows it are complete.
//!
//! The driver does not bound the number of attempts. Termination is the
//! caller's responsibility: either the [`Retryer`] eventually answers
//! [`RetryDecision::Stop`], or the [`CancelSignal`] fires. A retryer that
//! always retries, paired with a signal that never fires, loops forever.
//!
//! Cancellation is only observed while pausing between attempts. An
//! operation that is already running is not interrupted; pass the signal
//! into the operation if it should stop early as well.

use crate::cancel::{self, CancelSignal};
use crate::classify::{is_unknown_authority, never_permanent};
use crate::error::RetryError;
use crate::retry::{RetryDecision, Retryer};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Classifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Call `operation` until it succeeds, `retryer` gives up, or `signal` fires.
///
/// Errors recognised by [`is_unknown_authority`] are never retried.
///
/// # Returns
/// - `Ok(T)`: the first successful result
/// - `Err(RetryError::Operation(e))`: the error of the final attempt, unchanged
/// - `Err(RetryError::Cancelled(reason))`: the signal fired while pausing
///
/// # Examples
///
/// ```rust
/// use retry_backoff::cancel::CancelSignal;
/// use retry_backoff::driver::invoke;
/// use retry_backoff::retry::{retry_fn, RetryDecision};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let calls = AtomicU32::new(0);
/// let retryer = retry_fn(|attempt, _err: &std::io::Error| {
///     if attempt < 3 {
///         RetryDecision::Retry(Duration::from_millis(1))
///     } else {
///         RetryDecision::Stop
///     }
/// });
///
/// let result = invoke(&CancelSignal::new(), || async {
///     if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///         Err(std::io::Error::other("transient"))
///     } else {
///         Ok("done")
///     }
/// }, retryer).await;
///
/// assert_eq!(result.unwrap(), "done");
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # }
/// ```
pub async fn invoke<T, E, F, Fut, R>(
    signal: &CancelSignal,
    operation: F,
    retryer: R,
) -> Result<T, RetryError<E>>
where
    E: Error + Send + Sync + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Retryer<E>,
{
    drive(
        signal,
        operation,
        Some(&retryer),
        &|err: &E| is_unknown_authority(err),
    )
    .await
}

/// A reusable retry loop configuration.
///
/// Holds an optional [`Retryer`] and a classifier for permanent errors. The
/// driver is cheap to clone and can serve any number of concurrent
/// [`invoke`](Self::invoke) calls; each call keeps its own attempt counter.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::cancel::CancelSignal;
/// use retry_backoff::driver::RetryDriver;
/// use retry_backoff::retry::{BackoffRetryer, ExponentialBackoff};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let driver = RetryDriver::with_retryer(
///     BackoffRetryer::new(
///         ExponentialBackoff::builder()
///             .base_delay(Duration::from_millis(100))
///             .build(),
///     )
///     .max_retries(5),
/// );
///
/// let signal = CancelSignal::with_timeout(Duration::from_secs(30));
/// let body = driver
///     .invoke(&signal, || async { Ok::<_, std::io::Error>("response") })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RetryDriver<E> {
    retryer: Option<Arc<dyn Retryer<E>>>,
    is_permanent: Classifier<E>,
}

impl<E> RetryDriver<E>
where
    E: Error + Send + Sync + 'static,
{
    /// A driver without a retryer: the first error is returned as is.
    pub fn new() -> Self {
        Self {
            retryer: None,
            is_permanent: Arc::new(|err: &E| is_unknown_authority(err)),
        }
    }

    /// A driver that consults `retryer` after each failure.
    pub fn with_retryer(retryer: impl Retryer<E> + 'static) -> Self {
        Self::new().retryer(retryer)
    }

    /// Set the retryer.
    pub fn retryer(mut self, retryer: impl Retryer<E> + 'static) -> Self {
        self.retryer = Some(Arc::new(retryer));
        self
    }

    /// Replace the permanent-error classifier.
    ///
    /// Errors for which `predicate` returns `true` are returned without
    /// consulting the retryer. This replaces the default unknown-authority
    /// check; call [`is_unknown_authority`] from `predicate` to keep it.
    pub fn permanent_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.is_permanent = Arc::new(predicate);
        self
    }

    /// Leave every retry decision to the retryer, including for certificate
    /// errors.
    pub fn retry_all_errors(self) -> Self {
        self.permanent_if(never_permanent::<E>)
    }

    /// Returns `true` if a retryer is configured.
    pub fn has_retryer(&self) -> bool {
        self.retryer.is_some()
    }

    /// Run `operation` under this driver's retry configuration.
    ///
    /// See [`invoke`](crate::driver::invoke) for the termination rules.
    pub async fn invoke<T, F, Fut>(
        &self,
        signal: &CancelSignal,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        drive(
            signal,
            operation,
            self.retryer.as_deref(),
            self.is_permanent.as_ref(),
        )
        .await
    }
}

impl<E> Default for RetryDriver<E>
where
    E: Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryDriver<E> {
    fn clone(&self) -> Self {
        Self {
            retryer: self.retryer.clone(),
            is_permanent: Arc::clone(&self.is_permanent),
        }
    }
}

impl<E> fmt::Debug for RetryDriver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDriver")
            .field("has_retryer", &self.retryer.is_some())
            .finish_non_exhaustive()
    }
}

async fn drive<T, E, F, Fut>(
    signal: &CancelSignal,
    mut operation: F,
    retryer: Option<&dyn Retryer<E>>,
    is_permanent: &(dyn Fn(&E) -> bool + Send + Sync),
) -> Result<T, RetryError<E>>
where
    E: Error + Send + Sync + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                tracing::trace!(attempt, "operation succeeded");
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(retryer) = retryer else {
            return Err(RetryError::Operation(err));
        };

        if is_permanent(&err) {
            tracing::debug!(attempt, error = %err, "permanent error, not retrying");
            return Err(RetryError::Operation(err));
        }

        match retryer.decide(attempt, &err) {
            RetryDecision::Stop => {
                tracing::debug!(attempt, error = %err, "retryer gave up");
                return Err(RetryError::Operation(err));
            }
            RetryDecision::Retry(pause) => {
                tracing::debug!(attempt, ?pause, error = %err, "attempt failed, retrying");
                if let Err(reason) = cancel::sleep(signal, pause).await {
                    tracing::debug!(attempt, %reason, "cancelled while waiting to retry");
                    return Err(RetryError::Cancelled(reason));
                }
            }
        }

        attempt = attempt.saturating_add(1);
    }
}

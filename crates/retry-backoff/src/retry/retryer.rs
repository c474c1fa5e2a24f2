//! Ready-made [`Retryer`] implementations.

use super::strategy::{Backoff, RetryDecision, Retryer};
use std::fmt;
use std::marker::PhantomData;

/// Adapts a closure `Fn(attempt, &error) -> RetryDecision` into a [`Retryer`].
///
/// Built by [`retry_fn`].
pub struct RetryFn<F, E> {
    f: F,
    _error: PhantomData<fn(&E)>,
}

impl<F, E> fmt::Debug for RetryFn<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFn").finish_non_exhaustive()
    }
}

/// Use a closure as the retry decision.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::retry::{retry_fn, RetryDecision, Retryer};
/// use std::io;
/// use std::time::Duration;
///
/// let retryer = retry_fn(|attempt, err: &io::Error| {
///     if attempt < 3 && err.kind() == io::ErrorKind::TimedOut {
///         RetryDecision::Retry(Duration::from_millis(50))
///     } else {
///         RetryDecision::Stop
///     }
/// });
///
/// let timeout = io::Error::from(io::ErrorKind::TimedOut);
/// assert!(retryer.decide(0, &timeout).should_retry());
/// assert!(!retryer.decide(3, &timeout).should_retry());
/// ```
pub fn retry_fn<E, F>(f: F) -> RetryFn<F, E>
where
    F: Fn(u32, &E) -> RetryDecision + Send + Sync,
{
    RetryFn {
        f,
        _error: PhantomData,
    }
}

impl<E, F> Retryer<E> for RetryFn<F, E>
where
    F: Fn(u32, &E) -> RetryDecision + Send + Sync,
{
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision {
        (self.f)(attempt, error)
    }
}

/// Retries every error with delays from a [`Backoff`] policy, optionally
/// giving up after a fixed number of retries.
///
/// With `max_retries(3)` the operation runs at most 4 times: attempts 0, 1
/// and 2 are retried, the failure of attempt 3 is returned.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::retry::{BackoffRetryer, ExponentialBackoff, Retryer};
/// use std::io;
///
/// let retryer = BackoffRetryer::new(ExponentialBackoff::default()).max_retries(3);
/// let err = io::Error::other("unavailable");
///
/// assert!(retryer.decide(2, &err).should_retry());
/// assert!(!retryer.decide(3, &err).should_retry());
/// ```
#[derive(Debug, Clone)]
pub struct BackoffRetryer<B> {
    backoff: B,
    max_retries: Option<u32>,
}

impl<B: Backoff> BackoffRetryer<B> {
    /// Retry without limit, pausing for `backoff.delay(attempt)`.
    pub fn new(backoff: B) -> Self {
        Self {
            backoff,
            max_retries: None,
        }
    }

    /// Stop once `max_retries` retries have been made.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// The configured retry limit, if any.
    pub fn retry_limit(&self) -> Option<u32> {
        self.max_retries
    }

    /// The underlying backoff policy.
    pub fn backoff(&self) -> &B {
        &self.backoff
    }
}

impl<B: Backoff, E> Retryer<E> for BackoffRetryer<B> {
    fn decide(&self, attempt: u32, _error: &E) -> RetryDecision {
        match self.max_retries {
            Some(max) if attempt >= max => RetryDecision::Stop,
            _ => RetryDecision::Retry(self.backoff.delay(attempt)),
        }
    }
}

/// Wraps a retryer so that only errors matching a predicate are retried.
///
/// Built by [`Retryer::retry_if`].
#[derive(Clone)]
pub struct RetryIf<R, P> {
    inner: R,
    predicate: P,
}

impl<R, P> RetryIf<R, P> {
    pub(crate) fn new(inner: R, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<R: fmt::Debug, P> fmt::Debug for RetryIf<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryIf")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<E, R, P> Retryer<E> for RetryIf<R, P>
where
    R: Retryer<E>,
    P: Fn(&E) -> bool + Send + Sync,
{
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision {
        if (self.predicate)(error) {
            self.inner.decide(attempt, error)
        } else {
            RetryDecision::Stop
        }
    }
}

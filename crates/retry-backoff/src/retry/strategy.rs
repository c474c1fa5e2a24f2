//! Backoff policies and retry decisions.

use std::time::Duration;

/// A policy mapping the number of failed attempts to a delay.
///
/// Implementations are pure apart from any randomization: they never fail and
/// never sleep. Use them from a [`Retryer`] to decide how long the driver
/// should pause.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::retry::{Backoff, ExponentialBackoff};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::default();
/// for retries in 0..3 {
///     let delay = backoff.delay(retries);
///     assert!(delay <= Duration::from_secs(144));
/// }
/// ```
pub trait Backoff: Send + Sync {
    /// The time to wait before the next attempt, given how many attempts
    /// have already failed (0-indexed).
    fn delay(&self, retries: u32) -> Duration;
}

impl<B: Backoff + ?Sized> Backoff for std::sync::Arc<B> {
    fn delay(&self, retries: u32) -> Duration {
        (**self).delay(retries)
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn delay(&self, retries: u32) -> Duration {
        (**self).delay(retries)
    }
}

/// The outcome of consulting a [`Retryer`] after a failed attempt.
///
/// Equivalent to a `(pause, should_retry)` pair; `From<(Duration, bool)>` is
/// provided for callers that think of it that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryDecision {
    /// Wait for the given duration, then call the operation again.
    Retry(Duration),
    /// Give up and return the operation's error.
    Stop,
}

impl RetryDecision {
    /// Returns `true` if the operation should be attempted again.
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Retry(_))
    }

    /// The pause before the next attempt; zero when stopping.
    pub fn pause(&self) -> Duration {
        match self {
            Self::Retry(pause) => *pause,
            Self::Stop => Duration::ZERO,
        }
    }
}

impl From<(Duration, bool)> for RetryDecision {
    fn from((pause, should_retry): (Duration, bool)) -> Self {
        if should_retry {
            Self::Retry(pause)
        } else {
            Self::Stop
        }
    }
}

impl From<Option<Duration>> for RetryDecision {
    fn from(pause: Option<Duration>) -> Self {
        pause.map_or(Self::Stop, Self::Retry)
    }
}

/// Decides whether and when a failed operation is retried.
///
/// The driver calls [`decide`](Self::decide) once per failure, with the
/// 0-indexed attempt number and the error. It never calls it after a success.
///
/// The driver itself imposes no limit on the number of attempts: a retryer
/// that always answers [`RetryDecision::Retry`] loops until the cancellation
/// signal fires, and forever if the signal never does.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::retry::{RetryDecision, Retryer};
/// use std::io;
/// use std::time::Duration;
///
/// struct ThreeTries;
///
/// impl Retryer<io::Error> for ThreeTries {
///     fn decide(&self, attempt: u32, _error: &io::Error) -> RetryDecision {
///         if attempt < 2 {
///             RetryDecision::Retry(Duration::from_millis(10))
///         } else {
///             RetryDecision::Stop
///         }
///     }
/// }
/// ```
pub trait Retryer<E>: Send + Sync {
    /// Decide what to do after attempt `attempt` failed with `error`.
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision;

    /// Only retry errors for which `predicate` returns `true`; all others
    /// stop immediately.
    fn retry_if<P>(self, predicate: P) -> super::RetryIf<Self, P>
    where
        Self: Sized,
        P: Fn(&E) -> bool + Send + Sync,
    {
        super::RetryIf::new(self, predicate)
    }
}

impl<E, R: Retryer<E> + ?Sized> Retryer<E> for std::sync::Arc<R> {
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision {
        (**self).decide(attempt, error)
    }
}

impl<E, R: Retryer<E> + ?Sized> Retryer<E> for Box<R> {
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision {
        (**self).decide(attempt, error)
    }
}

impl<E, R: Retryer<E> + ?Sized> Retryer<E> for &R {
    fn decide(&self, attempt: u32, error: &E) -> RetryDecision {
        (**self).decide(attempt, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_from_pair() {
        let retry = RetryDecision::from((Duration::from_millis(5), true));
        assert!(retry.should_retry());
        assert_eq!(retry.pause(), Duration::from_millis(5));

        let stop = RetryDecision::from((Duration::from_millis(5), false));
        assert!(!stop.should_retry());
        assert_eq!(stop.pause(), Duration::ZERO);
    }

    #[test]
    fn test_decision_from_option() {
        assert_eq!(
            RetryDecision::from(Some(Duration::from_secs(1))),
            RetryDecision::Retry(Duration::from_secs(1))
        );
        assert_eq!(RetryDecision::from(None), RetryDecision::Stop);
    }
}

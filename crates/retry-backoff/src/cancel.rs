//! Cancellation signals and the cancellable sleep.
//!
//! A [`CancelSignal`] fires either when it is cancelled explicitly or when its
//! deadline passes, whichever comes first. [`sleep`] is the only point at
//! which the retry driver waits, and the only point at which it observes the
//! signal.

use crate::error::Cancelled;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An externally controlled signal that can interrupt a pending retry.
///
/// Clones share the same underlying token: cancelling any clone cancels all
/// of them. Use [`child`](Self::child) to derive a signal that is cancelled
/// with its parent but can also be cancelled on its own.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::cancel::CancelSignal;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let signal = CancelSignal::with_timeout(Duration::from_secs(5));
/// assert!(!signal.is_cancelled());
///
/// signal.cancel();
/// assert!(signal.is_cancelled());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that fires once `timeout` has elapsed from now.
    ///
    /// The deadline is measured on tokio's clock, so it follows
    /// `tokio::time::pause`/`advance` in tests. A timeout too large to
    /// represent as an instant, such as `Duration::MAX`, sets no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// A signal that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Wrap an existing token, e.g. one shared with a shutdown handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a signal that fires with this one, keeps its deadline, and can
    /// be cancelled independently.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel the signal, waking any pending [`sleep`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` if the signal has already fired.
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// The reason the signal fired, or `None` if it is still live.
    ///
    /// Explicit cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<Cancelled> {
        if self.token.is_cancelled() {
            return Some(Cancelled::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancelled::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the signal fires and return why.
    pub async fn done(&self) -> Cancelled {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Cancelled::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Cancelled::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                Cancelled::Cancelled
            }
        }
    }
}

impl From<CancellationToken> for CancelSignal {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}

/// Sleep for `duration` unless `signal` fires first.
///
/// Returns `Ok(())` once the duration has elapsed, or the reason the signal
/// fired. A signal that has already fired returns immediately without arming
/// a timer. The timer is dropped on either path.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::cancel::{sleep, CancelSignal};
/// use retry_backoff::error::Cancelled;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let signal = CancelSignal::new();
/// signal.cancel();
///
/// let result = sleep(&signal, Duration::from_secs(60)).await;
/// assert_eq!(result, Err(Cancelled::Cancelled));
/// # }
/// ```
pub async fn sleep(signal: &CancelSignal, duration: Duration) -> Result<(), Cancelled> {
    if let Some(reason) = signal.err() {
        return Err(reason);
    }

    let timer = tokio::time::sleep(duration);
    tokio::pin!(timer);

    tokio::select! {
        biased;
        reason = signal.done() => Err(reason),
        _ = &mut timer => Ok(()),
    }
}

//! Error types surfaced by the retry driver and the cancellable sleep.
//!
//! A call to [`invoke`](crate::driver::invoke) ends in exactly one of three
//! ways: success, the last operation error (returned unchanged), or the
//! reason the cancellation signal fired. [`RetryError`] carries the latter two
//! without wrapping them in further context.

use thiserror::Error;

/// Why a [`CancelSignal`](crate::cancel::CancelSignal) fired.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cancelled {
    /// The signal was cancelled explicitly.
    #[error("context canceled")]
    Cancelled,

    /// The signal's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl Cancelled {
    /// Returns `true` if the signal fired because its deadline passed.
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// Terminal error of a retried operation.
///
/// `Operation` holds the error the operation itself returned on its final
/// attempt. `Cancelled` replaces that error when the cancellation signal
/// interrupted the pause before the next attempt.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed and was not (or could no longer be) retried.
    #[error("{0}")]
    Operation(E),

    /// The cancellation signal fired while waiting to retry.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl<E> RetryError<E> {
    /// Returns `true` if the retry loop was cut short by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// The cancellation reason, if this error came from the cancel signal.
    pub fn cancel_reason(&self) -> Option<Cancelled> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            Self::Operation(_) => None,
        }
    }

    /// Borrow the operation error, if there is one.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Cancelled(_) => None,
        }
    }

    /// Take the operation error, if there is one.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Cancelled(_) => None,
        }
    }
}

/// Result type for retried operations.
pub type Result<T, E> = std::result::Result<T, RetryError<E>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_cancelled_messages() {
        assert_eq!(Cancelled::Cancelled.to_string(), "context canceled");
        assert_eq!(
            Cancelled::DeadlineExceeded.to_string(),
            "context deadline exceeded"
        );
        assert!(Cancelled::DeadlineExceeded.is_deadline());
        assert!(!Cancelled::Cancelled.is_deadline());
    }

    #[test]
    fn test_operation_error_displays_unchanged() {
        let err: RetryError<io::Error> = RetryError::Operation(io::Error::other("boom"));

        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_cancelled());
        assert_eq!(err.cancel_reason(), None);
        assert_eq!(err.operation_error().map(|e| e.to_string()), Some("boom".into()));
    }

    #[test]
    fn test_cancelled_converts_with_question_mark() {
        fn wait() -> std::result::Result<(), Cancelled> {
            Err(Cancelled::DeadlineExceeded)
        }

        fn interrupted() -> Result<(), io::Error> {
            wait()?;
            Ok(())
        }

        let err = interrupted().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.cancel_reason(), Some(Cancelled::DeadlineExceeded));
        assert!(err.into_operation_error().is_none());
    }
}

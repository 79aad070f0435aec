//! Cooperative cancellation for icon resolution.
//!
//! A resolution may fan out to a dozen candidate fetches. The frontend can
//! abandon it (the user closed the form) by cancelling the token it passed in;
//! candidate fetches that have not started yet are skipped and the call
//! returns [`IconError::Cancelled`](crate::IconError::Cancelled).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same state.
///
/// ```
/// use appdeck_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation on every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(CancelledError)` once cancellation was requested.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Returned when work is skipped because its token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}

impl From<CancelledError> for crate::error::IconError {
    fn from(_: CancelledError) -> Self {
        crate::error::IconError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_clone_shares_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(CancelledError));
    }

    #[test]
    fn test_converts_to_icon_error() {
        let err: crate::IconError = CancelledError.into();
        assert!(matches!(err, crate::IconError::Cancelled));
    }
}

//! Cooperative cancellation for foreground waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CartoonError;

/// Cooperative cancellation token using an atomic bool.
///
/// # Example
/// ```
/// use cartoon_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check_cancelled().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Return `Err(CartoonError::Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), CartoonError> {
        if self.is_cancelled() {
            Err(CartoonError::Cancelled)
        } else {
            Ok(())
        }
    }
}

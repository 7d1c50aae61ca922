//! Error type for cartoon pools.

use cartoon_memory::AllocError;
use cartoon_timer::TimerError;

/// Error type for cartoon pool operations.
#[derive(Debug, thiserror::Error)]
pub enum CartoonError {
    /// The pool could not hand out a slot.
    #[error("allocation failed: {0}")]
    Alloc(#[from] AllocError),

    /// The timer facility refused a registration.
    #[error("timer registration failed: {0}")]
    Timer(#[from] TimerError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Startup failed and every cartoon set up so far was rolled back.
    #[error("startup failed after {ready} of {requested} cartoons: {source}")]
    Startup {
        /// Cartoons fully armed before the failure.
        ready: usize,
        /// Cartoons requested.
        requested: usize,
        /// What went wrong.
        source: Box<CartoonError>,
    },

    /// The run was cancelled before every cartoon retired.
    #[error("run cancelled")]
    Cancelled,

    /// The run timed out before every cartoon retired.
    #[error("run timed out after {0}")]
    Timeout(String),
}

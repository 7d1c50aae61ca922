//! Allocation errors.

/// Error returned by pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// Every slot is currently handed out.
    #[error("pool '{name}' exhausted ({capacity} slots in use)")]
    Exhausted {
        /// Pool name.
        name: String,
        /// Total number of slots.
        capacity: usize,
    },

    /// The pool was destroyed and hands out nothing.
    #[error("pool '{0}' has been destroyed")]
    Destroyed(String),

    /// Destroy was requested while slots were still outstanding.
    #[error("pool '{name}' destroyed with {outstanding} slot(s) still outstanding")]
    Leaked {
        /// Pool name.
        name: String,
        /// Number of slots never released.
        outstanding: usize,
    },
}

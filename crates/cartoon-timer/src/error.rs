//! Timer facility errors.

/// Error returned when a timer cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// The service already holds its maximum number of registrations.
    #[error("timer service exhausted ({0} registrations)")]
    Exhausted(usize),

    /// The service has been shut down.
    #[error("timer service is shut down")]
    ShutDown,

    /// The worker thread could not be spawned.
    #[error("failed to spawn timer worker: {0}")]
    Spawn(String),
}

//! Orchestration interfaces.

use std::time::Duration;

use serde::Serialize;

use cartoon_core::cartoon::CartoonSnapshot;

/// Trait for watching a running pool.
pub trait PoolObserver: Send + Sync {
    /// Called on every poll with the number of retired cartoons.
    fn on_progress(&self, retired: usize, total: usize);

    /// Called once the wait is over, whatever the outcome.
    fn complete(&self);
}

/// Trait for presenting the outcome of a run to the user.
pub trait ReportPresenter {
    /// Present a completed teardown.
    fn present_report(&self, report: &StopReport, elapsed: Duration);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Outcome of stopping a pool.
#[derive(Debug, Clone, Serialize)]
pub struct StopReport {
    /// Cartoons cancelled and released.
    pub stopped: usize,
    /// Cartoons that had already spent their budget.
    pub terminal: usize,
    /// Cartoons whose pending or in-flight fire was cut short.
    pub interrupted: usize,
    /// Fires handled across the pool.
    pub total_fires: u64,
    /// Final state of every cartoon, taken after cancellation.
    pub cartoons: Vec<CartoonSnapshot>,
}

/// Observer that does nothing.
pub struct NullObserver;

impl PoolObserver for NullObserver {
    fn on_progress(&self, _retired: usize, _total: usize) {}
    fn complete(&self) {}
}

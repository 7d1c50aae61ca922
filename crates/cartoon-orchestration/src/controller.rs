//! Pool controller: bulk startup with rollback and synchronous teardown.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use cartoon_core::cancel::CancellationToken;
use cartoon_core::cartoon::{Cartoon, CartoonSnapshot};
use cartoon_core::engine::TimerEngine;
use cartoon_core::error::CartoonError;
use cartoon_memory::{Allocator, Slot};

use crate::interfaces::{PoolObserver, StopReport};

/// Owns every live cartoon of one pool.
pub struct PoolController {
    engine: TimerEngine,
    allocator: Arc<dyn Allocator<Cartoon>>,
    cartoons: Vec<Slot<Cartoon>>,
    stopped: bool,
}

impl PoolController {
    /// Acquire and arm `capacity` cartoons, or none at all.
    ///
    /// On the first failure every cartoon set up so far is cancelled and
    /// released, the pool is destroyed, and the failure is returned as
    /// [`CartoonError::Startup`].
    pub fn start(
        allocator: Arc<dyn Allocator<Cartoon>>,
        engine: TimerEngine,
        capacity: usize,
    ) -> Result<Self, CartoonError> {
        info!(capacity, "starting cartoon pool");
        let mut cartoons = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            match spawn_one(allocator.as_ref(), &engine) {
                Ok(slot) => cartoons.push(slot),
                Err(err) => {
                    let ready = cartoons.len();
                    warn!(ready, requested = capacity, error = %err, "startup failed, rolling back");
                    teardown(&engine, allocator.as_ref(), cartoons);
                    return Err(CartoonError::Startup {
                        ready,
                        requested: capacity,
                        source: Box::new(err),
                    });
                }
            }
        }
        info!(armed = cartoons.len(), "cartoon pool started");
        Ok(Self {
            engine,
            allocator,
            cartoons,
            stopped: false,
        })
    }

    /// Number of cartoons owned by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cartoons.len()
    }

    /// Whether the pool owns no cartoons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cartoons.is_empty()
    }

    /// Current state of every cartoon.
    #[must_use]
    pub fn snapshots(&self) -> Vec<CartoonSnapshot> {
        self.cartoons.iter().map(|c| c.snapshot()).collect()
    }

    /// Number of cartoons that have spent their budget.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.cartoons.iter().filter(|c| c.is_terminal()).count()
    }

    /// Whether every cartoon has spent its budget.
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.terminal_count() == self.cartoons.len()
    }

    /// Poll until every cartoon retires, the token is cancelled, or the
    /// timeout elapses.
    pub fn wait_until_retired(
        &self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
        poll: Duration,
        observer: &dyn PoolObserver,
    ) -> Result<(), CartoonError> {
        let started = Instant::now();
        let total = self.cartoons.len();
        let outcome = loop {
            let retired = self.terminal_count();
            observer.on_progress(retired, total);
            if retired == total {
                break Ok(());
            }
            if let Err(err) = cancel.check_cancelled() {
                break Err(err);
            }
            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    break Err(CartoonError::Timeout(format!("{timeout:?}")));
                }
            }
            thread::sleep(poll);
        };
        observer.complete();
        outcome
    }

    /// Cancel and release every cartoon, then destroy the pool.
    ///
    /// # Panics
    ///
    /// Panics if the pool still reports outstanding slots afterwards.
    pub fn stop(mut self) -> StopReport {
        self.stopped = true;
        let cartoons = std::mem::take(&mut self.cartoons);
        let report = teardown(&self.engine, self.allocator.as_ref(), cartoons);
        info!(
            stopped = report.stopped,
            terminal = report.terminal,
            interrupted = report.interrupted,
            "cartoon pool stopped"
        );
        report
    }
}

impl Drop for PoolController {
    fn drop(&mut self) {
        if !self.stopped {
            warn!(live = self.cartoons.len(), "cartoon pool dropped without stop");
            let cartoons = std::mem::take(&mut self.cartoons);
            teardown(&self.engine, self.allocator.as_ref(), cartoons);
        }
    }
}

/// Acquire one cartoon and arm it, releasing the slot if arming fails.
fn spawn_one(
    allocator: &dyn Allocator<Cartoon>,
    engine: &TimerEngine,
) -> Result<Slot<Cartoon>, CartoonError> {
    let slot = allocator.acquire()?;
    if let Err(err) = engine.arm(&slot) {
        allocator.release(slot);
        return Err(err);
    }
    Ok(slot)
}

/// Cancel, release, and destroy. Shared by stop and startup rollback.
fn teardown(
    engine: &TimerEngine,
    allocator: &dyn Allocator<Cartoon>,
    cartoons: Vec<Slot<Cartoon>>,
) -> StopReport {
    let mut report = StopReport {
        stopped: 0,
        terminal: 0,
        interrupted: 0,
        total_fires: 0,
        cartoons: Vec::with_capacity(cartoons.len()),
    };
    for slot in cartoons {
        if engine.cancel_sync(&slot) {
            report.interrupted += 1;
        }
        let snapshot = slot.snapshot();
        if snapshot.terminal {
            report.terminal += 1;
        }
        report.total_fires += u64::from(snapshot.fired);
        report.cartoons.push(snapshot);
        allocator.release(slot);
        report.stopped += 1;
    }
    if let Err(err) = allocator.destroy() {
        panic!("cartoon pool teardown incomplete: {err}");
    }
    report
}

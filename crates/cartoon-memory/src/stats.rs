//! Atomic pool statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of slots created for the first time.
    pub constructed: u64,
    /// Number of successful acquisitions (fresh or reused).
    pub acquired: u64,
    /// Number of slots handed back.
    pub released: u64,
    /// Number of acquisitions refused because the pool was full.
    pub exhausted: u64,
}

impl PoolStats {
    /// Acquisitions served from a previously released slot.
    #[must_use]
    pub fn reused(&self) -> u64 {
        self.acquired.saturating_sub(self.constructed)
    }
}

/// Atomic pool statistics for lock-free updates.
pub struct AtomicPoolStats {
    constructed: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
    exhausted: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self {
            constructed: AtomicU64::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            constructed: self.constructed.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Increment construction counter.
    pub fn record_construct(&self) {
        self.constructed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment acquisition counter.
    pub fn record_acquire(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment release counter.
    pub fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment exhaustion counter.
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicPoolStats {
    fn default() -> Self {
        Self::new()
    }
}

//! Fixed-capacity slab pool with constructor-on-acquire semantics.
//!
//! A [`SlabCache`] owns `capacity` slots. Storage for a slot is created the
//! first time it is handed out and kept for reuse after release; the pool's
//! constructor runs on every acquisition so a reused slot always starts from
//! a freshly initialized state.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::AllocError;
use crate::stats::{AtomicPoolStats, PoolStats};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Constructor run on every slot handed out by a [`SlabCache`].
pub type Constructor<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// Object pool interface consumed by the pool controller.
pub trait Allocator<T>: Send + Sync {
    /// Hand out a freshly constructed slot. Never blocks.
    fn acquire(&self) -> Result<Slot<T>, AllocError>;

    /// Return a slot to the pool.
    ///
    /// # Panics
    ///
    /// Panics if the slot belongs to another pool or is still shared.
    fn release(&self, slot: Slot<T>);

    /// Number of slots currently handed out.
    fn outstanding(&self) -> usize;

    /// Total number of slots.
    fn capacity(&self) -> usize;

    /// Tear the pool down. Fails if any slot is still outstanding.
    fn destroy(&self) -> Result<(), AllocError>;
}

/// A slot handed out by a pool.
///
/// Dereferences to the pooled value. The value lives behind an [`Arc`] so a
/// background context can hold a reference through [`Slot::share`]; every
/// such reference must be dropped before the slot is released.
pub struct Slot<T> {
    pool_id: u64,
    index: usize,
    value: Arc<T>,
}

impl<T> Slot<T> {
    /// Position of this slot in its pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Clone a shared reference to the pooled value.
    #[must_use]
    pub fn share(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }

    /// Whether this handle is the only reference to the value.
    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        Arc::strong_count(&self.value) == 1
    }
}

impl<T> Deref for Slot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("index", &self.index)
            .field("value", &self.value)
            .finish()
    }
}

struct SlabState<T> {
    slots: Vec<Option<Arc<T>>>,
    in_use: Vec<bool>,
    free: Vec<usize>,
    outstanding: usize,
    destroyed: bool,
}

/// Slab of `capacity` reusable slots guarded by a short-lived mutex.
pub struct SlabCache<T> {
    name: String,
    id: u64,
    capacity: usize,
    constructor: Constructor<T>,
    state: Mutex<SlabState<T>>,
    stats: AtomicPoolStats,
}

impl<T: Default> SlabCache<T> {
    /// Create a pool of `capacity` slots. No storage is created up front.
    pub fn new<F>(name: impl Into<String>, capacity: usize, constructor: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(pool = %name, capacity, "creating slab cache");
        Self {
            name,
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            capacity,
            constructor: Box::new(constructor),
            state: Mutex::new(SlabState {
                slots: (0..capacity).map(|_| None).collect(),
                in_use: vec![false; capacity],
                // Reversed so the lowest index is handed out first.
                free: (0..capacity).rev().collect(),
                outstanding: 0,
                destroyed: false,
            }),
            stats: AtomicPoolStats::new(),
        }
    }

    /// Pool name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots that can be acquired right now.
    #[must_use]
    pub fn available(&self) -> usize {
        let state = self.state.lock();
        if state.destroyed {
            0
        } else {
            state.free.len()
        }
    }

    /// Whether [`Allocator::destroy`] has completed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Get a snapshot of pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }
}

impl<T: Default + Send + Sync> Allocator<T> for SlabCache<T> {
    fn acquire(&self) -> Result<Slot<T>, AllocError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(AllocError::Destroyed(self.name.clone()));
        }
        let Some(index) = state.free.pop() else {
            self.stats.record_exhausted();
            return Err(AllocError::Exhausted {
                name: self.name.clone(),
                capacity: self.capacity,
            });
        };

        let mut value = if let Some(value) = state.slots[index].take() {
            value
        } else {
            self.stats.record_construct();
            Arc::new(T::default())
        };
        let Some(inner) = Arc::get_mut(&mut value) else {
            panic!("slot {index} of pool '{}' reused while still shared", self.name);
        };
        (self.constructor)(inner);

        state.in_use[index] = true;
        state.outstanding += 1;
        self.stats.record_acquire();
        trace!(pool = %self.name, index, "slot acquired");
        Ok(Slot {
            pool_id: self.id,
            index,
            value,
        })
    }

    fn release(&self, slot: Slot<T>) {
        assert_eq!(
            slot.pool_id, self.id,
            "slot {} released to foreign pool '{}'",
            slot.index, self.name
        );
        let Slot { index, value, .. } = slot;
        let refs = Arc::strong_count(&value);
        assert!(
            refs == 1,
            "slot {index} of pool '{}' released with {refs} live references",
            self.name
        );

        let mut state = self.state.lock();
        assert!(
            state.in_use[index],
            "slot {index} of pool '{}' released twice",
            self.name
        );
        state.in_use[index] = false;
        state.slots[index] = Some(value);
        state.free.push(index);
        state.outstanding -= 1;
        self.stats.record_release();
        trace!(pool = %self.name, index, "slot released");
    }

    fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn destroy(&self) -> Result<(), AllocError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Ok(());
        }
        if state.outstanding > 0 {
            return Err(AllocError::Leaked {
                name: self.name.clone(),
                outstanding: state.outstanding,
            });
        }
        state.destroyed = true;
        state.slots.clear();
        state.free.clear();
        debug!(pool = %self.name, "slab cache destroyed");
        Ok(())
    }
}

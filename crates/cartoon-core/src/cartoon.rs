//! The cartoon entity and its pooled constructor.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use cartoon_memory::SlabCache;
use cartoon_timer::TimerId;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use crate::constants::{CACHE_NAME, FIRE_BUDGET_BASE, MAX_FIRE_SPREAD, MAX_NAME_LEN};
use crate::random::RandomSource;

/// Lifecycle of a cartoon's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TimerState {
    /// Constructed, no timer registered yet.
    Unarmed = 0,
    /// A fire is scheduled or running.
    Armed = 1,
    /// Budget spent; no further fire will be scheduled.
    Terminal = 2,
    /// Retired by the controller.
    Cancelled = 3,
}

impl TimerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unarmed,
            1 => Self::Armed,
            2 => Self::Terminal,
            3 => Self::Cancelled,
            _ => unreachable!("invalid timer state {raw}"),
        }
    }
}

/// One self-rescheduling unit of work.
///
/// The counters are only written by the cartoon's own fire handler; the
/// controller only retires the state and takes the timer handle.
#[derive(Debug)]
pub struct Cartoon {
    name: String,
    budget: u32,
    remaining: AtomicU32,
    fired: AtomicU32,
    terminal: AtomicBool,
    state: AtomicU8,
    timer: Mutex<Option<TimerId>>,
}

impl Default for Cartoon {
    fn default() -> Self {
        Self {
            name: String::new(),
            budget: 0,
            remaining: AtomicU32::new(0),
            fired: AtomicU32::new(0),
            terminal: AtomicBool::new(false),
            state: AtomicU8::new(TimerState::Unarmed as u8),
            timer: Mutex::new(None),
        }
    }
}

impl Cartoon {
    /// Reset this slot to a freshly constructed cartoon.
    fn reset(&mut self, name: String, budget: u32) {
        debug_assert!(name.len() <= MAX_NAME_LEN);
        self.name = name;
        self.budget = budget;
        *self.remaining.get_mut() = budget;
        *self.fired.get_mut() = 0;
        *self.terminal.get_mut() = false;
        *self.state.get_mut() = TimerState::Unarmed as u8;
        *self.timer.get_mut() = None;
    }

    /// Stable identifier, `cartoon-<n>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reschedules granted at construction.
    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Reschedules left.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Fires handled so far. A budget of `n` ends after `n + 1` fires.
    #[must_use]
    pub fn fired(&self) -> u32 {
        self.fired.load(Ordering::Acquire)
    }

    /// Whether the budget has been spent.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }

    /// Current timer state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        TimerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Plain copy of the observable fields.
    #[must_use]
    pub fn snapshot(&self) -> CartoonSnapshot {
        CartoonSnapshot {
            name: self.name.clone(),
            budget: self.budget,
            remaining: self.remaining(),
            fired: self.fired(),
            terminal: self.is_terminal(),
            state: self.state(),
        }
    }

    /// Move from `from` to `to`, returning the actual state on mismatch.
    pub(crate) fn transition(&self, from: TimerState, to: TimerState) -> Result<(), TimerState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(TimerState::from_u8)
    }

    /// Atomically retire an armed or terminal cartoon.
    ///
    /// Returns the state it was retired from, or `None` if it was never
    /// armed or is already cancelled.
    pub(crate) fn retire(&self) -> Option<TimerState> {
        let mut current = self.state();
        loop {
            if matches!(current, TimerState::Unarmed | TimerState::Cancelled) {
                return None;
            }
            match self.transition(current, TimerState::Cancelled) {
                Ok(()) => return Some(current),
                Err(actual) => current = actual,
            }
        }
    }

    /// Spend one reschedule. Returns the new remaining count, or `None`
    /// when the budget is already empty.
    pub(crate) fn consume_fire(&self) -> Option<u32> {
        self.fired.fetch_add(1, Ordering::AcqRel);
        let remaining = self.remaining.load(Ordering::Acquire);
        if remaining == 0 {
            return None;
        }
        // Single writer: only this cartoon's fire handler decrements.
        self.remaining.store(remaining - 1, Ordering::Release);
        Some(remaining - 1)
    }

    /// Flag the cartoon terminal. Loses to a concurrent retire.
    pub(crate) fn mark_terminal(&self) {
        self.terminal.store(true, Ordering::Release);
        let _ = self.transition(TimerState::Armed, TimerState::Terminal);
    }

    pub(crate) fn set_timer(&self, id: TimerId) {
        *self.timer.lock() = Some(id);
    }

    pub(crate) fn take_timer(&self) -> Option<TimerId> {
        self.timer.lock().take()
    }
}

/// Serializable view of a cartoon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartoonSnapshot {
    /// Cartoon name.
    pub name: String,
    /// Reschedules granted at construction.
    pub budget: u32,
    /// Reschedules left.
    pub remaining: u32,
    /// Fires handled.
    pub fired: u32,
    /// Whether the budget has been spent.
    pub terminal: bool,
    /// Timer state.
    pub state: TimerState,
}

/// Monotonic counter handing out cartoon numbers, starting at 1.
#[derive(Debug, Default)]
pub struct NameSequence {
    last: AtomicU64,
}

impl NameSequence {
    /// Create a sequence whose first name is `cartoon-1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name in the sequence.
    pub fn next_name(&self) -> String {
        let n = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        format!("cartoon-{n}")
    }
}

/// Constructor for pooled cartoons.
///
/// Draws the fire budget and assigns the next name. Registers nothing: the
/// pool may construct cartoons that are never armed.
pub struct CartoonFactory {
    names: NameSequence,
    random: Arc<dyn RandomSource>,
    max_fires: u32,
}

impl CartoonFactory {
    /// Create a factory drawing budgets from `5..5 + max_fires`.
    #[must_use]
    pub fn new(random: Arc<dyn RandomSource>, max_fires: u32) -> Self {
        assert!(
            (1..=MAX_FIRE_SPREAD).contains(&max_fires),
            "max_fires must be between 1 and {MAX_FIRE_SPREAD}, got {max_fires}"
        );
        Self {
            names: NameSequence::new(),
            random,
            max_fires,
        }
    }

    /// Initialize a fresh or reused slot.
    pub fn construct(&self, cartoon: &mut Cartoon) {
        let budget = self
            .random
            .next_bounded(FIRE_BUDGET_BASE, FIRE_BUDGET_BASE + self.max_fires - 1);
        cartoon.reset(self.names.next_name(), budget);
        trace!(cartoon = cartoon.name(), budget, "constructed");
    }

    /// Build a slab cache of `capacity` cartoons using this constructor.
    #[must_use]
    pub fn into_cache(self, capacity: usize) -> SlabCache<Cartoon> {
        SlabCache::new(CACHE_NAME, capacity, move |cartoon: &mut Cartoon| {
            self.construct(cartoon);
        })
    }
}

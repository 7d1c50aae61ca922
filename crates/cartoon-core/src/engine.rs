//! Per-cartoon timer engine.
//!
//! `arm` registers the first fire, `on_fire` runs on the timer worker and
//! either reschedules or retires the cartoon, and `cancel_sync` retires the
//! cartoon and waits until no fire for it can run again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cartoon_memory::Slot;
use cartoon_timer::{DeadlineTimer, Rearm, TimerCallback};
use tracing::{debug, trace};

use crate::cartoon::{Cartoon, TimerState};
use crate::constants::{MAX_DELAY_UNITS, MIN_DELAY_UNITS};
use crate::error::CartoonError;
use crate::options::Options;
use crate::random::RandomSource;

/// Background half of the engine, captured by every timer callback.
///
/// Holds no reference to the timer facility, so registrations never keep
/// the facility alive.
#[derive(Clone)]
pub struct FireHandler {
    random: Arc<dyn RandomSource>,
    time_unit: Duration,
}

impl FireHandler {
    /// Random delay between 1 and 60 time units.
    fn next_delay(&self) -> Duration {
        let units = self.random.next_bounded(MIN_DELAY_UNITS, MAX_DELAY_UNITS);
        self.time_unit * units
    }

    /// Handle one fire of `cartoon`.
    ///
    /// Runs on the timer worker: touches only the cartoon's atomics and the
    /// random source. A fire observed after retirement changes nothing.
    pub fn on_fire(&self, cartoon: &Cartoon) -> Rearm {
        match cartoon.state() {
            TimerState::Armed => {}
            TimerState::Cancelled => {
                trace!(cartoon = cartoon.name(), "fire after retirement ignored");
                return Rearm::Stop;
            }
            state => panic!("cartoon {} fired while {state:?}", cartoon.name()),
        }
        debug!(cartoon = cartoon.name(), "cartoon has come to meddle");

        if let Some(remaining) = cartoon.consume_fire() {
            let delay = self.next_delay();
            debug!(
                cartoon = cartoon.name(),
                remaining,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "cartoon will come back"
            );
            Rearm::After(delay)
        } else {
            cartoon.mark_terminal();
            debug!(
                cartoon = cartoon.name(),
                fired = cartoon.fired(),
                "cartoon is done"
            );
            Rearm::Stop
        }
    }
}

/// Drives each cartoon's timer through `Unarmed -> Armed -> Terminal -> Cancelled`.
#[derive(Clone)]
pub struct TimerEngine {
    timer: Arc<dyn DeadlineTimer>,
    handler: FireHandler,
}

impl TimerEngine {
    /// Create an engine scheduling on `timer` with delays in `options.time_unit`.
    #[must_use]
    pub fn new(
        timer: Arc<dyn DeadlineTimer>,
        random: Arc<dyn RandomSource>,
        options: &Options,
    ) -> Self {
        Self {
            timer,
            handler: FireHandler {
                random,
                time_unit: options.time_unit,
            },
        }
    }

    /// Convert delay units to wall-clock time.
    #[must_use]
    pub fn delay_for(&self, units: u32) -> Duration {
        self.handler.time_unit * units
    }

    /// Register the first fire of a freshly constructed cartoon.
    ///
    /// # Panics
    ///
    /// Panics if the cartoon is not `Unarmed`.
    pub fn arm(&self, slot: &Slot<Cartoon>) -> Result<(), CartoonError> {
        if let Err(state) = slot.transition(TimerState::Unarmed, TimerState::Armed) {
            panic!("cannot arm cartoon {} while {state:?}", slot.name());
        }

        let delay = self.handler.next_delay();
        let cartoon = slot.share();
        let handler = self.handler.clone();
        let callback: TimerCallback = Box::new(move || handler.on_fire(&cartoon));

        match self.timer.register(Instant::now() + delay, callback) {
            Ok(id) => {
                slot.set_timer(id);
                debug!(
                    cartoon = slot.name(),
                    budget = slot.budget(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "cartoon armed"
                );
                Ok(())
            }
            Err(err) => {
                // The callback, and its reference to the cartoon, is gone.
                let _ = slot.transition(TimerState::Armed, TimerState::Unarmed);
                Err(err.into())
            }
        }
    }

    /// Run the fire handler directly.
    pub fn on_fire(&self, cartoon: &Cartoon) -> Rearm {
        self.handler.on_fire(cartoon)
    }

    /// Retire `cartoon` and block until none of its fires can run again.
    ///
    /// Returns `true` if a fire was pending or in flight. A no-op for a
    /// cartoon that was never armed or is already cancelled.
    pub fn cancel_sync(&self, cartoon: &Cartoon) -> bool {
        let Some(previous) = cartoon.retire() else {
            return false;
        };
        let Some(id) = cartoon.take_timer() else {
            panic!("cartoon {} was {previous:?} without a timer", cartoon.name());
        };
        let live = self.timer.cancel_and_wait(id);
        debug!(cartoon = cartoon.name(), ?previous, live, "cartoon cancelled");
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartoon::CartoonFactory;
    use crate::random::{FixedRandom, ThreadRandom};
    use cartoon_memory::{Allocator, SlabCache};
    use cartoon_timer::{TimerError, TimerId};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    /// Timer facility that only fires when told to.
    #[derive(Default)]
    struct ManualTimer {
        next: Mutex<u64>,
        timers: Mutex<BTreeMap<u64, (Instant, TimerCallback)>>,
        refuse: bool,
    }

    impl ManualTimer {
        fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::default()
            }
        }

        fn pending(&self) -> usize {
            self.timers.lock().len()
        }

        fn deadlines(&self) -> Vec<Instant> {
            self.timers.lock().values().map(|(d, _)| *d).collect()
        }

        /// Fire every registration once, keeping rearmed ones.
        fn fire_all(&self) {
            let due = std::mem::take(&mut *self.timers.lock());
            for (id, (_, mut callback)) in due {
                if let Rearm::After(delay) = callback() {
                    self.timers
                        .lock()
                        .insert(id, (Instant::now() + delay, callback));
                }
            }
        }
    }

    impl DeadlineTimer for ManualTimer {
        fn register(
            &self,
            deadline: Instant,
            callback: TimerCallback,
        ) -> Result<TimerId, TimerError> {
            if self.refuse {
                return Err(TimerError::Exhausted(0));
            }
            let mut next = self.next.lock();
            *next += 1;
            self.timers.lock().insert(*next, (deadline, callback));
            Ok(TimerId::from_raw(*next))
        }

        fn cancel_and_wait(&self, id: TimerId) -> bool {
            self.timers.lock().remove(&id.as_raw()).is_some()
        }
    }

    fn setup(
        timer: Arc<dyn DeadlineTimer>,
        random: Arc<dyn RandomSource>,
    ) -> (TimerEngine, SlabCache<Cartoon>) {
        let opts = Options {
            time_unit: Duration::from_millis(1),
            ..Options::default()
        };
        let engine = TimerEngine::new(timer, Arc::clone(&random), &opts);
        let cache = CartoonFactory::new(random, opts.max_fires).into_cache(4);
        (engine, cache)
    }

    #[test]
    fn arm_registers_one_timer() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer.clone(), Arc::new(ThreadRandom));
        let before = Instant::now();
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();
        assert_eq!(slot.state(), TimerState::Armed);
        assert_eq!(timer.pending(), 1);
        let deadline = timer.deadlines()[0];
        assert!(deadline >= before + engine.delay_for(MIN_DELAY_UNITS));
        assert!(deadline <= Instant::now() + engine.delay_for(MAX_DELAY_UNITS));

        assert!(engine.cancel_sync(&slot));
        assert!(slot.is_exclusive());
        cache.release(slot);
    }

    #[test]
    fn minimum_budget_fires_six_times_then_retires() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer.clone(), Arc::new(FixedRandom::minimum()));
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();

        let mut remaining = Vec::new();
        for _ in 0..5 {
            timer.fire_all();
            remaining.push(slot.remaining());
            assert!(!slot.is_terminal());
        }
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
        assert_eq!(timer.pending(), 1);

        timer.fire_all();
        assert!(slot.is_terminal());
        assert_eq!(slot.state(), TimerState::Terminal);
        assert_eq!(slot.fired(), 6);
        assert_eq!(timer.pending(), 0);

        // Terminal cartoons still go through cancellation.
        assert!(!engine.cancel_sync(&slot));
        assert_eq!(slot.state(), TimerState::Cancelled);
        cache.release(slot);
    }

    #[test]
    fn cancel_sync_is_idempotent() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer.clone(), Arc::new(ThreadRandom));
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();
        assert!(engine.cancel_sync(&slot));
        assert!(!engine.cancel_sync(&slot));
        assert_eq!(timer.pending(), 0);
        cache.release(slot);
    }

    #[test]
    fn cancel_sync_on_unarmed_is_noop() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer, Arc::new(ThreadRandom));
        let slot = cache.acquire().unwrap();
        assert!(!engine.cancel_sync(&slot));
        assert_eq!(slot.state(), TimerState::Unarmed);
        cache.release(slot);
    }

    #[test]
    fn fire_after_retirement_changes_nothing() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer, Arc::new(FixedRandom::minimum()));
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();
        engine.cancel_sync(&slot);

        let before = slot.snapshot();
        assert_eq!(engine.on_fire(&slot), Rearm::Stop);
        assert_eq!(slot.snapshot(), before);
        cache.release(slot);
    }

    #[test]
    fn failed_registration_rolls_back() {
        let timer = Arc::new(ManualTimer::refusing());
        let (engine, cache) = setup(timer, Arc::new(ThreadRandom));
        let slot = cache.acquire().unwrap();
        let err = engine.arm(&slot).unwrap_err();
        assert!(matches!(err, CartoonError::Timer(TimerError::Exhausted(_))));
        assert_eq!(slot.state(), TimerState::Unarmed);
        assert!(slot.is_exclusive());
        cache.release(slot);
    }

    #[test]
    #[should_panic(expected = "cannot arm")]
    fn arming_twice_panics() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer, Arc::new(ThreadRandom));
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();
        let _ = engine.arm(&slot);
    }

    #[test]
    #[should_panic(expected = "fired while Unarmed")]
    fn fire_on_unarmed_panics() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, cache) = setup(timer, Arc::new(ThreadRandom));
        let slot = cache.acquire().unwrap();
        let _ = engine.on_fire(&slot);
    }

    #[test]
    fn delays_scale_with_time_unit() {
        let timer = Arc::new(ManualTimer::default());
        let (engine, _cache) = setup(timer, Arc::new(ThreadRandom));
        assert_eq!(engine.delay_for(60), Duration::from_millis(60));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(30))]

            /// Remaining never increases and hits zero before the cartoon retires.
            #[test]
            fn remaining_counts_down_to_terminal(pick in 0u32..100) {
                let timer = Arc::new(ManualTimer::default());
                let (engine, cache) = setup(timer.clone(), Arc::new(FixedRandom::new(pick)));
                let slot = cache.acquire().unwrap();
                engine.arm(&slot).unwrap();
                let budget = slot.budget();

                let mut last = slot.remaining();
                while !slot.is_terminal() {
                    prop_assert!(timer.pending() == 1);
                    timer.fire_all();
                    let now = slot.remaining();
                    prop_assert!(now <= last);
                    if slot.is_terminal() {
                        prop_assert_eq!(now, 0);
                    }
                    last = now;
                }
                prop_assert_eq!(slot.fired(), budget + 1);
                prop_assert_eq!(timer.pending(), 0);
                engine.cancel_sync(&slot);
                cache.release(slot);
            }
        }
    }
}

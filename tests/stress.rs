//! Racing fires against synchronous cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cartoon_core::cartoon::{Cartoon, CartoonFactory, TimerState};
use cartoon_core::engine::TimerEngine;
use cartoon_core::options::Options;
use cartoon_core::random::{FixedRandom, RandomSource};
use cartoon_memory::{Allocator, SlabCache};
use cartoon_timer::TimerService;
use parking_lot::Mutex;

const TRIALS: usize = 10_000;

#[test]
fn no_fire_after_cancel_sync_returns() {
    // Budget 60, delays of 60ns: the cartoon fires back to back.
    let opts = Options {
        capacity: 1,
        max_fires: 1000,
        time_unit: Duration::from_nanos(1),
    }
    .validate()
    .unwrap();
    let random: Arc<dyn RandomSource> = Arc::new(FixedRandom::new(60));
    let timer = Arc::new(TimerService::start().unwrap());
    let cache: SlabCache<Cartoon> =
        CartoonFactory::new(Arc::clone(&random), opts.max_fires).into_cache(1);
    let engine = TimerEngine::new(timer.clone(), random, &opts);

    let started = Instant::now();
    let mut cancelled_mid_run = 0;
    for trial in 0..TRIALS {
        let slot = cache.acquire().unwrap();
        engine.arm(&slot).unwrap();
        if trial % 2 == 1 {
            // Let the cartoon get going so the cancel lands among its fires.
            let deadline = Instant::now() + Duration::from_secs(5);
            while slot.fired() == 0 {
                assert!(Instant::now() < deadline, "trial {trial}: cartoon never fired");
                std::hint::spin_loop();
            }
        }
        engine.cancel_sync(&slot);
        assert_eq!(slot.state(), TimerState::Cancelled);

        let fired = slot.fired();
        if fired > 0 {
            cancelled_mid_run += 1;
        }
        let total = timer.stats().fired;
        for _ in 0..8 {
            std::thread::yield_now();
        }
        assert_eq!(slot.fired(), fired, "trial {trial}: fire after cancel");
        assert_eq!(timer.stats().fired, total, "trial {trial}: timer still firing");
        assert!(slot.is_exclusive(), "trial {trial}: callback still holds the cartoon");
        cache.release(slot);
    }
    assert!(started.elapsed() < Duration::from_secs(120), "teardown stalled");
    assert!(
        cancelled_mid_run >= TRIALS / 2,
        "only {cancelled_mid_run} of {TRIALS} trials cancelled after a fire"
    );

    cache.destroy().unwrap();
    assert_eq!(timer.registered(), 0);
    assert_eq!(cache.stats().acquired, TRIALS as u64);
}

#[test]
fn concurrent_pools_share_one_timer() {
    let timer = Arc::new(TimerService::start().unwrap());
    let failures = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let timer = Arc::clone(&timer);
            let failures = Arc::clone(&failures);
            std::thread::spawn(move || {
                let opts = Options {
                    capacity: 8,
                    max_fires: 3,
                    time_unit: Duration::from_micros(50),
                };
                let random: Arc<dyn RandomSource> = Arc::new(FixedRandom::minimum());
                let cache =
                    CartoonFactory::new(Arc::clone(&random), opts.max_fires).into_cache(8);
                let engine = TimerEngine::new(timer, random, &opts);
                for round in 0..50 {
                    let slots: Vec<_> = (0..8).map(|_| cache.acquire().unwrap()).collect();
                    for slot in &slots {
                        engine.arm(slot).unwrap();
                    }
                    for slot in slots {
                        engine.cancel_sync(&slot);
                        if !slot.is_exclusive() {
                            failures.lock().push((worker, round));
                        }
                        cache.release(slot);
                    }
                }
                cache.destroy().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(failures.lock().is_empty());
    assert_eq!(timer.registered(), 0);
}

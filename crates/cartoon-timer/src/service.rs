//! Threaded deadline-timer service.
//!
//! All registrations share one worker thread. The worker sleeps on a condvar
//! until the earliest deadline, takes the due callback out of its
//! registration, and runs it with the state lock released. Cancellation
//! removes the registration and then waits on a second condvar until the
//! worker is no longer running that timer.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, trace};

use crate::error::TimerError;

/// What a callback wants after it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    /// Fire again this long after the current fire.
    After(Duration),
    /// Do not fire again. The registration stays until cancelled.
    Stop,
}

/// Callback executed on the timer worker thread.
///
/// Runs in the background context: it must not block and must not call
/// [`DeadlineTimer::cancel_and_wait`].
pub type TimerCallback = Box<dyn FnMut() -> Rearm + Send + 'static>;

/// Opaque handle to a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw id, for alternative [`DeadlineTimer`] implementations.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Deadline-timer facility used by the timer engine.
pub trait DeadlineTimer: Send + Sync {
    /// Schedule `callback` to run no earlier than `deadline`.
    fn register(&self, deadline: Instant, callback: TimerCallback) -> Result<TimerId, TimerError>;

    /// Retire a registration and wait until its callback is quiescent.
    ///
    /// After this returns no invocation of the callback is running and none
    /// will ever start. Returns `true` if a fire was pending or in flight.
    /// Unknown or already-cancelled ids are a no-op.
    fn cancel_and_wait(&self, id: TimerId) -> bool;
}

/// Timer service configuration.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Maximum number of live registrations.
    pub max_timers: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_timers: 4096,
            thread_name: "cartoon-timer".to_string(),
        }
    }
}

/// Counters maintained by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Callbacks executed.
    pub fired: u64,
    /// Fires that asked to run again.
    pub rearmed: u64,
    /// Cancellations that retired a pending or running fire.
    pub cancelled: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    deadline: Instant,
    id: u64,
    generation: u64,
}

struct Registration {
    callback: Option<TimerCallback>,
    generation: u64,
    pending: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    queue: BinaryHeap<Reverse<QueueEntry>>,
    timers: HashMap<u64, Registration>,
    running: Option<u64>,
    worker: Option<ThreadId>,
    shutdown: bool,
    stats: TimerStats,
}

impl State {
    /// Take the callback for a due queue entry, skipping stale entries.
    fn take_due(&mut self, entry: QueueEntry) -> Option<TimerCallback> {
        let registration = self.timers.get_mut(&entry.id)?;
        if !registration.pending || registration.generation != entry.generation {
            return None;
        }
        registration.callback.take()
    }

    /// Put a callback back after it ran, or drop it if it was cancelled.
    fn finish(&mut self, id: u64, callback: TimerCallback, outcome: Rearm, fired_at: Instant) {
        self.stats.fired += 1;
        let Some(registration) = self.timers.get_mut(&id) else {
            trace!(timer = id, "callback finished after cancellation");
            return;
        };
        match outcome {
            Rearm::After(delay) => {
                registration.generation += 1;
                registration.callback = Some(callback);
                let entry = QueueEntry {
                    deadline: fired_at + delay,
                    id,
                    generation: registration.generation,
                };
                self.queue.push(Reverse(entry));
                self.stats.rearmed += 1;
            }
            Rearm::Stop => {
                registration.pending = false;
            }
        }
    }
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
    idle: Condvar,
    max_timers: usize,
}

/// Deadline-timer service backed by one worker thread.
pub struct TimerService {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    /// Start a service with the default configuration.
    pub fn start() -> Result<Self, TimerError> {
        Self::with_config(TimerConfig::default())
    }

    /// Start a service and spawn its worker thread.
    pub fn with_config(config: TimerConfig) -> Result<Self, TimerError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wakeup: Condvar::new(),
            idle: Condvar::new(),
            max_timers: config.max_timers,
        });
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_worker(&worker_shared))
            .map_err(|e| TimerError::Spawn(e.to_string()))?;
        debug!(thread = %config.thread_name, max_timers = config.max_timers, "timer service started");
        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Number of registrations waiting for a fire (running ones included).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared
            .state
            .lock()
            .timers
            .values()
            .filter(|r| r.pending)
            .count()
    }

    /// Number of registrations not yet cancelled, idle ones included.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.shared.state.lock().timers.len()
    }

    /// Get a snapshot of service counters.
    #[must_use]
    pub fn stats(&self) -> TimerStats {
        self.shared.state.lock().stats
    }

    /// Stop the worker and drop every remaining registration.
    ///
    /// Waits for an in-flight callback to return. Idempotent.
    pub fn shutdown(&self) {
        let orphaned = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            std::mem::take(&mut state.timers)
        };
        self.shared.wakeup.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("timer worker exited with a panic");
            }
        }
        debug!(orphaned = orphaned.len(), "timer service stopped");
    }
}

impl DeadlineTimer for TimerService {
    fn register(&self, deadline: Instant, callback: TimerCallback) -> Result<TimerId, TimerError> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TimerError::ShutDown);
        }
        if state.timers.len() >= self.shared.max_timers {
            return Err(TimerError::Exhausted(self.shared.max_timers));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.timers.insert(
            id,
            Registration {
                callback: Some(callback),
                generation: 0,
                pending: true,
            },
        );
        state.queue.push(Reverse(QueueEntry {
            deadline,
            id,
            generation: 0,
        }));
        drop(state);
        self.shared.wakeup.notify_one();
        trace!(timer = id, "registered");
        Ok(TimerId(id))
    }

    fn cancel_and_wait(&self, id: TimerId) -> bool {
        let mut state = self.shared.state.lock();
        assert!(
            state.worker != Some(thread::current().id()),
            "cancel_and_wait({id}) called from the timer worker"
        );
        let mut live = state.timers.remove(&id.0).is_some_and(|r| r.pending);
        while state.running == Some(id.0) {
            live = true;
            self.shared.idle.wait(&mut state);
        }
        if live {
            state.stats.cancelled += 1;
        }
        trace!(timer = id.0, live, "cancelled");
        live
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: &Shared) {
    let mut state = shared.state.lock();
    state.worker = Some(thread::current().id());
    loop {
        if state.shutdown {
            break;
        }
        let Some(&Reverse(next)) = state.queue.peek() else {
            shared.wakeup.wait(&mut state);
            continue;
        };
        if next.deadline > Instant::now() {
            shared.wakeup.wait_until(&mut state, next.deadline);
            continue;
        }
        state.queue.pop();
        let Some(mut callback) = state.take_due(next) else {
            continue;
        };

        state.running = Some(next.id);
        let fired_at = Instant::now();
        let outcome = MutexGuard::unlocked(&mut state, || fire(next.id, &mut callback));
        state.finish(next.id, callback, outcome, fired_at);
        state.running = None;
        shared.idle.notify_all();
    }
}

fn fire(id: u64, callback: &mut TimerCallback) -> Rearm {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(outcome) => outcome,
        Err(_) => {
            // No one can observe a failure reported from here.
            error!(timer = id, "timer callback panicked, aborting");
            std::process::abort();
        }
    }
}

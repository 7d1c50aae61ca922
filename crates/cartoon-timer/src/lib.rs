//! # cartoon-timer
//!
//! Deadline timers for the cartoon workspace.
//!
//! Callbacks run on a single background worker thread. A callback may ask
//! to be rearmed by returning [`Rearm::After`], and
//! [`DeadlineTimer::cancel_and_wait`] guarantees that once it returns the
//! callback is neither running nor scheduled to run again.
#![warn(missing_docs)]

pub mod error;
pub mod service;

pub use error::TimerError;
pub use service::{
    DeadlineTimer, Rearm, TimerCallback, TimerConfig, TimerId, TimerService, TimerStats,
};

//! # cartoon-core
//!
//! Cartoons are pooled entities that reschedule themselves on a random
//! timer a bounded number of times before retiring. This crate holds the
//! entity, its constructor, the random source, and the [`TimerEngine`]
//! that drives each cartoon's `Unarmed -> Armed -> Terminal -> Cancelled`
//! state machine.

pub mod cancel;
pub mod cartoon;
pub mod constants;
pub mod engine;
pub mod error;
pub mod options;
pub mod random;

// Re-exports
pub use cancel::CancellationToken;
pub use cartoon::{Cartoon, CartoonFactory, CartoonSnapshot, NameSequence, TimerState};
pub use constants::{
    exit_codes, CACHE_NAME, DEFAULT_CAPACITY, DEFAULT_MAX_FIRES, FIRE_BUDGET_BASE, MAX_CAPACITY,
    MAX_DELAY_UNITS, MAX_FIRE_SPREAD, MAX_TIME_UNIT, MIN_DELAY_UNITS,
};
pub use engine::{FireHandler, TimerEngine};
pub use error::CartoonError;
pub use options::Options;
pub use random::{FixedRandom, RandomSource, ThreadRandom};

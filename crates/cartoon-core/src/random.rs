//! Random sources for fire budgets and delays.

use rand::Rng;

/// Source of bounded random integers.
///
/// Called from the timer worker thread, so implementations must not block.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn next_bounded(&self, min: u32, max: u32) -> u32;
}

/// Thread-local generator from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_bounded(&self, min: u32, max: u32) -> u32 {
        assert!(min <= max, "empty random range {min}..={max}");
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Source that always returns the same value, clamped into the range.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    value: u32,
}

impl FixedRandom {
    /// Always return `value`, clamped into each requested range.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    /// Always return the lower bound.
    #[must_use]
    pub fn minimum() -> Self {
        Self::new(0)
    }

    /// Always return the upper bound.
    #[must_use]
    pub fn maximum() -> Self {
        Self::new(u32::MAX)
    }
}

impl RandomSource for FixedRandom {
    fn next_bounded(&self, min: u32, max: u32) -> u32 {
        assert!(min <= max, "empty random range {min}..={max}");
        self.value.clamp(min, max)
    }
}

//! Constants for cartoon scheduling and pool sizing.

use std::time::Duration;

/// Smallest number of reschedules a cartoon is given.
pub const FIRE_BUDGET_BASE: u32 = 5;

/// Default spread of the fire budget: budgets fall in `5..5 + 20`.
pub const DEFAULT_MAX_FIRES: u32 = 20;

/// Largest accepted fire budget spread.
pub const MAX_FIRE_SPREAD: u32 = 1000;

/// Shortest delay between two fires, in time units.
pub const MIN_DELAY_UNITS: u32 = 1;

/// Longest delay between two fires, in time units.
pub const MAX_DELAY_UNITS: u32 = 60;

/// Default time unit for delays.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Longest accepted time unit. Keeps every delay well inside `Instant` range.
pub const MAX_TIME_UNIT: Duration = Duration::from_secs(3600);

/// Default number of cartoons in the pool.
pub const DEFAULT_CAPACITY: usize = 20;

/// Largest accepted pool capacity.
pub const MAX_CAPACITY: usize = 1024;

/// Longest cartoon name, in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Name of the slab cache holding cartoons.
pub const CACHE_NAME: &str = "cartoon-cache";

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Cartoons did not all retire before the run timeout.
    pub const ERROR_TIMEOUT: i32 = 2;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// Run cancelled by user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_range_is_well_formed() {
        assert!(MIN_DELAY_UNITS >= 1);
        assert!(MIN_DELAY_UNITS <= MAX_DELAY_UNITS);
    }

    #[test]
    fn longest_delay_fits_in_duration() {
        assert!(MAX_TIME_UNIT.checked_mul(MAX_DELAY_UNITS).is_some());
    }

    #[test]
    fn longest_name_fits() {
        let name = format!("cartoon-{}", u64::MAX);
        assert!(name.len() <= MAX_NAME_LEN);
    }
}

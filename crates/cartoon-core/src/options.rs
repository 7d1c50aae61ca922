//! Pool options and their validation.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CAPACITY, DEFAULT_MAX_FIRES, DEFAULT_TIME_UNIT, MAX_CAPACITY, MAX_FIRE_SPREAD,
    MAX_TIME_UNIT,
};
use crate::error::CartoonError;

/// Options for a cartoon pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Number of cartoons to create.
    pub capacity: usize,
    /// Spread of the fire budget: budgets are drawn from `5..5 + max_fires`.
    pub max_fires: u32,
    /// Length of one delay unit. Delays span 1 to 60 units.
    pub time_unit: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_fires: DEFAULT_MAX_FIRES,
            time_unit: DEFAULT_TIME_UNIT,
        }
    }
}

impl Options {
    /// Reject out-of-range values before anything is allocated.
    pub fn validate(self) -> Result<Self, CartoonError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(CartoonError::Config(format!(
                "capacity must be between 1 and {MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }
        if self.max_fires == 0 || self.max_fires > MAX_FIRE_SPREAD {
            return Err(CartoonError::Config(format!(
                "max fires must be between 1 and {MAX_FIRE_SPREAD}, got {}",
                self.max_fires
            )));
        }
        if self.time_unit.is_zero() {
            return Err(CartoonError::Config("time unit must be non-zero".into()));
        }
        if self.time_unit > MAX_TIME_UNIT {
            return Err(CartoonError::Config(format!(
                "time unit must be at most {MAX_TIME_UNIT:?}, got {:?}",
                self.time_unit
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        let opts = Options::default().validate().unwrap();
        assert_eq!(opts.capacity, DEFAULT_CAPACITY);
        assert_eq!(opts.max_fires, DEFAULT_MAX_FIRES);
        assert_eq!(opts.time_unit, Duration::from_secs(1));
    }

    #[test]
    fn zero_capacity_rejected() {
        let opts = Options {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(CartoonError::Config(_))));
    }

    #[test]
    fn oversized_capacity_rejected() {
        let opts = Options {
            capacity: MAX_CAPACITY + 1,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(CartoonError::Config(_))));
    }

    #[test]
    fn max_fires_bounds() {
        for max_fires in [0, MAX_FIRE_SPREAD + 1] {
            let opts = Options {
                max_fires,
                ..Default::default()
            };
            assert!(opts.validate().is_err());
        }
        let opts = Options {
            max_fires: 1,
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_time_unit_rejected() {
        let opts = Options {
            time_unit: Duration::ZERO,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn time_unit_upper_bound() {
        let opts = Options {
            time_unit: MAX_TIME_UNIT,
            ..Default::default()
        };
        assert!(opts.validate().is_ok());

        let opts = Options {
            time_unit: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(CartoonError::Config(_))));
    }
}

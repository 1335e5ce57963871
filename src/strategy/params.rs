//! Strategy Parameters
//!
//! Configuration structs for the earnings drift strategy.
//! Defaults match the sample configuration: a six-day PEAD hold and half the
//! book per side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of sessions a PEAD position is held after its last selection
pub const DEFAULT_PEAD_HOLD_DAYS: u32 = 6;

/// Default per-name weight cap
pub const DEFAULT_MAX_IN_ONE: f64 = 1.0;

/// Default fraction of the book allotted to each side
pub const DEFAULT_SIDE_BUDGET: f64 = 0.5;

/// Main strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Sessions a PEAD entry survives after its last (re)selection
    pub pead_hold_days: u32,
    /// Maximum absolute weight in any one instrument
    pub max_in_one: f64,
    /// Total absolute weight available to each of the long and short books
    pub side_budget: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            pead_hold_days: DEFAULT_PEAD_HOLD_DAYS,
            max_in_one: DEFAULT_MAX_IN_ONE,
            side_budget: DEFAULT_SIDE_BUDGET,
        }
    }
}

impl StrategyConfig {
    pub fn with_pead_hold_days(mut self, days: u32) -> Self {
        self.pead_hold_days = days;
        self
    }

    pub fn with_max_in_one(mut self, max_in_one: f64) -> Self {
        self.max_in_one = max_in_one;
        self
    }

    pub fn with_side_budget(mut self, side_budget: f64) -> Self {
        self.side_budget = side_budget;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.pead_hold_days == 0 {
            return Err(ParamsError::InvalidHoldDays(self.pead_hold_days));
        }
        if !(self.max_in_one > 0.0 && self.max_in_one <= 1.0) {
            return Err(ParamsError::InvalidMaxInOne(self.max_in_one));
        }
        if !(self.side_budget > 0.0 && self.side_budget <= 1.0) {
            return Err(ParamsError::InvalidSideBudget(self.side_budget));
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    #[error("pead_hold_days must be >= 1, got {0}")]
    InvalidHoldDays(u32),
    #[error("max_in_one must be in (0, 1], got {0}")]
    InvalidMaxInOne(f64),
    #[error("side_budget must be in (0, 1], got {0}")]
    InvalidSideBudget(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StrategyConfig::default();
        assert_eq!(config.pead_hold_days, 6);
        assert_eq!(config.max_in_one, 1.0);
        assert_eq!(config.side_budget, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_hold_days_rejected() {
        let config = StrategyConfig::default().with_pead_hold_days(0);
        assert_eq!(config.validate(), Err(ParamsError::InvalidHoldDays(0)));
    }

    #[test]
    fn test_out_of_range_weights_rejected() {
        let config = StrategyConfig::default().with_max_in_one(0.0);
        assert!(matches!(config.validate(), Err(ParamsError::InvalidMaxInOne(_))));

        let config = StrategyConfig::default().with_side_budget(1.5);
        assert!(matches!(config.validate(), Err(ParamsError::InvalidSideBudget(_))));

        let config = StrategyConfig::default().with_side_budget(f64::NAN);
        assert!(matches!(config.validate(), Err(ParamsError::InvalidSideBudget(_))));
    }
}

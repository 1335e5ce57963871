//! Rebalancer
//!
//! Equal-weight sizing of one book side. Each name gets
//! `min(side_budget / |set|, max_in_one)`, signed by the side.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::{Instrument, Side, TargetOrder};
use super::params::StrategyConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllocationError {
    #[error("Invalid allocation: {side} book is empty")]
    InvalidAllocation { side: Side },
}

/// Sizes target weights for a single book side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebalancer {
    max_in_one: f64,
    side_budget: f64,
}

impl Rebalancer {
    pub fn new(max_in_one: f64, side_budget: f64) -> Self {
        Self {
            max_in_one,
            side_budget,
        }
    }

    /// Unsigned per-name weight for a side holding `count` names
    pub fn side_weight(&self, side: Side, count: usize) -> Result<f64, AllocationError> {
        if count == 0 {
            return Err(AllocationError::InvalidAllocation { side });
        }
        Ok((self.side_budget / count as f64).min(self.max_in_one))
    }

    /// Target orders for every name in `set`.
    ///
    /// The weight divisor is the full set size, whether or not the host later
    /// accepts an order for every name.
    pub fn plan_side(
        &self,
        side: Side,
        set: &BTreeSet<Instrument>,
    ) -> Result<Vec<TargetOrder>, AllocationError> {
        let weight = self.side_weight(side, set.len())?;
        Ok(set
            .iter()
            .map(|instrument| TargetOrder::rebalance(instrument.clone(), side, weight))
            .collect())
    }

    pub fn max_in_one(&self) -> f64 {
        self.max_in_one
    }

    pub fn side_budget(&self) -> f64 {
        self.side_budget
    }
}

impl From<&StrategyConfig> for Rebalancer {
    fn from(config: &StrategyConfig) -> Self {
        Self::new(config.max_in_one, config.side_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn set(ids: &[&str]) -> BTreeSet<Instrument> {
        ids.iter().map(|id| Instrument::from(*id)).collect()
    }

    #[test]
    fn test_built_from_strategy_config() {
        let config = StrategyConfig::default().with_side_budget(0.4).with_max_in_one(0.1);
        let rebalancer = Rebalancer::from(&config);
        assert_relative_eq!(rebalancer.side_budget(), 0.4);
        assert_relative_eq!(rebalancer.max_in_one(), 0.1);
    }

    #[test]
    fn test_single_long_gets_half_book() {
        let rebalancer = Rebalancer::from(&StrategyConfig::default());
        let orders = rebalancer.plan_side(Side::Long, &set(&["A"])).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].instrument, Instrument::from("A"));
        assert_relative_eq!(orders[0].target_weight, 0.5);
    }

    #[test]
    fn test_single_short_is_negative() {
        let rebalancer = Rebalancer::from(&StrategyConfig::default());
        let orders = rebalancer.plan_side(Side::Short, &set(&["B"])).unwrap();
        assert_relative_eq!(orders[0].target_weight, -0.5);
    }

    #[test]
    fn test_budget_split_evenly() {
        let rebalancer = Rebalancer::new(1.0, 0.5);
        let orders = rebalancer.plan_side(Side::Long, &set(&["A", "B", "C", "D"])).unwrap();

        assert_eq!(orders.len(), 4);
        for order in &orders {
            assert_relative_eq!(order.target_weight, 0.125);
        }
        let gross: f64 = orders.iter().map(|o| o.target_weight.abs()).sum();
        assert_relative_eq!(gross, 0.5);
    }

    #[test]
    fn test_max_in_one_caps_concentration() {
        let rebalancer = Rebalancer::new(0.1, 0.5);
        let weight = rebalancer.side_weight(Side::Short, 2).unwrap();
        assert_relative_eq!(weight, 0.1);
    }

    #[test]
    fn test_empty_side_is_invalid_allocation() {
        let rebalancer = Rebalancer::from(&StrategyConfig::default());
        let result = rebalancer.plan_side(Side::Long, &BTreeSet::new());
        assert_eq!(
            result,
            Err(AllocationError::InvalidAllocation { side: Side::Long })
        );
    }
}

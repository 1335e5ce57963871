use serde::{Deserialize, Serialize};
use std::fmt;

use super::instrument::{Instrument, Side};

/// Why a target-percent order was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderReason {
    Rebalance(Side),
    Close,
}

impl fmt::Display for OrderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderReason::Rebalance(side) => write!(f, "rebalance {}", side),
            OrderReason::Close => f.write_str("close"),
        }
    }
}

/// Instruction to bring an instrument to a fraction of account value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOrder {
    pub instrument: Instrument,
    /// Signed fraction of net liquidation value (negative = short)
    pub target_weight: f64,
    pub reason: OrderReason,
}

impl TargetOrder {
    pub fn rebalance(instrument: Instrument, side: Side, weight: f64) -> Self {
        Self {
            instrument,
            target_weight: side.sign() * weight,
            reason: OrderReason::Rebalance(side),
        }
    }

    pub fn close(instrument: Instrument) -> Self {
        Self {
            instrument,
            target_weight: 0.0,
            reason: OrderReason::Close,
        }
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{DailyFrame, Instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Order rejected for {instrument}: {reason}")]
    OrderRejected { instrument: Instrument, reason: String },
    #[error("No price available for {0}")]
    NoPrice(Instrument),
    #[error("Invalid target weight {weight} for {instrument}")]
    InvalidTarget { instrument: Instrument, weight: f64 },
    #[error("Account unavailable: {0}")]
    AccountUnavailable(String),
}

/// Order placement and account state owned by the host platform.
///
/// Holdings are signed share amounts; weights are signed fractions of net
/// liquidation value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Called once per session before any handler runs, with the session's
    /// factor table. Venues that price off the table use this to mark.
    async fn observe_session(&self, _frame: &DailyFrame) -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Whether the host will accept an order for `instrument` right now
    async fn can_trade(&self, instrument: &Instrument) -> Result<bool, ExecutionError>;

    /// Current nonzero holdings
    async fn positions(&self) -> Result<HashMap<Instrument, f64>, ExecutionError>;

    /// Gross exposure over net liquidation value
    async fn leverage(&self) -> Result<f64, ExecutionError>;

    /// Adjust the position so its value is `target` times account value
    async fn order_target_percent(
        &self,
        instrument: &Instrument,
        target: f64,
    ) -> Result<(), ExecutionError>;
}

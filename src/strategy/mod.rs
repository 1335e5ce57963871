//! Strategy Layer - Earnings drift with short-horizon reversal overlay
//!
//! - `tracker`: PEAD holding records and daily reversal lists
//! - `rebalancer`: equal-weight sizing per book side
//! - `closer`: zero targets for names that left the aggregate set
//!
//! Everything here is synchronous and side-effect free apart from logging;
//! orders reach the host through the application layer.

pub mod params;
pub mod tracker;
pub mod rebalancer;
pub mod closer;

pub use params::{ParamsError, StrategyConfig};
pub use tracker::{PositionTracker, RefreshSummary};
pub use rebalancer::{AllocationError, Rebalancer};
pub use closer::plan_closes;

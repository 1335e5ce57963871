//! Ports Layer - Trait definitions for the host platform
//!
//! Following hexagonal architecture, these traits abstract what the hosting
//! backtester / live venue owns:
//! - The daily factor pipeline
//! - Order execution and account state
//! - Metric recording

pub mod pipeline;
pub mod execution;
pub mod telemetry;
pub mod mocks;

pub use pipeline::{PipelineError, PipelinePort};
pub use execution::{ExecutionError, ExecutionPort};
pub use telemetry::{MetricsPort, LEVERAGE_METRIC};

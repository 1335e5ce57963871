//! Domain Layer - Core types for the earnings drift strategy
//!
//! Pure data types with no external dependencies. All interaction with the
//! host platform happens through the ports layer.

pub mod instrument;
pub mod frame;
pub mod holding;
pub mod order;

pub use instrument::{Instrument, Side};
pub use frame::{Bucket, DailyFrame, PipelineRow, SignalFlags};
pub use holding::{HoldingRecord, ReversalList};
pub use order::{OrderReason, TargetOrder};

//! Adapters Layer - Local implementations of the host ports
//!
//! - Replay: JSON factor tables served one session at a time
//! - Paper: simulated execution venue
//! - Telemetry: metric recorders
//! - CLI: Command-line interface handlers

pub mod replay;
pub mod paper;
pub mod telemetry;
pub mod cli;

pub use replay::JsonFramePipeline;
pub use paper::PaperBroker;
pub use telemetry::{FanoutRecorder, MemoryRecorder, TracingRecorder};
pub use cli::CliApp;

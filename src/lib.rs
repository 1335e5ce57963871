//! Earnings Drift - PEAD and reversal daily long/short strategy library
//!
//! Holds post-earnings-announcement drift picks for a fixed number of sessions,
//! overlays one-day reversal picks on each side, and rebalances every session.
//!
//! # Modules
//!
//! - `domain`: Core types (Instrument, DailyFrame, HoldingRecord, TargetOrder)
//! - `ports`: Trait abstractions (PipelinePort, ExecutionPort, MetricsPort)
//! - `strategy`: Position tracking, rebalancing and closing rules
//! - `adapters`: Local implementations (JSON replay, paper venue, recorders, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Daily schedule, cycle and replay orchestrator

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;

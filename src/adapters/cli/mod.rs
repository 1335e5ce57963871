//! CLI Adapter
//!
//! Command-line interface for the earnings drift strategy.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{execute, CliApp, Command, RunCmd, ScheduleCmd, ValidateCmd};

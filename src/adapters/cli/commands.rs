//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the earnings drift strategy.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::adapters::paper::PaperBroker;
use crate::adapters::replay::JsonFramePipeline;
use crate::adapters::telemetry::{FanoutRecorder, MemoryRecorder, TracingRecorder};
use crate::application::{DailyCycle, ReplayOrchestrator, RunSummary};
use crate::config::{load_config, Config};
use crate::ports::LEVERAGE_METRIC;
use crate::strategy::Rebalancer;

/// Earnings Drift - PEAD + reversal daily long/short strategy
#[derive(Parser, Debug)]
#[command(
    name = "earnings-drift",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Earnings Drift PE Sensitivity daily long/short strategy",
    long_about = "Holds post-earnings-announcement drift picks for a fixed number of sessions, \
                  overlays one-day reversal picks, and rebalances each side to an equal-weight \
                  half of the book every session."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a factor table through the paper venue
    Run(RunCmd),

    /// Load and validate a configuration file
    Validate(ValidateCmd),

    /// Print the resolved daily handler schedule
    Schedule(ScheduleCmd),
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Validate(cmd) => &cmd.config,
            Command::Schedule(cmd) => &cmd.config,
        }
    }
}

/// Replay sessions
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// JSON file of daily factor tables
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Write the run summary as JSON
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Stop after this many sessions
    #[arg(long, value_name = "N")]
    pub max_days: Option<usize>,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct ValidateCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Show schedule
#[derive(Parser, Debug)]
pub struct ScheduleCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Execute the parsed command
pub async fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Validate(cmd) => validate_command(cmd),
        Command::Schedule(cmd) => schedule_command(cmd),
    }
}

fn load(path: &Path) -> Result<Config> {
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting earnings drift replay...");

    let config = load(&cmd.config)?;
    let strategy_config = config.strategy_config();
    let schedule = config.schedule()?;

    let data_path = shellexpand::tilde(&cmd.data.to_string_lossy()).to_string();
    let pipeline = JsonFramePipeline::from_path(&data_path)
        .with_context(|| format!("Failed to load factor tables from {}", data_path))?;

    let broker = PaperBroker::new(config.paper.starting_capital)
        .with_halted(config.paper.halted.iter().map(String::as_str));
    let memory = MemoryRecorder::new();
    let cycle = DailyCycle::new(
        Rebalancer::from(&strategy_config),
        schedule,
        broker.clone(),
        FanoutRecorder::new(TracingRecorder, memory.clone()),
    );

    let mut orchestrator = ReplayOrchestrator::new(pipeline, cycle, &strategy_config);
    if let Some(max_days) = cmd.max_days {
        orchestrator = orchestrator.with_max_sessions(max_days);
    }

    // Setup Ctrl+C handler
    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        stop.stop().await;
    });

    let summary = orchestrator.run().await.context("Replay failed")?;
    let snapshot = broker.snapshot()?;

    print_summary(&summary);
    println!(
        "Final equity: {:.2} ({:+.2}%) | Max drawdown: {:.2}% | Open positions: {}",
        snapshot.net_liquidation,
        snapshot.total_return_pct,
        snapshot.stats.max_drawdown_pct,
        snapshot.open_positions
    );
    if let Some(latest) = memory.latest(LEVERAGE_METRIC) {
        println!("Last recorded leverage: {:.3}", latest);
    }

    if let Some(report_path) = cmd.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        println!("Report written to {}", report_path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => {
            println!("Sessions: {} ({} .. {})", summary.sessions, first, last)
        }
        _ => println!("Sessions: 0"),
    }
    println!(
        "Orders: {} ({} closes) | Skipped untradable: {} | Empty sides: {}",
        summary.orders_submitted, summary.closes, summary.skipped_untradable, summary.empty_sides
    );
    if let Some(max) = summary.max_leverage {
        println!("Max leverage: {:.3}", max);
    }
    if summary.stopped_early {
        println!("Stopped before the end of the data");
    }
}

fn validate_command(cmd: ValidateCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let strategy = config.strategy_config();
    println!("Configuration OK: {}", cmd.config.display());
    println!(
        "PEAD hold: {} sessions | Side budget: {} | Max in one: {}",
        strategy.pead_hold_days, strategy.side_budget, strategy.max_in_one
    );
    Ok(())
}

fn schedule_command(cmd: ScheduleCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let schedule = config.schedule()?;
    let session = schedule.session();

    println!("Session: {} - {}", session.open.format("%H:%M"), session.close.format("%H:%M"));
    println!("  before open  pipeline refresh");
    for slot in schedule.slots() {
        println!("  {:<12} {}", slot.at.format("%H:%M").to_string(), slot.handler);
    }
    Ok(())
}

//! Earnings Drift - PEAD and reversal daily long/short strategy
//!
//! Replays daily factor tables through a paper venue.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use earnings_drift::adapters::cli::{self, CliApp};
use earnings_drift::config::{load_config, LOG_LEVEL_ENV};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    // Config errors surface from the command itself; logging falls back to env or warn
    let configured_level = load_config(app.command.config_path())
        .ok()
        .map(|config| config.logging.get_level());
    init_logging(app.verbose, app.debug, configured_level)?;

    cli::execute(app).await
}

fn init_logging(verbose: bool, debug: bool, configured_level: Option<String>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else if let Some(level) = configured_level {
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

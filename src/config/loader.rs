//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section is
//! optional; omitted values fall back to the sample strategy configuration.

use chrono::NaiveTime;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::application::schedule::{default_entries, DailySchedule, MarketSession, ScheduleEntry, ScheduleError};
use crate::strategy::params::{
    ParamsError, StrategyConfig, DEFAULT_MAX_IN_ONE, DEFAULT_PEAD_HOLD_DAYS, DEFAULT_SIDE_BUDGET,
};

/// Environment variable that overrides `logging.level`
pub const LOG_LEVEL_ENV: &str = "EARNINGS_DRIFT_LOG";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default = "default_entries")]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub paper: PaperSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategySection::default(),
            session: SessionSection::default(),
            schedule: default_entries(),
            paper: PaperSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

/// Strategy configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    /// Sessions a PEAD pick is held after its last selection
    #[serde(default = "default_pead_hold_days")]
    pub pead_hold_days: u32,
    /// Per-name weight cap
    #[serde(default = "default_max_in_one")]
    pub max_in_one: f64,
    /// Total weight per book side
    #[serde(default = "default_side_budget")]
    pub side_budget: f64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            pead_hold_days: DEFAULT_PEAD_HOLD_DAYS,
            max_in_one: DEFAULT_MAX_IN_ONE,
            side_budget: DEFAULT_SIDE_BUDGET,
        }
    }
}

fn default_pead_hold_days() -> u32 {
    DEFAULT_PEAD_HOLD_DAYS
}

fn default_max_in_one() -> f64 {
    DEFAULT_MAX_IN_ONE
}

fn default_side_budget() -> f64 {
    DEFAULT_SIDE_BUDGET
}

/// Trading session section, times as "HH:MM"
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
        }
    }
}

fn default_open() -> String {
    "09:30".to_string()
}

fn default_close() -> String {
    "16:00".to_string()
}

impl SessionSection {
    pub fn to_session(&self) -> Result<MarketSession, ConfigError> {
        let open = parse_time("session.open", &self.open)?;
        let close = parse_time("session.close", &self.close)?;
        Ok(MarketSession::new(open, close)?)
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| {
        ConfigError::ValidationError(format!("{} must be HH:MM, got '{}': {}", field, value, e))
    })
}

/// Paper venue section
#[derive(Debug, Clone, Deserialize)]
pub struct PaperSection {
    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,
    /// Instruments the paper venue refuses to trade
    #[serde(default)]
    pub halted: Vec<String>,
}

impl Default for PaperSection {
    fn default() -> Self {
        Self {
            starting_capital: default_starting_capital(),
            halted: Vec::new(),
        }
    }
}

fn default_starting_capital() -> f64 {
    1_000_000.0
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl LoggingSection {
    /// Log level with environment variable override
    /// Checks EARNINGS_DRIFT_LOG first, falls back to config value
    pub fn get_level(&self) -> String {
        std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| self.level.clone())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("Invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file. A leading `~` is expanded.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
    let content = std::fs::read_to_string(expanded)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy_config().validate()?;
        self.schedule()?;

        if !(self.paper.starting_capital.is_finite() && self.paper.starting_capital > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "starting_capital must be > 0, got {}",
                self.paper.starting_capital
            )));
        }

        if self.paper.halted.iter().any(|id| id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "halted instruments cannot be empty".to_string(),
            ));
        }

        if self.logging.level.is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig::from(self)
    }

    /// Resolve the handler table against the configured session
    pub fn schedule(&self) -> Result<DailySchedule, ConfigError> {
        let session = self.session.to_session()?;
        Ok(DailySchedule::new(&self.schedule, session)?)
    }
}

impl From<&Config> for StrategyConfig {
    fn from(config: &Config) -> Self {
        StrategyConfig {
            pead_hold_days: config.strategy.pead_hold_days,
            max_in_one: config.strategy.max_in_one,
            side_budget: config.strategy.side_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::schedule::{Handler, TimeRule};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[strategy]
pead_hold_days = 6
max_in_one = 1.0
side_budget = 0.5

[session]
open = "09:30"
close = "16:00"

[[schedule]]
handler = "rebalance_shorts"
rule = "market_open"
offset_minutes = 30

[[schedule]]
handler = "rebalance_longs"
rule = "market_open"
offset_minutes = 30

[[schedule]]
handler = "close_positions"
rule = "market_open"
offset_minutes = 35

[[schedule]]
handler = "record_vars"
rule = "market_close"

[paper]
starting_capital = 250000.0
halted = ["HALTED"]

[logging]
level = "debug"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.strategy.pead_hold_days, 6);
        assert_eq!(config.paper.starting_capital, 250_000.0);
        assert_eq!(config.paper.halted, vec!["HALTED".to_string()]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.schedule.len(), 4);
        assert_eq!(
            config.schedule[3],
            ScheduleEntry::new(Handler::RecordVars, TimeRule::MarketClose, 0)
        );

        let schedule = config.schedule().unwrap();
        assert_eq!(
            schedule.slots()[2].at,
            NaiveTime::from_hms_opt(10, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.strategy_config(), StrategyConfig::default());
        assert_eq!(config.schedule().unwrap(), DailySchedule::default());
        assert_eq!(config.paper.starting_capital, 1_000_000.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_side_budget() {
        let result = parse_config("[strategy]\nside_budget = 0.0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Params(ParamsError::InvalidSideBudget(_)))
        ));
    }

    #[test]
    fn test_unknown_handler_is_parse_error() {
        let result = parse_config(
            "[[schedule]]\nhandler = \"rebalance_everything\"\nrule = \"market_open\"\n",
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_partial_schedule_rejected() {
        let result = parse_config(
            "[[schedule]]\nhandler = \"record_vars\"\nrule = \"market_close\"\n",
        );
        assert!(matches!(
            result,
            Err(ConfigError::Schedule(ScheduleError::MissingHandler(Handler::RebalanceShorts)))
        ));
    }

    #[test]
    fn test_bad_session_time() {
        let result = parse_config("[session]\nopen = \"9h30\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_non_positive_capital_rejected() {
        let result = parse_config("[paper]\nstarting_capital = -5.0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}

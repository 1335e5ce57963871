use chrono::NaiveDate;

/// Name of the daily leverage metric
pub const LEVERAGE_METRIC: &str = "leverage";

/// Scalar diagnostics emitted for offline inspection
pub trait MetricsPort: Send + Sync {
    fn record(&self, date: NaiveDate, name: &str, value: f64);
}

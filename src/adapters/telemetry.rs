//! Metric Recorders
//!
//! - `TracingRecorder`: emits each metric as a structured log event
//! - `MemoryRecorder`: keeps every sample for the run summary
//! - `FanoutRecorder`: forwards to two recorders

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::ports::MetricsPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl MetricsPort for TracingRecorder {
    fn record(&self, date: NaiveDate, name: &str, value: f64) {
        tracing::info!(target: "metrics", %date, metric = name, value, "record");
    }
}

/// Metric series keyed by name, shareable across clones
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    series: Arc<Mutex<BTreeMap<String, Vec<(NaiveDate, f64)>>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self, name: &str) -> Vec<(NaiveDate, f64)> {
        self.series
            .lock()
            .map(|series| series.get(name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series(name).last().map(|(_, value)| *value)
    }
}

impl MetricsPort for MemoryRecorder {
    fn record(&self, date: NaiveDate, name: &str, value: f64) {
        if let Ok(mut series) = self.series.lock() {
            series.entry(name.to_string()).or_default().push((date, value));
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanoutRecorder<A, B> {
    first: A,
    second: B,
}

impl<A: MetricsPort, B: MetricsPort> FanoutRecorder<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: MetricsPort, B: MetricsPort> MetricsPort for FanoutRecorder<A, B> {
    fn record(&self, date: NaiveDate, name: &str, value: f64) {
        self.first.record(date, name, value);
        self.second.record(date, name, value);
    }
}

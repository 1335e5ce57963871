//! In-memory port doubles for tests and dry runs

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::domain::{DailyFrame, Instrument};
use super::execution::{ExecutionError, ExecutionPort};
use super::pipeline::{PipelineError, PipelinePort};

/// Pipeline that replays a fixed list of sessions
#[derive(Debug, Default)]
pub struct StaticPipeline {
    frames: VecDeque<DailyFrame>,
}

impl StaticPipeline {
    pub fn new(frames: Vec<DailyFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

#[async_trait]
impl PipelinePort for StaticPipeline {
    async fn next_session(&mut self) -> Result<Option<DailyFrame>, PipelineError> {
        Ok(self.frames.pop_front())
    }
}

/// Execution port that records orders and books them directly as weights.
///
/// Holdings reported by `positions` are the booked target weights, so a
/// close order removes the name. Leverage is the sum of absolute weights.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroker {
    orders: Arc<Mutex<Vec<(Instrument, f64)>>>,
    weights: Arc<Mutex<HashMap<Instrument, f64>>>,
    untradable: Arc<Mutex<HashSet<Instrument>>>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed an existing holding
    pub fn with_position(self, instrument: &str, weight: f64) -> Self {
        self.weights
            .lock()
            .unwrap()
            .insert(Instrument::from(instrument), weight);
        self
    }

    /// Builder method to mark an instrument as not tradable
    pub fn with_untradable(self, instrument: &str) -> Self {
        self.untradable
            .lock()
            .unwrap()
            .insert(Instrument::from(instrument));
        self
    }

    /// All orders submitted so far, in submission order
    pub fn orders(&self) -> Vec<(Instrument, f64)> {
        self.orders.lock().unwrap().clone()
    }

    pub fn clear_orders(&self) {
        self.orders.lock().unwrap().clear();
    }

    pub fn weight(&self, instrument: &str) -> Option<f64> {
        self.weights
            .lock()
            .unwrap()
            .get(&Instrument::from(instrument))
            .copied()
    }
}

#[async_trait]
impl ExecutionPort for RecordingBroker {
    async fn can_trade(&self, instrument: &Instrument) -> Result<bool, ExecutionError> {
        Ok(!self.untradable.lock().unwrap().contains(instrument))
    }

    async fn positions(&self) -> Result<HashMap<Instrument, f64>, ExecutionError> {
        Ok(self.weights.lock().unwrap().clone())
    }

    async fn leverage(&self) -> Result<f64, ExecutionError> {
        Ok(self.weights.lock().unwrap().values().map(|w| w.abs()).sum())
    }

    async fn order_target_percent(
        &self,
        instrument: &Instrument,
        target: f64,
    ) -> Result<(), ExecutionError> {
        self.orders.lock().unwrap().push((instrument.clone(), target));
        let mut weights = self.weights.lock().unwrap();
        if target == 0.0 {
            weights.remove(instrument);
        } else {
            weights.insert(instrument.clone(), target);
        }
        Ok(())
    }
}

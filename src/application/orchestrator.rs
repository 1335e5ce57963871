//! Replay Orchestrator
//!
//! Drives the daily cycle over every session a pipeline yields. Owns the
//! strategy state for the lifetime of the run.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::OrderReason;
use crate::ports::{ExecutionPort, MetricsPort, PipelineError, PipelinePort};
use crate::strategy::{PositionTracker, StrategyConfig};
use super::cycle::{CycleError, DailyCycle, DayReport};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Aggregate view of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub sessions: usize,
    pub orders_submitted: usize,
    pub closes: usize,
    pub skipped_untradable: usize,
    pub empty_sides: usize,
    pub leverage: Vec<(NaiveDate, f64)>,
    pub max_leverage: Option<f64>,
    pub stopped_early: bool,
    pub days: Vec<DayReport>,
}

impl RunSummary {
    fn absorb(&mut self, report: DayReport) {
        self.first_date.get_or_insert(report.date);
        self.last_date = Some(report.date);
        self.sessions += 1;

        for run in &report.handlers {
            let outcome = &run.outcome;
            self.orders_submitted += outcome.submitted.len();
            self.closes += outcome
                .submitted
                .iter()
                .filter(|order| order.reason == OrderReason::Close)
                .count();
            self.skipped_untradable += outcome.skipped.len();
            if outcome.empty_side {
                self.empty_sides += 1;
            }
        }

        if let Some(leverage) = report.leverage() {
            self.leverage.push((report.date, leverage));
            self.max_leverage = Some(self.max_leverage.map_or(leverage, |max| max.max(leverage)));
        }

        self.days.push(report);
    }
}

/// Cloneable handle that asks the orchestrator to stop after the current
/// session. A stop sent before `run` starts is honored as soon as it does.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop_requested: Arc<RwLock<bool>>,
}

impl StopHandle {
    pub async fn stop(&self) {
        *self.stop_requested.write().await = true;
        tracing::info!("Stop signal sent to orchestrator");
    }
}

pub struct ReplayOrchestrator<P, E, M> {
    pipeline: P,
    cycle: DailyCycle<E, M>,
    state: PositionTracker,
    stop_requested: Arc<RwLock<bool>>,
    max_sessions: Option<usize>,
}

impl<P, E, M> ReplayOrchestrator<P, E, M>
where
    P: PipelinePort,
    E: ExecutionPort,
    M: MetricsPort,
{
    pub fn new(pipeline: P, cycle: DailyCycle<E, M>, config: &StrategyConfig) -> Self {
        Self {
            pipeline,
            cycle,
            state: PositionTracker::new(config.pead_hold_days),
            stop_requested: Arc::new(RwLock::new(false)),
            max_sessions: None,
        }
    }

    /// Stop after this many sessions
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = Some(max_sessions);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_requested: Arc::clone(&self.stop_requested),
        }
    }

    pub fn state(&self) -> &PositionTracker {
        &self.state
    }

    pub fn cycle(&self) -> &DailyCycle<E, M> {
        &self.cycle
    }

    /// Run sessions until the pipeline is exhausted, the session limit is
    /// reached, or a stop is requested.
    pub async fn run(&mut self) -> Result<RunSummary, OrchestratorError> {
        let mut summary = RunSummary::default();

        tracing::info!(
            max_sessions = ?self.max_sessions,
            pead_hold_days = self.state.pead_hold_days(),
            "Starting replay"
        );

        loop {
            if *self.stop_requested.read().await {
                summary.stopped_early = true;
                break;
            }
            if self.max_sessions.is_some_and(|max| summary.sessions >= max) {
                break;
            }
            let Some(frame) = self.pipeline.next_session().await? else {
                break;
            };

            let report = self.cycle.run_day(&mut self.state, &frame).await?;
            summary.absorb(report);
        }

        tracing::info!(
            sessions = summary.sessions,
            orders = summary.orders_submitted,
            "Replay finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::telemetry::MemoryRecorder;
    use crate::application::schedule::DailySchedule;
    use crate::domain::{Bucket, DailyFrame, PipelineRow, SignalFlags};
    use crate::ports::mocks::{RecordingBroker, StaticPipeline};
    use crate::strategy::Rebalancer;

    fn frames(n: u32) -> Vec<DailyFrame> {
        (1..=n)
            .map(|d| {
                DailyFrame::new(
                    NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
                    vec![PipelineRow::new(
                        "A",
                        SignalFlags::default().with(Bucket::PeadReversalLongs),
                        Some(10.0),
                    )],
                )
            })
            .collect()
    }

    fn orchestrator(
        n: u32,
    ) -> ReplayOrchestrator<StaticPipeline, RecordingBroker, MemoryRecorder> {
        let config = StrategyConfig::default();
        let cycle = DailyCycle::new(
            Rebalancer::from(&config),
            DailySchedule::default(),
            RecordingBroker::new(),
            MemoryRecorder::new(),
        );
        ReplayOrchestrator::new(StaticPipeline::new(frames(n)), cycle, &config)
    }

    #[tokio::test]
    async fn test_runs_until_pipeline_exhausted() {
        let mut orchestrator = orchestrator(3);
        let summary = orchestrator.run().await.unwrap();

        assert_eq!(summary.sessions, 3);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 7, 3));
        // One long order per day, shorts side always empty
        assert_eq!(summary.orders_submitted, 3);
        assert_eq!(summary.empty_sides, 3);
        assert_eq!(summary.leverage.len(), 3);
        assert_eq!(summary.max_leverage, Some(0.5));
        assert!(!summary.stopped_early);
    }

    #[tokio::test]
    async fn test_max_sessions_limits_run() {
        let mut orchestrator = orchestrator(5).with_max_sessions(2);
        let summary = orchestrator.run().await.unwrap();
        assert_eq!(summary.sessions, 2);
        assert_eq!(orchestrator.cycle().metrics().series("leverage").len(), 2);
    }

    #[tokio::test]
    async fn test_stop_before_run_is_honored() {
        let mut orchestrator = orchestrator(3);
        orchestrator.stop_handle().stop().await;

        let summary = orchestrator.run().await.unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.sessions, 0);
        assert!(orchestrator.cycle().execution().orders().is_empty());
    }

    /// Pipeline that requests a stop once it has served `stop_after` frames
    struct StoppingPipeline {
        inner: StaticPipeline,
        served: usize,
        stop_after: usize,
        handle: Option<StopHandle>,
    }

    #[async_trait::async_trait]
    impl PipelinePort for StoppingPipeline {
        async fn next_session(&mut self) -> Result<Option<DailyFrame>, PipelineError> {
            if self.served == self.stop_after {
                if let Some(handle) = &self.handle {
                    handle.stop().await;
                }
            }
            self.served += 1;
            self.inner.next_session().await
        }
    }

    #[tokio::test]
    async fn test_stop_during_run_finishes_current_session() {
        let config = StrategyConfig::default();
        let cycle = DailyCycle::new(
            Rebalancer::from(&config),
            DailySchedule::default(),
            RecordingBroker::new(),
            MemoryRecorder::new(),
        );
        let pipeline = StoppingPipeline {
            inner: StaticPipeline::new(frames(5)),
            served: 0,
            stop_after: 1,
            handle: None,
        };
        let mut orchestrator = ReplayOrchestrator::new(pipeline, cycle, &config);
        orchestrator.pipeline.handle = Some(orchestrator.stop_handle());

        let summary = orchestrator.run().await.unwrap();
        // The frame fetched alongside the stop still runs to completion
        assert!(summary.stopped_early);
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 7, 2));
    }
}

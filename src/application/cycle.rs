//! Daily Cycle
//!
//! One trading session: pipeline refresh, then the scheduled handlers in
//! order. Strategy state is owned by the caller and passed in by reference.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::{DailyFrame, Instrument, Side, TargetOrder};
use crate::ports::{ExecutionError, ExecutionPort, MetricsPort, LEVERAGE_METRIC};
use crate::strategy::{plan_closes, AllocationError, PositionTracker, Rebalancer, RefreshSummary};
use super::schedule::{DailySchedule, Handler};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Session setup failed on {date}: {source}")]
    Session {
        date: NaiveDate,
        #[source]
        source: ExecutionError,
    },
    #[error("Handler {handler} failed on {date}: {source}")]
    Handler {
        handler: Handler,
        date: NaiveDate,
        #[source]
        source: ExecutionError,
    },
}

/// What a single handler did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HandlerOutcome {
    /// Orders accepted by the execution port
    pub submitted: Vec<TargetOrder>,
    /// Names skipped because the host reported them untradable
    pub skipped: Vec<Instrument>,
    /// Set when the side had nothing to allocate to
    pub empty_side: bool,
    /// Leverage read by the recorder
    pub leverage: Option<f64>,
}

/// A handler outcome tagged with its slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerRun {
    pub handler: Handler,
    pub at: NaiveTime,
    pub outcome: HandlerOutcome,
}

/// Everything that happened in one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub refresh: RefreshSummary,
    pub handlers: Vec<HandlerRun>,
}

impl DayReport {
    pub fn orders(&self) -> impl Iterator<Item = &TargetOrder> {
        self.handlers.iter().flat_map(|run| run.outcome.submitted.iter())
    }

    pub fn leverage(&self) -> Option<f64> {
        self.handlers.iter().find_map(|run| run.outcome.leverage)
    }

    pub fn outcome(&self, handler: Handler) -> Option<&HandlerOutcome> {
        self.handlers
            .iter()
            .find(|run| run.handler == handler)
            .map(|run| &run.outcome)
    }
}

async fn submit<E: ExecutionPort + ?Sized>(
    execution: &E,
    orders: Vec<TargetOrder>,
    outcome: &mut HandlerOutcome,
) -> Result<(), ExecutionError> {
    for order in orders {
        if !execution.can_trade(&order.instrument).await? {
            debug!(instrument = %order.instrument, reason = %order.reason, "Not tradable, skipping");
            outcome.skipped.push(order.instrument);
            continue;
        }
        execution
            .order_target_percent(&order.instrument, order.target_weight)
            .await?;
        info!(
            instrument = %order.instrument,
            target = order.target_weight,
            reason = %order.reason,
            "Order submitted"
        );
        outcome.submitted.push(order);
    }
    Ok(())
}

/// Bring every tradable name on one side of the book to its equal weight.
///
/// An empty side is an invalid allocation and is skipped without orders.
pub async fn rebalance_side<E: ExecutionPort + ?Sized>(
    execution: &E,
    rebalancer: &Rebalancer,
    state: &PositionTracker,
    side: Side,
) -> Result<HandlerOutcome, ExecutionError> {
    let mut outcome = HandlerOutcome::default();
    let orders = match rebalancer.plan_side(side, state.aggregate(side)) {
        Ok(orders) => orders,
        Err(AllocationError::InvalidAllocation { side }) => {
            info!(%side, "No names on this side today, skipping rebalance");
            outcome.empty_side = true;
            return Ok(outcome);
        }
    };
    submit(execution, orders, &mut outcome).await?;
    Ok(outcome)
}

/// Zero out every holding that is not in today's aggregate set
pub async fn close_stale<E: ExecutionPort + ?Sized>(
    execution: &E,
    state: &PositionTracker,
) -> Result<HandlerOutcome, ExecutionError> {
    let mut outcome = HandlerOutcome::default();
    let positions = execution.positions().await?;
    let orders = plan_closes(&positions, state.aggregate_all());
    submit(execution, orders, &mut outcome).await?;
    Ok(outcome)
}

/// Emit account leverage. No bound is enforced.
pub async fn record_daily<E: ExecutionPort + ?Sized, M: MetricsPort + ?Sized>(
    execution: &E,
    metrics: &M,
    date: NaiveDate,
) -> Result<HandlerOutcome, ExecutionError> {
    let leverage = execution.leverage().await?;
    metrics.record(date, LEVERAGE_METRIC, leverage);
    Ok(HandlerOutcome {
        leverage: Some(leverage),
        ..HandlerOutcome::default()
    })
}

/// Binds the schedule and sizing rules to the host ports
pub struct DailyCycle<E, M> {
    rebalancer: Rebalancer,
    schedule: DailySchedule,
    execution: E,
    metrics: M,
}

impl<E: ExecutionPort, M: MetricsPort> DailyCycle<E, M> {
    pub fn new(rebalancer: Rebalancer, schedule: DailySchedule, execution: E, metrics: M) -> Self {
        Self {
            rebalancer,
            schedule,
            execution,
            metrics,
        }
    }

    pub fn execution(&self) -> &E {
        &self.execution
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    /// Pre-market refresh followed by every scheduled handler.
    pub async fn run_day(
        &self,
        state: &mut PositionTracker,
        frame: &DailyFrame,
    ) -> Result<DayReport, CycleError> {
        let date = frame.date;
        self.execution
            .observe_session(frame)
            .await
            .map_err(|source| CycleError::Session { date, source })?;

        let refresh = state.refresh_daily(frame);

        let mut handlers = Vec::with_capacity(self.schedule.slots().len());
        for slot in self.schedule.slots() {
            let outcome = self
                .run_handler(slot.handler, state, date)
                .await
                .map_err(|source| {
                    error!(handler = %slot.handler, %date, error = %source, "Handler failed");
                    CycleError::Handler {
                        handler: slot.handler,
                        date,
                        source,
                    }
                })?;
            handlers.push(HandlerRun {
                handler: slot.handler,
                at: slot.at,
                outcome,
            });
        }

        Ok(DayReport {
            date,
            refresh,
            handlers,
        })
    }

    async fn run_handler(
        &self,
        handler: Handler,
        state: &PositionTracker,
        date: NaiveDate,
    ) -> Result<HandlerOutcome, ExecutionError> {
        match handler {
            Handler::RebalanceShorts => {
                rebalance_side(&self.execution, &self.rebalancer, state, Side::Short).await
            }
            Handler::RebalanceLongs => {
                rebalance_side(&self.execution, &self.rebalancer, state, Side::Long).await
            }
            Handler::ClosePositions => close_stale(&self.execution, state).await,
            Handler::RecordVars => record_daily(&self.execution, &self.metrics, date).await,
        }
    }
}

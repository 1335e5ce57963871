pub mod schedule;
pub mod cycle;
pub mod orchestrator;

pub use schedule::{DailySchedule, Handler, MarketSession, ScheduleEntry, ScheduleError, ScheduledHandler, TimeRule};
pub use cycle::{
    close_stale, rebalance_side, record_daily, CycleError, DailyCycle, DayReport, HandlerOutcome,
    HandlerRun,
};
pub use orchestrator::{OrchestratorError, ReplayOrchestrator, RunSummary, StopHandle};

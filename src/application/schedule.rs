//! Daily Schedule
//!
//! Explicit `{handler: time of day}` table for the intraday handlers, built
//! from configuration and validated once at startup. The pre-market pipeline
//! refresh is not part of the table; it always runs first.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Intraday handlers, in the order they must run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    RebalanceShorts,
    RebalanceLongs,
    ClosePositions,
    RecordVars,
}

impl Handler {
    pub const ALL: [Handler; 4] = [
        Handler::RebalanceShorts,
        Handler::RebalanceLongs,
        Handler::ClosePositions,
        Handler::RecordVars,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Handler::RebalanceShorts => "rebalance_shorts",
            Handler::RebalanceLongs => "rebalance_longs",
            Handler::ClosePositions => "close_positions",
            Handler::RecordVars => "record_vars",
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anchor for a handler's time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRule {
    /// `offset_minutes` after the open
    MarketOpen,
    /// `offset_minutes` before the close
    MarketClose,
}

/// One configured `{handler, rule, offset}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub handler: Handler,
    pub rule: TimeRule,
    #[serde(default)]
    pub offset_minutes: u32,
}

impl ScheduleEntry {
    pub fn new(handler: Handler, rule: TimeRule, offset_minutes: u32) -> Self {
        Self {
            handler,
            rule,
            offset_minutes,
        }
    }
}

/// Default table: trade half an hour after the open, record at the close
pub fn default_entries() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry::new(Handler::RebalanceShorts, TimeRule::MarketOpen, 30),
        ScheduleEntry::new(Handler::RebalanceLongs, TimeRule::MarketOpen, 30),
        ScheduleEntry::new(Handler::ClosePositions, TimeRule::MarketOpen, 30),
        ScheduleEntry::new(Handler::RecordVars, TimeRule::MarketClose, 0),
    ]
}

/// Regular trading hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSession {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl MarketSession {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, ScheduleError> {
        if open >= close {
            return Err(ScheduleError::InvalidSession { open, close });
        }
        Ok(Self { open, close })
    }

    pub fn length_minutes(&self) -> i64 {
        (self.close - self.open).num_minutes()
    }

    /// Time of day for a rule, or None if it falls outside the session
    pub fn resolve(&self, rule: TimeRule, offset_minutes: u32) -> Option<NaiveTime> {
        let offset = i64::from(offset_minutes);
        if offset > self.length_minutes() {
            return None;
        }
        let at = match rule {
            TimeRule::MarketOpen => self.open + Duration::minutes(offset),
            TimeRule::MarketClose => self.close - Duration::minutes(offset),
        };
        (self.open..=self.close).contains(&at).then_some(at)
    }
}

impl Default for MarketSession {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Session open {open} must be before close {close}")]
    InvalidSession { open: NaiveTime, close: NaiveTime },
    #[error("Handler {0} is scheduled more than once")]
    DuplicateHandler(Handler),
    #[error("Handler {0} is not scheduled")]
    MissingHandler(Handler),
    #[error("Handler {handler} offset of {offset_minutes} minutes falls outside the session")]
    OutsideSession { handler: Handler, offset_minutes: u32 },
    #[error("Handler {later} at {later_at} would run before {earlier} at {earlier_at}")]
    OutOfOrder {
        earlier: Handler,
        earlier_at: NaiveTime,
        later: Handler,
        later_at: NaiveTime,
    },
}

/// A handler bound to its resolved time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledHandler {
    pub handler: Handler,
    pub at: NaiveTime,
}

/// Validated intraday schedule, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    session: MarketSession,
    slots: Vec<ScheduledHandler>,
}

impl DailySchedule {
    /// Resolve and validate the configured entries.
    ///
    /// Every handler must appear exactly once, fall inside the session, and
    /// resolve to a time no earlier than the handler before it.
    pub fn new(entries: &[ScheduleEntry], session: MarketSession) -> Result<Self, ScheduleError> {
        let mut resolved: [Option<NaiveTime>; 4] = [None; 4];

        for entry in entries {
            let slot = &mut resolved[entry.handler as usize];
            if slot.is_some() {
                return Err(ScheduleError::DuplicateHandler(entry.handler));
            }
            let at = session.resolve(entry.rule, entry.offset_minutes).ok_or(
                ScheduleError::OutsideSession {
                    handler: entry.handler,
                    offset_minutes: entry.offset_minutes,
                },
            )?;
            *slot = Some(at);
        }

        let mut slots: Vec<ScheduledHandler> = Vec::with_capacity(Handler::ALL.len());
        for handler in Handler::ALL {
            let at = resolved[handler as usize].ok_or(ScheduleError::MissingHandler(handler))?;
            if let Some(previous) = slots.last().copied() {
                let ScheduledHandler { handler: earlier, at: earlier_at } = previous;
                if at < earlier_at {
                    return Err(ScheduleError::OutOfOrder {
                        earlier,
                        earlier_at,
                        later: handler,
                        later_at: at,
                    });
                }
            }
            slots.push(ScheduledHandler { handler, at });
        }

        Ok(Self { session, slots })
    }

    pub fn slots(&self) -> &[ScheduledHandler] {
        &self.slots
    }

    pub fn session(&self) -> MarketSession {
        self.session
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        let session = MarketSession::default();
        let slots = default_entries()
            .iter()
            .filter_map(|entry| {
                session
                    .resolve(entry.rule, entry.offset_minutes)
                    .map(|at| ScheduledHandler { handler: entry.handler, at })
            })
            .collect();
        Self { session, slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_default_schedule_resolves() {
        let schedule = DailySchedule::new(&default_entries(), MarketSession::default()).unwrap();
        let slots = schedule.slots();

        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], ScheduledHandler { handler: Handler::RebalanceShorts, at: time(10, 0) });
        assert_eq!(slots[1].handler, Handler::RebalanceLongs);
        assert_eq!(slots[2].handler, Handler::ClosePositions);
        assert_eq!(slots[3], ScheduledHandler { handler: Handler::RecordVars, at: time(16, 0) });
        assert_eq!(schedule, DailySchedule::default());
    }

    #[test]
    fn test_entries_may_be_listed_in_any_order() {
        let mut entries = default_entries();
        entries.reverse();
        let schedule = DailySchedule::new(&entries, MarketSession::default()).unwrap();
        let order: Vec<Handler> = schedule.slots().iter().map(|s| s.handler).collect();
        assert_eq!(order, Handler::ALL.to_vec());
    }

    #[test]
    fn test_duplicate_handler_rejected() {
        let mut entries = default_entries();
        entries.push(ScheduleEntry::new(Handler::RecordVars, TimeRule::MarketClose, 5));
        assert_eq!(
            DailySchedule::new(&entries, MarketSession::default()),
            Err(ScheduleError::DuplicateHandler(Handler::RecordVars))
        );
    }

    #[test]
    fn test_missing_handler_rejected() {
        let entries: Vec<_> = default_entries()
            .into_iter()
            .filter(|e| e.handler != Handler::ClosePositions)
            .collect();
        assert_eq!(
            DailySchedule::new(&entries, MarketSession::default()),
            Err(ScheduleError::MissingHandler(Handler::ClosePositions))
        );
    }

    #[test]
    fn test_offset_outside_session_rejected() {
        let mut entries = default_entries();
        entries[0].offset_minutes = 400;
        assert!(matches!(
            DailySchedule::new(&entries, MarketSession::default()),
            Err(ScheduleError::OutsideSession { handler: Handler::RebalanceShorts, .. })
        ));
    }

    #[test]
    fn test_close_before_longs_rejected() {
        let entries = vec![
            ScheduleEntry::new(Handler::RebalanceShorts, TimeRule::MarketOpen, 30),
            ScheduleEntry::new(Handler::RebalanceLongs, TimeRule::MarketOpen, 45),
            ScheduleEntry::new(Handler::ClosePositions, TimeRule::MarketOpen, 30),
            ScheduleEntry::new(Handler::RecordVars, TimeRule::MarketClose, 0),
        ];
        assert!(matches!(
            DailySchedule::new(&entries, MarketSession::default()),
            Err(ScheduleError::OutOfOrder {
                earlier: Handler::RebalanceLongs,
                later: Handler::ClosePositions,
                ..
            })
        ));
    }

    #[test]
    fn test_inverted_session_rejected() {
        assert!(matches!(
            MarketSession::new(time(16, 0), time(9, 30)),
            Err(ScheduleError::InvalidSession { .. })
        ));
    }

    #[test]
    fn test_close_rule_counts_back_from_close() {
        let session = MarketSession::default();
        assert_eq!(session.resolve(TimeRule::MarketClose, 15), Some(time(15, 45)));
        assert_eq!(session.resolve(TimeRule::MarketOpen, 390), Some(time(16, 0)));
        assert_eq!(session.resolve(TimeRule::MarketOpen, 391), None);
    }
}

//! Position Tracker
//!
//! Daily bookkeeping for the two signal families:
//! - PEAD picks live in a `HoldingRecord` per side and are held for a fixed
//!   number of sessions after their last selection
//! - Reversal picks live in a `ReversalList` per side, rebuilt every session
//!
//! Earnings-drift membership takes precedence: a name already on either PEAD
//! book never enters a reversal list the same day.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::domain::{Bucket, DailyFrame, HoldingRecord, Instrument, ReversalList, Side};

/// Outcome of one pre-market refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub expired_longs: usize,
    pub expired_shorts: usize,
    pub pead_longs: usize,
    pub pead_shorts: usize,
    pub reversal_longs: usize,
    pub reversal_shorts: usize,
    pub aggregate_longs: usize,
    pub aggregate_shorts: usize,
}

/// Strategy state owned by the run loop and mutated once per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionTracker {
    pead_hold_days: u32,
    long_holdings: HoldingRecord,
    short_holdings: HoldingRecord,
    long_reversals: ReversalList,
    short_reversals: ReversalList,
    aggregate_longs: BTreeSet<Instrument>,
    aggregate_shorts: BTreeSet<Instrument>,
    aggregate_all: BTreeSet<Instrument>,
}

impl PositionTracker {
    pub fn new(pead_hold_days: u32) -> Self {
        Self {
            pead_hold_days,
            long_holdings: HoldingRecord::new(),
            short_holdings: HoldingRecord::new(),
            long_reversals: ReversalList::new(),
            short_reversals: ReversalList::new(),
            aggregate_longs: BTreeSet::new(),
            aggregate_shorts: BTreeSet::new(),
            aggregate_all: BTreeSet::new(),
        }
    }

    /// Consume today's factor table and rebuild the aggregate sets.
    pub fn refresh_daily(&mut self, frame: &DailyFrame) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        // Expiry happens for every entry before any new selection
        let expired_longs = self.long_holdings.age_and_expire(self.pead_hold_days);
        let expired_shorts = self.short_holdings.age_and_expire(self.pead_hold_days);
        for instrument in expired_longs.iter().chain(expired_shorts.iter()) {
            debug!(%instrument, date = %frame.date, "PEAD hold period elapsed");
        }
        summary.expired_longs = expired_longs.len();
        summary.expired_shorts = expired_shorts.len();

        self.long_reversals.clear();
        self.short_reversals.clear();

        for instrument in frame.flagged(Bucket::PeadReversalLongs) {
            self.long_holdings.select(instrument.clone());
        }
        for instrument in frame.flagged(Bucket::PeadReversalShorts) {
            self.short_holdings.select(instrument.clone());
        }

        for instrument in frame.flagged(Bucket::ReversalLongs) {
            if !self.on_pead_book(instrument) {
                self.long_reversals.push(instrument.clone());
            }
        }
        for instrument in frame.flagged(Bucket::ReversalShorts) {
            if !self.on_pead_book(instrument) {
                self.short_reversals.push(instrument.clone());
            }
        }

        self.rebuild_aggregates();

        summary.pead_longs = self.long_holdings.len();
        summary.pead_shorts = self.short_holdings.len();
        summary.reversal_longs = self.long_reversals.len();
        summary.reversal_shorts = self.short_reversals.len();
        summary.aggregate_longs = self.aggregate_longs.len();
        summary.aggregate_shorts = self.aggregate_shorts.len();

        info!(
            date = %frame.date,
            longs = summary.aggregate_longs,
            shorts = summary.aggregate_shorts,
            pead_longs = summary.pead_longs,
            pead_shorts = summary.pead_shorts,
            expired = summary.expired_longs + summary.expired_shorts,
            "Pipeline refresh complete"
        );

        summary
    }

    fn on_pead_book(&self, instrument: &Instrument) -> bool {
        self.long_holdings.contains(instrument) || self.short_holdings.contains(instrument)
    }

    fn rebuild_aggregates(&mut self) {
        self.aggregate_longs = self
            .long_holdings
            .instruments()
            .chain(self.long_reversals.iter())
            .cloned()
            .collect();
        self.aggregate_shorts = self
            .short_holdings
            .instruments()
            .chain(self.short_reversals.iter())
            .cloned()
            .collect();
        self.aggregate_all = self
            .aggregate_longs
            .union(&self.aggregate_shorts)
            .cloned()
            .collect();
    }

    pub fn pead_hold_days(&self) -> u32 {
        self.pead_hold_days
    }

    pub fn holdings(&self, side: Side) -> &HoldingRecord {
        match side {
            Side::Long => &self.long_holdings,
            Side::Short => &self.short_holdings,
        }
    }

    pub fn reversals(&self, side: Side) -> &ReversalList {
        match side {
            Side::Long => &self.long_reversals,
            Side::Short => &self.short_reversals,
        }
    }

    pub fn aggregate(&self, side: Side) -> &BTreeSet<Instrument> {
        match side {
            Side::Long => &self.aggregate_longs,
            Side::Short => &self.aggregate_shorts,
        }
    }

    pub fn aggregate_longs(&self) -> &BTreeSet<Instrument> {
        &self.aggregate_longs
    }

    pub fn aggregate_shorts(&self) -> &BTreeSet<Instrument> {
        &self.aggregate_shorts
    }

    pub fn aggregate_all(&self) -> &BTreeSet<Instrument> {
        &self.aggregate_all
    }
}

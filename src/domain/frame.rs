//! Daily Factor Table
//!
//! The host's pipeline output for one trading session: one row per instrument
//! carrying the four strategy bucket memberships and the last close price.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::instrument::Instrument;

/// Named strategy bucket produced by the factor pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    PeadReversalLongs,
    PeadReversalShorts,
    ReversalLongs,
    ReversalShorts,
}

/// Bucket memberships for a single instrument. Missing columns read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlags {
    #[serde(default)]
    pub pead_reversal_longs: bool,
    #[serde(default)]
    pub pead_reversal_shorts: bool,
    #[serde(default)]
    pub reversal_longs: bool,
    #[serde(default)]
    pub reversal_shorts: bool,
}

impl SignalFlags {
    pub fn is_set(&self, bucket: Bucket) -> bool {
        match bucket {
            Bucket::PeadReversalLongs => self.pead_reversal_longs,
            Bucket::PeadReversalShorts => self.pead_reversal_shorts,
            Bucket::ReversalLongs => self.reversal_longs,
            Bucket::ReversalShorts => self.reversal_shorts,
        }
    }

    pub fn with(mut self, bucket: Bucket) -> Self {
        match bucket {
            Bucket::PeadReversalLongs => self.pead_reversal_longs = true,
            Bucket::PeadReversalShorts => self.pead_reversal_shorts = true,
            Bucket::ReversalLongs => self.reversal_longs = true,
            Bucket::ReversalShorts => self.reversal_shorts = true,
        }
        self
    }
}

/// One row of the daily factor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRow {
    pub instrument: Instrument,
    #[serde(flatten)]
    pub flags: SignalFlags,
    /// Last close price
    #[serde(default)]
    pub pricing: Option<f64>,
}

impl PipelineRow {
    pub fn new(instrument: impl Into<Instrument>, flags: SignalFlags, pricing: Option<f64>) -> Self {
        Self {
            instrument: instrument.into(),
            flags,
            pricing,
        }
    }
}

/// Full pipeline output for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFrame {
    pub date: NaiveDate,
    #[serde(default)]
    pub rows: Vec<PipelineRow>,
}

impl DailyFrame {
    pub fn new(date: NaiveDate, rows: Vec<PipelineRow>) -> Self {
        Self { date, rows }
    }

    /// Instruments flagged in the given bucket, in table order
    pub fn flagged(&self, bucket: Bucket) -> impl Iterator<Item = &Instrument> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.flags.is_set(bucket))
            .map(|row| &row.instrument)
    }

    /// Last close per instrument, skipping rows without a usable price
    pub fn prices(&self) -> HashMap<Instrument, f64> {
        self.rows
            .iter()
            .filter_map(|row| match row.pricing {
                Some(price) if price.is_finite() && price > 0.0 => {
                    Some((row.instrument.clone(), price))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_missing_columns_default_to_false() {
        let row: PipelineRow = serde_json::from_str(
            r#"{"instrument": "AAPL", "reversal_longs": true, "pricing": 187.5}"#,
        )
        .unwrap();

        assert!(row.flags.reversal_longs);
        assert!(!row.flags.pead_reversal_longs);
        assert!(!row.flags.pead_reversal_shorts);
        assert!(!row.flags.reversal_shorts);
        assert_eq!(row.pricing, Some(187.5));
    }

    #[test]
    fn test_flagged_filters_by_bucket() {
        let frame = DailyFrame::new(
            date(2),
            vec![
                PipelineRow::new("A", SignalFlags::default().with(Bucket::PeadReversalLongs), None),
                PipelineRow::new("B", SignalFlags::default().with(Bucket::ReversalShorts), None),
                PipelineRow::new("C", SignalFlags::default().with(Bucket::PeadReversalLongs), None),
            ],
        );

        let longs: Vec<_> = frame.flagged(Bucket::PeadReversalLongs).map(|i| i.as_str()).collect();
        assert_eq!(longs, vec!["A", "C"]);
        assert_eq!(frame.flagged(Bucket::ReversalLongs).count(), 0);
    }

    #[test]
    fn test_prices_skip_unusable_values() {
        let frame = DailyFrame::new(
            date(3),
            vec![
                PipelineRow::new("A", SignalFlags::default(), Some(10.0)),
                PipelineRow::new("B", SignalFlags::default(), None),
                PipelineRow::new("C", SignalFlags::default(), Some(0.0)),
                PipelineRow::new("D", SignalFlags::default(), Some(f64::NAN)),
            ],
        );

        let prices = frame.prices();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(&Instrument::from("A")), Some(&10.0));
    }
}

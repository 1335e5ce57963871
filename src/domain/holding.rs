use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::instrument::Instrument;

/// Days-held counter for positions opened on the earnings-drift signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRecord {
    entries: BTreeMap<Instrument, u32>,
}

impl HoldingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Age every entry by one day and drop those whose age reaches `hold_limit`.
    ///
    /// Returns the instruments that expired, in instrument order.
    pub fn age_and_expire(&mut self, hold_limit: u32) -> Vec<Instrument> {
        let mut expired = Vec::new();
        self.entries.retain(|instrument, days_held| {
            *days_held += 1;
            if *days_held >= hold_limit {
                expired.push(instrument.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Insert or re-select an instrument; re-selection resets its age to 0
    pub fn select(&mut self, instrument: Instrument) {
        self.entries.insert(instrument, 0);
    }

    pub fn contains(&self, instrument: &Instrument) -> bool {
        self.entries.contains_key(instrument)
    }

    pub fn days_held(&self, instrument: &Instrument) -> Option<u32> {
        self.entries.get(instrument).copied()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-day membership list for the short-horizon reversal signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalList {
    members: BTreeSet<Instrument>,
}

impl ReversalList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Returns false if the instrument was already listed
    pub fn push(&mut self, instrument: Instrument) -> bool {
        self.members.insert(instrument)
    }

    pub fn contains(&self, instrument: &Instrument) -> bool {
        self.members.contains(instrument)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_starts_at_zero() {
        let mut record = HoldingRecord::new();
        record.select(Instrument::from("A"));
        assert_eq!(record.days_held(&Instrument::from("A")), Some(0));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_age_and_expire_exclusive_limit() {
        let mut record = HoldingRecord::new();
        let a = Instrument::from("A");
        record.select(a.clone());

        for expected_age in 1..3 {
            let expired = record.age_and_expire(3);
            assert!(expired.is_empty());
            assert_eq!(record.days_held(&a), Some(expected_age));
        }

        // Age would reach the limit: dropped
        let expired = record.age_and_expire(3);
        assert_eq!(expired, vec![a.clone()]);
        assert!(!record.contains(&a));
        assert!(record.is_empty());
    }

    #[test]
    fn test_reselect_resets_age() {
        let mut record = HoldingRecord::new();
        let a = Instrument::from("A");
        record.select(a.clone());
        record.age_and_expire(6);
        record.age_and_expire(6);
        assert_eq!(record.days_held(&a), Some(2));

        record.select(a.clone());
        assert_eq!(record.days_held(&a), Some(0));
    }

    #[test]
    fn test_reversal_list_dedups() {
        let mut list = ReversalList::new();
        assert!(list.push(Instrument::from("B")));
        assert!(!list.push(Instrument::from("B")));
        assert_eq!(list.len(), 1);

        list.clear();
        assert!(list.is_empty());
    }
}

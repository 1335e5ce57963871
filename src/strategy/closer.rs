//! Position Closer
//!
//! Zero-target orders for holdings that dropped out of today's aggregate set.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{Instrument, TargetOrder};

/// Close orders for every nonzero position not in `keep`, in instrument order.
pub fn plan_closes(
    positions: &HashMap<Instrument, f64>,
    keep: &BTreeSet<Instrument>,
) -> Vec<TargetOrder> {
    let mut stale: Vec<&Instrument> = positions
        .iter()
        .filter(|(instrument, amount)| **amount != 0.0 && !keep.contains(*instrument))
        .map(|(instrument, _)| instrument)
        .collect();
    stale.sort();

    stale
        .into_iter()
        .map(|instrument| TargetOrder::close(instrument.clone()))
        .collect()
}

//! Classification of a ledger against reference bands.

use crate::cell::{CellType, Panel};
use crate::ledger::{percent_of, CountLedger};
use crate::reference::{ReferenceBand, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of the results table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub cell_type: CellType,
    pub count: u32,
    pub percent: f64,
    pub band: ReferenceBand,
    pub status: Status,
}

/// Results table for the ledger's panel, in panel order.
///
/// Cell types without a band in `bands` are left out.
pub fn build_summary(
    ledger: &CountLedger,
    bands: &BTreeMap<CellType, ReferenceBand>,
) -> Vec<SummaryRow> {
    summarise_counts(ledger.panel(), &ledger.snapshot(), bands)
}

/// Same as [`build_summary`] over a plain count map, e.g. a saved record's counts.
pub fn summarise_counts(
    panel: Panel,
    counts: &BTreeMap<CellType, u32>,
    bands: &BTreeMap<CellType, ReferenceBand>,
) -> Vec<SummaryRow> {
    let total: u32 = counts.values().sum();
    panel
        .cell_types()
        .iter()
        .filter_map(|&cell| {
            let band = *bands.get(&cell)?;
            let count = counts.get(&cell).copied().unwrap_or(0);
            let percent = percent_of(count, total);
            Some(SummaryRow {
                cell_type: cell,
                count,
                percent,
                band,
                status: band.classify(percent),
            })
        })
        .collect()
}

/// Summary of a counting session on a given day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub age: Option<u32>,
    pub total: u32,
    pub rows: Vec<SummaryRow>,
}

//! Per-session tally of counted cells with single-step undo.

use crate::cell::{CellType, Panel};
use crate::constants::MILESTONES;
use crate::error::{CountError, CountResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A total the ledger reports once when it is reached from below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milestone(pub u32);

/// Result of [`CountLedger::undo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "cell_type", rename_all = "snake_case")]
pub enum UndoOutcome {
    /// The last increment of this cell type was reverted.
    Undone(CellType),
    /// The history named this cell type but its counter was already zero.
    CounterAlreadyZero(CellType),
    NothingToUndo,
}

/// Mapping of the panel's cell types to non-negative counts, plus the increment history.
///
/// `total()` always equals the number of increments not yet undone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountLedger {
    panel: Panel,
    counts: BTreeMap<CellType, u32>,
    history: Vec<CellType>,
}

impl CountLedger {
    pub fn new(panel: Panel) -> Self {
        Self {
            panel,
            counts: panel.cell_types().iter().map(|&cell| (cell, 0)).collect(),
            history: Vec::new(),
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    /// Count one cell. Cell types outside the panel are rejected without mutation.
    pub fn increment(&mut self, cell: CellType) -> CountResult<Option<Milestone>> {
        let before = self.total();
        let Some(count) = self.counts.get_mut(&cell) else {
            return Err(CountError::CellNotInPanel {
                cell,
                panel: self.panel,
            });
        };

        *count += 1;
        self.history.push(cell);
        let after = before + 1;

        Ok(MILESTONES
            .into_iter()
            .find(|&m| before < m && after >= m)
            .map(Milestone))
    }

    pub fn undo(&mut self) -> UndoOutcome {
        let Some(cell) = self.history.pop() else {
            return UndoOutcome::NothingToUndo;
        };

        match self.counts.get_mut(&cell) {
            Some(count) if *count > 0 => {
                *count -= 1;
                UndoOutcome::Undone(cell)
            }
            _ => {
                tracing::warn!(cell_type = cell.name(), "undo skipped: counter already zero");
                UndoOutcome::CounterAlreadyZero(cell)
            }
        }
    }

    /// Zero every counter and clear the history.
    pub fn reset(&mut self) {
        self.counts.values_mut().for_each(|count| *count = 0);
        self.history.clear();
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Count of `cell`; zero for cell types outside the panel.
    pub fn count(&self, cell: CellType) -> u32 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    /// Share of the total, in percent, rounded to one decimal. Zero when nothing is counted.
    pub fn percent(&self, cell: CellType) -> f64 {
        percent_of(self.count(cell), self.total())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn snapshot(&self) -> BTreeMap<CellType, u32> {
        self.counts.clone()
    }
}

/// `100 * count / total`, rounded to one decimal place with exact ties going to the even
/// tenth. Computed in integers so ties such as 1/16 are not lost to binary fractions.
pub fn percent_of(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = 1000 * u64::from(count);
    let t = u64::from(total);
    let (q, r) = (n / t, n % t);
    let tenths = if 2 * r > t || (2 * r == t && q % 2 == 1) {
        q + 1
    } else {
        q
    };
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_increment_and_percentages() {
        let mut ledger = CountLedger::new(Panel::Simplified);
        for _ in 0..3 {
            ledger.increment(CellType::Neutrophils).unwrap();
        }
        ledger.increment(CellType::Eosinophils).unwrap();

        assert_eq!(ledger.total(), 4);
        assert_eq!(ledger.percent(CellType::Neutrophils), 75.0);
        assert_eq!(ledger.percent(CellType::Eosinophils), 25.0);

        assert_eq!(ledger.undo(), UndoOutcome::Undone(CellType::Eosinophils));
        assert_eq!(ledger.count(CellType::Neutrophils), 3);
        assert_eq!(ledger.count(CellType::Eosinophils), 0);
        assert_eq!(ledger.total(), 3);
        assert_eq!(ledger.percent(CellType::Neutrophils), 100.0);
    }

    #[test]
    fn test_increment_rejects_cell_outside_panel() {
        let mut ledger = CountLedger::new(Panel::Simplified);
        let err = ledger.increment(CellType::Lymphocytes).unwrap_err();
        assert!(matches!(err, CountError::CellNotInPanel { .. }));
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.history_len(), 0);
    }

    #[test]
    fn test_undo_on_empty_history_is_a_no_op() {
        let mut ledger = CountLedger::new(Panel::WhiteDifferential);
        let before = ledger.clone();
        assert_eq!(ledger.undo(), UndoOutcome::NothingToUndo);
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_undo_reports_counter_already_zero() {
        let mut ledger = CountLedger::new(Panel::Simplified);
        ledger.increment(CellType::Monocytes).unwrap();
        ledger.counts.insert(CellType::Monocytes, 0);

        assert_eq!(
            ledger.undo(),
            UndoOutcome::CounterAlreadyZero(CellType::Monocytes)
        );
        assert_eq!(ledger.count(CellType::Monocytes), 0);
        assert_eq!(ledger.history_len(), 0);
    }

    #[test]
    fn test_reset_clears_counts_and_history() {
        let mut ledger = CountLedger::new(Panel::WhiteDifferential);
        ledger.increment(CellType::Lymphocytes).unwrap();
        ledger.increment(CellType::PlasmaCells).unwrap();
        ledger.reset();

        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.history_len(), 0);
        assert_eq!(ledger.snapshot().len(), 8);
    }

    #[test]
    fn test_milestones_reported_once_when_crossed() {
        let mut ledger = CountLedger::new(Panel::Simplified);
        let mut reached = Vec::new();
        for _ in 0..200 {
            if let Some(m) = ledger.increment(CellType::Neutrophils).unwrap() {
                reached.push(m);
            }
        }
        assert_eq!(reached, vec![Milestone(100), Milestone(200)]);

        // Dropping below and reaching the threshold again reports it again.
        ledger.undo();
        assert_eq!(
            ledger.increment(CellType::Basophils).unwrap(),
            Some(Milestone(200))
        );
        assert_eq!(ledger.increment(CellType::Basophils).unwrap(), None);
    }

    #[test]
    fn test_percent_rounds_to_one_decimal() {
        assert_eq!(percent_of(1, 3), 33.3);
        assert_eq!(percent_of(2, 3), 66.7);
        assert_eq!(percent_of(0, 0), 0.0);
        assert_eq!(percent_of(16, 16), 100.0);
    }

    #[test]
    fn test_percent_ties_round_to_even() {
        assert_eq!(percent_of(1, 16), 6.2);
        assert_eq!(percent_of(1, 80), 1.2);
        assert_eq!(percent_of(3, 16), 18.8);
        assert_eq!(percent_of(5, 16), 31.2);
    }

    #[derive(Clone, Debug)]
    enum Action {
        Increment(usize),
        Undo,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => (0usize..5).prop_map(Action::Increment),
            1 => Just(Action::Undo),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_matches_outstanding_increments(actions in prop::collection::vec(action(), 0..300)) {
            let cells = Panel::Simplified.cell_types();
            let mut ledger = CountLedger::new(Panel::Simplified);
            let mut outstanding: Vec<CellType> = Vec::new();

            for action in actions {
                match action {
                    Action::Increment(i) => {
                        ledger.increment(cells[i]).unwrap();
                        outstanding.push(cells[i]);
                    }
                    Action::Undo => {
                        let expected = match outstanding.pop() {
                            Some(cell) => UndoOutcome::Undone(cell),
                            None => UndoOutcome::NothingToUndo,
                        };
                        prop_assert_eq!(ledger.undo(), expected);
                    }
                }
                prop_assert_eq!(ledger.total() as usize, outstanding.len());
                prop_assert_eq!(ledger.history_len(), outstanding.len());
                for &cell in cells {
                    let expected = outstanding.iter().filter(|&&c| c == cell).count();
                    prop_assert_eq!(ledger.count(cell) as usize, expected);
                }
            }
        }
    }
}

//! Cell types and counting panels.
//!
//! A [`Panel`] fixes which [`CellType`]s are counted in one workflow. The white cell
//! differential counts eight types; the simplified panel, used for the quick
//! paediatric-style count, folds segmented and band forms into "Neutrophils" and
//! drops lymphocytes and plasma cells.

use crate::error::{CountError, CountResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A white blood cell category that can be counted.
///
/// Declaration order is the canonical order used for export columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Neutrophils,
    SegmentedNeutrophils,
    BandNeutrophils,
    Eosinophils,
    Basophils,
    Monocytes,
    Lymphocytes,
    PlasmaCells,
    Precursors,
}

impl CellType {
    pub const ALL: [CellType; 9] = [
        CellType::Neutrophils,
        CellType::SegmentedNeutrophils,
        CellType::BandNeutrophils,
        CellType::Eosinophils,
        CellType::Basophils,
        CellType::Monocytes,
        CellType::Lymphocytes,
        CellType::PlasmaCells,
        CellType::Precursors,
    ];

    /// Stable machine name, as used in persisted records and the HTTP API.
    pub fn name(self) -> &'static str {
        match self {
            CellType::Neutrophils => "neutrophils",
            CellType::SegmentedNeutrophils => "segmented_neutrophils",
            CellType::BandNeutrophils => "band_neutrophils",
            CellType::Eosinophils => "eosinophils",
            CellType::Basophils => "basophils",
            CellType::Monocytes => "monocytes",
            CellType::Lymphocytes => "lymphocytes",
            CellType::PlasmaCells => "plasma_cells",
            CellType::Precursors => "precursors",
        }
    }

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            CellType::Neutrophils => "Neutrophils",
            CellType::SegmentedNeutrophils => "Segmented Neutrophils",
            CellType::BandNeutrophils => "Band Neutrophils",
            CellType::Eosinophils => "Eosinophils",
            CellType::Basophils => "Basophils",
            CellType::Monocytes => "Monocytes",
            CellType::Lymphocytes => "Lymphocytes",
            CellType::PlasmaCells => "Plasma Cells",
            CellType::Precursors => "Precursors",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CellType {
    type Err = CountError;

    /// Accepts either the machine name or the label, case-insensitively.
    fn from_str(s: &str) -> CountResult<Self> {
        let wanted = s.trim();
        CellType::ALL
            .into_iter()
            .find(|cell| {
                cell.name().eq_ignore_ascii_case(wanted) || cell.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CountError::UnknownCellType(wanted.to_string()))
    }
}

/// The set of cell types counted in one workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[default]
    WhiteDifferential,
    Simplified,
}

const WHITE_DIFFERENTIAL: &[CellType] = &[
    CellType::SegmentedNeutrophils,
    CellType::BandNeutrophils,
    CellType::Eosinophils,
    CellType::Basophils,
    CellType::Monocytes,
    CellType::Lymphocytes,
    CellType::PlasmaCells,
    CellType::Precursors,
];

const SIMPLIFIED: &[CellType] = &[
    CellType::Neutrophils,
    CellType::Basophils,
    CellType::Eosinophils,
    CellType::Monocytes,
    CellType::Precursors,
];

impl Panel {
    pub const ALL: [Panel; 2] = [Panel::WhiteDifferential, Panel::Simplified];

    /// Cell types of this panel, in display order.
    pub fn cell_types(self) -> &'static [CellType] {
        match self {
            Panel::WhiteDifferential => WHITE_DIFFERENTIAL,
            Panel::Simplified => SIMPLIFIED,
        }
    }

    pub fn contains(self, cell: CellType) -> bool {
        self.cell_types().contains(&cell)
    }

    pub fn name(self) -> &'static str {
        match self {
            Panel::WhiteDifferential => "white_differential",
            Panel::Simplified => "simplified",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Panel {
    type Err = CountError;

    fn from_str(s: &str) -> CountResult<Self> {
        let wanted = s.trim();
        Panel::ALL
            .into_iter()
            .find(|panel| panel.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CountError::UnknownPanel(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_differential_has_eight_types() {
        assert_eq!(Panel::WhiteDifferential.cell_types().len(), 8);
        assert!(!Panel::WhiteDifferential.contains(CellType::Neutrophils));
        assert!(Panel::WhiteDifferential.contains(CellType::PlasmaCells));
    }

    #[test]
    fn simplified_panel_folds_neutrophils() {
        let cells = Panel::Simplified.cell_types();
        assert_eq!(cells.len(), 5);
        assert!(cells.contains(&CellType::Neutrophils));
        assert!(!cells.contains(&CellType::Lymphocytes));
    }

    #[test]
    fn cell_type_parses_name_and_label() {
        assert_eq!(
            "segmented_neutrophils".parse::<CellType>().unwrap(),
            CellType::SegmentedNeutrophils
        );
        assert_eq!(
            "Plasma Cells".parse::<CellType>().unwrap(),
            CellType::PlasmaCells
        );
        assert_eq!(" eosinophils ".parse::<CellType>().unwrap(), CellType::Eosinophils);
        assert!(matches!(
            "erythrocytes".parse::<CellType>(),
            Err(CountError::UnknownCellType(_))
        ));
    }

    #[test]
    fn serde_uses_machine_names() {
        let json = serde_json::to_string(&CellType::BandNeutrophils).unwrap();
        assert_eq!(json, "\"band_neutrophils\"");
        for cell in CellType::ALL {
            let json = serde_json::to_string(&cell).unwrap();
            assert_eq!(json, format!("\"{}\"", cell.name()));
        }
    }

    #[test]
    fn panel_parses_names() {
        assert_eq!("simplified".parse::<Panel>().unwrap(), Panel::Simplified);
        assert_eq!(
            "WHITE_DIFFERENTIAL".parse::<Panel>().unwrap(),
            Panel::WhiteDifferential
        );
        assert!("red".parse::<Panel>().is_err());
    }
}

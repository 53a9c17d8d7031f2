//! Age- and gender-stratified reference bands.
//!
//! [`reference_bands`] is a total function: every cell type of the requested panel
//! gets a band, whether or not age and gender are known.

use crate::cell::{CellType, Panel};
use crate::patient::Gender;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normal percentage range of one cell type. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBand {
    pub low: f64,
    pub high: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Low,
    Normal,
    High,
}

impl ReferenceBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn classify(&self, percent: f64) -> Status {
        if percent < self.low {
            Status::Low
        } else if percent > self.high {
            Status::High
        } else {
            Status::Normal
        }
    }
}

impl std::fmt::Display for ReferenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}%", self.low, self.high)
    }
}

/// Age tier of the reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeBracket {
    Unspecified,
    Infant,
    Toddler,
    Child,
    Adolescent,
    Adult,
}

/// Upper bounds (exclusive) of the paediatric tiers, in ascending order.
const BRACKET_BOUNDS: [(u32, AgeBracket); 4] = [
    (1, AgeBracket::Infant),
    (5, AgeBracket::Toddler),
    (12, AgeBracket::Child),
    (18, AgeBracket::Adolescent),
];

impl AgeBracket {
    pub fn for_age(age: Option<u32>) -> Self {
        let Some(age) = age else {
            return AgeBracket::Unspecified;
        };
        BRACKET_BOUNDS
            .iter()
            .find(|(upper, _)| age < *upper)
            .map(|(_, bracket)| *bracket)
            .unwrap_or(AgeBracket::Adult)
    }
}

/// Bands shared by both panels, keyed by the "neutrophil" slot.
struct BaseBands {
    neutrophils: ReferenceBand,
    basophils: ReferenceBand,
    eosinophils: ReferenceBand,
    monocytes: ReferenceBand,
    precursors: ReferenceBand,
}

const fn base(
    neutrophils: (f64, f64),
    eosinophils: (f64, f64),
    monocytes: (f64, f64),
) -> BaseBands {
    BaseBands {
        neutrophils: ReferenceBand::new(neutrophils.0, neutrophils.1),
        basophils: ReferenceBand::new(0.0, 1.0),
        eosinophils: ReferenceBand::new(eosinophils.0, eosinophils.1),
        monocytes: ReferenceBand::new(monocytes.0, monocytes.1),
        precursors: ReferenceBand::new(0.0, 1.0),
    }
}

fn base_bands(bracket: AgeBracket, gender: Gender) -> BaseBands {
    match (bracket, gender) {
        (AgeBracket::Unspecified, _) => base((40.0, 75.0), (1.0, 6.0), (2.0, 10.0)),
        (AgeBracket::Infant, _) => base((50.0, 80.0), (1.0, 4.0), (4.0, 10.0)),
        (AgeBracket::Toddler, _) => base((30.0, 60.0), (1.0, 5.0), (2.0, 10.0)),
        (AgeBracket::Child, _) => base((35.0, 60.0), (1.0, 5.0), (2.0, 10.0)),
        (AgeBracket::Adolescent, _) => base((40.0, 65.0), (1.0, 5.0), (2.0, 10.0)),
        (AgeBracket::Adult, Gender::Female) => base((42.0, 77.0), (1.0, 6.0), (2.0, 10.0)),
        (AgeBracket::Adult, Gender::Male | Gender::Unspecified) => {
            base((40.0, 75.0), (1.0, 6.0), (2.0, 10.0))
        }
    }
}

const BAND_NEUTROPHILS: ReferenceBand = ReferenceBand::new(3.0, 6.0);
const LYMPHOCYTES: ReferenceBand = ReferenceBand::new(15.0, 45.0);
const PLASMA_CELLS: ReferenceBand = ReferenceBand::new(0.0, 2.0);

/// Reference band for every cell type of `panel`.
pub fn reference_bands(
    age: Option<u32>,
    gender: Gender,
    panel: Panel,
) -> BTreeMap<CellType, ReferenceBand> {
    let bands = base_bands(AgeBracket::for_age(age), gender);
    panel
        .cell_types()
        .iter()
        .map(|&cell| {
            let band = match cell {
                CellType::Neutrophils | CellType::SegmentedNeutrophils => bands.neutrophils,
                CellType::Basophils => bands.basophils,
                CellType::Eosinophils => bands.eosinophils,
                CellType::Monocytes => bands.monocytes,
                CellType::Precursors => bands.precursors,
                CellType::BandNeutrophils => BAND_NEUTROPHILS,
                CellType::Lymphocytes => LYMPHOCYTES,
                CellType::PlasmaCells => PLASMA_CELLS,
            };
            (cell, band)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_panel_type_has_a_band() {
        for panel in Panel::ALL {
            for age in [None, Some(0), Some(3), Some(11), Some(17), Some(18), Some(90)] {
                for gender in [Gender::Unspecified, Gender::Male, Gender::Female] {
                    let bands = reference_bands(age, gender, panel);
                    assert_eq!(bands.len(), panel.cell_types().len());
                }
            }
        }
    }

    #[test]
    fn test_age_brackets_are_half_open() {
        assert_eq!(AgeBracket::for_age(None), AgeBracket::Unspecified);
        assert_eq!(AgeBracket::for_age(Some(0)), AgeBracket::Infant);
        assert_eq!(AgeBracket::for_age(Some(1)), AgeBracket::Toddler);
        assert_eq!(AgeBracket::for_age(Some(4)), AgeBracket::Toddler);
        assert_eq!(AgeBracket::for_age(Some(5)), AgeBracket::Child);
        assert_eq!(AgeBracket::for_age(Some(12)), AgeBracket::Adolescent);
        assert_eq!(AgeBracket::for_age(Some(17)), AgeBracket::Adolescent);
        assert_eq!(AgeBracket::for_age(Some(18)), AgeBracket::Adult);
    }

    #[test]
    fn test_gender_only_matters_for_adults() {
        let teen_f = reference_bands(Some(15), Gender::Female, Panel::Simplified);
        let teen_m = reference_bands(Some(15), Gender::Male, Panel::Simplified);
        assert_eq!(teen_f, teen_m);

        let adult_f = reference_bands(Some(40), Gender::Female, Panel::Simplified);
        let adult_u = reference_bands(Some(40), Gender::Unspecified, Panel::Simplified);
        assert_eq!(adult_f[&CellType::Neutrophils], ReferenceBand::new(42.0, 77.0));
        assert_eq!(adult_u[&CellType::Neutrophils], ReferenceBand::new(40.0, 75.0));
    }

    #[test]
    fn test_infant_values() {
        let bands = reference_bands(Some(0), Gender::Unspecified, Panel::Simplified);
        assert_eq!(bands[&CellType::Neutrophils], ReferenceBand::new(50.0, 80.0));
        assert_eq!(bands[&CellType::Eosinophils], ReferenceBand::new(1.0, 4.0));
        assert_eq!(bands[&CellType::Monocytes], ReferenceBand::new(4.0, 10.0));
        assert_eq!(bands[&CellType::Basophils], ReferenceBand::new(0.0, 1.0));
    }

    #[test]
    fn test_white_differential_fixed_bands() {
        let bands = reference_bands(Some(30), Gender::Male, Panel::WhiteDifferential);
        assert_eq!(
            bands[&CellType::SegmentedNeutrophils],
            ReferenceBand::new(40.0, 75.0)
        );
        assert_eq!(bands[&CellType::BandNeutrophils], ReferenceBand::new(3.0, 6.0));
        assert_eq!(bands[&CellType::Lymphocytes], ReferenceBand::new(15.0, 45.0));
        assert_eq!(bands[&CellType::PlasmaCells], ReferenceBand::new(0.0, 2.0));
        assert!(!bands.contains_key(&CellType::Neutrophils));
    }

    #[test]
    fn test_classify_bounds_are_inclusive() {
        let band = ReferenceBand::new(1.0, 5.0);
        assert_eq!(band.classify(0.9), Status::Low);
        assert_eq!(band.classify(1.0), Status::Normal);
        assert_eq!(band.classify(5.0), Status::Normal);
        assert_eq!(band.classify(5.1), Status::High);
    }
}

//! Red cell morphology grading.
//!
//! Nineteen fixed features in four categories, each graded on a four-step scale.

use crate::error::{CountError, CountResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::None,
        Severity::Mild,
        Severity::Moderate,
        Severity::Severe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = CountError;

    fn from_str(s: &str) -> CountResult<Self> {
        let wanted = s.trim();
        Severity::ALL
            .into_iter()
            .find(|sev| sev.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CountError::UnknownSeverity(wanted.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyCategory {
    SizeShape,
    Color,
    InclusionBodies,
    Behavior,
}

impl MorphologyCategory {
    pub fn label(self) -> &'static str {
        match self {
            MorphologyCategory::SizeShape => "Size and shape",
            MorphologyCategory::Color => "Color",
            MorphologyCategory::InclusionBodies => "Inclusion bodies",
            MorphologyCategory::Behavior => "Behavior",
        }
    }
}

/// Declaration order is the fixed display and export order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyFeature {
    Microcytic,
    Macrocytic,
    Anisocytosis,
    Poikilocytosis,
    TargetCells,
    Fragmentocytes,
    SickleCells,
    Spherocytes,
    Elliptocytes,
    Stomatocytes,
    Hypochromic,
    Hyperchromic,
    Polychromasia,
    BasophilicStippling,
    HowellJollyBodies,
    PappenheimerBodies,
    HeinzBodies,
    Agglutination,
    Erythroblasts,
}

impl MorphologyFeature {
    pub const ALL: [MorphologyFeature; 19] = [
        MorphologyFeature::Microcytic,
        MorphologyFeature::Macrocytic,
        MorphologyFeature::Anisocytosis,
        MorphologyFeature::Poikilocytosis,
        MorphologyFeature::TargetCells,
        MorphologyFeature::Fragmentocytes,
        MorphologyFeature::SickleCells,
        MorphologyFeature::Spherocytes,
        MorphologyFeature::Elliptocytes,
        MorphologyFeature::Stomatocytes,
        MorphologyFeature::Hypochromic,
        MorphologyFeature::Hyperchromic,
        MorphologyFeature::Polychromasia,
        MorphologyFeature::BasophilicStippling,
        MorphologyFeature::HowellJollyBodies,
        MorphologyFeature::PappenheimerBodies,
        MorphologyFeature::HeinzBodies,
        MorphologyFeature::Agglutination,
        MorphologyFeature::Erythroblasts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MorphologyFeature::Microcytic => "microcytic",
            MorphologyFeature::Macrocytic => "macrocytic",
            MorphologyFeature::Anisocytosis => "anisocytosis",
            MorphologyFeature::Poikilocytosis => "poikilocytosis",
            MorphologyFeature::TargetCells => "target_cells",
            MorphologyFeature::Fragmentocytes => "fragmentocytes",
            MorphologyFeature::SickleCells => "sickle_cells",
            MorphologyFeature::Spherocytes => "spherocytes",
            MorphologyFeature::Elliptocytes => "elliptocytes",
            MorphologyFeature::Stomatocytes => "stomatocytes",
            MorphologyFeature::Hypochromic => "hypochromic",
            MorphologyFeature::Hyperchromic => "hyperchromic",
            MorphologyFeature::Polychromasia => "polychromasia",
            MorphologyFeature::BasophilicStippling => "basophilic_stippling",
            MorphologyFeature::HowellJollyBodies => "howell_jolly_bodies",
            MorphologyFeature::PappenheimerBodies => "pappenheimer_bodies",
            MorphologyFeature::HeinzBodies => "heinz_bodies",
            MorphologyFeature::Agglutination => "agglutination",
            MorphologyFeature::Erythroblasts => "erythroblasts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MorphologyFeature::Microcytic => "Microcytic",
            MorphologyFeature::Macrocytic => "Macrocytic",
            MorphologyFeature::Anisocytosis => "Anisocytosis",
            MorphologyFeature::Poikilocytosis => "Poikilocytosis",
            MorphologyFeature::TargetCells => "Target cells",
            MorphologyFeature::Fragmentocytes => "Fragmentocytes",
            MorphologyFeature::SickleCells => "Sickle cells",
            MorphologyFeature::Spherocytes => "Spherocytes",
            MorphologyFeature::Elliptocytes => "Elliptocytes",
            MorphologyFeature::Stomatocytes => "Stomatocytes",
            MorphologyFeature::Hypochromic => "Hypochromic",
            MorphologyFeature::Hyperchromic => "Hyperchromic",
            MorphologyFeature::Polychromasia => "Polychromasia",
            MorphologyFeature::BasophilicStippling => "Basophilic stippling",
            MorphologyFeature::HowellJollyBodies => "Howell-Jolly bodies",
            MorphologyFeature::PappenheimerBodies => "Pappenheimer bodies",
            MorphologyFeature::HeinzBodies => "Heinz bodies",
            MorphologyFeature::Agglutination => "Agglutination",
            MorphologyFeature::Erythroblasts => "Erythroblasts",
        }
    }

    pub fn category(self) -> MorphologyCategory {
        use MorphologyFeature::*;
        match self {
            Microcytic | Macrocytic | Anisocytosis | Poikilocytosis | TargetCells
            | Fragmentocytes | SickleCells | Spherocytes | Elliptocytes | Stomatocytes => {
                MorphologyCategory::SizeShape
            }
            Hypochromic | Hyperchromic | Polychromasia => MorphologyCategory::Color,
            BasophilicStippling | HowellJollyBodies | PappenheimerBodies | HeinzBodies => {
                MorphologyCategory::InclusionBodies
            }
            Agglutination | Erythroblasts => MorphologyCategory::Behavior,
        }
    }
}

impl fmt::Display for MorphologyFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MorphologyFeature {
    type Err = CountError;

    /// Accepts either the machine name or the label, case-insensitively.
    fn from_str(s: &str) -> CountResult<Self> {
        let wanted = s.trim();
        MorphologyFeature::ALL
            .into_iter()
            .find(|feature| {
                feature.name().eq_ignore_ascii_case(wanted)
                    || feature.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CountError::UnknownFeature(wanted.to_string()))
    }
}

/// A grade for every morphology feature. Ungraded features are `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<MorphologyFeature, Severity>", into = "BTreeMap<MorphologyFeature, Severity>")]
pub struct MorphologyAssessment {
    grades: BTreeMap<MorphologyFeature, Severity>,
}

impl Default for MorphologyAssessment {
    fn default() -> Self {
        Self {
            grades: MorphologyFeature::ALL
                .into_iter()
                .map(|feature| (feature, Severity::None))
                .collect(),
        }
    }
}

impl From<BTreeMap<MorphologyFeature, Severity>> for MorphologyAssessment {
    /// Missing features are filled in as `None`.
    fn from(partial: BTreeMap<MorphologyFeature, Severity>) -> Self {
        let mut assessment = Self::default();
        assessment.grades.extend(partial);
        assessment
    }
}

impl From<MorphologyAssessment> for BTreeMap<MorphologyFeature, Severity> {
    fn from(assessment: MorphologyAssessment) -> Self {
        assessment.grades
    }
}

impl MorphologyAssessment {
    pub fn set(&mut self, feature: MorphologyFeature, severity: Severity) {
        self.grades.insert(feature, severity);
    }

    pub fn get(&self, feature: MorphologyFeature) -> Severity {
        self.grades.get(&feature).copied().unwrap_or_default()
    }

    /// All features with their grade, in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (MorphologyFeature, Severity)> + '_ {
        self.grades.iter().map(|(&f, &s)| (f, s))
    }

    /// Features graded above `None`, in fixed order.
    pub fn abnormal_findings(&self) -> Vec<(MorphologyFeature, Severity)> {
        self.iter()
            .filter(|(_, severity)| *severity != Severity::None)
            .collect()
    }
}

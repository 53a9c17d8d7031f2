//! Visit records and their persisted JSON form.
//!
//! [`VisitRecord`] is the typed, immutable snapshot used everywhere in the code base.
//! [`StoredRecord`] is the loosely typed shape written to disk; conversion happens
//! only at the store edge.

use crate::cell::{CellType, Panel};
use crate::constants::UNSPECIFIED_AGE;
use crate::error::{CountError, CountResult};
use crate::ledger::{percent_of, CountLedger};
use crate::morphology::{MorphologyAssessment, MorphologyFeature, Severity};
use crate::patient::{format_birth_date, parse_birth_date, Gender, PatientMeta};
use crate::reference::reference_bands;
use crate::summary::{summarise_counts, SummaryRow};
use cellcount_types::NonEmptyText;
use cellcount_uuid::TimestampId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique, time-ordered identifier of a saved visit record.
pub type RecordId = TimestampId;

/// One saved snapshot of a counting session.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitRecord {
    id: RecordId,
    panel: Panel,
    patient: PatientMeta,
    age: Option<u32>,
    counts: BTreeMap<CellType, u32>,
    morphology: MorphologyAssessment,
    comment: String,
}

/// Assemble a record from the current session state.
///
/// The record is stamped with `now` (bumped past `previous_id` if needed) and the age
/// is computed on `now`'s date.
pub fn build_record(
    meta: &PatientMeta,
    ledger: &CountLedger,
    morphology: &MorphologyAssessment,
    comment: &str,
    now: DateTime<Utc>,
    previous_id: Option<&RecordId>,
) -> VisitRecord {
    VisitRecord {
        id: RecordId::generate_at(now, previous_id),
        panel: ledger.panel(),
        patient: meta.clone(),
        age: meta.age_on(now.date_naive()),
        counts: ledger.snapshot(),
        morphology: morphology.clone(),
        comment: comment.trim().to_string(),
    }
}

impl VisitRecord {
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.id.timestamp()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn patient(&self) -> &PatientMeta {
        &self.patient
    }

    /// Age at save time.
    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn counts(&self) -> &BTreeMap<CellType, u32> {
        &self.counts
    }

    pub fn count(&self, cell: CellType) -> u32 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn percent(&self, cell: CellType) -> f64 {
        percent_of(self.count(cell), self.total())
    }

    pub fn morphology(&self) -> &MorphologyAssessment {
        &self.morphology
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Results table against the bands that applied at save time.
    pub fn summary(&self) -> Vec<SummaryRow> {
        let bands = reference_bands(self.age, self.patient.gender, self.panel);
        summarise_counts(self.panel, &self.counts, &bands)
    }
}

/// `age` is either whole years or the literal `"unspecified"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredAge {
    Years(u32),
    Text(String),
}

/// On-disk shape of a visit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub timestamp: String,
    pub panel: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birth_date: String,
    pub age: StoredAge,
    pub counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub morphology_results: BTreeMap<String, String>,
    #[serde(default)]
    pub comment: String,
}

impl From<&VisitRecord> for StoredRecord {
    fn from(record: &VisitRecord) -> Self {
        let gender = match record.patient.gender {
            Gender::Unspecified => String::new(),
            other => other.name().to_string(),
        };

        Self {
            id: record.id.to_string(),
            timestamp: record.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
            panel: record.panel.name().to_string(),
            patient_id: record.patient.patient_id_str().to_string(),
            gender,
            birth_date: record
                .patient
                .birth_date
                .map(format_birth_date)
                .unwrap_or_default(),
            age: match record.age {
                Some(years) => StoredAge::Years(years),
                None => StoredAge::Text(UNSPECIFIED_AGE.to_string()),
            },
            counts: record
                .counts
                .iter()
                .map(|(cell, count)| (cell.name().to_string(), *count))
                .collect(),
            morphology_results: record
                .morphology
                .iter()
                .map(|(feature, severity)| {
                    (feature.name().to_string(), severity.name().to_string())
                })
                .collect(),
            comment: record.comment.clone(),
        }
    }
}

impl TryFrom<StoredRecord> for VisitRecord {
    type Error = CountError;

    fn try_from(stored: StoredRecord) -> CountResult<Self> {
        let malformed = |reason: String| CountError::MalformedRecord {
            id: stored.id.clone(),
            reason,
        };

        let id: RecordId = stored.id.parse()?;
        let panel: Panel = stored
            .panel
            .parse()
            .map_err(|e: CountError| malformed(e.to_string()))?;
        let gender: Gender = stored
            .gender
            .parse()
            .map_err(|e: CountError| malformed(e.to_string()))?;
        let birth_date =
            parse_birth_date(&stored.birth_date).map_err(|e| malformed(e.to_string()))?;

        let age = match &stored.age {
            StoredAge::Years(years) => Some(*years),
            StoredAge::Text(text) if text == UNSPECIFIED_AGE || text.is_empty() => None,
            StoredAge::Text(text) => return Err(malformed(format!("invalid age '{text}'"))),
        };

        let mut counts: BTreeMap<CellType, u32> =
            panel.cell_types().iter().map(|&cell| (cell, 0)).collect();
        for (name, count) in &stored.counts {
            let cell: CellType = name.parse().map_err(|e: CountError| malformed(e.to_string()))?;
            if !panel.contains(cell) {
                return Err(malformed(format!(
                    "cell type '{name}' is not part of the {panel} panel"
                )));
            }
            counts.insert(cell, *count);
        }

        let mut morphology = MorphologyAssessment::default();
        for (name, severity) in &stored.morphology_results {
            let feature: MorphologyFeature =
                name.parse().map_err(|e: CountError| malformed(e.to_string()))?;
            let severity: Severity = severity
                .parse()
                .map_err(|e: CountError| malformed(e.to_string()))?;
            morphology.set(feature, severity);
        }

        Ok(Self {
            id,
            panel,
            patient: PatientMeta {
                patient_id: NonEmptyText::optional(&stored.patient_id),
                gender,
                birth_date,
            },
            age,
            counts,
            morphology,
            comment: stored.comment,
        })
    }
}

impl Serialize for VisitRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        StoredRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VisitRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let stored = StoredRecord::deserialize(deserializer)?;
        VisitRecord::try_from(stored).map_err(serde::de::Error::custom)
    }
}

//! JSON request and response bodies.
//!
//! Cell types, panels, genders, features and severities travel as their machine
//! names (`"band_neutrophils"`, `"simplified"`, `"female"`, `"target_cells"`,
//! `"moderate"`); responses add human labels where a front-end would display them.

use cellcount_core::{
    CellType, CountingSession, MorphologyAssessment, PatientMeta, ReferenceBand,
    SessionSummary, SummaryRow, UndoOutcome, VisitRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Auth

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegisterRes {
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub username: String,
    /// RFC 3339 expiry time.
    pub expires_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogoutRes {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Reference bands

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReferenceBandsQuery {
    /// Age in whole years; omitted means unspecified.
    pub age: Option<u32>,
    /// `male`, `female` or `unspecified`.
    pub gender: Option<String>,
    /// `white_differential` or `simplified`.
    pub panel: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BandDto {
    pub cell_type: String,
    pub label: String,
    pub low: f64,
    pub high: f64,
}

impl BandDto {
    pub fn new(cell: CellType, band: ReferenceBand) -> Self {
        Self {
            cell_type: cell.name().to_string(),
            label: cell.label().to_string(),
            low: band.low,
            high: band.high,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceBandsRes {
    pub panel: String,
    pub age: Option<u32>,
    pub gender: String,
    pub bands: Vec<BandDto>,
}

// ---------------------------------------------------------------------------
// Session

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CountDto {
    pub cell_type: String,
    pub label: String,
    pub count: u32,
    pub percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientDto {
    pub patient_id: String,
    pub gender: String,
    /// `DD.MM.YYYY` or empty.
    pub birth_date: String,
}

impl From<&PatientMeta> for PatientDto {
    fn from(meta: &PatientMeta) -> Self {
        Self {
            patient_id: meta.patient_id_str().to_string(),
            gender: meta.gender.name().to_string(),
            birth_date: meta
                .birth_date
                .map(cellcount_core::patient::format_birth_date)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionRes {
    pub panel: String,
    pub counts: Vec<CountDto>,
    pub total: u32,
    pub history_len: usize,
    pub patient: PatientDto,
    pub comment: String,
}

impl From<&CountingSession> for SessionRes {
    fn from(session: &CountingSession) -> Self {
        let ledger = session.ledger();
        Self {
            panel: session.panel().name().to_string(),
            counts: session
                .panel()
                .cell_types()
                .iter()
                .map(|&cell| CountDto {
                    cell_type: cell.name().to_string(),
                    label: cell.label().to_string(),
                    count: ledger.count(cell),
                    percent: ledger.percent(cell),
                })
                .collect(),
            total: ledger.total(),
            history_len: ledger.history_len(),
            patient: PatientDto::from(session.patient()),
            comment: session.comment().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StartPanelReq {
    pub panel: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IncrementReq {
    pub cell_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IncrementRes {
    pub cell_type: String,
    pub count: u32,
    pub total: u32,
    /// Set when this increment reached 100 or 200 cells.
    pub milestone: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UndoRes {
    /// `undone`, `counter_already_zero` or `nothing_to_undo`.
    pub outcome: String,
    pub cell_type: Option<String>,
    pub total: u32,
}

impl UndoRes {
    pub fn new(outcome: UndoOutcome, total: u32) -> Self {
        let (outcome, cell) = match outcome {
            UndoOutcome::Undone(cell) => ("undone", Some(cell)),
            UndoOutcome::CounterAlreadyZero(cell) => ("counter_already_zero", Some(cell)),
            UndoOutcome::NothingToUndo => ("nothing_to_undo", None),
        };
        Self {
            outcome: outcome.to_string(),
            cell_type: cell.map(|c| c.name().to_string()),
            total,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PatientReq {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub gender: String,
    /// `DD.MM.YYYY`; empty when unknown.
    #[serde(default)]
    pub birth_date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MorphologyFeatureDto {
    pub feature: String,
    pub label: String,
    pub category: String,
    pub severity: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MorphologyRes {
    pub features: Vec<MorphologyFeatureDto>,
}

impl From<&MorphologyAssessment> for MorphologyRes {
    fn from(assessment: &MorphologyAssessment) -> Self {
        Self {
            features: assessment
                .iter()
                .map(|(feature, severity)| MorphologyFeatureDto {
                    feature: feature.name().to_string(),
                    label: feature.label().to_string(),
                    category: feature.category().label().to_string(),
                    severity: severity.name().to_string(),
                })
                .collect(),
        }
    }
}

/// Severities to set, keyed by feature name. Features not listed keep their grade.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MorphologyReq {
    pub grades: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CommentReq {
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRowDto {
    pub cell_type: String,
    pub label: String,
    pub count: u32,
    pub percent: f64,
    pub low: f64,
    pub high: f64,
    /// `low`, `normal` or `high`.
    pub status: String,
}

impl From<&SummaryRow> for SummaryRowDto {
    fn from(row: &SummaryRow) -> Self {
        let status = match row.status {
            cellcount_core::Status::Low => "low",
            cellcount_core::Status::Normal => "normal",
            cellcount_core::Status::High => "high",
        };
        Self {
            cell_type: row.cell_type.name().to_string(),
            label: row.cell_type.label().to_string(),
            count: row.count,
            percent: row.percent,
            low: row.band.low,
            high: row.band.high,
            status: status.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRes {
    pub age: Option<u32>,
    pub total: u32,
    pub rows: Vec<SummaryRowDto>,
}

impl From<&SessionSummary> for SummaryRes {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            age: summary.age,
            total: summary.total,
            rows: summary.rows.iter().map(SummaryRowDto::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Records

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FindingDto {
    pub feature: String,
    pub severity: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordDto {
    pub id: String,
    /// RFC 3339 save time.
    pub timestamp: String,
    pub panel: String,
    pub patient_id: String,
    pub gender: String,
    pub birth_date: String,
    /// Age at save time; absent when the birth date was unknown.
    pub age: Option<u32>,
    pub counts: BTreeMap<String, u32>,
    pub total: u32,
    pub abnormal_findings: Vec<FindingDto>,
    pub comment: String,
}

impl From<&VisitRecord> for RecordDto {
    fn from(record: &VisitRecord) -> Self {
        let patient = PatientDto::from(record.patient());
        Self {
            id: record.id().to_string(),
            timestamp: record.timestamp().to_rfc3339(),
            panel: record.panel().name().to_string(),
            patient_id: patient.patient_id,
            gender: patient.gender,
            birth_date: patient.birth_date,
            age: record.age(),
            counts: record
                .counts()
                .iter()
                .map(|(cell, count)| (cell.name().to_string(), *count))
                .collect(),
            total: record.total(),
            abnormal_findings: record
                .morphology()
                .abnormal_findings()
                .into_iter()
                .map(|(feature, severity)| FindingDto {
                    feature: feature.name().to_string(),
                    severity: severity.name().to_string(),
                })
                .collect(),
            comment: record.comment().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaveRes {
    pub record: RecordDto,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordsQuery {
    /// Exact patient identifier to filter by.
    pub patient_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordsRes {
    /// Newest first.
    pub records: Vec<RecordDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientsRes {
    pub patient_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub deleted: bool,
}

//! Text content of the printable per-record report.
//!
//! [`ReportModel`] holds every string that ends up on the page, so layout (in
//! [`crate::pdf`]) stays separate from wording.

use cellcount_core::patient::format_birth_date;
use cellcount_core::VisitRecord;

pub const REPORT_TITLE: &str = "Cell count results";
const NO_FINDINGS: &str = "No abnormal findings";

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub cell_type: String,
    pub count: String,
    pub percent: String,
    pub reference: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportModel {
    pub title: String,
    pub patient_line: String,
    pub timestamp_line: String,
    pub panel_line: String,
    pub rows: Vec<ReportRow>,
    pub total_line: String,
    /// `Feature: Severity` for each abnormal finding, or a single "none" line.
    pub morphology: Vec<String>,
    pub comment: String,
}

impl ReportModel {
    pub fn from_record(record: &VisitRecord) -> Self {
        let patient = record.patient();
        let patient_id = patient.patient_id.as_ref().map(|p| p.as_str()).unwrap_or("-");
        let birth_date = patient
            .birth_date
            .map(format_birth_date)
            .unwrap_or_else(|| "-".to_string());
        let age = record
            .age()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unspecified".to_string());

        let rows = record
            .summary()
            .into_iter()
            .map(|row| ReportRow {
                cell_type: row.cell_type.label().to_string(),
                count: row.count.to_string(),
                percent: format!("{:.1}%", row.percent),
                reference: row.band.to_string(),
            })
            .collect();

        let findings = record.morphology().abnormal_findings();
        let morphology = if findings.is_empty() {
            vec![NO_FINDINGS.to_string()]
        } else {
            findings
                .into_iter()
                .map(|(feature, severity)| format!("{}: {}", feature.label(), severity.label()))
                .collect()
        };

        Self {
            title: REPORT_TITLE.to_string(),
            patient_line: format!(
                "Patient: {patient_id}   Gender: {}   Birth date: {birth_date}   Age: {age}",
                patient.gender.name()
            ),
            timestamp_line: format!(
                "Time: {}",
                record.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
            ),
            panel_line: format!("Panel: {}", record.panel()),
            rows,
            total_line: format!("Total counted: {}", record.total()),
            morphology,
            comment: if record.comment().is_empty() {
                "-".to_string()
            } else {
                record.comment().to_string()
            },
        }
    }
}

/// `CellReport_<patient id>_<YYYY-MM-DD_HH-MM-SS>.pdf`, with characters outside
/// `[A-Za-z0-9_-]` in the patient id replaced by `_`.
pub fn report_filename(record: &VisitRecord) -> String {
    let patient_id = record.patient().patient_id_str();
    let safe_id: String = if patient_id.is_empty() {
        "unspecified".to_string()
    } else {
        patient_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!(
        "CellReport_{safe_id}_{}.pdf",
        record.timestamp().format("%Y-%m-%d_%H-%M-%S")
    )
}

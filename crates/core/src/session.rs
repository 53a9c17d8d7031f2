//! One user's counting workflow.
//!
//! A [`CountingSession`] owns everything entered between logging in and saving: the
//! active panel and its ledger, patient metadata, morphology grades and the comment.
//! Nothing here is persisted until [`CountingSession::save`] is called, and saving
//! leaves the session untouched so counting can continue.

use crate::cell::{CellType, Panel};
use crate::constants::{MAX_COMMENT_CHARS, MAX_PATIENT_ID_CHARS};
use crate::error::{CountError, CountResult};
use crate::ledger::{CountLedger, Milestone, UndoOutcome};
use crate::morphology::{MorphologyAssessment, MorphologyFeature, Severity};
use crate::patient::{format_birth_date, PatientMeta};
use crate::record::{build_record, VisitRecord};
use crate::reference::reference_bands;
use crate::store::RecordStore;
use crate::summary::{build_summary, SessionSummary};
use cellcount_types::{NonEmptyText, TextError};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Clone, Debug)]
pub struct CountingSession {
    ledger: CountLedger,
    patient: PatientMeta,
    morphology: MorphologyAssessment,
    comment: String,
}

impl CountingSession {
    pub fn new(panel: Panel) -> Self {
        Self {
            ledger: CountLedger::new(panel),
            patient: PatientMeta::default(),
            morphology: MorphologyAssessment::default(),
            comment: String::new(),
        }
    }

    /// Begin a new workflow on `panel`. Counts and history are cleared; patient,
    /// morphology and comment are kept.
    pub fn start_panel(&mut self, panel: Panel) {
        self.ledger = CountLedger::new(panel);
    }

    pub fn panel(&self) -> Panel {
        self.ledger.panel()
    }

    pub fn ledger(&self) -> &CountLedger {
        &self.ledger
    }

    pub fn patient(&self) -> &PatientMeta {
        &self.patient
    }

    pub fn morphology(&self) -> &MorphologyAssessment {
        &self.morphology
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn increment(&mut self, cell: CellType) -> CountResult<Option<Milestone>> {
        self.ledger.increment(cell)
    }

    pub fn undo(&mut self) -> UndoOutcome {
        self.ledger.undo()
    }

    pub fn reset_counts(&mut self) {
        self.ledger.reset();
    }

    pub fn set_patient(&mut self, patient: PatientMeta) {
        self.patient = patient;
    }

    pub fn clear_patient(&mut self) {
        self.patient = PatientMeta::default();
    }

    pub fn set_morphology(&mut self, feature: MorphologyFeature, severity: Severity) {
        self.morphology.set(feature, severity);
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Results table for the current patient, with age taken on `today`.
    pub fn summary(&self, today: NaiveDate) -> SessionSummary {
        let age = self.patient.age_on(today);
        let bands = reference_bands(age, self.patient.gender, self.panel());
        SessionSummary {
            age,
            total: self.ledger.total(),
            rows: build_summary(&self.ledger, &bands),
        }
    }

    /// Reject input that must not end up in a saved record.
    pub fn validate_for_save(&self, today: NaiveDate) -> CountResult<()> {
        if let Some(id) = &self.patient.patient_id {
            NonEmptyText::bounded(id.as_str(), MAX_PATIENT_ID_CHARS).map_err(|e| match e {
                TextError::TooLong { max } => CountError::InvalidInput(format!(
                    "patient id exceeds {max} characters"
                )),
                other => CountError::InvalidInput(other.to_string()),
            })?;
        }

        if self.comment.trim().chars().count() > MAX_COMMENT_CHARS {
            return Err(CountError::InvalidInput(format!(
                "comment exceeds {MAX_COMMENT_CHARS} characters"
            )));
        }

        if let Some(birth) = self.patient.birth_date.filter(|birth| *birth > today) {
            return Err(CountError::BirthDateInFuture(format_birth_date(birth)));
        }

        Ok(())
    }

    /// Validate and persist a snapshot of the session.
    ///
    /// The session itself is never modified, also when the store fails.
    pub fn save(&self, store: &dyn RecordStore, now: DateTime<Utc>) -> CountResult<VisitRecord> {
        self.validate_for_save(now.date_naive())?;
        store.append_new(Box::new(|previous| {
            build_record(
                &self.patient,
                &self.ledger,
                &self.morphology,
                &self.comment,
                now,
                previous,
            )
        }))
    }
}

//! # CellCount Core
//!
//! Core business logic for manual blood cell differential counting.
//!
//! This crate contains pure data operations and file-backed record storage:
//! - Cell types, panels and the age/gender-stratified reference table
//! - The count ledger with single-step undo, and per-user counting sessions
//! - Red cell morphology grading
//! - Visit records and their JSON persistence under the configured data directory
//!
//! **No API concerns**: authentication, HTTP servers and export formats belong in
//! `cellcount-auth`, `api-rest` and `cellcount-export`.

pub mod cell;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod morphology;
pub mod patient;
pub mod record;
pub mod reference;
pub mod session;
pub mod store;
pub mod summary;

pub use cell::{CellType, Panel};
pub use config::CoreConfig;
pub use error::{CountError, CountResult};
pub use ledger::{CountLedger, Milestone, UndoOutcome};
pub use morphology::{MorphologyAssessment, MorphologyCategory, MorphologyFeature, Severity};
pub use patient::{Gender, PatientMeta};
pub use record::{build_record, RecordId, StoredRecord, VisitRecord};
pub use reference::{reference_bands, AgeBracket, ReferenceBand, Status};
pub use session::CountingSession;
pub use store::{FileRecordStore, RecordRepository, RecordStore};
pub use summary::{build_summary, SessionSummary, SummaryRow};

pub use cellcount_types::NonEmptyText;

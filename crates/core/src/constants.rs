//! Constants used throughout the CellCount core crate.
//!
//! Path names, formats and fixed thresholds live here so the store, the session and
//! the export layer agree on them.

/// Directory name (under the data directory) holding per-user record folders.
pub const RECORDS_DIR_NAME: &str = "records";

/// Default data directory when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "cellcount_data";

/// File extension of persisted visit records.
pub const RECORD_FILE_EXTENSION: &str = "json";

/// Birth dates are entered and stored as `DD.MM.YYYY`.
pub const BIRTH_DATE_FORMAT: &str = "%d.%m.%Y";

/// Totals at which the ledger reports a milestone, once each, when crossed upwards.
pub const MILESTONES: [u32; 2] = [100, 200];

/// Maximum length of a patient identifier, in characters.
pub const MAX_PATIENT_ID_CHARS: usize = 64;

/// Maximum length of a free-text comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2_000;

/// Stored `age` value for records without a birth date.
pub const UNSPECIFIED_AGE: &str = "unspecified";

use crate::cell::{CellType, Panel};

#[derive(Debug, thiserror::Error)]
pub enum CountError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cell type '{cell}' is not part of the {panel} panel")]
    CellNotInPanel { cell: CellType, panel: Panel },
    #[error("unknown cell type: '{0}'")]
    UnknownCellType(String),
    #[error("unknown panel: '{0}'")]
    UnknownPanel(String),
    #[error("unknown morphology feature: '{0}'")]
    UnknownFeature(String),
    #[error("unknown severity: '{0}'")]
    UnknownSeverity(String),
    #[error("unknown gender: '{0}'")]
    UnknownGender(String),
    #[error("invalid birth date '{0}': expected DD.MM.YYYY")]
    InvalidBirthDate(String),
    #[error("birth date {0} lies in the future")]
    BirthDateInFuture(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(#[from] cellcount_uuid::UuidError),
    #[error("invalid user directory name: '{0}'")]
    InvalidUserKey(String),
    #[error("record {0} already exists")]
    RecordExists(String),
    #[error("{count} records share timestamp {timestamp}; delete by id instead")]
    AmbiguousTimestamp { timestamp: String, count: usize },
    #[error("stored record {id} is malformed: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

impl CountError {
    /// True for errors caused by the caller's input rather than by storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CountError::InvalidInput(_)
                | CountError::CellNotInPanel { .. }
                | CountError::UnknownCellType(_)
                | CountError::UnknownPanel(_)
                | CountError::UnknownFeature(_)
                | CountError::UnknownSeverity(_)
                | CountError::UnknownGender(_)
                | CountError::InvalidBirthDate(_)
                | CountError::BirthDateInFuture(_)
                | CountError::InvalidRecordId(_)
                | CountError::InvalidUserKey(_)
                | CountError::AmbiguousTimestamp { .. }
        )
    }
}

pub type CountResult<T> = std::result::Result<T, CountError>;

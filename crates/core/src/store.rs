//! Durable storage of visit records.
//!
//! Each record is one JSON file named after its id:
//!
//! ```text
//! <data_dir>/records/<user>/<record-id>.json
//! ```
//!
//! Record ids start with their timestamp, so file-name order is insertion order.

use crate::config::CoreConfig;
use crate::constants::RECORD_FILE_EXTENSION;
use crate::error::{CountError, CountResult};
use crate::record::{RecordId, StoredRecord, VisitRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Builds a record given the id of the newest stored record.
pub type RecordBuilder<'a> = Box<dyn FnOnce(Option<&RecordId>) -> VisitRecord + 'a>;

/// Append-only collection of one user's visit records.
pub trait RecordStore: Send + Sync {
    /// Build a record with [`RecordBuilder`] and append it, both under the append lock,
    /// so ids handed out by this store are strictly increasing.
    fn append_new(&self, build: RecordBuilder<'_>) -> CountResult<VisitRecord>;

    /// Append an already built record. Existing records are never overwritten.
    fn append(&self, record: &VisitRecord) -> CountResult<()>;

    /// Records in insertion order, optionally restricted to one patient identifier.
    fn list(&self, patient_id: Option<&str>) -> CountResult<Vec<VisitRecord>>;

    fn get(&self, id: &RecordId) -> CountResult<Option<VisitRecord>>;

    /// Remove a record. Returns `false` when no such record exists.
    fn delete(&self, id: &RecordId) -> CountResult<bool>;

    /// Remove the single record saved at exactly `timestamp`.
    ///
    /// Fails with [`CountError::AmbiguousTimestamp`] when several records match; nothing
    /// is deleted in that case.
    fn delete_at(&self, timestamp: DateTime<Utc>) -> CountResult<bool>;

    fn latest_id(&self) -> CountResult<Option<RecordId>>;

    /// Distinct non-empty patient identifiers, sorted.
    fn patient_ids(&self) -> CountResult<Vec<String>>;
}

/// Hands out per-user [`FileRecordStore`]s that share one append lock.
#[derive(Clone, Debug)]
pub struct RecordRepository {
    cfg: Arc<CoreConfig>,
    append_lock: Arc<Mutex<()>>,
}

impl RecordRepository {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store for `user`. The name must only contain `[A-Za-z0-9_.-]`.
    pub fn store_for(&self, user: &str) -> CountResult<FileRecordStore> {
        validate_user_key(user)?;
        Ok(FileRecordStore {
            dir: self.cfg.records_dir().join(user),
            append_lock: Arc::clone(&self.append_lock),
        })
    }
}

fn validate_user_key(user: &str) -> CountResult<()> {
    let valid = !user.is_empty()
        && user != "."
        && user != ".."
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(CountError::InvalidUserKey(user.to_string()))
    }
}

/// JSON-file backed [`RecordStore`] for a single user directory.
#[derive(Clone, Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl FileRecordStore {
    /// Store rooted directly at `dir`, with its own append lock.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        self.dir
            .join(format!("{id}.{RECORD_FILE_EXTENSION}"))
    }

    /// Record file paths, sorted by id.
    fn record_files(&self) -> CountResult<Vec<(RecordId, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CountError::FileRead(e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(CountError::FileRead)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<RecordId>() {
                Ok(id) => files.push((id, path)),
                Err(e) => {
                    tracing::warn!("Skipping record file with unexpected name {:?}: {}", path, e);
                }
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn read_record(path: &Path) -> CountResult<VisitRecord> {
        let raw = fs::read_to_string(path).map_err(CountError::FileRead)?;
        let stored: StoredRecord =
            serde_json::from_str(&raw).map_err(CountError::Deserialization)?;
        VisitRecord::try_from(stored)
    }

    fn write_record(&self, record: &VisitRecord) -> CountResult<()> {
        fs::create_dir_all(&self.dir).map_err(CountError::StorageDirCreation)?;

        let path = self.record_path(record.id());
        if path.exists() {
            return Err(CountError::RecordExists(record.id().to_string()));
        }

        let json = serde_json::to_string_pretty(&StoredRecord::from(record))
            .map_err(CountError::Serialization)?;
        let tmp = self
            .dir
            .join(format!(".{}.{RECORD_FILE_EXTENSION}.tmp", record.id()));
        fs::write(&tmp, json).map_err(CountError::FileWrite)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(CountError::FileWrite(e));
        }

        tracing::info!(
            record_id = %record.id(),
            patient_id = record.patient().patient_id_str(),
            "Saved visit record"
        );
        Ok(())
    }

    fn latest_id_unlocked(&self) -> CountResult<Option<RecordId>> {
        Ok(self.record_files()?.pop().map(|(id, _)| id))
    }
}

impl RecordStore for FileRecordStore {
    fn append_new(&self, build: RecordBuilder<'_>) -> CountResult<VisitRecord> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = self.latest_id_unlocked()?;
        let record = build(previous.as_ref());
        self.write_record(&record)?;
        Ok(record)
    }

    fn append(&self, record: &VisitRecord) -> CountResult<()> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.write_record(record)
    }

    fn list(&self, patient_id: Option<&str>) -> CountResult<Vec<VisitRecord>> {
        let wanted = patient_id.map(str::trim);
        let mut records = Vec::new();

        for (_, path) in self.record_files()? {
            match Self::read_record(&path) {
                Ok(record) => {
                    if wanted.is_none_or(|p| record.patient().patient_id_str() == p) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable record {:?}: {}", path, e);
                }
            }
        }

        Ok(records)
    }

    fn get(&self, id: &RecordId) -> CountResult<Option<VisitRecord>> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn delete(&self, id: &RecordId) -> CountResult<bool> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => {
                tracing::info!(record_id = %id, "Deleted visit record");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CountError::FileDelete(e)),
        }
    }

    fn delete_at(&self, timestamp: DateTime<Utc>) -> CountResult<bool> {
        let matches: Vec<RecordId> = self
            .record_files()?
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| id.timestamp() == timestamp)
            .collect();

        match matches.as_slice() {
            [] => Ok(false),
            [id] => self.delete(id),
            _ => Err(CountError::AmbiguousTimestamp {
                timestamp: timestamp.to_rfc3339(),
                count: matches.len(),
            }),
        }
    }

    fn latest_id(&self) -> CountResult<Option<RecordId>> {
        self.latest_id_unlocked()
    }

    fn patient_ids(&self) -> CountResult<Vec<String>> {
        let ids: BTreeSet<String> = self
            .list(None)?
            .into_iter()
            .filter_map(|record| record.patient().patient_id.clone())
            .map(|id| id.into_string())
            .collect();
        Ok(ids.into_iter().collect())
    }
}

//! YAML credentials file.

use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsFile {
    #[serde(default)]
    pub usernames: BTreeMap<String, UserEntry>,
}

/// Reads and atomically rewrites the credentials file.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all users. A missing or empty file holds no users.
    pub fn load(&self) -> AuthResult<CredentialsFile> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CredentialsFile::default()),
            Err(e) => return Err(AuthError::CredentialsRead(e)),
        };
        if raw.trim().is_empty() {
            return Ok(CredentialsFile::default());
        }
        serde_yaml::from_str(&raw).map_err(AuthError::CredentialsParse)
    }

    pub fn save(&self, credentials: &CredentialsFile) -> AuthResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(AuthError::CredentialsWrite)?;
        }

        let yaml = serde_yaml::to_string(credentials).map_err(AuthError::CredentialsSerialize)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, yaml).map_err(AuthError::CredentialsWrite)?;
        fs::rename(&tmp, &self.path).map_err(AuthError::CredentialsWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_has_no_users() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CredentialStore::new(temp_dir.path().join("credentials.yaml"));
        assert!(store.load().unwrap().usernames.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CredentialStore::new(temp_dir.path().join("nested").join("credentials.yaml"));

        let mut file = CredentialsFile::default();
        file.usernames.insert(
            "jdoe".into(),
            UserEntry {
                email: "jdoe@example.org".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                password_hash: "$2b$04$abcdefghijklmnopqrstuu0123456789012345678901234567890".into(),
            },
        );
        store.save(&file).unwrap();

        assert_eq!(store.load().unwrap(), file);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("usernames:"));
    }

    #[test]
    fn test_reads_file_with_empty_usernames_map() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("credentials.yaml");
        fs::write(&path, "usernames: {}\n").unwrap();
        assert!(CredentialStore::new(path).load().unwrap().usernames.is_empty());
    }

    #[test]
    fn test_garbage_file_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("credentials.yaml");
        fs::write(&path, "usernames: [1, 2").unwrap();
        assert!(matches!(
            CredentialStore::new(path).load(),
            Err(AuthError::CredentialsParse(_))
        ));
    }
}

//! Authentication configuration, resolved once at startup.

use crate::password::{DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};
use chrono::Duration;
use std::path::{Path, PathBuf};

/// File name of the credentials file inside the data directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.yaml";

/// Default lifetime of a login session.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    credentials_file: PathBuf,
    session_ttl: Duration,
    hash_cost: u32,
}

impl AuthConfig {
    pub fn new(credentials_file: PathBuf, session_ttl: Duration) -> Self {
        Self {
            credentials_file,
            session_ttl,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    /// bcrypt cost for newly hashed passwords. Existing hashes keep their own.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost.clamp(MIN_HASH_COST, MAX_HASH_COST);
        self
    }

    pub fn credentials_file(&self) -> &Path {
        &self.credentials_file
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn hash_cost(&self) -> u32 {
        self.hash_cost
    }
}

/// Resolve the credentials file path from an optional override value.
pub fn credentials_file_from_env_value(value: Option<String>, data_dir: &Path) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(CREDENTIALS_FILE_NAME))
}

/// Parse the session lifetime in hours. Blank, unparsable or non-positive values use
/// [`DEFAULT_SESSION_TTL_HOURS`].
pub fn session_ttl_from_env_value(value: Option<String>) -> Duration {
    let hours = value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
    Duration::hours(hours)
}

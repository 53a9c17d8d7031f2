use cellcount_auth::{AuthConfig, AuthService};
use cellcount_core::{CoreConfig, CountResult, CountingSession, FileRecordStore, RecordRepository};
use cellcount_uuid::CanonicalUuid;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state, injected into all route handlers via axum state.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub auth: Arc<AuthService>,
    pub records: RecordRepository,
    /// Counting session per login token.
    pub sessions: Arc<Mutex<HashMap<CanonicalUuid, CountingSession>>>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, auth_cfg: Arc<AuthConfig>) -> Self {
        Self {
            records: RecordRepository::new(cfg.clone()),
            auth: Arc::new(AuthService::new(auth_cfg)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            cfg,
        }
    }

    pub fn store_for(&self, username: &str) -> CountResult<FileRecordStore> {
        self.records.store_for(username)
    }

    pub fn new_session(&self) -> CountingSession {
        CountingSession::new(self.cfg.default_panel())
    }

    /// Drop counting sessions whose login token the auth service no longer holds.
    pub async fn prune_sessions(&self) {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|token, _| self.auth.has_session(token));
        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped counting sessions of expired logins");
        }
    }
}

/// Authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub token: CanonicalUuid,
}

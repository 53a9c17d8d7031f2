//! Registration, login and bearer session tokens.

use crate::config::AuthConfig;
use crate::credentials::{CredentialStore, UserEntry};
use crate::error::{AuthError, AuthResult};
use crate::password::{hash_password, validate_password_policy, verify_password};
use cellcount_types::{EmailAddress, NonEmptyText};
use cellcount_uuid::CanonicalUuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;

/// Raw registration form.
#[derive(Clone, Debug, Default)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// A freshly issued bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginToken {
    pub token: CanonicalUuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct LoginSession {
    username: String,
    expires_at: DateTime<Utc>,
}

/// Authentication service, constructed once at startup and shared.
#[derive(Debug)]
pub struct AuthService {
    cfg: Arc<AuthConfig>,
    store: CredentialStore,
    // Serialises read-modify-write of the credentials file.
    write_lock: Mutex<()>,
    sessions: Mutex<HashMap<CanonicalUuid, LoginSession>>,
}

fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    let valid = (USERNAME_MIN..=USERNAME_MAX).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        && username != "."
        && username != "..";
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidUsername)
    }
}

fn required(value: &str, field: &'static str) -> AuthResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| AuthError::MissingField(field))
}

impl AuthService {
    pub fn new(cfg: Arc<AuthConfig>) -> Self {
        let store = CredentialStore::new(cfg.credentials_file());
        Self {
            cfg,
            store,
            write_lock: Mutex::new(()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Validate the form and add the user to the credentials file.
    pub fn register(&self, request: &RegistrationRequest) -> AuthResult<String> {
        let username = required(&request.username, "username")?;
        let email = required(&request.email, "email")?;
        let first_name = required(&request.first_name, "first_name")?;
        let last_name = required(&request.last_name, "last_name")?;
        if request.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        validate_username(username.as_str())?;
        let email = EmailAddress::parse(email.as_str())
            .map_err(|_| AuthError::InvalidEmail(email.to_string()))?;
        validate_password_policy(&request.password)?;

        let password_hash = hash_password(&request.password, self.cfg.hash_cost())?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut credentials = self.store.load()?;
        if credentials.usernames.contains_key(username.as_str()) {
            return Err(AuthError::UserExists(username.to_string()));
        }

        credentials.usernames.insert(
            username.to_string(),
            UserEntry {
                email: email.to_string(),
                first_name: first_name.into_string(),
                last_name: last_name.into_string(),
                password_hash,
            },
        );
        self.store.save(&credentials)?;

        tracing::info!(username = username.as_str(), "Registered user");
        Ok(username.into_string())
    }

    pub fn login(&self, username: &str, password: &str) -> AuthResult<LoginToken> {
        self.login_at(username, password, Utc::now())
    }

    /// Like [`AuthService::login`] with an explicit clock.
    pub fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginToken> {
        let username = username.trim();
        let credentials = self.store.load()?;
        let Some(entry) = credentials.usernames.get(username) else {
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &entry.password_hash)? {
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = CanonicalUuid::new();
        let expires_at = now + self.cfg.session_ttl();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            LoginSession {
                username: username.to_string(),
                expires_at,
            },
        );
        let active_sessions = sessions.len();
        drop(sessions);

        tracing::info!(username, active_sessions, "User logged in");
        Ok(LoginToken {
            token,
            username: username.to_string(),
            expires_at,
        })
    }

    /// Drop a login session. Returns the user it belonged to, if any.
    pub fn logout(&self, token: &CanonicalUuid) -> Option<String> {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .map(|session| session.username);
        if let Some(username) = &removed {
            tracing::info!(username = username.as_str(), "User logged out");
        }
        removed
    }

    /// True while `token` is held, expired or not. Expired tokens are dropped on the next
    /// login or when presented.
    pub fn has_session(&self, token: &CanonicalUuid) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn authenticate(&self, token: &CanonicalUuid) -> AuthResult<String> {
        self.authenticate_at(token, Utc::now())
    }

    /// Resolve a token to its username. Expired tokens are removed.
    pub fn authenticate_at(&self, token: &CanonicalUuid, now: DateTime<Utc>) -> AuthResult<String> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(token) {
            Some(session) if session.expires_at > now => Ok(session.username.clone()),
            Some(_) => {
                sessions.remove(token);
                Err(AuthError::InvalidToken)
            }
            None => Err(AuthError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> AuthService {
        let cfg = AuthConfig::new(
            temp_dir.path().join("credentials.yaml"),
            Duration::hours(1),
        )
        .with_hash_cost(4);
        AuthService::new(Arc::new(cfg))
    }

    fn request(username: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: username.into(),
            email: format!("{username}@example.org"),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            password: "Passw0rd!".into(),
        }
    }

    #[test]
    fn test_register_then_login() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);

        assert_eq!(auth.register(&request("jdoe")).unwrap(), "jdoe");
        let token = auth.login("jdoe", "Passw0rd!").unwrap();
        assert_eq!(auth.authenticate(&token.token).unwrap(), "jdoe");
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.register(&request("jdoe")).unwrap();

        assert!(matches!(
            auth.register(&request("jdoe")),
            Err(AuthError::UserExists(name)) if name == "jdoe"
        ));
    }

    #[test]
    fn test_register_validates_every_field() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);

        let mut missing = request("jdoe");
        missing.last_name = " ".into();
        assert!(matches!(
            auth.register(&missing),
            Err(AuthError::MissingField("last_name"))
        ));

        let mut bad_email = request("jdoe");
        bad_email.email = "jdoe@example".into();
        assert!(matches!(auth.register(&bad_email), Err(AuthError::InvalidEmail(_))));

        let mut weak = request("jdoe");
        weak.password = "password".into();
        assert!(matches!(auth.register(&weak), Err(AuthError::WeakPassword)));

        let long = "x".repeat(33);
        for name in ["jd", "j doe", "../etc", long.as_str()] {
            assert!(matches!(
                auth.register(&request(name)),
                Err(AuthError::InvalidUsername)
            ));
        }

        assert!(CredentialStore::new(temp_dir.path().join("credentials.yaml"))
            .load()
            .unwrap()
            .usernames
            .is_empty());
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.register(&request("jdoe")).unwrap();

        let wrong = auth.login("jdoe", "Passw0rd?").unwrap_err();
        let unknown = auth.login("nobody", "Passw0rd!").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_logout_invalidates_token() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.register(&request("jdoe")).unwrap();
        let token = auth.login("jdoe", "Passw0rd!").unwrap().token;

        assert_eq!(auth.logout(&token).as_deref(), Some("jdoe"));
        assert!(matches!(auth.authenticate(&token), Err(AuthError::InvalidToken)));
        assert_eq!(auth.logout(&token), None);
    }

    #[test]
    fn test_tokens_expire() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.register(&request("jdoe")).unwrap();

        let now = Utc::now();
        let token = auth.login_at("jdoe", "Passw0rd!", now).unwrap().token;
        assert!(auth.authenticate_at(&token, now + Duration::minutes(59)).is_ok());
        assert!(matches!(
            auth.authenticate_at(&token, now + Duration::hours(1)),
            Err(AuthError::InvalidToken)
        ));
        assert!(auth.authenticate_at(&token, now).is_err());
    }

    #[test]
    fn test_login_drops_expired_sessions() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.register(&request("jdoe")).unwrap();

        let start = Utc::now();
        let stale: Vec<_> = (0..20)
            .map(|_| auth.login_at("jdoe", "Passw0rd!", start).unwrap().token)
            .collect();
        assert_eq!(auth.active_sessions(), 20);

        let fresh = auth
            .login_at("jdoe", "Passw0rd!", start + Duration::days(1))
            .unwrap()
            .token;
        assert_eq!(auth.active_sessions(), 1);
        assert!(auth.has_session(&fresh));
        assert!(stale.iter().all(|token| !auth.has_session(token)));
    }
}

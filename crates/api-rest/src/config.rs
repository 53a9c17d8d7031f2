//! Server configuration resolved once at startup.

use cellcount_auth::config::{credentials_file_from_env_value, session_ttl_from_env_value};
use cellcount_auth::AuthConfig;
use cellcount_core::config::{data_dir_from_env_value, default_panel_from_env_value};
use cellcount_core::{CoreConfig, CountResult};
use std::sync::Arc;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Everything the REST server needs from the environment.
///
/// # Environment Variables
/// - `CELLCOUNT_REST_ADDR`: listen address (default `0.0.0.0:3000`)
/// - `CELLCOUNT_DATA_DIR`: root of the records tree (default `cellcount_data`)
/// - `CELLCOUNT_CREDENTIALS_FILE`: user registry (default `<data dir>/credentials.yaml`)
/// - `CELLCOUNT_SESSION_TTL_HOURS`: login lifetime in hours (default 12)
/// - `CELLCOUNT_DEFAULT_PANEL`: `white_differential` or `simplified`
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub core: Arc<CoreConfig>,
    pub auth: Arc<AuthConfig>,
}

impl ServerConfig {
    pub fn from_env() -> CountResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CountResult<Self> {
        let addr = lookup("CELLCOUNT_REST_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REST_ADDR.into());

        let data_dir = data_dir_from_env_value(lookup("CELLCOUNT_DATA_DIR"));
        let default_panel = default_panel_from_env_value(lookup("CELLCOUNT_DEFAULT_PANEL"))?;
        let credentials_file =
            credentials_file_from_env_value(lookup("CELLCOUNT_CREDENTIALS_FILE"), &data_dir);
        let session_ttl = session_ttl_from_env_value(lookup("CELLCOUNT_SESSION_TTL_HOURS"));

        Ok(Self {
            addr,
            core: Arc::new(CoreConfig::new(data_dir, default_panel)),
            auth: Arc::new(AuthConfig::new(credentials_file, session_ttl)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcount_core::Panel;
    use std::collections::HashMap;
    use std::path::Path;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let cfg = ServerConfig::from_lookup(|_| None).expect("defaults should resolve");
        assert_eq!(cfg.addr, DEFAULT_REST_ADDR);
        assert_eq!(cfg.core.data_dir(), Path::new("cellcount_data"));
        assert_eq!(cfg.core.default_panel(), Panel::WhiteDifferential);
        assert_eq!(
            cfg.auth.credentials_file(),
            Path::new("cellcount_data").join("credentials.yaml")
        );
        assert_eq!(cfg.auth.session_ttl(), chrono::Duration::hours(12));
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("CELLCOUNT_REST_ADDR", "127.0.0.1:8080"),
            ("CELLCOUNT_DATA_DIR", "/srv/counts"),
            ("CELLCOUNT_DEFAULT_PANEL", "simplified"),
            ("CELLCOUNT_SESSION_TTL_HOURS", "2"),
        ]))
        .expect("overrides should resolve");

        assert_eq!(cfg.addr, "127.0.0.1:8080");
        assert_eq!(cfg.core.records_dir(), Path::new("/srv/counts/records"));
        assert_eq!(cfg.core.default_panel(), Panel::Simplified);
        assert_eq!(cfg.auth.session_ttl(), chrono::Duration::hours(2));
    }

    #[test]
    fn test_unknown_panel_is_rejected() {
        let result =
            ServerConfig::from_lookup(lookup_from(&[("CELLCOUNT_DEFAULT_PANEL", "red_cells")]));
        assert!(result.is_err());
    }
}

//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. Request handling never reads process-wide environment variables.

use crate::cell::Panel;
use crate::constants::{DEFAULT_DATA_DIR, RECORDS_DIR_NAME};
use crate::error::CountResult;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    default_panel: Panel,
}

impl CoreConfig {
    pub fn new(data_dir: PathBuf, default_panel: Panel) -> Self {
        Self {
            data_dir,
            default_panel,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Root of the per-user record folders.
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join(RECORDS_DIR_NAME)
    }

    /// Panel used for freshly created counting sessions.
    pub fn default_panel(&self) -> Panel {
        self.default_panel
    }
}

/// Resolve the data directory from an optional override value.
///
/// Blank values fall back to [`DEFAULT_DATA_DIR`] relative to the working directory.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the default panel from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`Panel::WhiteDifferential`].
pub fn default_panel_from_env_value(value: Option<String>) -> CountResult<Panel> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<Panel>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CountError;

    #[test]
    fn test_records_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/tmp/cc"), Panel::Simplified);
        assert_eq!(cfg.records_dir(), PathBuf::from("/tmp/cc/records"));
        assert_eq!(cfg.default_panel(), Panel::Simplified);
    }

    #[test]
    fn test_data_dir_defaults_when_blank() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("  ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some("/srv/cells".into())),
            PathBuf::from("/srv/cells")
        );
    }

    #[test]
    fn test_default_panel_from_env_value() {
        assert_eq!(
            default_panel_from_env_value(None).unwrap(),
            Panel::WhiteDifferential
        );
        assert_eq!(
            default_panel_from_env_value(Some(" simplified ".into())).unwrap(),
            Panel::Simplified
        );
        assert!(matches!(
            default_panel_from_env_value(Some("platelets".into())),
            Err(CountError::UnknownPanel(_))
        ));
    }
}

//! Host configuration.
//!
//! Read from `~/.config/scratchpad/config.ron` unless `--config` names
//! another file. Every field is optional:
//!
//! ```ron
//! (
//!     debounce_ms: 1000,
//!     database: Some("/home/me/.local/share/scratchpad/state.db"),
//!     state_key: "scratchpad.state",
//!     legacy_file: Some("/home/me/.scratchpad.txt"),
//!     dialogs: Terminal,
//! )
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scratchpad_engine::EngineConfig;
use scratchpad_store::DEFAULT_STATE_KEY;

/// How close confirmations and title prompts are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DialogMode {
    /// Ask on the controlling terminal.
    #[default]
    Terminal,
    /// Approve every close, cancel every rename prompt.
    Approve,
    /// Reject every close, cancel every rename prompt.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub debounce_ms: u64,
    /// SQLite file. `None` uses [`default_database_path`].
    pub database: Option<PathBuf>,
    pub state_key: String,
    /// Pre-tabs scratchpad text file imported on first run.
    pub legacy_file: Option<PathBuf>,
    pub dialogs: DialogMode,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            database: None,
            state_key: DEFAULT_STATE_KEY.to_string(),
            legacy_file: None,
            dialogs: DialogMode::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// `~/.config/scratchpad/config.ron`.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scratchpad").join("config.ron"))
}

/// `~/.local/share/scratchpad/state.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("scratchpad").join("state.db"))
}

impl HostConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Load from `path`, or from [`config_file_path`] when `None`.
    ///
    /// A missing or broken file yields defaults with a warning; the panel
    /// should still come up.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
            info!("no config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(default_database_path)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_debounce(Duration::from_millis(self.debounce_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(HostConfig::from_ron_str("()").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = HostConfig::from_ron_str(
            r#"(debounce_ms: 250, dialogs: Approve, database: Some("/tmp/pad.db"))"#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.dialogs, DialogMode::Approve);
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/pad.db")));
        assert_eq!(config.state_key, "scratchpad.state");
        assert_eq!(config.engine_config().debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_ron_is_an_error() {
        assert!(matches!(
            HostConfig::from_ron_str("(debounce_ms: \"soon\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_load_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "not ron at all (").unwrap();
        assert_eq!(HostConfig::load(Some(&path)), HostConfig::default());
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(state_key: \"pad.alt\")").unwrap();
        assert_eq!(HostConfig::load(Some(&path)).state_key, "pad.alt");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        assert_eq!(HostConfig::load(Some(&path)), HostConfig::default());
    }
}

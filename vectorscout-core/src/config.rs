//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/vectorscout/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/vectorscout/` (~/.config/vectorscout/)
//! - Data: `$XDG_DATA_HOME/vectorscout/` (~/.local/share/vectorscout/)
//! - State/Logs: `$XDG_STATE_HOME/vectorscout/` (~/.local/state/vectorscout/)

use crate::error::{Error, Result};
use crate::geometry::MirrorMode;
use crate::session::CancelPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable consulted when `schedule.api_key` is not set.
pub const TBA_API_KEY_ENV: &str = "TBA_API_KEY";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Match schedule provider configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Scouting session behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Field diagram geometry
    #[serde(default)]
    pub geometry: GeometryConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The Blue Alliance schedule provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// API base URL
    #[serde(default = "default_schedule_base_url")]
    pub base_url: String,

    /// Read API key (falls back to `TBA_API_KEY`)
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_schedule_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_schedule_max_retries")]
    pub max_retries: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            base_url: default_schedule_base_url(),
            api_key: None,
            timeout_secs: default_schedule_timeout(),
            max_retries: default_schedule_max_retries(),
        }
    }
}

impl ScheduleConfig {
    /// Returns the configured API key, or the one from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(TBA_API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("schedule.base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "schedule.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_schedule_base_url() -> String {
    "https://www.thebluealliance.com/api/v3".to_string()
}

fn default_schedule_timeout() -> u64 {
    10
}

fn default_schedule_max_retries() -> usize {
    2
}

/// Scouting session configuration
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct SessionConfig {
    /// What cancelling an in-progress action does to the tally
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
}

/// Field diagram configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct GeometryConfig {
    /// Whether mirrored coordinates come from the authored tables or are derived
    #[serde(default)]
    pub mirror_mode: MirrorMode,

    /// Directory of custom `*.toml` diagram definitions
    pub diagram_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.schedule.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/vectorscout/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("vectorscout").join("config.toml")
    }

    /// Returns the data directory path (database and schedule cache)
    ///
    /// `$XDG_DATA_HOME/vectorscout/`
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("vectorscout")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/vectorscout/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("vectorscout")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/vectorscout/data.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the cached schedule directory
    ///
    /// `$XDG_DATA_HOME/vectorscout/schedules/`
    pub fn schedule_cache_dir() -> PathBuf {
        Self::data_dir().join("schedules")
    }

    /// Returns the event catalog file
    ///
    /// `$XDG_DATA_HOME/vectorscout/events.json`
    pub fn events_path() -> PathBuf {
        Self::data_dir().join("events.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/vectorscout/vectorscout.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("vectorscout.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.schedule.timeout_secs, 10);
        assert_eq!(config.session.cancel_policy, CancelPolicy::Discard);
        assert_eq!(config.geometry.mirror_mode, MirrorMode::Authored);
        assert!(config.geometry.diagram_dir.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[schedule]
api_key = "abc123"
timeout_secs = 5

[session]
cancel_policy = "undo_tally"

[geometry]
mirror_mode = "derived"
diagram_dir = "/tmp/diagrams"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.schedule.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.schedule.timeout_secs, 5);
        assert_eq!(
            config.schedule.base_url,
            "https://www.thebluealliance.com/api/v3"
        );
        assert_eq!(config.session.cancel_policy, CancelPolicy::UndoTally);
        assert_eq!(config.geometry.mirror_mode, MirrorMode::Derived);
        assert_eq!(
            config.geometry.diagram_dir,
            Some(PathBuf::from("/tmp/diagrams"))
        );
    }

    #[test]
    fn test_schedule_config_validation() {
        assert!(ScheduleConfig::default().validate().is_ok());

        let config = ScheduleConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScheduleConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let config = ScheduleConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolved_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ncancel_policy = \"discard\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session.cancel_policy, CancelPolicy::Discard);

        std::fs::write(&path, "[session\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}

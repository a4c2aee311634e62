//! Configuration loading for the triage console.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api_url`.
pub const API_URL_ENV: &str = "TRIAGE_CONSOLE_API_URL";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the triage backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Replay launcher defaults.
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            replay: ReplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit path must exist. Without one, the platform config file is
    /// used when present, else the defaults. The API URL is then overridden
    /// by the environment and finally by `api_url_flag`.
    pub fn resolve(explicit: Option<&Path>, api_url_flag: Option<&str>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };

        let env_url = std::env::var(API_URL_ENV).ok();
        config.apply_api_url_overrides(env_url.as_deref(), api_url_flag);
        Ok(config)
    }

    /// Applies the environment and flag overrides, flag last.
    pub fn apply_api_url_overrides(&mut self, env_url: Option<&str>, flag_url: Option<&str>) {
        for url in [env_url, flag_url].into_iter().flatten() {
            let url = url.trim();
            if !url.is_empty() {
                self.api_url = url.to_string();
            }
        }
    }

    /// Saves configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Platform config file location, e.g. `~/.config/triage-console/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "triage-console").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Replay launcher defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Window length used when `--since` is not given.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,

    /// Overrides sent with every replay unless `--overrides` is given.
    #[serde(default = "default_config_overrides")]
    pub config_overrides: Value,
}

fn default_window_minutes() -> i64 {
    60
}

fn default_config_overrides() -> Value {
    json!({"scoring": {"weights": {"signal.ip_rep.bad": 35}}})
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            config_overrides: default_config_overrides(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to use JSON format.
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

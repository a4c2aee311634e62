//! Configuration validation for the triage console.
//!
//! Run by `triage-console validate` and before every command that talks to
//! the backend. Errors stop the command; warnings are printed and ignored.

use crate::config::AppConfig;
use colored::Colorize;
use tc_client::Url;
use tc_observability::parse_level;

/// Timeouts above this many seconds get a warning.
const LONG_TIMEOUT_SECS: u64 = 300;

/// Replay windows above this many minutes get a warning.
const LONG_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Problems that prevent the console from running.
    pub errors: Vec<String>,
    /// Problems worth fixing that do not block anything.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a new empty validation result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to stderr.
    pub fn print(&self) {
        if self.has_warnings() {
            eprintln!();
            eprintln!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                eprintln!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if self.has_errors() {
            eprintln!();
            eprintln!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                eprintln!("  {} {}", "✗".red(), error);
            }
        }

        if !self.has_errors() && !self.has_warnings() {
            eprintln!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates the console configuration.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the application configuration.
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_api_url(config, &mut result);
        Self::validate_timeout(config, &mut result);
        Self::validate_replay(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_api_url(config: &AppConfig, result: &mut ValidationResult) {
        let url = match Url::parse(config.api_url.trim()) {
            Ok(url) => url,
            Err(e) => {
                result.add_error(format!("api_url '{}' is not a valid URL: {}", config.api_url, e));
                return;
            }
        };

        match url.scheme() {
            "http" | "https" => {}
            other => result.add_warning(format!(
                "api_url uses the '{}' scheme; the backend is normally served over http or https",
                other
            )),
        }

        if url.host_str().map_or(true, str::is_empty) {
            result.add_error(format!("api_url '{}' has no host", config.api_url));
        }
        if url.query().is_some() || url.fragment().is_some() {
            result.add_warning("api_url query and fragment are ignored");
        }
    }

    fn validate_timeout(config: &AppConfig, result: &mut ValidationResult) {
        if config.timeout_secs == 0 {
            result.add_error("timeout_secs must be greater than 0");
        } else if config.timeout_secs > LONG_TIMEOUT_SECS {
            result.add_warning(format!(
                "timeout_secs is {}; a hung backend will block the console that long",
                config.timeout_secs
            ));
        }
    }

    fn validate_replay(config: &AppConfig, result: &mut ValidationResult) {
        let window = config.replay.window_minutes;
        if window <= 0 {
            result.add_error(format!(
                "replay.window_minutes must be positive, got {}",
                window
            ));
        } else if window > LONG_WINDOW_MINUTES {
            result.add_warning(format!(
                "replay.window_minutes is {} (over a week); replays of that size are slow",
                window
            ));
        }

        let overrides = &config.replay.config_overrides;
        if !(overrides.is_object() || overrides.is_null()) {
            result.add_error("replay.config_overrides must be a mapping");
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        if parse_level(&config.logging.level).is_none() {
            result.add_warning(format!(
                "logging.level '{}' is not a known level; using 'warn'",
                config.logging.level
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn test_validation_result_operations() {
        let mut result = ValidationResult::new();
        assert!(!result.has_errors());
        assert!(!result.has_warnings());

        result.add_error("Test error");
        assert!(result.has_errors());

        result.add_warning("Test warning");
        assert!(result.has_warnings());

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_default_config_is_clean() {
        let result = ConfigValidator::validate(&default_config());
        assert!(!result.has_errors(), "{:?}", result.errors);
        assert!(!result.has_warnings(), "{:?}", result.warnings);
    }

    #[test]
    fn test_unparseable_url() {
        let mut config = default_config();
        config.api_url = "not a url".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(result.has_errors());
        assert!(result.errors[0].contains("not a valid URL"));
    }

    #[test]
    fn test_non_http_scheme_warns() {
        let mut config = default_config();
        config.api_url = "ftp://backend.internal".to_string();

        let mut result = ValidationResult::new();
        ConfigValidator::validate_api_url(&config, &mut result);
        assert!(!result.has_errors());
        assert!(result.warnings[0].contains("'ftp'"));
    }

    #[test]
    fn test_timeouts() {
        let mut config = default_config();
        config.timeout_secs = 0;
        let mut result = ValidationResult::new();
        ConfigValidator::validate_timeout(&config, &mut result);
        assert!(result.has_errors());

        config.timeout_secs = 3600;
        let mut result = ValidationResult::new();
        ConfigValidator::validate_timeout(&config, &mut result);
        assert!(!result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_replay_window() {
        let mut config = default_config();
        config.replay.window_minutes = 0;
        let mut result = ValidationResult::new();
        ConfigValidator::validate_replay(&config, &mut result);
        assert!(result.has_errors());

        config.replay.window_minutes = 60 * 24 * 30;
        let mut result = ValidationResult::new();
        ConfigValidator::validate_replay(&config, &mut result);
        assert!(!result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_replay_overrides_must_be_mapping() {
        let mut config = default_config();
        config.replay.config_overrides = json!(["scoring"]);
        let mut result = ValidationResult::new();
        ConfigValidator::validate_replay(&config, &mut result);
        assert!(result.has_errors());
    }

    #[test]
    fn test_unknown_log_level_warns() {
        let mut config = default_config();
        config.logging.level = "chatty".to_string();
        let mut result = ValidationResult::new();
        ConfigValidator::validate_logging(&config, &mut result);
        assert!(result.has_warnings());
    }
}

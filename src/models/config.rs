//! Configuration data model and validation

use crate::error::{AppError, Result};
use crate::extract::ExtractOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebDriver server used to render report pages
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// check-host.net origin; report pages live under `/check-report/{id}`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for rendering one report page
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Delay between page-source polls while waiting for the results table
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Browser sessions used in parallel during a batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Fail instead of leaving `date` unset when "Checked on" is unusable
    #[serde(default)]
    pub strict_checked_on: bool,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_concurrency: default_max_concurrency(),
            strict_checked_on: false,
            headless: default_headless(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Options for the extraction pass
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            strict_checked_on: self.strict_checked_on,
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("WebDriver URL", &self.webdriver_url), ("base URL", &self.base_url)] {
            if value.is_empty() {
                return Err(AppError::config(format!("{} cannot be empty", name)));
            }

            match url::Url::parse(value) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(_) => {
                    return Err(AppError::config(format!("{} must use http or https: {}", name, value)));
                }
                Err(e) => {
                    return Err(AppError::config(format!("Invalid {} '{}': {}", name, value, e)));
                }
            }
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if !(50..=10_000).contains(&self.poll_interval_ms) {
            return Err(AppError::config("Poll interval must be between 50 and 10000 ms"));
        }

        if self.max_concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        if self.max_concurrency > 32 {
            return Err(AppError::config("Concurrency cannot exceed 32 browser sessions"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            self.webdriver_url = webdriver_url.trim().to_string();
        }

        if let Ok(base_url) = std::env::var("CHECKHOST_BASE_URL") {
            self.base_url = base_url.trim().trim_end_matches('/').to_string();
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(interval) = std::env::var("POLL_INTERVAL_MS") {
            self.poll_interval_ms = interval.parse()
                .map_err(|e| AppError::config(format!("Invalid POLL_INTERVAL_MS value '{}': {}", interval, e)))?;
        }

        if let Ok(concurrency) = std::env::var("MAX_CONCURRENCY") {
            self.max_concurrency = concurrency.parse()
                .map_err(|e| AppError::config(format!("Invalid MAX_CONCURRENCY value '{}': {}", concurrency, e)))?;
        }

        if let Ok(strict) = std::env::var("STRICT_CHECKED_ON") {
            self.strict_checked_on = strict.parse()
                .map_err(|e| AppError::config(format!("Invalid STRICT_CHECKED_ON value '{}': {}", strict, e)))?;
        }

        if let Ok(headless) = std::env::var("HEADLESS") {
            self.headless = headless.parse()
                .map_err(|e| AppError::config(format!("Invalid HEADLESS value '{}': {}", headless, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_webdriver_url() -> String {
    crate::defaults::DEFAULT_WEBDRIVER_URL.to_string()
}

fn default_base_url() -> String {
    crate::defaults::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_poll_interval_ms() -> u64 {
    crate::defaults::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_max_concurrency() -> usize {
    crate::defaults::DEFAULT_MAX_CONCURRENCY
}

fn default_headless() -> bool {
    true
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(!config.extract_options().strict_checked_on);
    }

    #[test]
    fn test_invalid_webdriver_url() {
        let mut config = Config::default();
        config.webdriver_url = "localhost:4444".to_string();
        assert!(config.validate().is_err());

        config.webdriver_url = String::new();
        assert!(config.validate().is_err());

        config.webdriver_url = "ftp://localhost:4444".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.timeout_seconds = 301;
        assert!(config.validate().is_err());
        config.timeout_seconds = 300;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
        config.max_concurrency = 33;
        assert!(config.validate().is_err());
        config.max_concurrency = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = Config::default();
        config.poll_interval_ms = 10;
        assert!(config.validate().is_err());
        config.poll_interval_ms = 20_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strict_flag_flows_into_extract_options() {
        let config = Config {
            strict_checked_on: true,
            ..Default::default()
        };
        assert!(config.extract_options().strict_checked_on);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"max_concurrency": 3}"#).unwrap();
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert!(config.headless);
    }
}

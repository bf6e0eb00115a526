//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file()?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref webdriver) = self.cli.webdriver {
            config.webdriver_url = webdriver.clone();
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(concurrency) = self.cli.concurrency {
            config.max_concurrency = concurrency;
        }

        if self.cli.strict_date {
            config.strict_checked_on = true;
        }

        if self.cli.no_headless {
            config.headless = false;
        }

        if self.cli.color || self.cli.no_color {
            config.enable_color = self.cli.use_colors();
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("WebDriver: {}", config.webdriver_url));
    summary.push(format!("Base URL: {}", config.base_url));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Poll interval: {}ms", config.poll_interval_ms));
    summary.push(format!("Concurrency: {}", config.max_concurrency));
    summary.push(format!("Strict check time: {}", config.strict_checked_on));
    summary.push(format!("Headless: {}", config.headless));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

//! check-host.net Report Scraper
//!
//! Converts rendered check-host.net check reports (HTTP, DNS, ping, TCP and
//! UDP) into typed records and writes them as JSON Lines. Pages are rendered
//! through a WebDriver server or read from disk.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod output;

// Re-export commonly used types
pub use batch::{BatchRecord, BatchRunner, BatchSummary};
pub use error::{AppError, Result};
pub use extract::{extract_report, is_rendered, parse_report, ExtractOptions, Extraction};
pub use fetch::{FileSource, PageSource, WebDriverSource};
pub use models::{Config, InvalidReport, Report, ReportType, ResultRow, ScrapeOutcome};
pub use output::JsonLinesWriter;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
    pub const DEFAULT_BASE_URL: &str = "https://check-host.net";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_MAX_CONCURRENCY: usize = 1;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}

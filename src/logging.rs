//! Structured logging for the report scraper
//!
//! All log output goes to standard error; standard output is reserved for
//! JSON Lines records.
//! - Leveled console and JSON formats
//! - Session correlation via a per-run UUID
//! - Scrape event helpers for page retrieval and extraction warnings

use crate::error::{AppError, Result};
use crate::models::{Config, ScrapeOutcome};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn colorize(&self, text: &str) -> String {
        match self {
            LogLevel::Debug => text.cyan().to_string(),
            LogLevel::Info => text.green().to_string(),
            LogLevel::Warn => text.yellow().to_string(),
            LogLevel::Error => text.red().to_string(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per entry
    Json,
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Report the entry is about, if any
    pub report_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger writing leveled entries to standard error
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = format!("{:>5}", entry.level.as_str());
        let formatted_level = if self.use_color {
            entry.level.colorize(&level_str)
        } else {
            level_str
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(report_id) = &entry.report_id {
            output.push_str(&format!(" [{}]", report_id));
        }

        // session_id is noise on a terminal
        let fields: Vec<String> = entry.fields.iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !fields.is_empty() {
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                report_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    /// Tag the entry with a report ID
    pub fn report_id(mut self, id: &str) -> Self {
        self.entry.report_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for per-report scrape events
pub struct ScrapeLogger {
    logger: Logger,
}

impl ScrapeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("SCRAPE".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log a finished page retrieval
    pub async fn log_page_fetch(&self, report_id: &str, source: &str, bytes: usize, elapsed: Duration) {
        self.logger.debug(&format!("Fetched {} ({} bytes) in {}ms", source, bytes, elapsed.as_millis()))
            .report_id(report_id)
            .field("source", source)
            .field("bytes", bytes)
            .field("elapsed_ms", elapsed.as_millis() as u64)
            .log()
            .await;
    }

    /// Log a non-fatal extraction warning
    pub async fn log_extraction_warning(&self, report_id: &str, warning: &str) {
        self.logger.warn(warning)
            .report_id(report_id)
            .log()
            .await;
    }

    /// Log the classification of one report
    pub async fn log_outcome(&self, outcome: &ScrapeOutcome) {
        match outcome {
            ScrapeOutcome::Report(report) => {
                self.logger.info(&format!("Extracted {} report with {} rows", report.report_type, report.results.len()))
                    .report_id(&report.report_id)
                    .field("type", report.report_type.as_str())
                    .field("rows", report.results.len())
                    .log()
                    .await;
            }
            ScrapeOutcome::Invalid(invalid) => {
                self.logger.info(&format!("Report is invalid: {}", invalid.reason))
                    .report_id(&invalid.report_id)
                    .field("reason", &invalid.reason)
                    .log()
                    .await;
            }
        }
    }

    /// Log a browser session that could not be closed
    pub async fn log_session_cleanup_failure(&self, report_id: &str, session_id: &str, error: &AppError) {
        self.logger.warn(&format!("Failed to close WebDriver session {}: {}", session_id, error))
            .report_id(report_id)
            .field("webdriver_session", session_id)
            .error_info(error)
            .log()
            .await;
    }

    /// Log a failed report with full error context
    pub async fn log_failure(&self, report_id: &str, error: &AppError) {
        self.logger.error(&error.to_string())
            .report_id(report_id)
            .error_info(error)
            .log()
            .await;
    }
}

/// Logger factory sharing one session ID across components
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_scrape_logger(&self) -> ScrapeLogger {
        let scrape = ScrapeLogger::new(&self.config);
        scrape.logger.set_session_id(self.session_id.clone()).await;
        scrape
    }
}

//! Error handling for the check-host report scraper

use thiserror::Error;

/// Custom error types for the scraper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Heading label does not name any known report kind
    #[error("Unrecognized report type: {0:?}")]
    UnrecognizedReportType(String),

    /// Results table headers differ from the ones expected for the report kind
    #[error("Schema violation for {report_type}: expected headers {expected:?}, found {found:?}")]
    SchemaViolation {
        report_type: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A structurally required element is absent from the document
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// "Checked on" text present but not in the expected format
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    /// Canonical link and permalink name different reports
    #[error("Report ID mismatch: canonical link says {canonical:?}, permalink says {permalink:?}")]
    ReportIdMismatch { canonical: String, permalink: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Page retrieval errors (WebDriver / HTTP)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unrecognized_report_type<S: Into<String>>(raw: S) -> Self {
        Self::UnrecognizedReportType(raw.into())
    }

    pub fn schema_violation(report_type: &str, expected: &[&str], found: &[String]) -> Self {
        Self::SchemaViolation {
            report_type: report_type.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.to_vec(),
        }
    }

    pub fn missing_element<S: Into<String>>(what: S) -> Self {
        Self::MissingElement(what.into())
    }

    pub fn malformed_timestamp<S: Into<String>>(raw: S) -> Self {
        Self::MalformedTimestamp(raw.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new retrieval error
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnrecognizedReportType(_) => "REPORT_TYPE",
            Self::SchemaViolation { .. } => "SCHEMA",
            Self::MissingElement(_) => "MISSING_ELEMENT",
            Self::MalformedTimestamp(_) => "TIMESTAMP",
            Self::ReportIdMismatch { .. } => "REPORT_ID",
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Retrieval(_) => "RETRIEVAL",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (a later attempt may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Retrieval(_) | Self::Timeout(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UnrecognizedReportType(raw) => {
                format!("The report heading {:?} does not name a supported check.\n\nSuggestion: Only HTTP, DNS, ping, TCP and UDP reports are supported.", raw)
            }
            Self::SchemaViolation { .. } => {
                format!("{}\n\nSuggestion: The site's markup has changed; the extraction rules need updating.", self)
            }
            Self::MissingElement(what) => {
                format!("The page has no {}.\n\nSuggestion: Make sure the document was fully rendered before it was captured.", what)
            }
            Self::MalformedTimestamp(raw) => {
                format!("Could not read the check time {:?}.\n\nSuggestion: Run without --strict-date to leave the date unset.", raw)
            }
            Self::ReportIdMismatch { .. } => {
                format!("{}\n\nSuggestion: The captured document may belong to a different report.", self)
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Report IDs are alphanumeric, e.g. 23d52df5k770.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file paths and permissions.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data.", msg)
            }
            Self::Retrieval(msg) => {
                format!("Page retrieval failed: {}\n\nSuggestion: Make sure a WebDriver server (e.g. chromedriver --port=4444) is running.", msg)
            }
            Self::Timeout(msg) => {
                format!("Timed out: {}\n\nSuggestion: Increase the timeout value using --timeout.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Retrieval(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::UnrecognizedReportType(_)
            | Self::SchemaViolation { .. }
            | Self::MissingElement(_)
            | Self::MalformedTimestamp(_)
            | Self::ReportIdMismatch { .. } => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Retrieval(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
                _ => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::retrieval(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    /// Prefixes the message but keeps the original category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Retrieval(msg) => AppError::Retrieval(format!("{}: {}", context, msg)),
                AppError::Timeout(msg) => AppError::Timeout(format!("{}: {}", context, msg)),
                other => other,
            }
        })
    }
}

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "This error might be temporary. You can try running the command again.".green());
                } else {
                    eprintln!("This error might be temporary. You can try running the command again.");
                }
            }
        }
    }

    /// Get formatted summary of failures keyed by category
    pub fn format_error_summary(&self, errors: &[(String, AppError)]) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        let mut summary = format!("Found {} error(s):", errors.len());

        let mut error_groups: std::collections::BTreeMap<&'static str, Vec<&(String, AppError)>> =
            std::collections::BTreeMap::new();
        for entry in errors {
            error_groups.entry(entry.1.category()).or_default().push(entry);
        }

        for (category, group_errors) in error_groups {
            summary.push_str(&format!("\n  {}: {} error(s)", category, group_errors.len()));
            if self.verbose {
                for (report_id, error) in group_errors {
                    summary.push_str(&format!("\n    - {}: {}", report_id, error));
                }
            }
        }

        summary
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let retrieval_error = AppError::retrieval("session not created");
        assert_eq!(retrieval_error.category(), "RETRIEVAL");
        assert!(retrieval_error.is_recoverable());
        assert_eq!(retrieval_error.exit_code(), 2);
    }

    #[test]
    fn test_extraction_errors() {
        let errors = [
            AppError::unrecognized_report_type("Traceroute"),
            AppError::schema_violation("check-udp", &["Location"], &["Where".to_string()]),
            AppError::missing_element("canonical link"),
            AppError::malformed_timestamp("yesterday"),
            AppError::ReportIdMismatch {
                canonical: "a".to_string(),
                permalink: "b".to_string(),
            },
        ];

        for error in &errors {
            assert!(!error.is_recoverable());
            assert_eq!(error.exit_code(), 6);
        }
    }

    #[test]
    fn test_schema_violation_display() {
        let error = AppError::schema_violation(
            "check-dns",
            &["Location", "Result", "TTL"],
            &["Location".to_string(), "Result".to_string()],
        );
        let display = error.to_string();
        assert!(display.contains("check-dns"));
        assert!(display.contains("TTL"));
    }

    #[test]
    fn test_unrecognized_type_keeps_raw_text() {
        let error = AppError::unrecognized_report_type("Traceroute");
        assert!(error.to_string().contains("\"Traceroute\""));
        assert!(error.user_friendly_message().contains("Traceroute"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::retrieval("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::missing_element("test").exit_code(), 6);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert!(app_error.to_string().contains("URL parse error"));

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_error: AppError = json_error.into();
        assert!(app_error.to_string().contains("JSON parse error"));

        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
    }

    #[test]
    fn test_error_context_keeps_category() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));

        let error = result
            .with_context(|| format!("Failed to read ID list {}", "ids.txt"))
            .unwrap_err();
        assert_eq!(error.category(), "IO");
        assert_eq!(error.to_string(), "I/O error: Failed to read ID list ids.txt: File not found");

        let parse: std::result::Result<u64, std::num::ParseIntError> = "x".parse();
        let error = parse.with_context(|| "TIMEOUT_SECONDS".to_string()).unwrap_err();
        assert_eq!(error.category(), "PARSE");
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::missing_element("results table");
        let plain = error.format_for_console(false);
        assert!(plain.starts_with("[MISSING_ELEMENT]"));
        assert!(error.format_for_console(true).contains("results table"));
    }

    #[test]
    fn test_error_summary() {
        let reporter = ErrorReporter::new(false, true);
        let errors = vec![
            ("a1".to_string(), AppError::missing_element("flag image")),
            ("b2".to_string(), AppError::timeout("render")),
            ("c3".to_string(), AppError::missing_element("location cell")),
        ];

        let summary = reporter.format_error_summary(&errors);
        assert!(summary.contains("Found 3 error(s)"));
        assert!(summary.contains("MISSING_ELEMENT: 2 error(s)"));
        assert!(summary.contains("TIMEOUT: 1 error(s)"));
        assert!(summary.contains("- c3:"));

        assert_eq!(reporter.format_error_summary(&[]), "No errors");
    }
}

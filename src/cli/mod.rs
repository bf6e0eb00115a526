//! Command-line interface

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// check-host.net report scraper - converts check reports into JSON Lines
#[derive(Parser, Debug, Clone)]
#[command(name = "checkhost-scraper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Report ID, report URL, or path to a file with one report ID per line
    #[arg(value_name = "REPORT_ID|FILE")]
    pub input: Option<String>,

    /// Write JSON Lines to this file instead of standard output
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Parse an already rendered report page instead of fetching (repeatable)
    #[arg(long = "html", value_name = "PATH", action = ArgAction::Append)]
    pub html_files: Vec<PathBuf>,

    /// WebDriver server URL (e.g. a local chromedriver)
    #[arg(long, value_name = "URL")]
    pub webdriver: Option<String>,

    /// Page render timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Number of reports fetched in parallel
    #[arg(short = 'j', long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Fail when the "Checked on" time is missing or unreadable
    #[arg(long)]
    pub strict_date: bool,

    /// Show the browser window while rendering
    #[arg(long)]
    pub no_headless: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        match (&self.input, self.html_files.is_empty()) {
            (None, true) => {
                Err("Must specify a report ID, an ID file, or at least one --html page".to_string())
            }
            (Some(_), false) => Err("A report ID/file cannot be combined with --html".to_string()),
            _ => Ok(()),
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map_err(|_| format!("Invalid concurrency: {}", s))
        .and_then(|n| match n {
            1..=32 => Ok(n),
            _ => Err("Concurrency must be between 1 and 32".to_string()),
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

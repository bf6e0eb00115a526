//! Batch input resolution: report IDs, report URLs and ID list files

use crate::error::{AppError, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static REPORT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]+$").expect("report ID pattern is valid"));
static REPORT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/\s]+/check-report/([^/?#\s]*)").expect("report URL pattern is valid")
});

/// One unit of batch work
#[derive(Debug, Clone)]
pub enum BatchInput {
    /// Key handed to the page source (report ID or file path)
    Key(String),
    /// Entry that was rejected before retrieval
    Rejected { entry: String, error: AppError },
}

/// Reduce a bare ID or a `.../check-report/<id>` URL to the report ID
pub fn normalize_report_id(entry: &str) -> Result<String> {
    let entry = entry.trim();
    let candidate = match REPORT_URL.captures(entry) {
        Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
        None => entry,
    };

    if REPORT_ID.is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(AppError::validation(format!("not a check-host.net report ID: {:?}", entry)))
    }
}

/// Entries of an ID list: one per line, blank lines and `#` comments skipped
pub fn parse_id_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Resolve the positional argument: an existing file is an ID list, anything
/// else is a single entry
pub fn resolve_report_inputs(input: &str) -> Result<Vec<BatchInput>> {
    let path = Path::new(input);
    let entries = if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ID list {}", path.display()))?;
        parse_id_list(&content)
    } else {
        vec![input.to_string()]
    };

    Ok(entries.into_iter().map(report_input).collect())
}

fn report_input(entry: String) -> BatchInput {
    match normalize_report_id(&entry) {
        Ok(id) => BatchInput::Key(id),
        Err(error) => BatchInput::Rejected { entry, error },
    }
}

/// Rendered documents given with `--html`; keys are the paths themselves
pub fn page_inputs(paths: &[PathBuf]) -> Vec<BatchInput> {
    paths
        .iter()
        .map(|path| BatchInput::Key(path.display().to_string()))
        .collect()
}

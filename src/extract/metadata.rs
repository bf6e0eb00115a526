//! Report metadata outside the heading: report ID, permalink and check time.

use super::{element_text, selector};
use crate::error::{AppError, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Path marker preceding the report ID in report URLs
pub const REPORT_PATH_MARKER: &str = "check-report/";

/// Format of the "Checked on" time, e.g. `Sat Mar 08 20:28:15 UTC 2025`
pub const CHECKED_ON_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

const CHECKED_ON_PREFIX: &str = "Checked on";

static CANONICAL_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel="canonical"]"#));
static PERMALINK_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("#report_permalink a"));
static BLOCKS: Lazy<Selector> = Lazy::new(|| selector("div"));
static EMPHASIS: Lazy<Selector> = Lazy::new(|| selector("strong, b, em"));

/// Report ID from a report URL: the path segment after `check-report/`
pub fn report_id_from_href(href: &str) -> Option<String> {
    let start = href.rfind(REPORT_PATH_MARKER)? + REPORT_PATH_MARKER.len();
    let rest = &href[start..];
    let end = rest.find(['?', '#', '/']).unwrap_or(rest.len());
    let id = rest[..end].trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn canonical_href(document: &Html) -> Option<&str> {
    document
        .select(&CANONICAL_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
}

fn permalink_href(document: &Html) -> Option<&str> {
    document
        .select(&PERMALINK_ANCHOR)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
}

/// Href of the "Permanent link to this check report" anchor, verbatim
pub fn permalink(document: &Html) -> Result<String> {
    permalink_href(document)
        .map(str::to_string)
        .ok_or_else(|| AppError::missing_element("permanent link anchor (#report_permalink a)"))
}

/// Report ID from the canonical link and/or the permalink.
/// When both are present they must name the same report.
pub fn report_id(document: &Html) -> Result<String> {
    let canonical = canonical_href(document).and_then(report_id_from_href);
    let from_permalink = permalink_href(document).and_then(report_id_from_href);

    match (canonical, from_permalink) {
        (Some(canonical), Some(permalink)) if canonical != permalink => {
            Err(AppError::ReportIdMismatch { canonical, permalink })
        }
        (Some(id), _) | (None, Some(id)) => Ok(id),
        (None, None) => Err(AppError::missing_element(
            "report ID (canonical link or permanent link)",
        )),
    }
}

/// Outcome of looking for the "Checked on" block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedOn {
    Parsed(NaiveDateTime),
    /// No block starting with "Checked on"
    Absent,
    /// Block present but its time could not be read
    Malformed(String),
}

pub fn parse_checked_on_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), CHECKED_ON_FORMAT).ok()
}

/// Find the block whose text starts with "Checked on" and read its bold time
pub fn checked_on(document: &Html) -> CheckedOn {
    let Some(block) = document
        .select(&BLOCKS)
        .find(|div| element_text(*div).starts_with(CHECKED_ON_PREFIX))
    else {
        return CheckedOn::Absent;
    };

    let Some(emphasis) = block.select(&EMPHASIS).next() else {
        return CheckedOn::Malformed(element_text(block));
    };

    let raw = element_text(emphasis);
    match parse_checked_on_time(&raw) {
        Some(time) => CheckedOn::Parsed(time),
        None => CheckedOn::Malformed(raw),
    }
}

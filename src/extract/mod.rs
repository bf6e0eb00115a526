//! HTML-to-report extraction
//!
//! Turns one fully rendered check-host.net report page into a [`Report`] or,
//! when the site says the report is gone, an [`InvalidReport`]. Extraction is
//! a single synchronous pass over a parsed document:
//!
//! 1. validity check on the page heading
//! 2. report kind from the heading label
//! 3. metadata (report ID, permalink, target, check time)
//! 4. results table, validated against the kind's header schema
//!
//! Nothing here holds state between calls; concurrent callers each parse
//! their own document.

pub mod heading;
pub mod metadata;
pub mod table;

pub use heading::NOT_FOUND_MARKERS;
pub use metadata::{report_id_from_href, CheckedOn, CHECKED_ON_FORMAT};
pub use table::{parse_answers, ResultsTable, RowCells};

use crate::error::{AppError, Result};
use crate::models::{InvalidReport, Report, ScrapeOutcome};
use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};

/// Compile a selector that is known to be valid at build time
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {:?}: {:?}", css, e))
}

/// Concatenated descendant text, trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Knobs for the extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Treat a missing or unreadable "Checked on" block as an error instead
    /// of leaving the date unset
    pub strict_checked_on: bool,
}

/// Result of one extraction plus any non-fatal findings
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub outcome: ScrapeOutcome,
    pub warnings: Vec<String>,
}

/// Parse a rendered report page
pub fn parse_report(html: &str, options: &ExtractOptions) -> Result<ScrapeOutcome> {
    extract_report(html, options).map(|extraction| extraction.outcome)
}

/// Parse a rendered report page, keeping non-fatal warnings
pub fn extract_report(html: &str, options: &ExtractOptions) -> Result<Extraction> {
    let document = Html::parse_document(html);
    ReportAssembler::new(&document, *options).assemble()
}

/// True when `html` is a finished page: either the removed-report notice or
/// a results table whose body has rows
pub fn is_rendered(html: &str) -> bool {
    let document = Html::parse_document(html);

    if let Ok(h1) = heading::primary_heading(&document) {
        if heading::not_found_reason(h1).is_some() {
            return true;
        }
    }

    ResultsTable::locate(&document)
        .map(|table| table.is_populated())
        .unwrap_or(false)
}

struct ReportAssembler<'a> {
    document: &'a Html,
    options: ExtractOptions,
    warnings: Vec<String>,
}

impl<'a> ReportAssembler<'a> {
    fn new(document: &'a Html, options: ExtractOptions) -> Self {
        Self {
            document,
            options,
            warnings: Vec::new(),
        }
    }

    fn assemble(mut self) -> Result<Extraction> {
        let h1 = heading::primary_heading(self.document)?;

        if let Some(reason) = heading::not_found_reason(h1) {
            let invalid = InvalidReport {
                report_id: metadata::report_id(self.document)?,
                reason: reason.to_string(),
            };
            return Ok(self.finish(ScrapeOutcome::Invalid(invalid)));
        }

        let report_type = heading::classify(h1)?;

        let report_id = metadata::report_id(self.document)?;
        let permalink = metadata::permalink(self.document)?;
        let target = heading::target(h1)?;
        let checked_at = self.checked_at()?;

        let results = ResultsTable::locate(self.document)?.extract(report_type)?;

        let report = Report::new(report_id, permalink, report_type, target, checked_at, results)?;
        Ok(self.finish(ScrapeOutcome::Report(report)))
    }

    fn checked_at(&mut self) -> Result<Option<NaiveDateTime>> {
        match (metadata::checked_on(self.document), self.options.strict_checked_on) {
            (CheckedOn::Parsed(time), _) => Ok(Some(time)),
            (CheckedOn::Absent, true) => Err(AppError::missing_element("\"Checked on\" block")),
            (CheckedOn::Malformed(raw), true) => Err(AppError::malformed_timestamp(raw)),
            (CheckedOn::Absent, false) => {
                self.warnings.push("no \"Checked on\" block; date left unset".to_string());
                Ok(None)
            }
            (CheckedOn::Malformed(raw), false) => {
                self.warnings.push(format!(
                    "unreadable check time {:?} (expected {}); date left unset",
                    raw, CHECKED_ON_FORMAT
                ));
                Ok(None)
            }
        }
    }

    fn finish(self, outcome: ScrapeOutcome) -> Extraction {
        Extraction {
            outcome,
            warnings: self.warnings,
        }
    }
}

//! Batch scraping: many report IDs or documents, one record each, in order

pub mod input;

pub use input::{normalize_report_id, page_inputs, parse_id_list, resolve_report_inputs, BatchInput};

use crate::error::{AppError, Result};
use crate::extract::{extract_report, ExtractOptions};
use crate::fetch::PageSource;
use crate::logging::ScrapeLogger;
use crate::models::{InvalidReport, Report, ScrapeOutcome};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Exit code used when failures of different kinds are mixed in one run
pub const MIXED_FAILURE_EXIT_CODE: i32 = 6;

/// One output line of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Report(Report),
    Invalid(InvalidReport),
    Failed {
        report_id: String,
        error: String,
        category: String,
        #[serde(skip)]
        source: AppError,
    },
}

impl BatchRecord {
    pub fn failed(report_id: &str, error: &AppError) -> Self {
        BatchRecord::Failed {
            report_id: report_id.to_string(),
            error: error.to_string(),
            category: error.category().to_string(),
            source: error.clone(),
        }
    }

    pub fn report_id(&self) -> &str {
        match self {
            BatchRecord::Report(report) => &report.report_id,
            BatchRecord::Invalid(invalid) => &invalid.report_id,
            BatchRecord::Failed { report_id, .. } => report_id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BatchRecord::Failed { .. })
    }

    /// The error behind a `Failed` record
    pub fn failure(&self) -> Option<&AppError> {
        match self {
            BatchRecord::Failed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ScrapeOutcome> for BatchRecord {
    fn from(outcome: ScrapeOutcome) -> Self {
        match outcome {
            ScrapeOutcome::Report(report) => BatchRecord::Report(report),
            ScrapeOutcome::Invalid(invalid) => BatchRecord::Invalid(invalid),
        }
    }
}

/// Counts for a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub reports: usize,
    pub invalid: usize,
    pub failed: usize,
    pub elapsed: Duration,
    failure_codes: BTreeSet<i32>,
}

impl BatchSummary {
    pub fn record(&mut self, record: &BatchRecord) {
        self.total += 1;
        match record {
            BatchRecord::Report(_) => self.reports += 1,
            BatchRecord::Invalid(_) => self.invalid += 1,
            BatchRecord::Failed { source, .. } => {
                self.failed += 1;
                self.failure_codes.insert(source.exit_code());
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// 0 when nothing failed; the shared code when every failure agrees
    pub fn exit_code(&self) -> i32 {
        let mut codes = self.failure_codes.iter();
        match (codes.next(), codes.next()) {
            (None, _) => 0,
            (Some(code), None) => *code,
            (Some(_), Some(_)) => MIXED_FAILURE_EXIT_CODE,
        }
    }
}

/// Drives a [`PageSource`] over batch inputs with bounded concurrency
pub struct BatchRunner<S> {
    source: S,
    options: ExtractOptions,
    max_concurrency: usize,
    logger: ScrapeLogger,
}

impl<S: PageSource> BatchRunner<S> {
    pub fn new(source: S, options: ExtractOptions, max_concurrency: usize, logger: ScrapeLogger) -> Self {
        Self {
            source,
            options,
            max_concurrency: max_concurrency.max(1),
            logger,
        }
    }

    /// Process every input, handing records to `sink` in input order.
    /// A failing input becomes a `Failed` record; only a `sink` error stops the run.
    pub async fn run<F>(&self, inputs: Vec<BatchInput>, mut sink: F) -> Result<BatchSummary>
    where
        F: FnMut(&BatchRecord) -> Result<()>,
    {
        let started = Instant::now();
        let mut summary = BatchSummary::default();

        let mut records = stream::iter(inputs)
            .map(|input| self.process(input))
            .buffered(self.max_concurrency);

        while let Some(record) = records.next().await {
            summary.record(&record);
            sink(&record)?;
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Process every input and collect the records
    pub async fn collect(&self, inputs: Vec<BatchInput>) -> Result<(Vec<BatchRecord>, BatchSummary)> {
        let mut records = Vec::new();
        let summary = self
            .run(inputs, |record| {
                records.push(record.clone());
                Ok(())
            })
            .await?;
        Ok((records, summary))
    }

    async fn process(&self, input: BatchInput) -> BatchRecord {
        let key = match input {
            BatchInput::Key(key) => key,
            BatchInput::Rejected { entry, error } => {
                self.logger.log_failure(&entry, &error).await;
                return BatchRecord::failed(&entry, &error);
            }
        };

        match self.scrape(&key).await {
            Ok(outcome) => {
                self.logger.log_outcome(&outcome).await;
                outcome.into()
            }
            Err(error) => {
                self.logger.log_failure(&key, &error).await;
                BatchRecord::failed(&key, &error)
            }
        }
    }

    async fn scrape(&self, key: &str) -> Result<ScrapeOutcome> {
        let started = Instant::now();
        let html = self.source.fetch(key).await?;
        self.logger
            .log_page_fetch(key, self.source.name(), html.len(), started.elapsed())
            .await;

        // The parsed document never lives across an await.
        let extraction = extract_report(&html, &self.options)?;
        for warning in &extraction.warnings {
            self.logger.log_extraction_warning(key, warning).await;
        }
        Ok(extraction.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const REMOVED: &str = r#"<html><head>
        <link rel="canonical" href="https://check-host.net/check-report/gone1">
        </head><body><h1>Check report was removed</h1></body></html>"#;

    const UNKNOWN_KIND: &str = r#"<html><head>
        <link rel="canonical" href="https://check-host.net/check-report/odd1">
        </head><body><h1>Check traceroute <div class="inline-block">1.1.1.1</div></h1></body></html>"#;

    /// Pages served from memory, with per-key delays to shuffle completion order
    struct MemorySource {
        pages: HashMap<&'static str, (&'static str, u64)>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for MemorySource {
        async fn fetch(&self, key: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let (html, delay_ms) = self
                .pages
                .get(key)
                .ok_or_else(|| AppError::retrieval(format!("no page for {}", key)))?;
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            Ok(html.to_string())
        }

        fn name(&self) -> &'static str {
            "memory"
        }
    }

    fn runner(concurrency: usize) -> BatchRunner<MemorySource> {
        let pages = HashMap::from([
            ("gone1", (REMOVED, 40)),
            ("odd1", (UNKNOWN_KIND, 0)),
        ]);
        let source = MemorySource {
            pages,
            fetches: AtomicUsize::new(0),
        };
        let logger = ScrapeLogger::new(&Config::default());
        BatchRunner::new(source, ExtractOptions::default(), concurrency, logger)
    }

    fn inputs() -> Vec<BatchInput> {
        vec![
            BatchInput::Key("gone1".to_string()),
            BatchInput::Rejected {
                entry: "bad/id".to_string(),
                error: AppError::validation("not a check-host.net report ID"),
            },
            BatchInput::Key("odd1".to_string()),
            BatchInput::Key("missing".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_one_record_per_input_in_order() {
        let runner = runner(4);
        let (records, summary) = runner.collect(inputs()).await.unwrap();

        let ids: Vec<&str> = records.iter().map(BatchRecord::report_id).collect();
        assert_eq!(ids, vec!["gone1", "bad/id", "odd1", "missing"]);

        assert!(matches!(&records[0], BatchRecord::Invalid(r) if r.reason == "Check report was removed"));
        assert!(matches!(&records[1], BatchRecord::Failed { category, .. } if category == "VALIDATION"));
        assert!(matches!(&records[2], BatchRecord::Failed { category, .. } if category == "REPORT_TYPE"));
        assert!(matches!(&records[3], BatchRecord::Failed { category, .. } if category == "RETRIEVAL"));

        assert_eq!(summary.total, 4);
        assert_eq!(summary.reports, 0);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.exit_code(), MIXED_FAILURE_EXIT_CODE);

        // Rejected entries never reach the page source
        assert_eq!(runner.source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sequential_run_matches_parallel() {
        let (sequential, _) = runner(1).collect(inputs()).await.unwrap();
        let (parallel, _) = runner(4).collect(inputs()).await.unwrap();
        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_sink_error_stops_run() {
        let result = runner(1)
            .run(inputs(), |_| Err(AppError::io("disk full")))
            .await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_failed_record_serialization() {
        let record = BatchRecord::failed("abc", &AppError::timeout("report abc did not render within 30s"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "report_id": "abc",
                "error": "Timeout error: report abc did not render within 30s",
                "category": "TIMEOUT"
            })
        );
    }

    #[test]
    fn test_summary_exit_codes() {
        let mut summary = BatchSummary::default();
        assert_eq!(summary.exit_code(), 0);

        summary.record(&BatchRecord::failed("a", &AppError::timeout("slow")));
        summary.record(&BatchRecord::failed("b", &AppError::timeout("slow")));
        assert_eq!(summary.exit_code(), 3);

        summary.record(&BatchRecord::failed("c", &AppError::missing_element("results table")));
        assert_eq!(summary.exit_code(), MIXED_FAILURE_EXIT_CODE);
        assert!(summary.has_failures());
    }
}

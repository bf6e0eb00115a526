//! Run summary printed to standard error

use crate::batch::BatchSummary;
use crate::error::{AppError, Result};
use colored::*;
use std::fmt::Write as _;

pub struct SummaryFormatter {
    use_color: bool,
}

impl SummaryFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format_summary(&self, summary: &BatchSummary, destination: &str) -> Result<String> {
        let mut output = String::new();
        let header = if self.use_color {
            "Scrape Summary".bold().to_string()
        } else {
            "Scrape Summary".to_string()
        };

        writeln!(output, "{}", header)
            .and_then(|_| writeln!(output, "  Output:    {}", destination))
            .and_then(|_| writeln!(output, "  Duration:  {:.2}s", summary.elapsed.as_secs_f64()))
            .and_then(|_| writeln!(output, "  Total:     {}", summary.total))
            .and_then(|_| writeln!(output, "  Reports:   {}", self.paint(&summary.reports.to_string(), Color::Green)))
            .and_then(|_| writeln!(output, "  Invalid:   {}", self.paint(&summary.invalid.to_string(), Color::Yellow)))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;

        if summary.has_failures() {
            write!(output, "  Failed:    {}", self.paint(&summary.failed.to_string(), Color::Red))
                .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        } else {
            write!(output, "  Failed:    0")
                .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchRecord;
    use crate::models::InvalidReport;

    #[test]
    fn test_plain_summary() {
        let mut summary = BatchSummary::default();
        summary.record(&BatchRecord::Invalid(InvalidReport {
            report_id: "a".to_string(),
            reason: "Check report was removed".to_string(),
        }));
        summary.record(&BatchRecord::failed("b", &AppError::timeout("slow")));

        let text = SummaryFormatter::new(false).format_summary(&summary, "stdout").unwrap();
        assert!(text.starts_with("Scrape Summary\n"));
        assert!(text.contains("Output:    stdout"));
        assert!(text.contains("Total:     2"));
        assert!(text.contains("Invalid:   1"));
        assert!(text.contains("Failed:    1"));
    }
}

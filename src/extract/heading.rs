//! Page heading: removed-report detection, report kind and check target.
//!
//! A rendered report heading looks like
//!
//! ```html
//! <h1>Check website <div class="inline-block">
//!   <span class="break-all bg-neutral-200 px-1">https://1.1.1.1</span></div>
//! </h1>
//! ```

use super::{element_text, selector};
use crate::error::{AppError, Result};
use crate::models::ReportType;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Heading texts the site shows in place of a report
pub const NOT_FOUND_MARKERS: &[&str] = &["Check report was removed"];

static HEADING: Lazy<Selector> = Lazy::new(|| selector("h1"));
static TARGET: Lazy<Selector> = Lazy::new(|| selector("div.inline-block"));

/// The document's primary heading
pub fn primary_heading(document: &Html) -> Result<ElementRef<'_>> {
    document
        .select(&HEADING)
        .next()
        .ok_or_else(|| AppError::missing_element("page heading (h1)"))
}

/// Returns the marker text when the heading says the report does not exist
pub fn not_found_reason(heading: ElementRef<'_>) -> Option<&'static str> {
    let text = element_text(heading);
    NOT_FOUND_MARKERS.iter().copied().find(|marker| *marker == text)
}

/// The single target sub-element embedded in the heading
fn target_element(heading: ElementRef<'_>) -> Result<ElementRef<'_>> {
    let mut targets = heading.select(&TARGET);
    match (targets.next(), targets.next()) {
        (Some(target), None) => Ok(target),
        (None, _) => Err(AppError::missing_element("report target in page heading")),
        (Some(_), Some(_)) => Err(AppError::missing_element(
            "a single report target in page heading (found several)",
        )),
    }
}

/// Checked host, URL or address as printed in the heading
pub fn target(heading: ElementRef<'_>) -> Result<String> {
    let text = element_text(target_element(heading)?);
    if text.is_empty() {
        return Err(AppError::missing_element("report target text"));
    }
    Ok(text)
}

/// Map the label in front of the target to a report kind
pub fn classify(heading: ElementRef<'_>) -> Result<ReportType> {
    let target_id = target_element(heading)?.id();

    // Text nodes in document order up to the target element
    let leading: String = heading
        .descendants()
        .take_while(|node| node.id() != target_id)
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect();
    let label = leading.trim();

    ReportType::from_heading_label(label).ok_or_else(|| AppError::unrecognized_report_type(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading_doc(inner: &str) -> Html {
        Html::parse_document(&format!("<html><body><h1>{}</h1></body></html>", inner))
    }

    fn with_target(label: &str, target: &str) -> Html {
        heading_doc(&format!(
            "{} <div class=\"inline-block\">\n  <span class=\"break-all\">{}</span></div>\n",
            label, target
        ))
    }

    #[test]
    fn test_classify_all_labels() {
        let cases = [
            ("Check website", ReportType::Http),
            ("DNS", ReportType::Dns),
            ("Ping server", ReportType::Ping),
            ("TCP connect", ReportType::Tcp),
            ("UDP connect", ReportType::Udp),
        ];

        for (label, expected) in cases {
            let doc = with_target(label, "example.com");
            let heading = primary_heading(&doc).unwrap();
            assert_eq!(classify(heading).unwrap(), expected, "label {}", label);
        }
    }

    #[test]
    fn test_classify_when_target_text_repeats_label_text() {
        let cases = [
            ("Check website <div class=\"inline-block\"><span>web</span></div>", ReportType::Http),
            ("DNS <div class=\"inline-block\"><span>N</span></div>", ReportType::Dns),
            ("Ping server<div class=\"inline-block\">server</div>", ReportType::Ping),
        ];

        for (inner, expected) in cases {
            let doc = heading_doc(inner);
            let heading = primary_heading(&doc).unwrap();
            assert_eq!(classify(heading).unwrap(), expected, "heading {}", inner);
        }
    }

    #[test]
    fn test_label_ignores_text_after_target() {
        let doc = heading_doc("UDP connect <div class=\"inline-block\">8.8.8.8:53</div> (IPv4)");
        let heading = primary_heading(&doc).unwrap();
        assert_eq!(classify(heading).unwrap(), ReportType::Udp);
    }

    #[test]
    fn test_classify_unknown_label_carries_raw_text() {
        let doc = with_target("Traceroute", "example.com");
        let heading = primary_heading(&doc).unwrap();

        match classify(heading) {
            Err(AppError::UnrecognizedReportType(raw)) => assert_eq!(raw, "Traceroute"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let doc = with_target("check website", "example.com");
        let heading = primary_heading(&doc).unwrap();
        assert!(matches!(
            classify(heading),
            Err(AppError::UnrecognizedReportType(_))
        ));
    }

    #[test]
    fn test_target_is_trimmed() {
        let doc = with_target("Check website", "  https://1.1.1.1 ");
        let heading = primary_heading(&doc).unwrap();
        assert_eq!(target(heading).unwrap(), "https://1.1.1.1");
    }

    #[test]
    fn test_heading_without_target() {
        let doc = heading_doc("Check website");
        let heading = primary_heading(&doc).unwrap();
        assert!(matches!(classify(heading), Err(AppError::MissingElement(_))));
        assert!(matches!(target(heading), Err(AppError::MissingElement(_))));
    }

    #[test]
    fn test_heading_with_two_targets() {
        let doc = heading_doc(
            "DNS <div class=\"inline-block\">a</div> <div class=\"inline-block\">b</div>",
        );
        let heading = primary_heading(&doc).unwrap();
        assert!(matches!(classify(heading), Err(AppError::MissingElement(_))));
    }

    #[test]
    fn test_not_found_marker() {
        let doc = heading_doc("  Check report was removed ");
        let heading = primary_heading(&doc).unwrap();
        assert_eq!(not_found_reason(heading), Some("Check report was removed"));

        let doc = with_target("DNS", "google.com");
        let heading = primary_heading(&doc).unwrap();
        assert_eq!(not_found_reason(heading), None);
    }

    #[test]
    fn test_missing_heading() {
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(matches!(
            primary_heading(&doc),
            Err(AppError::MissingElement(_))
        ));
    }
}

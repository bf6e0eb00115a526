//! Page retrieval: turning a report ID into a rendered report document

pub mod webdriver;

pub use webdriver::WebDriverSource;

use crate::error::{ErrorContext, Result};
use async_trait::async_trait;
use url::Url;

/// Something that can produce the rendered document for a report
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Rendered HTML for `key` (a report ID, or a path for [`FileSource`])
    async fn fetch(&self, key: &str) -> Result<String>;

    /// Short name used in log entries
    fn name(&self) -> &'static str;
}

/// Report page URL for `report_id`, always requesting the English page
pub fn report_url(base_url: &str, report_id: &str) -> Result<String> {
    let mut url = Url::parse(&format!(
        "{}/check-report/{}",
        base_url.trim_end_matches('/'),
        report_id
    ))?;
    url.query_pairs_mut().append_pair("lang", "en");
    Ok(url.to_string())
}

/// Serves previously rendered documents from disk; keys are file paths
#[derive(Debug, Clone, Default)]
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn fetch(&self, key: &str) -> Result<String> {
        tokio::fs::read_to_string(key)
            .await
            .with_context(|| format!("Failed to read {}", key))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_url() {
        assert_eq!(
            report_url("https://check-host.net", "23d52df5k770").unwrap(),
            "https://check-host.net/check-report/23d52df5k770?lang=en"
        );
        assert_eq!(
            report_url("https://check-host.net/", "abc").unwrap(),
            "https://check-host.net/check-report/abc?lang=en"
        );
        assert!(report_url("not a url", "abc").is_err());
    }

    #[tokio::test]
    async fn test_file_source_reads_documents() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("abc.html");
        std::fs::write(&page, "<html></html>").unwrap();

        let source = FileSource::new();
        assert_eq!(source.fetch(&page.display().to_string()).await.unwrap(), "<html></html>");

        let missing = dir.path().join("nope.html").display().to_string();
        let error = source.fetch(&missing).await.unwrap_err();
        assert_eq!(error.category(), "IO");
        assert!(error.to_string().contains(&format!("Failed to read {}", missing)));
    }
}

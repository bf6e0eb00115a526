//! Minimal W3C WebDriver client used to render report pages
//!
//! check-host.net fills the results table from page script, so a plain GET
//! returns an empty table. A browser driven through WebDriver (chromedriver,
//! geckodriver or a Selenium server) renders the page; the page source is
//! polled until the results are in.

use super::{report_url, PageSource};
use crate::error::{AppError, Result};
use crate::extract::is_rendered;
use crate::logging::ScrapeLogger;
use crate::models::Config;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Extra allowance for the WebDriver round trips themselves
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Renders report pages in a browser session per report
pub struct WebDriverSource {
    client: Client,
    webdriver_url: String,
    base_url: String,
    headless: bool,
    timeout: Duration,
    poll_interval: Duration,
    logger: ScrapeLogger,
}

impl WebDriverSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout() + REQUEST_TIMEOUT_MARGIN)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create WebDriver client: {}", e)))?;

        Ok(Self {
            client,
            webdriver_url: config.webdriver_url.trim_end_matches('/').to_string(),
            base_url: config.base_url.clone(),
            headless: config.headless,
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            logger: ScrapeLogger::new(config),
        })
    }

    /// Report session cleanup problems through `logger`
    pub fn with_logger(mut self, logger: ScrapeLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Browser capabilities requested for every session
    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--window-size=1280,1024"];
        if self.headless {
            args.push("--headless=new");
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }

    /// Send one WebDriver command and return the response's `value`
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.webdriver_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::retrieval(format!("WebDriver request to {} failed: {}", url, e)))?;
        let status = response.status();
        let mut payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::retrieval(format!("Unreadable WebDriver response from {}: {}", url, e)))?;
        let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

        if let Ok(wire) = serde_json::from_value::<WireError>(value.clone()) {
            return Err(AppError::retrieval(format!("{}: {}", wire.error, wire.message)));
        }
        if !status.is_success() {
            return Err(AppError::retrieval(format!("WebDriver returned HTTP {} for {}", status, path)));
        }

        Ok(value)
    }

    async fn new_session(&self) -> Result<String> {
        let value = self.command(Method::POST, "/session", Some(self.capabilities())).await?;
        let session: NewSession = serde_json::from_value(value)
            .map_err(|e| AppError::retrieval(format!("WebDriver did not return a session: {}", e)))?;
        Ok(session.session_id)
    }

    async fn navigate(&self, session_id: &str, url: &str) -> Result<()> {
        self.command(Method::POST, &format!("/session/{}/url", session_id), Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn page_source(&self, session_id: &str) -> Result<String> {
        match self.command(Method::GET, &format!("/session/{}/source", session_id), None).await? {
            Value::String(source) => Ok(source),
            other => Err(AppError::retrieval(format!("Page source is not a string: {}", other))),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.command(Method::DELETE, &format!("/session/{}", session_id), None).await?;
        Ok(())
    }

    /// Navigate and poll until the document is rendered or time runs out
    async fn render(&self, session_id: &str, report_id: &str) -> Result<String> {
        let url = report_url(&self.base_url, report_id)?;

        let wait = async {
            self.navigate(session_id, &url).await?;
            loop {
                let source = self.page_source(session_id).await?;
                if is_rendered(&source) {
                    return Ok(source);
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.timeout, wait).await.map_err(|_| {
            AppError::timeout(format!(
                "report {} did not render within {}s",
                report_id,
                self.timeout.as_secs()
            ))
        })?
    }
}

#[async_trait]
impl PageSource for WebDriverSource {
    async fn fetch(&self, report_id: &str) -> Result<String> {
        let session_id = self.new_session().await?;
        let rendered = self.render(&session_id, report_id).await;

        // Runs after success and failure alike; never replaces the render result.
        if let Err(error) = self.delete_session(&session_id).await {
            self.logger.log_session_cleanup_failure(report_id, &session_id, &error).await;
        }

        rendered
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RENDERED: &str = r#"<html><body>
        <h1>Check report was removed</h1>
        <link rel="canonical" href="https://check-host.net/check-report/abc">
        </body></html>"#;

    const LOADING: &str = r#"<html><body>
        <h1>UDP connect <div class="inline-block">8.8.8.8:53</div></h1>
        <table><thead><tr><th>Location</th><th>Result</th><th>IP address</th></tr></thead>
        <tbody></tbody></table>
        </body></html>"#;

    fn config_for(server: &MockServer) -> Config {
        Config {
            webdriver_url: server.uri(),
            timeout_seconds: 1,
            poll_interval_ms: 50,
            ..Default::default()
        }
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s1", "capabilities": {} }
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .and(body_partial_json(json!({
                "url": "https://check-host.net/check-report/abc?lang=en"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_returns_rendered_source() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/session/s1/source"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": RENDERED })))
            .mount(&server)
            .await;

        let source = WebDriverSource::new(&config_for(&server)).unwrap();
        let html = source.fetch("abc").await.unwrap();
        assert!(html.contains("Check report was removed"));
    }

    #[tokio::test]
    async fn test_unrendered_page_times_out_and_closes_session() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/session/s1/source"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": LOADING })))
            .mount(&server)
            .await;

        let source = WebDriverSource::new(&config_for(&server)).unwrap();
        let error = source.fetch("abc").await.unwrap_err();
        assert!(matches!(error, AppError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_webdriver_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": {
                    "error": "session not created",
                    "message": "Chrome failed to start",
                    "stacktrace": ""
                }
            })))
            .mount(&server)
            .await;

        let source = WebDriverSource::new(&config_for(&server)).unwrap();
        let error = source.fetch("abc").await.unwrap_err();
        assert!(matches!(error, AppError::Retrieval(_)));
        assert!(error.to_string().contains("session not created"));
        assert!(error.is_recoverable());
    }

    #[tokio::test]
    async fn test_failed_session_cleanup_keeps_rendered_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s1", "capabilities": {} }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/source"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": RENDERED })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": { "error": "invalid session id", "message": "session deleted" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = WebDriverSource::new(&config_for(&server))
            .unwrap()
            .with_logger(ScrapeLogger::new(&Config::default()));
        let html = source.fetch("abc").await.unwrap();
        assert!(html.contains("Check report was removed"));
    }

    #[test]
    fn test_headless_capability() {
        let config = Config::default();
        let headless = WebDriverSource::new(&config).unwrap();
        assert!(headless.capabilities().to_string().contains("--headless"));

        let windowed = WebDriverSource::new(&Config { headless: false, ..config }).unwrap();
        assert!(!windowed.capabilities().to_string().contains("--headless"));
    }
}

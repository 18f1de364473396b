//! Page fetching: download HTML and convert it to Markdown.

use crate::error::PipelineError;
use async_trait::async_trait;
use htmd::HtmlToMarkdown;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Tags dropped before conversion: page chrome and non-content elements.
const SKIP_TAGS: [&str; 9] = [
    "nav", "footer", "header", "aside", "script", "style", "noscript", "iframe", "svg",
];

/// Fetch a documentation page as Markdown.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

/// HTTP fetcher using reqwest + htmd.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    converter: Arc<HtmlToMarkdown>,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Fetch {
                url: String::new(),
                message: format!("Failed to build HTTP client: {e}"),
                status_code: None,
            })?;

        let converter = HtmlToMarkdown::builder().skip_tags(SKIP_TAGS.to_vec()).build();

        Ok(Self {
            client,
            converter: Arc::new(converter),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// Convert an HTML document to Markdown.
    pub fn to_markdown(&self, url: &str, html: &str) -> Result<String, PipelineError> {
        self.converter
            .convert(html)
            .map_err(|e| PipelineError::Fetch {
                url: url.to_string(),
                message: format!("HTML conversion failed: {e}"),
                status_code: None,
            })
    }
}

fn fetch_error(url: &str, message: String, status_code: Option<u16>) -> PipelineError {
    PipelineError::Fetch {
        url: url.to_string(),
        message,
        status_code,
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let parsed =
            Url::parse(url).map_err(|e| fetch_error(url, format!("Invalid URL: {e}"), None))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(fetch_error(
                url,
                format!("URL scheme '{}' is not allowed (only http/https)", parsed.scheme()),
                None,
            ));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout {
                    stage: "fetch".to_string(),
                    target: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else if e.is_connect() {
                fetch_error(url, format!("Connection failed: {e}"), None)
            } else {
                fetch_error(url, e.to_string(), None)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(
                url,
                format!("HTTP {}", status.as_u16()),
                Some(status.as_u16()),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| fetch_error(url, format!("Failed to read response body: {e}"), None))?;

        self.to_markdown(url, &html)
    }
}

//! JSON-over-HTTP plumbing shared by the hosted providers.

use crate::error::PipelineError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Characters of an error body kept in the error message.
const ERROR_BODY_CHARS: usize = 500;

fn llm_error(message: String, status_code: Option<u16>) -> PipelineError {
    PipelineError::Llm {
        message,
        status_code,
    }
}

/// POST `body` as JSON and decode a JSON reply.
///
/// Non-2xx replies become `PipelineError::Llm` carrying the status code, so
/// retry classification can see it.
pub(crate) async fn post_json<B, R>(
    label: &str,
    builder: RequestBuilder,
    body: &B,
    timeout: Duration,
) -> Result<R, PipelineError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let resp = builder
        .json(body)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            // Wording is matched by retry classification
            let kind = if e.is_timeout() {
                "timed out"
            } else if e.is_connect() {
                "could not connect"
            } else {
                "failed"
            };
            llm_error(format!("{label} request {kind}: {e}"), None)
        })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let text: String = text.chars().take(ERROR_BODY_CHARS).collect();
        return Err(llm_error(
            format!("{label} HTTP {status}: {text}"),
            Some(status.as_u16()),
        ));
    }

    resp.json()
        .await
        .map_err(|e| llm_error(format!("Failed to parse {label} response: {e}"), None))
}

/// Trim generated text, rejecting replies with no content.
pub(crate) fn non_empty(label: &str, text: Option<String>) -> Result<String, PipelineError> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| llm_error(format!("{label} returned no content"), None))
}

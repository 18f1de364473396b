//! OpenRouter LLM provider (OpenAI-compatible API).
//!
//! OpenRouter uses the same Chat Completions format as OpenAI,
//! so this delegates to `OpenAiProvider` with a custom endpoint and
//! the attribution headers OpenRouter expects.

use super::openai::OpenAiProvider;
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::config::OpenRouterConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::time::Duration;

/// OpenRouter provider wrapping an OpenAI-compatible endpoint.
pub struct OpenRouterProvider {
    inner: OpenAiProvider,
}

impl OpenRouterProvider {
    pub fn new(config: &OpenRouterConfig, api_key: &str, model: &str) -> Self {
        let url = format!("{}/chat/completions", config.endpoint.trim_end_matches('/'));
        Self {
            inner: OpenAiProvider::with_endpoint(api_key, model, &url)
                .with_header("HTTP-Referer", &config.referer)
                .with_header("X-Title", &config.title)
                .with_timeout(Duration::from_secs(120)),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        self.inner.generate(request).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}

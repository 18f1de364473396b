//! OpenAI LLM provider using the Chat Completions API.
//!
//! Also serves as the wire implementation for OpenAI-compatible gateways
//! (OpenRouter) via [`OpenAiProvider::with_endpoint`].

use super::http;
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    extra_headers: Vec<(String, String)>,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint(api_key, model, "https://api.openai.com/v1/chat/completions")
    }

    /// Create with a custom endpoint (used by the OpenRouter provider).
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            extra_headers: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Label used in error messages, derived from the endpoint host.
    fn label(&self) -> &str {
        if self.endpoint.contains("openrouter") {
            "OpenRouter"
        } else {
            "OpenAI"
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let start = Instant::now();
        let label = self.label();

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        };

        let mut builder = self.client.post(&self.endpoint).bearer_auth(&self.api_key);
        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let reply: ChatResponse = http::post_json(label, builder, &body, self.timeout).await?;
        let content = reply.choices.into_iter().next().and_then(|c| c.message.content);
        let text = http::non_empty(label, content)?;

        Ok(LlmResponse {
            text,
            model: reply.model.unwrap_or_else(|| self.model.clone()),
            tokens_used: reply.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 10,
            temperature: 0.1,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn test_chat_response_parses_without_usage() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  # Title  "}}],"model":"m"}"#,
        )
        .unwrap();
        assert!(resp.usage.is_none());
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("  # Title  "));
    }

    #[test]
    fn test_label_follows_endpoint() {
        let p = OpenAiProvider::new("k", "m");
        assert_eq!(p.label(), "OpenAI");
        let p = OpenAiProvider::with_endpoint(
            "k",
            "m",
            "https://openrouter.ai/api/v1/chat/completions",
        );
        assert_eq!(p.label(), "OpenRouter");
    }
}

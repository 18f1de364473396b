//! Anthropic provider over the Messages API.

use super::http;
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [UserTurn<'a>; 1],
}

#[derive(Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<Block>,
    model: String,
    usage: Option<Usage>,
}

/// Only `text` blocks carry output; other block types have no `text` field.
#[derive(Deserialize)]
struct Block {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesReply {
    fn text(&self) -> String {
        self.content.iter().filter_map(|b| b.text.as_deref()).collect()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let start = Instant::now();
        let body = MessagesBody {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [UserTurn {
                role: "user",
                content: &request.prompt,
            }],
        };
        let builder = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);

        let reply: MessagesReply =
            http::post_json("Anthropic", builder, &body, self.timeout()).await?;
        let text = http::non_empty("Anthropic", Some(reply.text()))?;

        Ok(LlmResponse {
            text,
            model: reply.model,
            tokens_used: reply.usage.map(|u| u.input_tokens + u.output_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_has_single_user_turn() {
        let body = MessagesBody {
            model: "claude-sonnet-4-20250514",
            max_tokens: 8192,
            temperature: 0.1,
            messages: [UserTurn {
                role: "user",
                content: "raw",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["content"], "raw");
    }

    #[test]
    fn test_reply_joins_text_blocks() {
        let reply: MessagesReply = serde_json::from_str(
            r##"{
                "content": [
                    {"type": "text", "text": "# Refined"},
                    {"type": "text", "text": "\nbody"}
                ],
                "model": "claude-sonnet-4-20250514",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }"##,
        )
        .unwrap();
        assert_eq!(reply.text(), "# Refined\nbody");
        let usage = reply.usage.unwrap();
        assert_eq!(usage.input_tokens + usage.output_tokens, 15);
    }
}

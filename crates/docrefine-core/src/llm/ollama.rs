//! Local inference through an Ollama server. No API key involved.

use super::http;
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct OllamaProvider {
    base: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            base: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base)
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

impl GenerateReply {
    fn tokens(&self) -> Option<u32> {
        Some(self.prompt_eval_count? + self.eval_count?)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let start = Instant::now();
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };
        let builder = self.client.post(self.api("generate"));

        let reply: GenerateReply = http::post_json("Ollama", builder, &body, self.timeout()).await?;
        let tokens_used = reply.tokens();
        let text = http::non_empty("Ollama", Some(reply.response))?;

        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }
}

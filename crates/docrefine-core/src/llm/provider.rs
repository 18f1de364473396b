//! LLM provider trait and request/response types.
//!
//! Defines the interface that all LLM providers implement, plus the
//! factory that builds the right provider for a configured backend.

use super::prompt;
use crate::batch::backend::ProviderKind;
use crate::config::LlmConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::time::Duration;

/// A request to generate a text completion.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Full prompt text, instructions and document included
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Build a refining request for one raw document.
    ///
    /// Low temperature keeps the rewrite close to the source text.
    pub fn refine_document(document: &str) -> Self {
        Self {
            prompt: prompt::refining_prompt(document),
            max_tokens: 8192,
            temperature: 0.1,
        }
    }
}

/// The response from an LLM completion call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (backends hold an `Arc<dyn LlmProvider>`).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini", "openrouter").
    fn name(&self) -> &str;

    /// Generate a completion for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn missing_key(provider: &str, env_var: &str) -> PipelineError {
    PipelineError::Llm {
        message: format!("{provider} API key not set. Set {env_var} env var."),
        status_code: None,
    }
}

/// Factory that creates the appropriate provider for a backend.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider for one backend.
    ///
    /// # Arguments
    /// * `kind` - Which provider serves the model
    /// * `config` - The full LLM config section
    /// * `model` - Provider-side model identifier
    pub fn create(
        kind: ProviderKind,
        config: &LlmConfig,
        model: &str,
    ) -> Result<Box<dyn LlmProvider>, PipelineError> {
        match kind {
            ProviderKind::Gemini => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("Gemini", "GEMINI_API_KEY"))?;
                Ok(Box::new(super::gemini::GeminiProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    model,
                )))
            }
            ProviderKind::OpenRouter => {
                let cfg = config.openrouter.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("OpenRouter", "OPENROUTER_API_KEY"))?;
                Ok(Box::new(super::openrouter::OpenRouterProvider::new(
                    &cfg, &api_key, model,
                )))
            }
            ProviderKind::OpenAi => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("OpenAI", "OPENAI_API_KEY"))?;
                Ok(Box::new(super::openai::OpenAiProvider::new(&api_key, model)))
            }
            ProviderKind::Anthropic => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("Anthropic", "ANTHROPIC_API_KEY"))?;
                Ok(Box::new(super::anthropic::AnthropicProvider::new(
                    &api_key, model,
                )))
            }
            ProviderKind::Ollama => {
                let cfg = config.ollama.clone().unwrap_or_default();
                Ok(Box::new(super::ollama::OllamaProvider::new(
                    &cfg.endpoint,
                    model,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, OpenRouterConfig};

    #[test]
    fn test_refine_document_request() {
        let request = LlmRequest::refine_document("raw page text");
        assert!(request.prompt.ends_with("raw page text"));
        assert_eq!(request.max_tokens, 8192);
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_factory_builds_providers_with_literal_keys() {
        let config = LlmConfig {
            gemini: Some(GeminiConfig {
                api_key: "g-key".to_string(),
                ..Default::default()
            }),
            openrouter: Some(OpenRouterConfig {
                api_key: "or-key".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let gemini = LlmProviderFactory::create(ProviderKind::Gemini, &config, "gemini-2.5-pro")
            .unwrap();
        assert_eq!(gemini.name(), "gemini");

        let router = LlmProviderFactory::create(
            ProviderKind::OpenRouter,
            &config,
            "deepseek/deepseek-r1-0528:free",
        )
        .unwrap();
        assert_eq!(router.name(), "openrouter");
        assert_eq!(router.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_factory_reports_missing_key() {
        let config = LlmConfig {
            openai: Some(crate::config::OpenAiConfig {
                api_key: "${DEFINITELY_NOT_SET_OPENAI_XYZ}".to_string(),
            }),
            ..Default::default()
        };
        let err = LlmProviderFactory::create(ProviderKind::OpenAi, &config, "gpt-4o-mini")
            .err()
            .unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_factory_ollama_needs_no_key() {
        let provider =
            LlmProviderFactory::create(ProviderKind::Ollama, &LlmConfig::default(), "llama3.2")
                .unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}

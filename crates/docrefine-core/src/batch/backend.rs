//! Backend definitions: which provider and model a document is sent to.

use crate::config::LlmConfig;
use crate::error::RefineError;
use crate::llm::{LlmProvider, LlmProviderFactory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The closed set of supported LLM provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenRouter,
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("Unknown LLM provider: {other}")),
        }
    }
}

/// Static description of one backend in the rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider-side model identifier
    pub name: String,
    /// Short identifier used in output file names and reports
    pub short_name: String,
    /// Which provider serves this model
    pub provider: ProviderKind,
    /// Pause after each successful call, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

impl BackendConfig {
    pub fn new(name: &str, short_name: &str, provider: ProviderKind, delay_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            short_name: short_name.to_string(),
            provider,
            delay_ms,
        }
    }

    /// Post-call politeness delay.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// A configured backend paired with a ready-to-use provider client.
#[derive(Clone)]
pub struct Backend {
    pub config: BackendConfig,
    pub provider: Arc<dyn LlmProvider>,
}

impl Backend {
    pub fn new(config: BackendConfig, provider: Box<dyn LlmProvider>) -> Self {
        Self {
            config,
            provider: Arc::from(provider),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.config.short_name
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Narrow the configured backends to the given short names.
///
/// An empty `names` keeps every backend. Configured order is preserved and
/// an unknown short name is an error.
pub fn select_backends(
    configs: &[BackendConfig],
    names: &[String],
) -> Result<Vec<BackendConfig>, RefineError> {
    if names.is_empty() {
        return Ok(configs.to_vec());
    }
    if let Some(unknown) = names
        .iter()
        .find(|name| !configs.iter().any(|c| &c.short_name == *name))
    {
        return Err(RefineError::UnknownBackend {
            name: unknown.clone(),
            known: configs
                .iter()
                .map(|c| c.short_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(configs
        .iter()
        .filter(|c| names.contains(&c.short_name))
        .cloned()
        .collect())
}

/// Build ready-to-use backends from configuration, in configured order.
///
/// `only` restricts the list to one provider kind. Backends whose provider
/// cannot be constructed (typically a missing API key) are skipped with a
/// warning. Fails when nothing usable remains.
pub fn build_backends(
    configs: &[BackendConfig],
    llm: &LlmConfig,
    only: Option<ProviderKind>,
) -> Result<Vec<Backend>, RefineError> {
    let mut backends = Vec::new();
    for config in configs {
        if only.is_some_and(|kind| kind != config.provider) {
            continue;
        }
        match LlmProviderFactory::create(config.provider, llm, &config.name) {
            Ok(provider) => backends.push(Backend::new(config.clone(), provider)),
            Err(e) => tracing::warn!("Skipping backend {}: {e}", config.short_name),
        }
    }

    if backends.is_empty() {
        let scope = match only {
            Some(kind) => format!("no usable {kind} backends configured"),
            None => "no usable backends configured".to_string(),
        };
        return Err(RefineError::NoBackends(scope));
    }

    tracing::info!(
        "Using {} backends: {}",
        backends.len(),
        backends
            .iter()
            .map(|b| b.short_name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    fn mixed_configs() -> Vec<BackendConfig> {
        vec![
            BackendConfig::new("llama3.2", "local_llama", ProviderKind::Ollama, 0),
            BackendConfig::new("gpt-4o-mini", "gpt4o_mini", ProviderKind::OpenAi, 0),
            BackendConfig::new("qwen2.5", "local_qwen", ProviderKind::Ollama, 0),
        ]
    }

    fn llm_without_openai_key() -> LlmConfig {
        LlmConfig {
            openai: Some(OpenAiConfig {
                api_key: "${DEFINITELY_NOT_SET_OPENAI_BACKENDS}".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_backends_skips_unconstructible() {
        let backends = build_backends(&mixed_configs(), &llm_without_openai_key(), None).unwrap();
        let names: Vec<&str> = backends.iter().map(|b| b.short_name()).collect();
        assert_eq!(names, ["local_llama", "local_qwen"]);
    }

    #[test]
    fn test_build_backends_only_filter() {
        let err = build_backends(
            &mixed_configs(),
            &llm_without_openai_key(),
            Some(ProviderKind::OpenAi),
        )
        .unwrap_err();
        assert!(matches!(err, RefineError::NoBackends(_)));

        let only_ollama = build_backends(
            &mixed_configs(),
            &LlmConfig::default(),
            Some(ProviderKind::Ollama),
        )
        .unwrap();
        assert_eq!(only_ollama.len(), 2);
    }

    #[test]
    fn test_select_backends_by_short_name() {
        let configs = mixed_configs();
        let picked = select_backends(
            &configs,
            &["local_qwen".to_string(), "local_llama".to_string()],
        )
        .unwrap();
        let names: Vec<&str> = picked.iter().map(|c| c.short_name.as_str()).collect();
        assert_eq!(names, ["local_llama", "local_qwen"]);

        assert_eq!(select_backends(&configs, &[]).unwrap(), configs);

        let err = select_backends(&configs, &["mistral".to_string()]).unwrap_err();
        assert!(matches!(err, RefineError::UnknownBackend { ref name, .. } if name == "mistral"));
        assert!(err.to_string().contains("gpt4o_mini"));
    }

    #[test]
    fn test_build_backends_empty_list_fails() {
        assert!(build_backends(&[], &LlmConfig::default(), None).is_err());
    }

    #[test]
    fn test_provider_kind_parse_and_display() {
        assert_eq!("gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("OpenRouter".parse::<ProviderKind>(), Ok(ProviderKind::OpenRouter));
        assert!("bard".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_backend_config_delay() {
        let cfg = BackendConfig::new("m", "s", ProviderKind::Ollama, 1500);
        assert_eq!(cfg.delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_provider_kind_serde_lowercase() {
        let cfg: BackendConfig = toml::from_str(
            "name = \"gemini-2.5-pro\"\nshort_name = \"g\"\nprovider = \"gemini\"\n",
        )
        .unwrap();
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.delay_ms, 0);
    }
}

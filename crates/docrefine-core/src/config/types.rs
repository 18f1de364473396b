//! Sub-configuration structs and their defaults.

use crate::batch::backend::{BackendConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the raw scraped documents
    pub input_dir: PathBuf,

    /// Directory receiving refined documents and run reports
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Barba_Docs"),
            output_dir: PathBuf::from("Barba_Docs_Refined"),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of documents in flight at once
    pub max_parallel: usize,

    /// Extension (without dot) of input documents
    pub input_extension: String,

    /// Prefix marking refined output files
    pub output_marker: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            input_extension: "txt".to_string(),
            output_marker: "refined_".to_string(),
        }
    }
}

/// Retry policy for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts per document (0 disables retries)
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,

    /// Upper bound of random jitter added to each backoff, in milliseconds
    pub retry_jitter_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 0,
            retry_delay_ms: 1000,
            retry_jitter_ms: 250,
        }
    }
}

/// Timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// LLM call timeout in milliseconds; unset uses each provider's own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_timeout_ms: Option<u64>,

    /// Page fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: None,
            fetch_timeout_ms: 60_000,
        }
    }
}

/// Scraper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// URL prefix stripped when deriving topic names
    pub base_url: String,

    /// File name prefix for scraped documents
    pub prefix: String,

    /// Directory receiving scraped documents
    pub output_dir: PathBuf,

    /// Pause between consecutive requests in milliseconds
    pub delay_ms: u64,

    /// Pages with less trimmed content than this are reported as empty
    pub min_content_chars: usize,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// URLs to scrape when no URL file is given on the command line
    pub urls: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gsap.com/docs/v3/GSAP/".to_string(),
            prefix: "gsap".to_string(),
            output_dir: PathBuf::from("Gsap_Docs"),
            delay_ms: 2000,
            min_content_chars: 100,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            urls: Vec::new(),
        }
    }
}

/// Multi-model comparison settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Maximum concurrent backend calls
    pub max_parallel: usize,

    /// Directory receiving comparison outputs and report
    pub output_dir: PathBuf,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            max_parallel: 3,
            output_dir: PathBuf::from("Gsap_Docs_refined"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Also write per-item results as JSON Lines next to the report
    pub results_log: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,

    /// Optional log file receiving a plain-text copy of all log lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Google Gemini configuration
    pub gemini: Option<GeminiConfig>,

    /// OpenRouter configuration
    pub openrouter: Option<OpenRouterConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,

    /// Ollama (local) configuration
    pub ollama: Option<OllamaConfig>,
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API endpoint (model path is appended)
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: "${GEMINI_API_KEY}".to_string(),
        }
    }
}

/// OpenRouter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Sent as the HTTP-Referer attribution header
    pub referer: String,

    /// Sent as the X-Title attribution header
    pub title: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            api_key: "${OPENROUTER_API_KEY}".to_string(),
            referer: "https://localhost:3000".to_string(),
            title: "Advanced Document Refiner".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
        }
    }
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
        }
    }
}

/// The default backend rotation.
pub fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new("gemini-2.5-pro", "gemini_25_pro", ProviderKind::Gemini, 8000),
        BackendConfig::new(
            "deepseek/deepseek-r1-0528-qwen3-8b:free",
            "deepseek_qwen3_8b",
            ProviderKind::OpenRouter,
            8000,
        ),
        BackendConfig::new(
            "deepseek/deepseek-r1-0528:free",
            "deepseek_r1",
            ProviderKind::OpenRouter,
            8000,
        ),
        BackendConfig::new(
            "meta-llama/llama-3.1-405b-instruct:free",
            "llama_405b",
            ProviderKind::OpenRouter,
            8000,
        ),
        BackendConfig::new(
            "mistralai/mistral-small-3.1-24b-instruct:free",
            "mistral_small",
            ProviderKind::OpenRouter,
            8000,
        ),
    ]
}

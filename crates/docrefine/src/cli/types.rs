//! CLI-specific enums for clap argument parsing.

use clap::ValueEnum;
use docrefine_core::batch::ProviderKind;
use docrefine_core::ReportFormat;

/// LLM provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Gemini,
    Openrouter,
    Openai,
    Anthropic,
    Ollama,
}

impl From<Provider> for ProviderKind {
    fn from(p: Provider) -> Self {
        match p {
            Provider::Gemini => ProviderKind::Gemini,
            Provider::Openrouter => ProviderKind::OpenRouter,
            Provider::Openai => ProviderKind::OpenAi,
            Provider::Anthropic => ProviderKind::Anthropic,
            Provider::Ollama => ProviderKind::Ollama,
        }
    }
}

/// Report rendering format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    /// Markdown text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(f: ReportFormatArg) -> Self {
        match f {
            ReportFormatArg::Text => ReportFormat::Text,
            ReportFormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Mode description for the run banner.
pub fn mode_label(only: Option<ProviderKind>) -> String {
    match only {
        Some(kind) => format!("{} only", kind.as_str().to_uppercase()),
        None => "ALL PROVIDERS".to_string(),
    }
}

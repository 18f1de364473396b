//! LLM integration for documentation refinement.
//!
//! Provides a provider abstraction over multiple hosted LLM backends
//! (Gemini, OpenRouter, OpenAI, Anthropic, Ollama), the fixed refining
//! prompt, and retry classification for transient failures.

pub(crate) mod anthropic;
pub(crate) mod gemini;
mod http;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod openrouter;
pub mod prompt;
pub(crate) mod provider;
pub mod retry;

pub use provider::{resolve_env_var, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse};

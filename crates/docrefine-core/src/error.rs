//! Error types for docrefine.
//!
//! Setup and configuration errors are fatal to a run. Pipeline errors are
//! scoped to a single work item (or URL) and are absorbed at the item
//! boundary, ending up in the run report instead of aborting the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for docrefine operations.
#[derive(Error, Debug)]
pub enum RefineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-item pipeline errors surfaced at the top level
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// No usable backend after filtering and provider construction
    #[error("No backends available: {0}")]
    NoBackends(String),

    /// A requested short name matches no configured backend
    #[error("Unknown backend '{name}' (configured: {known})")]
    UnknownBackend { name: String, known: String },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors scoped to one work item or one fetched URL.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading the source document failed
    #[error("Read error for {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Writing the refined document failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Provider call failed
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {target} after {timeout_ms}ms")]
    Timeout {
        stage: String,
        target: String,
        timeout_ms: u64,
    },

    /// Fetching a page failed
    #[error("Fetch error for {url}: {message}")]
    Fetch {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// A page fetched fine but carried too little content to be useful
    #[error("Empty or suspicious content for {url}: {chars} chars (< {min_chars})")]
    EmptyContent {
        url: String,
        chars: usize,
        min_chars: usize,
    },
}

//! Per-item outcome records.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of processing one work item. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Source file name
    pub file_name: String,

    /// Short name of the backend the item was assigned to
    pub backend: String,

    pub success: bool,

    /// Output file name, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Error text, on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall time spent on the item, excluding the post-call delay
    pub processing_time_secs: f64,

    /// Characters of generated output (0 on failure)
    pub content_length: usize,

    /// Token usage reported by the provider, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl ProcessingResult {
    pub fn success(
        file_name: &str,
        backend: &str,
        output_file: String,
        elapsed: Duration,
        content_length: usize,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            backend: backend.to_string(),
            success: true,
            output_file: Some(output_file),
            error: None,
            processing_time_secs: elapsed.as_secs_f64(),
            content_length,
            tokens_used: None,
        }
    }

    pub fn with_tokens_used(mut self, tokens_used: Option<u32>) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn failure(file_name: &str, backend: &str, error: String, elapsed: Duration) -> Self {
        Self {
            file_name: file_name.to_string(),
            backend: backend.to_string(),
            success: false,
            output_file: None,
            error: Some(error),
            processing_time_secs: elapsed.as_secs_f64(),
            content_length: 0,
            tokens_used: None,
        }
    }

    pub fn processing_time(&self) -> Duration {
        Duration::from_secs_f64(self.processing_time_secs.max(0.0))
    }
}

/// Truncate error text for log lines, on a char boundary.
pub fn truncate_error(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}

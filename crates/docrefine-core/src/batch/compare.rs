//! Multi-model comparison: one document through every backend.
//!
//! Every backend refines the same source text, bounded by the comparison
//! parallelism. The report ranks the outputs by length and by speed so the
//! best-suited model can be picked by hand.

use super::backend::Backend;
use super::naming;
use super::report::group_thousands;
use crate::error::PipelineError;
use crate::io::DocumentStore;
use crate::llm::retry::{self, RetryPolicy};
use crate::llm::LlmRequest;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Errors are cut to this many characters in the report.
const REPORT_ERROR_CHARS: usize = 100;

/// Configuration for one comparison run.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub max_parallel: usize,
    pub output_dir: PathBuf,
    pub output_marker: String,
    pub retry: RetryPolicy,
}

/// Outcome of running the document through one backend.
#[derive(Debug, Clone, Serialize)]
pub struct ModelOutcome {
    pub backend: String,
    /// Provider-side model identifier
    pub model: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub response_length: usize,
    pub word_count: usize,
    pub processing_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs one document through all backends.
pub struct ModelComparison {
    backends: Vec<Backend>,
    store: Arc<dyn DocumentStore>,
    options: CompareOptions,
}

impl ModelComparison {
    pub fn new(
        backends: Vec<Backend>,
        store: Arc<dyn DocumentStore>,
        options: CompareOptions,
    ) -> Self {
        Self {
            backends,
            store,
            options,
        }
    }

    /// Refine `input` with every backend, invoking `on_outcome` as each finishes.
    ///
    /// Failing to read the input is fatal; backend failures are recorded.
    pub async fn run<F>(
        &self,
        input: &Path,
        mut on_outcome: F,
    ) -> Result<Vec<ModelOutcome>, PipelineError>
    where
        F: FnMut(&ModelOutcome),
    {
        let document = self.store.read_to_string(input).await?;
        let request = LlmRequest::refine_document(&document);
        let target = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut pending = stream::iter(self.backends.iter())
            .map(|backend| self.run_one(backend, &request, &target))
            .buffer_unordered(self.options.max_parallel.max(1));

        let mut outcomes = Vec::with_capacity(self.backends.len());
        while let Some(outcome) = pending.next().await {
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn run_one(&self, backend: &Backend, request: &LlmRequest, target: &str) -> ModelOutcome {
        let start = Instant::now();
        tracing::info!("Starting {}: {}", backend.short_name(), backend.config.name);

        let result = async {
            let response = retry::generate_with_retry(
                backend.provider.as_ref(),
                request,
                &self.options.retry,
                target,
            )
            .await?;
            let elapsed = start.elapsed();
            tracing::debug!(
                "{}: provider latency {}ms, tokens {:?}",
                backend.short_name(),
                response.latency_ms,
                response.tokens_used
            );
            let output_file = format!(
                "{}{}_{}.txt",
                self.options.output_marker,
                backend.short_name(),
                naming::timestamp()
            );
            self.store
                .write(&self.options.output_dir.join(&output_file), &response.text)
                .await?;
            Ok::<_, PipelineError>((response, output_file, elapsed))
        }
        .await;

        match result {
            Ok((response, output_file, elapsed)) => {
                let response_length = response.text.chars().count();
                let word_count = response.text.split_whitespace().count();
                tracing::info!(
                    "{}: {response_length} chars, {word_count} words in {:.2}s",
                    backend.short_name(),
                    elapsed.as_secs_f64()
                );
                ModelOutcome {
                    backend: backend.short_name().to_string(),
                    model: backend.config.name.clone(),
                    success: true,
                    output_file: Some(output_file),
                    response_length,
                    word_count,
                    processing_time_secs: elapsed.as_secs_f64(),
                    tokens_used: response.tokens_used,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("{}: {e}", backend.short_name());
                ModelOutcome {
                    backend: backend.short_name().to_string(),
                    model: backend.config.name.clone(),
                    success: false,
                    output_file: None,
                    response_length: 0,
                    word_count: 0,
                    processing_time_secs: start.elapsed().as_secs_f64(),
                    tokens_used: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Comparison report over all backend outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub generated_at: String,
    pub input_file: String,
    pub total_models: usize,
    pub total_time_secs: f64,
    /// Successful outcomes, longest response first
    pub by_length: Vec<ModelOutcome>,
    /// Successful outcomes, fastest first
    pub by_speed: Vec<ModelOutcome>,
    pub failed: Vec<ModelOutcome>,
    pub average_length: f64,
    pub average_words: f64,
    pub average_secs: f64,
}

impl ComparisonReport {
    pub fn from_outcomes(
        outcomes: &[ModelOutcome],
        input_file: &str,
        total_time: Duration,
    ) -> Self {
        let mut by_length: Vec<ModelOutcome> =
            outcomes.iter().filter(|o| o.success).cloned().collect();
        by_length.sort_by(|a, b| b.response_length.cmp(&a.response_length));

        let mut by_speed = by_length.clone();
        by_speed.sort_by(|a, b| a.processing_time_secs.total_cmp(&b.processing_time_secs));

        let n = by_length.len();
        let mean = |f: fn(&ModelOutcome) -> f64| {
            if n == 0 {
                0.0
            } else {
                by_length.iter().map(f).sum::<f64>() / n as f64
            }
        };
        let average_length = mean(|o| o.response_length as f64);
        let average_words = mean(|o| o.word_count as f64);
        let average_secs = mean(|o| o.processing_time_secs);

        Self {
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            input_file: input_file.to_string(),
            total_models: outcomes.len(),
            total_time_secs: total_time.as_secs_f64(),
            failed: outcomes.iter().filter(|o| !o.success).cloned().collect(),
            by_length,
            by_speed,
            average_length,
            average_words,
            average_secs,
        }
    }

    /// Most comprehensive (longest) successful output.
    pub fn most_comprehensive(&self) -> Option<&ModelOutcome> {
        self.by_length.first()
    }

    pub fn fastest(&self) -> Option<&ModelOutcome> {
        self.by_speed.first()
    }

    /// File name of the rendered report.
    pub fn file_name(ts: &str) -> String {
        format!("model_comparison_report_{ts}.txt")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Multi-Model Comparison Report\n");
        let _ = writeln!(out, "**Generated:** {}", self.generated_at);
        let _ = writeln!(out, "**Input File:** {}", self.input_file);
        let _ = writeln!(out, "**Total Models:** {}", self.total_models);
        let _ = writeln!(out, "**Successful:** {}", self.by_length.len());
        let _ = writeln!(out, "**Failed:** {}", self.failed.len());
        let _ = writeln!(out, "**Total Processing Time:** {:.2} seconds\n", self.total_time_secs);

        let _ = writeln!(out, "## 📊 Performance Summary\n");
        let _ = writeln!(
            out,
            "| Model | Status | Response Length | Word Count | Processing Time | Output File |"
        );
        let _ = writeln!(
            out,
            "|-------|--------|----------------|------------|----------------|-------------|"
        );
        for o in &self.by_length {
            let _ = writeln!(
                out,
                "| {} | ✅ Success | {} chars | {} words | {:.2}s | {} |",
                o.backend,
                group_thousands(o.response_length),
                group_thousands(o.word_count),
                o.processing_time_secs,
                o.output_file.as_deref().unwrap_or("-")
            );
        }
        for o in &self.failed {
            let _ = writeln!(out, "| {} | ❌ Failed | - | - | - | Error occurred |", o.backend);
        }

        if !self.by_length.is_empty() {
            let _ = writeln!(out, "\n## 🏆 Performance Rankings\n");
            let _ = writeln!(out, "### By Response Length (Most Comprehensive)");
            for (i, o) in self.by_length.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. **{}**: {} characters",
                    i + 1,
                    o.backend,
                    group_thousands(o.response_length)
                );
            }
            let _ = writeln!(out, "\n### By Processing Speed (Fastest)");
            for (i, o) in self.by_speed.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. **{}**: {:.2} seconds",
                    i + 1,
                    o.backend,
                    o.processing_time_secs
                );
            }

            let _ = writeln!(out, "\n## 📈 Averages");
            let _ = writeln!(
                out,
                "- **Average Response Length:** {} characters",
                group_thousands(self.average_length.round() as usize)
            );
            let _ = writeln!(
                out,
                "- **Average Word Count:** {} words",
                group_thousands(self.average_words.round() as usize)
            );
            let _ = writeln!(
                out,
                "- **Average Processing Time:** {:.2} seconds",
                self.average_secs
            );

            if let (Some(best), Some(fastest)) = (self.most_comprehensive(), self.fastest()) {
                let _ = writeln!(out, "\n## 🎯 Recommendations");
                let _ = writeln!(
                    out,
                    "- **Most Comprehensive:** {} ({} chars)",
                    best.backend,
                    group_thousands(best.response_length)
                );
                let _ = writeln!(
                    out,
                    "- **Fastest Processing:** {} ({:.2}s)",
                    fastest.backend, fastest.processing_time_secs
                );
            }
        }

        if !self.failed.is_empty() {
            let _ = writeln!(out, "\n## ❌ Failed Models ({})", self.failed.len());
            for o in &self.failed {
                let error = o.error.as_deref().unwrap_or_default();
                let cut: String = error.chars().take(REPORT_ERROR_CHARS).collect();
                let _ = writeln!(out, "- **{}**: {cut}...", o.backend);
            }
        }

        let _ = writeln!(out, "\n## 📁 Generated Files");
        for o in &self.by_length {
            if let Some(file) = &o.output_file {
                let _ = writeln!(out, "- {file}");
            }
        }

        let _ = writeln!(out, "\n## 💡 Next Steps");
        let _ = writeln!(out, "1. Review each output file to compare quality");
        let _ = writeln!(out, "2. Check for technical accuracy and completeness");
        let _ = writeln!(out, "3. Evaluate markdown formatting and structure");
        let _ = writeln!(out, "4. Choose the best model for your RAG system");
        let _ = writeln!(out, "5. Consider using the most comprehensive result as your base");
        out
    }
}

//! Run report: aggregate statistics over per-item results.

use super::result::ProcessingResult;
use crate::error::PipelineError;
use crate::io::DocumentStore;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run-level facts that are not derivable from the results.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    /// Human-readable generation time, `YYYY-mm-dd HH:MM:SS`
    pub generated_at: String,
    pub output_dir: PathBuf,
    pub max_parallel: usize,
    /// Wall-clock duration of the run
    pub wall_time_secs: f64,
}

impl ReportContext {
    pub fn now(output_dir: &Path, max_parallel: usize, wall_time: Duration) -> Self {
        Self {
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            output_dir: output_dir.to_path_buf(),
            max_parallel,
            wall_time_secs: wall_time.as_secs_f64(),
        }
    }
}

/// Per-backend tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStats {
    pub backend: String,
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEntry {
    pub file_name: String,
    pub output_file: String,
    pub backend: String,
    pub processing_time_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub file_name: String,
    pub backend: String,
    pub error: String,
}

/// Aggregate report for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub context: ReportContext,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage, 0 when there were no items
    pub success_rate: f64,
    /// Sum of per-item processing times
    pub total_processing_secs: f64,
    pub average_secs: f64,
    /// Characters generated across successful items
    pub total_content_chars: usize,
    /// In order of first appearance in the results
    pub backends: Vec<BackendStats>,
    pub successes: Vec<SuccessEntry>,
    pub failures: Vec<FailureEntry>,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl BatchReport {
    pub fn from_results(results: &[ProcessingResult], context: ReportContext) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let total_processing_secs: f64 = results.iter().map(|r| r.processing_time_secs).sum();
        let average_secs = if total == 0 {
            0.0
        } else {
            total_processing_secs / total as f64
        };

        let mut backends: Vec<BackendStats> = Vec::new();
        for r in results {
            let idx = match backends.iter().position(|b| b.backend == r.backend) {
                Some(idx) => idx,
                None => {
                    backends.push(BackendStats {
                        backend: r.backend.clone(),
                        attempts: 0,
                        successes: 0,
                        failures: 0,
                        success_rate: 0.0,
                    });
                    backends.len() - 1
                }
            };
            let stats = &mut backends[idx];
            stats.attempts += 1;
            if r.success {
                stats.successes += 1;
            } else {
                stats.failures += 1;
            }
        }
        for stats in &mut backends {
            stats.success_rate = percent(stats.successes, stats.attempts);
        }

        let successes = results
            .iter()
            .filter(|r| r.success)
            .map(|r| SuccessEntry {
                file_name: r.file_name.clone(),
                output_file: r.output_file.clone().unwrap_or_default(),
                backend: r.backend.clone(),
                processing_time_secs: r.processing_time_secs,
            })
            .collect();

        let failures = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| FailureEntry {
                file_name: r.file_name.clone(),
                backend: r.backend.clone(),
                error: r.error.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            context,
            total,
            successful,
            failed: total - successful,
            success_rate: percent(successful, total),
            total_processing_secs,
            average_secs,
            total_content_chars: results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.content_length)
                .sum(),
            backends,
            successes,
            failures,
        }
    }

    /// Render the Markdown report text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Advanced Batch Document Refining Report\n");
        let _ = writeln!(out, "**Generated:** {}", self.context.generated_at);
        let _ = writeln!(out, "**Total Files:** {}", self.total);
        let _ = writeln!(out, "**Successful:** {}", self.successful);
        let _ = writeln!(out, "**Failed:** {}", self.failed);
        let _ = writeln!(out, "**Success Rate:** {:.1}%\n", self.success_rate);

        let _ = writeln!(out, "## ⏱️ Performance Metrics");
        let _ = writeln!(
            out,
            "- **Total Processing Time:** {:.1} seconds ({:.1} minutes)",
            self.total_processing_secs,
            self.total_processing_secs / 60.0
        );
        let _ = writeln!(out, "- **Average Time per File:** {:.1} seconds", self.average_secs);
        let _ = writeln!(
            out,
            "- **Wall-Clock Duration:** {:.1} seconds",
            self.context.wall_time_secs
        );
        let _ = writeln!(
            out,
            "- **Total Content Generated:** {} characters",
            group_thousands(self.total_content_chars)
        );
        let _ = writeln!(
            out,
            "- **Parallel Processing:** Up to {} files simultaneously\n",
            self.context.max_parallel
        );

        let _ = writeln!(out, "## 📊 Model Performance");
        for b in &self.backends {
            let _ = writeln!(
                out,
                "- **{}:** {}/{} ({:.1}% success)",
                b.backend, b.successes, b.attempts, b.success_rate
            );
        }

        if !self.successes.is_empty() {
            let _ = writeln!(out, "\n## ✅ Successfully Processed ({})", self.successes.len());
            for s in &self.successes {
                let _ = writeln!(
                    out,
                    "- `{}` → `{}` ({}, {:.1}s)",
                    s.file_name, s.output_file, s.backend, s.processing_time_secs
                );
            }
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out, "\n## ❌ Failed Processing ({})", self.failures.len());
            for f in &self.failures {
                let _ = writeln!(out, "- `{}` ({}): {}", f.file_name, f.backend, f.error);
            }
        }

        let _ = writeln!(
            out,
            "\n## 📁 Output Directory\n`{}/`",
            self.context.output_dir.display()
        );
        let _ = writeln!(out, "\n## 🚀 Next Steps");
        let _ = writeln!(out, "- All refined files are ready for RAG ingestion");
        let _ = writeln!(out, "- Consider running quality checks on failed files");
        let _ = writeln!(out, "- Files can be reprocessed individually if needed");
        out
    }

    /// Write the rendered report into `dir` under `file_name`.
    pub async fn write_to(
        &self,
        store: &dyn DocumentStore,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, PipelineError> {
        let path = dir.join(file_name);
        store.write(&path, &self.render()).await?;
        tracing::info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

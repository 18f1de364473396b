//! Refine setup: CLI overrides and batch options.

use docrefine_core::batch::BatchOptions;
use docrefine_core::llm::retry::RetryPolicy;
use docrefine_core::Config;
use std::path::Path;

use super::RefineArgs;

fn expand(path: &Path) -> std::path::PathBuf {
    std::path::PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &RefineArgs) -> anyhow::Result<()> {
    if let Some(ref input) = args.input {
        config.general.input_dir = expand(input);
    }
    if let Some(ref output) = args.output {
        config.general.output_dir = expand(output);
    }
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            anyhow::bail!("--parallel must be at least 1");
        }
        config.processing.max_parallel = parallel;
    }
    if let Some(attempts) = args.retry_attempts {
        config.pipeline.retry_attempts = attempts;
    }
    if args.results_log {
        config.output.results_log = true;
    }
    Ok(())
}

/// Batch options derived from the effective configuration.
pub fn batch_options(config: &Config) -> BatchOptions {
    BatchOptions {
        max_parallel: config.processing.max_parallel,
        output_dir: config.output_dir(),
        output_marker: config.processing.output_marker.clone(),
        retry: RetryPolicy::from_config(&config.pipeline, &config.limits),
    }
}

//! The `docrefine compare` command: one document through every backend.

use super::types::{mode_label, Provider};
use clap::Args;
use console::Style;
use docrefine_core::batch::{
    build_backends, naming, select_backends, CompareOptions, ComparisonReport, ModelComparison,
    ModelOutcome, ProviderKind,
};
use docrefine_core::llm::retry::RetryPolicy;
use docrefine_core::{Config, DocumentStore, FsStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the `compare` command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Document to refine with every backend
    pub input: PathBuf,

    /// Directory for outputs and the comparison report (defaults to compare.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum concurrent backend calls
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Only use backends of this provider
    #[arg(long, value_enum)]
    pub only: Option<Provider>,

    /// Only use the backend with this short name (repeatable)
    #[arg(short, long = "backend", value_name = "SHORT_NAME")]
    pub backends: Vec<String>,
}

/// Execute the compare command.
pub async fn execute(args: CompareArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    if let Some(ref output) = args.output {
        config.compare.output_dir = output.clone();
    }
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            anyhow::bail!("--parallel must be at least 1");
        }
        config.compare.max_parallel = parallel;
    }

    let only = args.only.map(ProviderKind::from);
    let selected = select_backends(&config.backends, &args.backends)?;
    let backends = build_backends(&selected, &config.llm, only)?;
    let output_dir = config.compare_dir();
    let options = CompareOptions {
        max_parallel: config.compare.max_parallel,
        output_dir: output_dir.clone(),
        output_marker: config.processing.output_marker.clone(),
        retry: RetryPolicy::from_config(&config.pipeline, &config.limits),
    };

    let rule = "=".repeat(70);
    eprintln!("{rule}");
    eprintln!("🚀 Multi-Model Parallel Comparison");
    eprintln!("{rule}");
    eprintln!("📄 Input: {}", args.input.display());
    eprintln!("🎯 Mode: {}", mode_label(only));
    eprintln!("🤖 Models: {}", backends.len());
    eprintln!("⚡ Parallel: {}", options.max_parallel);
    eprintln!("{rule}");

    let store = Arc::new(FsStore);
    let comparison = ModelComparison::new(backends, store.clone(), options);
    let start = Instant::now();
    let outcomes = comparison.run(&args.input, print_outcome).await?;

    let input_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report = ComparisonReport::from_outcomes(&outcomes, &input_name, start.elapsed());
    let path = output_dir.join(ComparisonReport::file_name(&naming::timestamp()));
    store.write(&path, &report.render()).await?;
    tracing::info!("Comparison report saved: {}", path.display());

    eprintln!();
    eprintln!(
        "✅ Successful: {}/{}",
        report.by_length.len(),
        report.total_models
    );
    if let Some(best) = report.most_comprehensive() {
        eprintln!(
            "📝 Most comprehensive: {} ({} chars)",
            best.backend, best.response_length
        );
    }
    if let Some(fastest) = report.fastest() {
        eprintln!(
            "⚡ Fastest: {} ({:.2}s)",
            fastest.backend, fastest.processing_time_secs
        );
    }
    eprintln!("📁 Report: {}", path.display());
    Ok(())
}

fn print_outcome(outcome: &ModelOutcome) {
    if outcome.success {
        let green = Style::new().for_stderr().green();
        eprintln!(
            "{} {}: {} chars, {} words in {:.2}s",
            green.apply_to("✅"),
            outcome.backend,
            outcome.response_length,
            outcome.word_count,
            outcome.processing_time_secs
        );
    } else {
        let red = Style::new().for_stderr().red();
        let error = outcome.error.as_deref().unwrap_or_default();
        eprintln!(
            "{} {}: {}",
            red.apply_to("❌"),
            outcome.backend,
            docrefine_core::batch::result::truncate_error(error, 100)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CompareArgs,
    }

    #[test]
    fn test_backend_flag_repeats() {
        let argv = ["compare", "doc.txt", "-b", "gemini_25_pro", "--backend", "kimi_k2"];
        let parsed = Wrapper::try_parse_from(argv).unwrap();
        assert_eq!(parsed.args.backends, ["gemini_25_pro", "kimi_k2"]);

        let parsed = Wrapper::try_parse_from(["compare", "doc.txt"]).unwrap();
        assert!(parsed.args.backends.is_empty());
    }

    #[test]
    fn test_unknown_backend_rejected_before_any_call() {
        let config = Config::default();
        let err = select_backends(&config.backends, &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}

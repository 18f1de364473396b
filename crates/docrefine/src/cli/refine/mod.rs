//! The `docrefine refine` command: batch refinement of a document directory.

mod progress;
mod setup;

use clap::Args;
use docrefine_core::batch::{
    build_backends, naming, BackendRotation, BatchProcessor, BatchReport, FileDiscovery,
    ProcessingResult, ProviderKind, ReportContext,
};
use docrefine_core::output;
use docrefine_core::{Config, DocumentStore, FsStore, ReportFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::types::{mode_label, Provider, ReportFormatArg};
use progress::Banner;
use setup::{apply_overrides, batch_options};

/// Arguments for the `refine` command.
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// Directory of raw documents (defaults to general.input_dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for refined documents and reports (defaults to general.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum documents in flight at once
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Only use backends of this provider
    #[arg(long, value_enum)]
    pub only: Option<Provider>,

    /// Retries per document for transient provider errors
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub report_format: ReportFormatArg,

    /// Also write per-document results as JSON Lines
    #[arg(long)]
    pub results_log: bool,
}

/// Values match the clap defaults above.
impl Default for RefineArgs {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            parallel: None,
            only: None,
            retry_attempts: None,
            report_format: ReportFormatArg::Text,
            results_log: false,
        }
    }
}

/// Execute the refine command.
pub async fn execute(args: RefineArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args)?;
    let only = args.only.map(ProviderKind::from);

    let input_dir = config.input_dir();
    let output_dir = config.output_dir();
    if !input_dir.is_dir() {
        anyhow::bail!(
            "Input directory does not exist: {}\n\n  \
             Hint: run `docrefine scrape` first or pass --input.",
            input_dir.display()
        );
    }

    let rotation = BackendRotation::new(build_backends(&config.backends, &config.llm, only)?)?;

    // Outputs of every configured backend count as done, not just the selected ones
    let known: Vec<String> = config
        .backends
        .iter()
        .map(|b| b.short_name.clone())
        .collect();
    let discovery = FileDiscovery::new(config.processing.clone());
    let outcome = discovery.pending(&input_dir, &output_dir, &known);

    let options = batch_options(&config);
    let max_parallel = options.max_parallel;

    progress::print_banner(&Banner {
        input_dir: &input_dir,
        output_dir: &output_dir,
        mode: &mode_label(only),
        backends: &rotation.short_names(),
        max_parallel,
    });

    if outcome.remaining.is_empty() {
        tracing::info!("No files to process - all done!");
        return Ok(());
    }

    let items = outcome.remaining;
    tracing::debug!(
        "Pending input: {} bytes",
        FileDiscovery::total_size(&items)
    );
    progress::print_plan(items.len(), outcome.already_processed, max_parallel);

    let store = Arc::new(FsStore);
    let mut processor = BatchProcessor::new(rotation, store.clone(), options);
    let pb = progress::create_progress_bar(items.len() as u64);
    let start = Instant::now();

    let results = tokio::select! {
        results = processor.run(items, |result, snapshot| {
            progress::report_item(&pb, result, snapshot)
        }) => results,
        _ = tokio::signal::ctrl_c() => {
            pb.abandon();
            tracing::warn!("Processing interrupted by user");
            return Ok(());
        }
    };
    let wall_time = start.elapsed();
    pb.finish_and_clear();

    let context = ReportContext::now(&output_dir, max_parallel, wall_time);
    let report = BatchReport::from_results(&results, context);
    let ts = naming::timestamp();
    let format = args.report_format.into();
    write_report(store.as_ref(), &report, &output_dir, &ts, format).await?;
    if config.output.results_log {
        write_results_log(store.as_ref(), &results, &output_dir, &ts).await?;
    }

    progress::print_summary(&results, wall_time, &output_dir);
    Ok(())
}

async fn write_report(
    store: &dyn DocumentStore,
    report: &BatchReport,
    dir: &Path,
    ts: &str,
    format: ReportFormat,
) -> anyhow::Result<PathBuf> {
    let file_name = naming::report_file_name(ts, format.extension());
    let path = match format {
        ReportFormat::Text => report.write_to(store, dir, &file_name).await?,
        ReportFormat::Json => {
            let path = dir.join(&file_name);
            store.write(&path, &output::to_json(report, true)?).await?;
            tracing::info!("Report saved: {}", path.display());
            path
        }
    };
    Ok(path)
}

async fn write_results_log(
    store: &dyn DocumentStore,
    results: &[ProcessingResult],
    dir: &Path,
    ts: &str,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(naming::results_log_name(ts));
    store.write(&path, &output::to_jsonl(results)?).await?;
    tracing::info!("Results log saved: {}", path.display());
    Ok(path)
}

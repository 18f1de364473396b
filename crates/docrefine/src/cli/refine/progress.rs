//! Console output for batch runs: banner, per-item lines, summary.

use console::Style;
use docrefine_core::batch::{BatchProgress, ProcessingResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Seconds a single document is expected to take, before parallelism.
const SECS_PER_DOCUMENT: f64 = 12.0;

/// Batches larger than this get an extra banner line.
const LARGE_BATCH: usize = 100;

/// What the banner shows before a run starts.
pub struct Banner<'a> {
    pub input_dir: &'a Path,
    pub output_dir: &'a Path,
    pub mode: &'a str,
    pub backends: &'a [String],
    pub max_parallel: usize,
}

pub fn print_banner(banner: &Banner<'_>) {
    let bold = Style::new().for_stderr().bold();
    let cyan = Style::new().for_stderr().cyan();
    let rule = "=".repeat(70);

    eprintln!();
    eprintln!("{}", cyan.apply_to(&rule));
    eprintln!("{}", bold.apply_to("🚀 ADVANCED BATCH DOCUMENT REFINER"));
    eprintln!("{}", cyan.apply_to(&rule));
    eprintln!("📁 Input: {}/", banner.input_dir.display());
    eprintln!("📁 Output: {}/", banner.output_dir.display());
    eprintln!("🎯 Mode: {}", banner.mode);
    eprintln!(
        "🤖 Models: {} ({})",
        banner.backends.len(),
        banner.backends.join(", ")
    );
    eprintln!("⚡ Parallel: {} files simultaneously", banner.max_parallel);
    eprintln!("{}", cyan.apply_to(&rule));
}

/// Expected run time in minutes for `items` documents.
pub fn estimate_minutes(items: usize, max_parallel: usize) -> f64 {
    items as f64 * SECS_PER_DOCUMENT / max_parallel.max(1) as f64 / 60.0
}

pub fn print_plan(items: usize, already_processed: usize, max_parallel: usize) {
    eprintln!();
    if already_processed > 0 {
        eprintln!("⏭️  Skipping {already_processed} already refined files");
    }
    eprintln!("📊 Processing {items} files");
    eprintln!(
        "⏱️  Estimated time: {:.1} minutes",
        estimate_minutes(items, max_parallel)
    );
    if items > LARGE_BATCH {
        eprintln!("🔥 Large batch detected! Optimized for {items} files");
    }
    eprintln!("🎯 Starting parallel processing...\n");
}

/// Create a progress bar for batch processing.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

/// `[ i/total] ✅ file (backend) - ETA: 1.5m`
pub fn item_line(result: &ProcessingResult, progress: &BatchProgress) -> String {
    let status = if result.success { "✅" } else { "❌" };
    format!(
        "[{:2}/{}] {status} {} ({}) - ETA: {:.1}m",
        progress.completed,
        progress.total,
        result.file_name,
        result.backend,
        progress.eta.as_secs_f64() / 60.0
    )
}

/// Print one completed item above the bar and advance it.
pub fn report_item(pb: &ProgressBar, result: &ProcessingResult, progress: &BatchProgress) {
    pb.println(item_line(result, progress));
    pb.inc(1);
    let elapsed = progress.elapsed.as_secs_f64();
    if elapsed > 0.0 {
        pb.set_message(format!("{:.2} docs/min", progress.completed as f64 / elapsed * 60.0));
    }
}

/// Print the summary block after a run.
pub fn print_summary(results: &[ProcessingResult], wall_time: Duration, output_dir: &Path) {
    let successful = results.iter().filter(|r| r.success).count();
    let failed = results.len() - successful;
    let total = results.len();
    let rule = "=".repeat(60);
    let green = Style::new().for_stderr().green();
    let red = Style::new().for_stderr().red();

    eprintln!();
    eprintln!("{rule}");
    eprintln!("📊 BATCH REFINING PROGRESS SUMMARY");
    eprintln!("{rule}");
    eprintln!("{}", green.apply_to(format!("✅ Successful: {successful}")));
    if failed > 0 {
        eprintln!("{}", red.apply_to(format!("❌ Failed: {failed}")));
    } else {
        eprintln!("❌ Failed: 0");
    }
    eprintln!("📈 Total Processed: {total}");
    if total > 0 {
        eprintln!(
            "🎯 Success Rate: {:.1}%",
            successful as f64 / total as f64 * 100.0
        );
    }
    eprintln!("{rule}");
    eprintln!("\n🎉 Batch processing complete!");
    eprintln!("⏱️  Total time: {:.1} minutes", wall_time.as_secs_f64() / 60.0);
    eprintln!("📁 Check {}/ for refined files", output_dir.display());
}

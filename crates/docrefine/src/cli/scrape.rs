//! The `docrefine scrape` command: fetch documentation pages to text files.

use clap::Args;
use console::Style;
use docrefine_core::scrape::{HttpFetcher, PageOutcome, ScrapeOptions, Scraper};
use docrefine_core::{Config, FsStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the `scrape` command.
#[derive(Args, Debug, Default)]
pub struct ScrapeArgs {
    /// File with one URL per line (`#` starts a comment); defaults to scrape.urls
    #[arg(short, long)]
    pub urls: Option<PathBuf>,

    /// Directory for scraped documents (defaults to scrape.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File name prefix for scraped documents
    #[arg(long)]
    pub prefix: Option<String>,

    /// URL prefix stripped when naming topics
    #[arg(long)]
    pub base_url: Option<String>,

    /// Pause between requests in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

/// Execute the scrape command.
pub async fn execute(args: ScrapeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(prefix) = args.prefix {
        config.scrape.prefix = prefix;
    }
    if let Some(base_url) = args.base_url {
        config.scrape.base_url = base_url;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.scrape.delay_ms = delay_ms;
    }
    if let Some(ref output) = args.output {
        config.scrape.output_dir = output.clone();
    }

    let urls = match args.urls {
        Some(ref path) => read_url_file(path)?,
        None => config.scrape.urls.clone(),
    };
    if urls.is_empty() {
        anyhow::bail!(
            "No URLs to scrape.\n\n  \
             Hint: pass --urls <file> or set scrape.urls in the config file."
        );
    }

    let output_dir = config.scrape_dir();
    let fetcher = HttpFetcher::new(
        &config.scrape.user_agent,
        Duration::from_millis(config.limits.fetch_timeout_ms),
    )?;
    let options = ScrapeOptions::from_config(&config.scrape, output_dir.clone());
    let store = Arc::new(FsStore);
    let scraper = Scraper::new(Arc::new(fetcher), store.clone(), options);

    eprintln!("📊 Total URLs to scrape: {}", urls.len());
    let total = urls.len();
    let green = Style::new().for_stderr().green();
    let red = Style::new().for_stderr().red();
    let yellow = Style::new().for_stderr().yellow();

    let report = scraper
        .run(&urls, |i, outcome| match outcome {
            PageOutcome::Saved(page) => eprintln!(
                "[{i}/{total}] {} {} ({} chars)",
                green.apply_to("✅"),
                page.topic,
                page.size
            ),
            PageOutcome::Failed(page) => eprintln!(
                "[{i}/{total}] {} {}: {}",
                red.apply_to("❌"),
                page.topic,
                page.error
            ),
            PageOutcome::Empty(page) => eprintln!(
                "[{i}/{total}] {} {} ({} chars, skipped)",
                yellow.apply_to("⚠️"),
                page.topic,
                page.chars
            ),
        })
        .await;

    report
        .write_to(store.as_ref(), &output_dir, &config.scrape.prefix)
        .await?;

    eprintln!();
    eprintln!("  ✅ Successful: {}", report.successful.len());
    eprintln!("  ❌ Failed:     {}", report.failed.len());
    eprintln!("  ⚠️  Empty:      {}", report.empty.len());
    eprintln!(
        "  📈 Total content: {} characters",
        docrefine_core::batch::report::group_thousands(report.total_chars())
    );
    eprintln!("  ⏱️  Average time: {:.2}s per page", report.average_secs());
    eprintln!("  📁 Files saved to {}/", output_dir.display());
    Ok(())
}

/// Read a URL list: one URL per line, blank lines and `#` comments ignored.
fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read URL file {}: {e}", path.display()))?;
    Ok(parse_url_list(&content))
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list_skips_comments_and_blanks() {
        let urls = parse_url_list(concat!(
            "# core methods\n",
            "https://gsap.com/docs/v3/GSAP/\n",
            "\n",
            "  https://gsap.com/docs/v3/GSAP/gsap.to()  \n",
            "#https://skipped\n",
        ));
        assert_eq!(
            urls,
            [
                "https://gsap.com/docs/v3/GSAP/",
                "https://gsap.com/docs/v3/GSAP/gsap.to()"
            ]
        );
    }

    #[test]
    fn test_read_url_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://a.example/\nhttps://b.example/x\n").unwrap();
        assert_eq!(read_url_file(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_url_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_url_file(&dir.path().join("absent.txt")).is_err());
    }
}

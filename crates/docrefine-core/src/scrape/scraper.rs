//! Sequential documentation scraper.
//!
//! Pages are fetched one at a time with a pause between requests. Each page
//! lands in exactly one bucket: successful, failed, or empty.

use super::fetcher::ContentFetcher;
use crate::batch::naming;
use crate::config::ScrapeConfig;
use crate::error::PipelineError;
use crate::io::DocumentStore;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Settings for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub base_url: String,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub min_content_chars: usize,
}

impl ScrapeOptions {
    pub fn from_config(config: &ScrapeConfig, output_dir: PathBuf) -> Self {
        Self {
            base_url: config.base_url.clone(),
            prefix: config.prefix.clone(),
            output_dir,
            delay: Duration::from_millis(config.delay_ms),
            min_content_chars: config.min_content_chars,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapedPage {
    pub url: String,
    pub topic: String,
    pub file_name: String,
    /// Markdown characters
    pub size: usize,
    pub fetch_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPage {
    pub url: String,
    pub topic: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyPage {
    pub url: String,
    pub topic: String,
    pub chars: usize,
}

/// What happened to one URL, reported to the caller as it completes.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Saved(ScrapedPage),
    Failed(FailedPage),
    Empty(EmptyPage),
}

/// Results of a scrape run, bucketed by outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub generated_at: String,
    /// All URLs in submission order
    pub urls: Vec<String>,
    pub successful: Vec<ScrapedPage>,
    pub failed: Vec<FailedPage>,
    pub empty: Vec<EmptyPage>,
}

/// Derive a file-safe topic name from a page URL.
///
/// Strips `base_url`, drops `()`, and maps `/` and `.` to `_`. The base page
/// itself becomes `main`.
pub fn topic_name(url: &str, base_url: &str) -> String {
    let path = match url.strip_prefix(base_url) {
        Some(rest) => rest.to_string(),
        None => url::Url::parse(url)
            .map(|u| u.path().trim_start_matches('/').to_string())
            .unwrap_or_else(|_| url.to_string()),
    };
    let path = path.trim_matches('/');
    if path.is_empty() {
        return "main".to_string();
    }
    path.replace("()", "").replace(['/', '.'], "_")
}

/// Fetches pages sequentially and writes them with a metadata header.
pub struct Scraper {
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn DocumentStore>,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn DocumentStore>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            fetcher,
            store,
            options,
        }
    }

    /// Scrape every URL in order, sleeping between requests but not after
    /// the last one.
    pub async fn run<F>(&self, urls: &[String], mut on_page: F) -> ScrapeReport
    where
        F: FnMut(usize, &PageOutcome),
    {
        let mut report = ScrapeReport {
            urls: urls.to_vec(),
            ..Default::default()
        };

        for (i, url) in urls.iter().enumerate() {
            let outcome = self.scrape_one(url).await;
            on_page(i + 1, &outcome);
            match outcome {
                PageOutcome::Saved(page) => report.successful.push(page),
                PageOutcome::Failed(page) => report.failed.push(page),
                PageOutcome::Empty(page) => report.empty.push(page),
            }

            if i + 1 < urls.len() && !self.options.delay.is_zero() {
                tracing::debug!("Waiting {:?} before next request", self.options.delay);
                tokio::time::sleep(self.options.delay).await;
            }
        }

        report.generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        report
    }

    async fn scrape_one(&self, url: &str) -> PageOutcome {
        let topic = topic_name(url, &self.options.base_url);
        let file_name = format!("{}_{topic}.txt", self.options.prefix);
        tracing::info!("Processing {topic}: {url}");

        let start = Instant::now();
        let markdown = match self.fetcher.fetch(url).await {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::error!("Fetch failed for {url}: {e}");
                return PageOutcome::Failed(FailedPage {
                    url: url.to_string(),
                    topic,
                    error: e.to_string(),
                });
            }
        };
        let fetch_secs = start.elapsed().as_secs_f64();

        let chars = markdown.trim().chars().count();
        if chars < self.options.min_content_chars {
            let warning = PipelineError::EmptyContent {
                url: url.to_string(),
                chars,
                min_chars: self.options.min_content_chars,
            };
            tracing::warn!("{warning}");
            return PageOutcome::Empty(EmptyPage {
                url: url.to_string(),
                topic,
                chars,
            });
        }

        let size = markdown.chars().count();
        let content = page_document(&topic, url, &markdown, fetch_secs);
        let path = self.options.output_dir.join(&file_name);
        if let Err(e) = self.store.write(&path, &content).await {
            tracing::error!("{e}");
            return PageOutcome::Failed(FailedPage {
                url: url.to_string(),
                topic,
                error: e.to_string(),
            });
        }

        tracing::info!("Saved {file_name}: {size} chars in {fetch_secs:.2}s");
        PageOutcome::Saved(ScrapedPage {
            url: url.to_string(),
            topic,
            file_name,
            size,
            fetch_secs,
        })
    }
}

fn page_document(topic: &str, url: &str, markdown: &str, fetch_secs: f64) -> String {
    format!(
        "# Documentation: {topic}\n\n\
         **URL:** {url}\n\
         **Scraped:** {}\n\
         **Content Length:** {} characters\n\
         **Processing Time:** {fetch_secs:.2} seconds\n\n\
         ---\n\n\
         {markdown}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        markdown.chars().count(),
    )
}

impl ScrapeReport {
    pub fn file_name(prefix: &str, ts: &str) -> String {
        format!("{prefix}_scraping_report_{ts}.txt")
    }

    /// Total Markdown characters across saved pages.
    pub fn total_chars(&self) -> usize {
        self.successful.iter().map(|p| p.size).sum()
    }

    /// Mean fetch time of saved pages in seconds (0 when none).
    pub fn average_secs(&self) -> f64 {
        if self.successful.is_empty() {
            0.0
        } else {
            self.successful.iter().map(|p| p.fetch_secs).sum::<f64>() / self.successful.len() as f64
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Documentation Scraping Report\n");
        let _ = writeln!(out, "**Generated:** {}", self.generated_at);
        let _ = writeln!(out, "**Total URLs:** {}", self.urls.len());
        let _ = writeln!(out, "**Successful:** {}", self.successful.len());
        let _ = writeln!(out, "**Failed:** {}", self.failed.len());
        let _ = writeln!(out, "**Empty/Warning:** {}\n", self.empty.len());

        let _ = writeln!(out, "## ✅ Successfully Scraped ({})", self.successful.len());
        for p in &self.successful {
            let _ = writeln!(out, "- {} ({} chars, {:.2}s)", p.topic, p.size, p.fetch_secs);
        }

        if !self.failed.is_empty() {
            let _ = writeln!(out, "\n## ❌ Failed to Scrape ({})", self.failed.len());
            for p in &self.failed {
                let _ = writeln!(out, "- {}: {}", p.topic, p.error);
            }
        }

        if !self.empty.is_empty() {
            let _ = writeln!(out, "\n## ⚠️ Empty or Suspicious Content ({})", self.empty.len());
            for p in &self.empty {
                let _ = writeln!(out, "- {}", p.topic);
            }
        }

        let _ = writeln!(out, "\n## 📁 Generated Files");
        for p in &self.successful {
            let _ = writeln!(out, "- {}", p.file_name);
        }

        let _ = writeln!(out, "\n## 🔗 Original URLs");
        for (i, url) in self.urls.iter().enumerate() {
            let ok = self.successful.iter().any(|p| &p.url == url);
            let _ = writeln!(out, "{}. {} {url}", i + 1, if ok { "✅" } else { "❌" });
        }
        out
    }

    /// Write the rendered report into `dir`.
    pub async fn write_to(
        &self,
        store: &dyn DocumentStore,
        dir: &Path,
        prefix: &str,
    ) -> Result<PathBuf, PipelineError> {
        let path = dir.join(Self::file_name(prefix, &naming::timestamp()));
        store.write(&path, &self.render()).await?;
        tracing::info!("Scraping report saved: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    const BASE: &str = "https://gsap.com/docs/v3/GSAP/";

    /// Serves canned pages; unknown URLs fail with a 404.
    struct MockFetcher {
        pages: HashMap<String, String>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| PipelineError::Fetch {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
                status_code: Some(404),
            })
        }
    }

    fn options(delay_ms: u64) -> ScrapeOptions {
        ScrapeOptions {
            base_url: BASE.to_string(),
            prefix: "gsap".to_string(),
            output_dir: PathBuf::from("scraped"),
            delay: Duration::from_millis(delay_ms),
            min_content_chars: 100,
        }
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(topic_name(BASE, BASE), "main");
        assert_eq!(topic_name("https://gsap.com/docs/v3/GSAP/gsap.utils", BASE), "gsap_utils");
        assert_eq!(topic_name("https://gsap.com/docs/v3/GSAP/gsap.config()", BASE), "gsap_config");
        assert_eq!(topic_name("https://gsap.com/docs/v3/GSAP/Tween/kill()", BASE), "Tween_kill");
        assert_eq!(topic_name("https://example.com/guide/intro", BASE), "guide_intro");
    }

    #[tokio::test]
    async fn test_pages_bucketed_by_outcome() {
        let good = format!("{BASE}gsap.to()");
        let thin = format!("{BASE}gsap.version");
        let missing = format!("{BASE}gsap.nope");
        let pages = HashMap::from([
            (good.clone(), "# gsap.to()\n".to_string() + &"tween ".repeat(40)),
            (thin.clone(), "   3.12   ".to_string()),
        ]);
        let calls = Arc::new(AtomicU32::new(0));
        let store = Arc::new(MemoryStore::new());
        let scraper = Scraper::new(
            Arc::new(MockFetcher {
                pages,
                calls: calls.clone(),
            }),
            store.clone(),
            options(0),
        );

        let urls = vec![good.clone(), thin, missing];
        let mut indices = Vec::new();
        let report = scraper.run(&urls, |i, _| indices.push(i)).await;

        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.successful.len(), 1);
        assert_eq!(report.empty.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.empty[0].chars, 4);

        let saved = store.get(Path::new("scraped/gsap_gsap_to.txt")).unwrap();
        assert!(saved.starts_with("# Documentation: gsap_to"));
        assert!(saved.contains(&format!("**URL:** {good}")));
        assert!(saved.contains("---\n\n# gsap.to()"));
        assert_eq!(store.paths_in(Path::new("scraped")).len(), 1);
    }

    #[tokio::test]
    async fn test_delay_between_requests_not_after_last() {
        let urls: Vec<String> = (0..3).map(|i| format!("{BASE}p{i}")).collect();
        let pages = urls.iter().map(|u| (u.clone(), "x".repeat(200))).collect();
        let scraper = Scraper::new(
            Arc::new(MockFetcher {
                pages,
                calls: Arc::new(AtomicU32::new(0)),
            }),
            Arc::new(MemoryStore::new()),
            options(100),
        );

        let start = Instant::now();
        let report = scraper.run(&urls, |_, _| {}).await;
        let elapsed = start.elapsed();
        assert_eq!(report.successful.len(), 3);
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[test]
    fn test_report_render_and_stats() {
        let report = ScrapeReport {
            generated_at: "2025-06-11 10:00:00".to_string(),
            urls: vec!["u1".into(), "u2".into()],
            successful: vec![ScrapedPage {
                url: "u1".into(),
                topic: "main".into(),
                file_name: "gsap_main.txt".into(),
                size: 1200,
                fetch_secs: 1.5,
            }],
            failed: vec![FailedPage {
                url: "u2".into(),
                topic: "gsap_ticker".into(),
                error: "HTTP 500".into(),
            }],
            empty: Vec::new(),
        };
        let text = report.render();
        assert!(text.contains("- main (1200 chars, 1.50s)"));
        assert!(text.contains("- gsap_ticker: HTTP 500"));
        assert!(text.contains("1. ✅ u1"));
        assert!(text.contains("2. ❌ u2"));
        assert!(!text.contains("Empty or Suspicious"));
        assert_eq!(report.total_chars(), 1200);
        assert!((report.average_secs() - 1.5).abs() < 1e-9);
        assert_eq!(
            ScrapeReport::file_name("gsap", "20250611_100000"),
            "gsap_scraping_report_20250611_100000.txt"
        );
    }
}

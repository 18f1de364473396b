//! Documentation scraping: fetch pages, convert to Markdown, save sequentially.

pub mod fetcher;
pub mod scraper;

pub use fetcher::{ContentFetcher, HttpFetcher};
pub use scraper::{topic_name, PageOutcome, ScrapeOptions, ScrapeReport, Scraper};

//! docrefine core: scrape documentation and refine it through hosted LLMs.
//!
//! Raw documentation pages are scraped to text files, then each file is sent
//! to one backend from a round-robin rotation with a fixed clean-up prompt.
//! At most `max_parallel` documents are in flight at once; every document
//! yields exactly one result, and a Markdown report summarizes the run.
//!
//! ```text
//! URLs → Scrape → raw .txt → Discover → Rotate backend → LLM → refined .txt → Report
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrefine_core::batch::{build_backends, BackendRotation, BatchOptions, BatchProcessor};
//! use docrefine_core::{Config, FsStore};
//!
//! let config = Config::load()?;
//! let backends = build_backends(&config.backends, &config.llm, None)?;
//! let mut processor = BatchProcessor::new(
//!     BackendRotation::new(backends)?,
//!     Arc::new(FsStore),
//!     BatchOptions::default(),
//! );
//! let results = processor.run(items, |_, _| {}).await;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod llm;
pub mod output;
pub mod scrape;

pub use config::Config;
pub use error::{ConfigError, PipelineError, RefineError};
pub use io::{DocumentStore, FsStore, MemoryStore};
pub use output::ReportFormat;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! docrefine CLI - scrape documentation and refine it in batches through hosted LLMs.
//!
//! Raw documentation pages are scraped to text files, each file is sent to
//! one backend from a round-robin rotation with a fixed clean-up prompt, and
//! the refined Markdown lands next to a per-run report.
//!
//! # Usage
//!
//! ```bash
//! # Scrape a list of documentation URLs
//! docrefine scrape --urls urls.txt
//!
//! # Refine everything not yet refined, five documents at a time
//! docrefine refine --parallel 5
//!
//! # Only use OpenRouter-hosted backends
//! docrefine refine --only openrouter
//!
//! # Run one document through every backend and compare
//! docrefine compare Gsap_Docs/gsap_main.txt
//!
//! # View configuration
//! docrefine config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// docrefine - Scrape documentation and refine it in batches through hosted LLMs.
#[derive(Parser, Debug)]
#[command(name = "docrefine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "DOCREFINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Refine every pending document in the input directory
    Refine(cli::refine::RefineArgs),

    /// Scrape documentation pages to raw text files
    Scrape(cli::scrape::ScrapeArgs),

    /// Run one document through every backend and compare the results
    Compare(cli::compare::CompareArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli::config_path(cli.config.as_deref());

    // Logging isn't initialized yet, so use eprintln for config warnings.
    // `config` commands must still work with a broken file, so only they
    // fall back to defaults.
    let config = match cli::load_config(&config_path) {
        Ok(config) => config,
        Err(e) if matches!(cli.command, Commands::Config(_)) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `docrefine config path`."
            );
            docrefine_core::Config::default()
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e).context(format!(
                "Failed to load config from {}",
                config_path.display()
            )))
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("docrefine v{}", docrefine_core::VERSION);

    match cli.command {
        Commands::Refine(args) => cli::refine::execute(args, config).await,
        Commands::Scrape(args) => cli::scrape::execute(args, config).await,
        Commands::Compare(args) => cli::compare::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}

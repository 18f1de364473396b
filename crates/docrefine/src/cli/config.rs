//! The `docrefine config` command for configuration management.

use super::types::Provider;
use clap::{Args, Subcommand};
use console::Style;
use docrefine_core::config::{GeminiConfig, OpenRouterConfig};
use docrefine_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store an API key for a provider in the config file
    SetKey {
        /// Provider the key belongs to
        #[arg(value_enum)]
        provider: Provider,

        /// The API key (or a ${ENV_VAR} reference)
        key: String,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, config: &Config, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetKey { provider, key } => {
            save_key_to_config(path, provider, &key)?;
            let dim = Style::new().for_stderr().dim();
            eprintln!("  {}", dim.apply_to(format!("Key saved to {}", path.display())));
        }
    }

    Ok(())
}

/// Write `[llm.<provider>] api_key = key`, preserving the rest of the file.
fn save_key_to_config(path: &Path, provider: Provider, key: &str) -> anyhow::Result<()> {
    let section_name = match provider {
        Provider::Gemini => "gemini",
        Provider::Openrouter => "openrouter",
        Provider::Openai => "openai",
        Provider::Anthropic => "anthropic",
        Provider::Ollama => anyhow::bail!("Ollama runs locally and takes no API key"),
    };

    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: toml_edit::DocumentMut = content
        .parse()
        .map_err(|e| anyhow::anyhow!("Cannot edit {}: {e}", path.display()))?;

    if !doc.contains_key("llm") {
        doc["llm"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if !doc["llm"]
        .as_table()
        .is_some_and(|t| t.contains_key(section_name))
    {
        doc["llm"][section_name] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["llm"][section_name]["api_key"] = toml_edit::value(key);

    // Sections missing their required fields would fail to load
    let section = &mut doc["llm"][section_name];
    let required: Vec<(&str, String)> = match provider {
        Provider::Gemini => vec![("endpoint", GeminiConfig::default().endpoint)],
        Provider::Openrouter => {
            let defaults = OpenRouterConfig::default();
            vec![
                ("endpoint", defaults.endpoint),
                ("referer", defaults.referer),
                ("title", defaults.title),
            ]
        }
        _ => Vec::new(),
    };
    for (field, value) in required {
        if section.get(field).is_none() {
            section[field] = toml_edit::value(value);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;
    Ok(())
}

//! Configuration management for docrefine.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`; a missing file means
//! "run with defaults", and any section may be omitted.

mod types;
mod validate;

pub use types::*;

use crate::batch::backend::BackendConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for docrefine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input/output directories
    pub general: GeneralConfig,

    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Retry policy
    pub pipeline: PipelineConfig,

    /// Timeouts
    pub limits: LimitsConfig,

    /// Ordered backend rotation
    pub backends: Vec<BackendConfig>,

    /// Scraper settings
    pub scrape: ScrapeConfig,

    /// Multi-model comparison settings
    pub compare: CompareConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            processing: ProcessingConfig::default(),
            pipeline: PipelineConfig::default(),
            limits: LimitsConfig::default(),
            backends: default_backends(),
            scrape: ScrapeConfig::default(),
            compare: CompareConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.docrefine.docrefine/config.toml
    /// - Linux: ~/.config/docrefine/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\docrefine\config\config.toml
    ///
    /// Falls back to ~/.docrefine/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "docrefine", "docrefine")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".docrefine").join("config.toml")
            })
    }

    /// Resolved input directory (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        expand(&self.general.input_dir)
    }

    /// Resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.general.output_dir)
    }

    /// Resolved scraper output directory (with ~ expansion).
    pub fn scrape_dir(&self) -> PathBuf {
        expand(&self.scrape.output_dir)
    }

    /// Resolved comparison output directory (with ~ expansion).
    pub fn compare_dir(&self) -> PathBuf {
        expand(&self.compare.output_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::backend::ProviderKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.max_parallel, 5);
        assert_eq!(config.processing.output_marker, "refined_");
        assert_eq!(config.pipeline.retry_attempts, 0);
        assert_eq!(config.backends.len(), 5);
        assert_eq!(config.backends[0].provider, ProviderKind::Gemini);
        assert!(config.backends.iter().all(|b| b.delay_ms == 8000));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[[backends]]"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let toml = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(parsed.backends, Config::default().backends);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [processing]
            max_parallel = 2

            [[backends]]
            name = "qwen/qwen3-coder:free"
            short_name = "qwen_coder"
            provider = "openrouter"
            delay_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.processing.max_parallel, 2);
        assert_eq!(config.processing.input_extension, "txt");
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].short_name, "qwen_coder");
        assert_eq!(config.scrape.min_content_chars, 100);
    }

    #[test]
    fn test_from_toml_runs_validation() {
        let err = Config::from_toml("[processing]\nmax_parallel = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_parallel"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\ninput_dir = \"raw\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.input_dir(), PathBuf::from("raw"));
    }
}

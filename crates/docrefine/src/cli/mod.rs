//! CLI command implementations.

pub mod compare;
pub mod config;
pub mod refine;
pub mod scrape;
pub mod types;

use docrefine_core::{Config, ConfigError};
use std::path::{Path, PathBuf};

/// Config file in effect: the `--config` override, or the platform default.
pub fn config_path(override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => Config::default_path(),
    }
}

/// Load the config file at `path`, or defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        Config::load_from(path)
    } else {
        Ok(Config::default())
    }
}

//! Configuration validation with range checks.

use std::collections::HashSet;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_parallel == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_parallel must be > 0".into(),
            ));
        }
        if self.processing.output_marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.output_marker must not be empty".into(),
            ));
        }
        if self.compare.max_parallel == 0 {
            return Err(ConfigError::ValidationError(
                "compare.max_parallel must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.fetch_timeout_ms must be > 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            let short = backend.short_name.as_str();
            if short.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "backends: short_name for '{}' must not be empty",
                    backend.name
                )));
            }
            if short.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "backends: short_name '{short}' must not contain path separators"
                )));
            }
            if !seen.insert(short) {
                return Err(ConfigError::ValidationError(format!(
                    "backends: duplicate short_name '{short}'"
                )));
            }
        }
        Ok(())
    }
}

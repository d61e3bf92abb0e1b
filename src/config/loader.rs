use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::RuntimeConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl RuntimeConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/markpen/config.toml` on Unix/macOS, or the
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("markpen").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `RuntimeConfig::default()`.
    pub fn load() -> Result<Self, LoadError> {
        let path = Self::config_path();
        if !path.exists() {
            tracing::debug!(target: "markpen::config", path = %path.display(), "no config file, using defaults");
            return Ok(RuntimeConfig::default());
        }
        Self::load_from(&path)
    }

    /// Loads, parses and validates a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|e| LoadError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_toml(&content).map_err(|e| match e {
            LoadError::ParseError { source, .. } => LoadError::ParseError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(target: "markpen::config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates config text.
    pub fn from_toml(content: &str) -> Result<Self, LoadError> {
        let config: RuntimeConfig =
            toml::from_str(content).map_err(|e| LoadError::ParseError {
                path: PathBuf::new(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Marker names are non-empty and distinct
    /// - At least one delegated event, none empty, no duplicates
    pub fn validate(&self) -> Result<(), LoadError> {
        let markers = [
            ("action", &self.markers.action),
            ("event", &self.markers.event),
            ("value", &self.markers.value),
        ];
        for (role, name) in markers {
            if name.trim().is_empty() {
                return Err(LoadError::ValidationError {
                    message: format!("The {} marker name must not be empty", role),
                });
            }
        }
        let distinct: HashSet<&String> = markers.iter().map(|(_, name)| *name).collect();
        if distinct.len() != markers.len() {
            return Err(LoadError::ValidationError {
                message: "Marker names must be distinct".to_string(),
            });
        }

        if self.delegated_events.is_empty() {
            return Err(LoadError::ValidationError {
                message: "At least one delegated event must be configured".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for event in &self.delegated_events {
            if event.trim().is_empty() {
                return Err(LoadError::ValidationError {
                    message: "Delegated event names must not be empty".to_string(),
                });
            }
            if !seen.insert(event.as_str()) {
                return Err(LoadError::ValidationError {
                    message: format!("Delegated event '{}' is listed twice", event),
                });
            }
        }

        Ok(())
    }
}

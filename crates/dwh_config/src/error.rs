//! Error types for the configuration module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating deployment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Deployment file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration key '{0}' must be supplied as a secret value")]
    NotSecret(String),

    #[error("Incomplete range: '{present}' is set but '{missing}' is not (both or neither required)")]
    IncompleteRange { present: String, missing: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

//! Error types for IaC module.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur while composing or rendering a deployment.
///
/// Every variant names the resource involved and the precondition that failed.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Validation failed for {resource}: {message}")]
    Validation { resource: String, message: String },

    #[error("Could not resolve {resource}: {message}")]
    Resolution { resource: String, message: String },

    #[error("Provider rejected {resource}: {message}")]
    Provider { resource: String, message: String },

    #[error("{resource} cannot be created: dependency {dependency} is unmet")]
    DependencyUnmet { resource: String, dependency: String },

    #[error("Configuration error: {0}")]
    Config(#[from] dwh_config::ConfigError),

    #[error("Resource graph error: {0}")]
    Graph(#[from] dwh_graph::GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IacError {
    pub(crate) fn validation(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub(crate) fn resolution(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

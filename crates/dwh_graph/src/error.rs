//! Error types for the resource graph.

use thiserror::Error;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building or walking a resource graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Resource declared twice: {0}")]
    DuplicateResource(String),

    #[error("Resource '{resource}' depends on undeclared resource '{dependency}'")]
    UnknownDependency { resource: String, dependency: String },

    #[error("Dependency cycle between resources: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid resource id '{0}': expected <kind>.<name>")]
    InvalidId(String),

    #[error("Applying '{resource}' failed: {message}")]
    ApplyFailed { resource: String, message: String },
}

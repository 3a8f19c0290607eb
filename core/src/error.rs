//! Common error types for flowgen.

use thiserror::Error;

/// Errors that can occur while planning or generating a test suite.
#[derive(Debug, Error)]
pub enum GenError {
    /// The input document yielded no usable endpoints.
    #[error("No endpoints found in the API document (every operation needs an operationId)")]
    NoEndpoints,

    /// The generation options are structurally invalid.
    #[error("Invalid generation options: {0}")]
    InvalidOptions(String),

    /// The endpoint filter selected nothing.
    #[error("Endpoint filter matched no endpoints: {}", filters.join(", "))]
    UnsatisfiableFilter { filters: Vec<String> },

    /// Producer/consumer dependencies form a cycle.
    #[error("Dependency cycle detected between operations: {}", operations.join(" -> "))]
    DependencyCycle { operations: Vec<String> },

    /// The input is not shaped like an OpenAPI document.
    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// Configuration errors are fatal to one operation but not to a whole generation run.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            GenError::DependencyCycle { .. } | GenError::UnsatisfiableFilter { .. }
        )
    }
}

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;

//! Error types for the hybrid search system.

use thiserror::Error;

/// Result type alias using SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while building, executing or ranking a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query string is empty or whitespace-only.
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// No dataset is registered under the requested identifier.
    #[error("Unknown dataset: {id}")]
    UnknownDataset { id: String },

    /// The retrieval backend failed or returned malformed data.
    #[error("Retrieval failed: {message}")]
    RetrievalFailure { message: String },

    /// A mapped output field was not returned for a hit.
    #[error("Missing field '{field}' for hit {hit_id}")]
    MissingField { field: String, hit_id: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SearchError {
    /// Create an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create an unknown dataset error.
    pub fn unknown_dataset(id: impl Into<String>) -> Self {
        Self::UnknownDataset { id: id.into() }
    }

    /// Create a retrieval failure.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::RetrievalFailure {
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>, hit_id: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            hit_id: hit_id.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => "INVALID_QUERY",
            Self::UnknownDataset { .. } => "UNKNOWN_DATASET",
            Self::RetrievalFailure { .. } => "RETRIEVAL_FAILURE",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. } | Self::UnknownDataset { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::unknown_dataset("books");
        assert_eq!(err.to_string(), "Unknown dataset: books");

        let err = SearchError::missing_field("overview", "doc-7");
        assert_eq!(err.to_string(), "Missing field 'overview' for hit doc-7");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SearchError::invalid_query("empty").error_code(),
            "INVALID_QUERY"
        );
        assert_eq!(
            SearchError::retrieval("connection refused").error_code(),
            "RETRIEVAL_FAILURE"
        );
        assert_eq!(
            SearchError::missing_field("title", "1").error_code(),
            "MISSING_FIELD"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(SearchError::invalid_query("blank").is_caller_error());
        assert!(SearchError::unknown_dataset("x").is_caller_error());
        assert!(!SearchError::retrieval("502").is_caller_error());
        assert!(!SearchError::internal("bug").is_caller_error());
    }
}

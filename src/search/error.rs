//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Index missing or could not be opened
    #[error("Search unavailable: {0}")]
    Unavailable(String),

    /// Invalid boost, fuzziness, field or limit values
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Query compilation failed
    #[error("Query compilation failed: {0}")]
    QueryFailed(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Stored document could not be read back as a spec record
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tantivy error
    #[error("Tantivy error: {0}")]
    TantivyError(String),
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::TantivyError(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Unavailable(msg) => AppError::SearchUnavailable(msg),
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::MalformedDocument(msg) => AppError::Serialization(msg),
            SearchError::IoError(err) => AppError::Io(err),
            _ => AppError::Search(err.to_string()),
        }
    }
}

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (invalid boost, fuzziness, limits, config files)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Directory index or data store unreachable or missing
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// Time bucket granularity not supported by the aggregation engine
    #[error("Unsupported time unit: {0}")]
    UnsupportedTimeUnit(String),

    /// Plot type not supported by the aggregation engine
    #[error("Unsupported plot type: {0}")]
    UnsupportedPlotType(String),

    /// Aggregation operation not supported by the aggregation engine
    #[error("Unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    /// Referenced column absent from the dataset
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Instruction set incomplete or inconsistent with its declared type
    #[error("Invalid instructions: {0}")]
    InvalidInstructions(String),

    /// Search execution errors
    #[error("Search error: {0}")]
    Search(String),

    /// Dataset parsing errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::SearchUnavailable(_) => "SEARCH_UNAVAILABLE",
            AppError::UnsupportedTimeUnit(_) => "UNSUPPORTED_TIME_UNIT",
            AppError::UnsupportedPlotType(_) => "UNSUPPORTED_PLOT_TYPE",
            AppError::UnsupportedAggregation(_) => "UNSUPPORTED_AGGREGATION",
            AppError::FieldNotFound(_) => "FIELD_NOT_FOUND",
            AppError::InvalidInstructions(_) => "INVALID_INSTRUCTIONS",
            AppError::Search(_) => "SEARCH_ERROR",
            AppError::Dataset(_) => "DATASET_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Configuration(_) => 78,
            AppError::SearchUnavailable(_) => 69,
            AppError::UnsupportedTimeUnit(_)
            | AppError::UnsupportedPlotType(_)
            | AppError::UnsupportedAggregation(_)
            | AppError::FieldNotFound(_)
            | AppError::InvalidInstructions(_)
            | AppError::Dataset(_)
            | AppError::Serialization(_) => 65,
            AppError::NotFound(_) => 66,
            AppError::Io(_) => 74,
            AppError::Search(_) | AppError::Internal(_) => 70,
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

//! Error types for aggregation operations

use crate::error::AppError;

/// Result type for aggregation operations
pub type AggregationResult<T> = std::result::Result<T, AggregationError>;

/// Errors that can occur while planning or running an aggregation
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// Plot type other than timeseries or category
    #[error("Unsupported plot type: {0}")]
    UnsupportedPlotType(String),

    /// Time unit other than month or day
    #[error("{0} is not a valid time unit")]
    UnsupportedTimeUnit(String),

    /// Aggregation operation other than count, sum, mean or median
    #[error("{0} operation is not supported")]
    UnsupportedAggregation(String),

    /// A field required by the declared plot type is absent
    #[error("Instruction set for {plot_type} is missing '{field}'")]
    MissingInstruction { plot_type: String, field: String },

    /// Instructions do not match the grouping they are applied to
    #[error("Instruction mismatch: {0}")]
    InstructionMismatch(String),

    /// Referenced column absent from the dataset
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Time field value could not be read as a timestamp
    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    /// Dataset could not be read
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Data store missing
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// Invalid limit values
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Export failed
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl From<csv::Error> for AggregationError {
    fn from(err: csv::Error) -> Self {
        AggregationError::Dataset(err.to_string())
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::UnsupportedPlotType(msg) => AppError::UnsupportedPlotType(msg),
            AggregationError::UnsupportedTimeUnit(msg) => AppError::UnsupportedTimeUnit(msg),
            AggregationError::UnsupportedAggregation(msg) => AppError::UnsupportedAggregation(msg),
            AggregationError::FieldNotFound(msg) => AppError::FieldNotFound(msg),
            AggregationError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            AggregationError::DatasetUnavailable(msg) => AppError::SearchUnavailable(msg),
            AggregationError::MissingInstruction { .. } | AggregationError::InstructionMismatch(_) => {
                AppError::InvalidInstructions(err.to_string())
            }
            AggregationError::InvalidTimestamp { .. } | AggregationError::Dataset(_) => {
                AppError::Dataset(err.to_string())
            }
            AggregationError::ExportFailed(msg) => AppError::Internal(msg),
        }
    }
}

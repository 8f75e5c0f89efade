//! Error types for the detection pipeline.
//!
//! Only environment faults surface here: a missing table, a failed Arrow
//! cast, an unwritable log sink. A detector that cannot produce flags is
//! not an error — it reports [`Unavailable`](crate::detectors::Unavailable)
//! through its outcome and the pipeline continues without it.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, SpotterError>;

/// Errors that can occur while preparing data or running the pipeline.
#[derive(Error, Debug)]
pub enum SpotterError {
    /// DataFusion query execution error.
    #[error("Query execution failed: {0}")]
    QueryExecution(#[from] datafusion::error::DataFusionError),

    /// Arrow computation error.
    #[error("Arrow computation failed: {0}")]
    ArrowComputation(#[from] arrow::error::ArrowError),

    /// Invalid configuration or parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error registering or reading a data source.
    #[error("Data source error ({source_type}): {message}")]
    DataSource {
        /// Kind of source that failed (csv, json, parquet).
        source_type: String,
        /// What went wrong.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic pipeline error with custom message.
    #[error("{0}")]
    Custom(String),
}

impl SpotterError {
    /// Creates an invalid configuration error with the given message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a data source error for the given source kind.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Creates a custom error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Custom(format!("Internal error: {}", msg.into()))
    }
}

/// Converts serde_json errors to SpotterError.
impl From<serde_json::Error> for SpotterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

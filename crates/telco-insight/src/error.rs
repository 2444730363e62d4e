//! Error types for the cleaning and analysis pipeline.
//!
//! Only configuration problems are fatal: they indicate an unusable setup and
//! are raised before any record is touched. Everything else (unparseable
//! dates, missing columns, integrity violations) degrades to nulls, defaults,
//! or report warnings and never reaches the caller as an error.

use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration (malformed bins/labels, negative thresholds).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Check if this error stems from an unusable configuration.
    ///
    /// Configuration errors are the one class a caller can fix without
    /// touching the input data.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

impl From<crate::config::ConfigValidationError> for PipelineError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

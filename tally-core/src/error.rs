//! Error types for tally-core

use thiserror::Error;

/// Why a single raw record was rejected. Never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed amount: {0}")]
    MalformedAmount(String),

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),
}

impl ValidationError {
    /// Short label used when logging without debug detail.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "MissingField",
            ValidationError::MalformedAmount(_) => "MalformedAmount",
            ValidationError::MalformedTimestamp(_) => "MalformedTimestamp",
        }
    }
}

/// Batch-level failure of a report request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("no valid data points found after processing")]
    NoValidData,
}

//! Error types for the vitals engine

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while classifying, scoring or tracking
#[derive(Debug, Error)]
pub enum VitalsError {
    /// Non-finite or out-of-domain numeric input
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Missing or malformed band/weight table
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Streak update dated before the last recorded date
    #[error("Out of order update: {attempted} is before last recorded date {last}")]
    OutOfOrder { last: NaiveDate, attempted: NaiveDate },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Entry store error: {0}")]
    StoreError(String),
}

impl VitalsError {
    /// Stable machine-readable code for hosts that render their own messages
    pub fn code(&self) -> &'static str {
        match self {
            VitalsError::InvalidReading(_) => "INVALID_READING",
            VitalsError::Configuration(_) => "CONFIGURATION_ERROR",
            VitalsError::OutOfOrder { .. } => "OUT_OF_ORDER",
            VitalsError::JsonError(_) => "JSON_ERROR",
            VitalsError::StoreError(_) => "STORE_ERROR",
        }
    }
}

//! # Error Module
//!
//! Error taxonomy for the scan pipeline. Only configuration problems and an
//! unavailable random source are recoverable; every numeric stage is total
//! over its valid input domain.

use thiserror::Error;

/// Errors surfaced by the scan pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A `ScanConfig` field is outside its valid domain.
    #[error("invalid scan configuration: {field} {reason}")]
    Configuration {
        field: &'static str,
        reason: String,
    },

    /// The operating system could not provide entropy to seed a scan.
    #[error("random source unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Reading or writing a settings/report file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A settings/report file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for scan pipeline operations.
pub type Result<T> = std::result::Result<T, ScanError>;

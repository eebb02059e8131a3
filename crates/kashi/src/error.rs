//! Error types for the external collaborators.
//!
//! None of these escape the engine's entry points, every failure has a local fallback.

use std::time::Duration;
use thiserror::Error;

/// A failure of a reading service.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Cannot convert '{0}' with this reading service")]
    Unsupported(String),
    #[error("Reading service produced no output for '{0}'")]
    Empty(String),
    #[error("Reading service failed: {0}")]
    Service(String),
    #[error("Failed to load reading dictionary")]
    Dictionary(#[from] std::io::Error),
    #[error("Failed to parse reading dictionary")]
    DictionaryFormat(#[from] serde_json::Error),
}

/// A failure of the AI oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("No usable credentials for the oracle")]
    MissingCredentials,
    #[error("Oracle request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Oracle request was cancelled")]
    Cancelled,
    #[error("Oracle returned HTTP status {0}")]
    Http(u16),
    #[error("Oracle response was malformed: {0}")]
    Malformed(String),
    #[error("Oracle is unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for OracleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}

//! Domain error types for the summary reporter.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Only failures that abort a build live here; degraded paths are reported as
//! [`BuildWarning`](crate::models::BuildWarning)s instead.

use crate::config::ConfigError;

/// Reporter-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run document is malformed or misses required fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading the run document or a source file failed
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Artifact store upload failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Archive packaging failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Forwarding history rows failed
    #[error("History error: {0}")]
    History(String),
}

/// Convenience type alias for Results with ReporterError.
pub type ReporterResult<T> = Result<T, ReporterError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for ReporterError {
    fn from(err: serde_json::Error) -> Self {
        ReporterError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<zip::result::ZipError> for ReporterError {
    fn from(err: zip::result::ZipError) -> Self {
        ReporterError::Archive(err.to_string())
    }
}

impl From<reqwest::Error> for ReporterError {
    fn from(err: reqwest::Error) -> Self {
        ReporterError::Upload(err.to_string())
    }
}

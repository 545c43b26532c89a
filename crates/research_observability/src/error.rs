//! Error types for observability crate

use thiserror::Error;

/// Errors that can occur during logging initialization
#[derive(Error, Debug)]
pub enum ObservabilityError {
    /// A global subscriber is already installed, or the filter is invalid
    #[error("Failed to initialize observability: {0}")]
    InitFailed(String),

    /// The log file could not be opened
    #[error("Failed to open log file: {0}")]
    LogFile(#[from] std::io::Error),
}

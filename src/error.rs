//! Error types for the Stormwatch service
//!
//! Provider-facing failures live in [`crate::providers::ProviderError`] and never
//! escape the aggregation services. This module holds the errors that can reach
//! startup code or a handler.

use thiserror::Error;

/// Main error type for the Stormwatch service
#[derive(Error, Debug)]
pub enum StormwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Unexpected failure inside aggregation or normalization logic
    #[error("Aggregation error: {message}")]
    Aggregation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl StormwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new aggregation error
    pub fn aggregation<S: Into<String>>(message: S) -> Self {
        Self::Aggregation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            StormwatchError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            StormwatchError::Aggregation { .. } => {
                "Failed to assemble data from upstream providers.".to_string()
            }
            StormwatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

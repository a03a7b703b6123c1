use thiserror::Error;

use crate::models::DataSource;

/// Failure of a single upstream provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credential or endpoint not configured; not a runtime failure
    #[error("{provider} is not configured")]
    ConfigurationMissing { provider: &'static str },

    /// Transport error, timeout or non-success status
    #[error("{provider} unavailable: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
    },

    /// Response did not match the expected schema
    #[error("{provider} returned malformed data: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    #[must_use]
    pub fn configuration_missing(provider: &'static str) -> Self {
        Self::ConfigurationMissing { provider }
    }

    pub fn unavailable<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::Unavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::Malformed {
            provider,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing { provider }
            | Self::Unavailable { provider, .. }
            | Self::Malformed { provider, .. } => provider,
        }
    }

    /// Tag carried by fallback data that replaces this failure
    #[must_use]
    pub fn source_tag(&self) -> DataSource {
        match self {
            Self::ConfigurationMissing { .. } => DataSource::Mock,
            Self::Unavailable { .. } | Self::Malformed { .. } => DataSource::Error,
        }
    }
}

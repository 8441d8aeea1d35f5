//! Error types for the location resolution system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the location resolution system
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Provider could not be reached (network failure, timeout)
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// Provider responded with an unexpected payload shape
    #[error("provider returned malformed payload: {0}")]
    ProviderMalformed(String),

    /// Every provider in the chain failed or returned no usable fields
    #[error("all providers exhausted")]
    AllProvidersExhausted,

    /// A provider succeeded but the fields required by the active
    /// display format are absent
    #[error("incomplete location: missing {0}")]
    IncompleteLocation(String),

    /// Persistent cache tier unreadable/unwritable (never fatal)
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider-specific error with context
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "provider unreachable" error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::ProviderUnreachable(msg.into())
    }

    /// Create a "malformed payload" error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::ProviderMalformed(msg.into())
    }

    /// Create an "incomplete location" error naming the missing field
    pub fn incomplete(field: impl Into<String>) -> Self {
        Self::IncompleteLocation(field.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Short human-readable cause string for a result-list entry
    ///
    /// The host renders failures as normal entries; this keeps the
    /// subtitle to a single line.
    pub fn user_message(&self) -> String {
        match self {
            Self::AllProvidersExhausted => "No location provider responded".to_string(),
            Self::IncompleteLocation(field) => format!("Location is missing {}", field),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ProviderMalformed(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

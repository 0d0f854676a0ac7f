//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Remote push rejected by the endpoint
    #[error("replication failed: {message}")]
    Replication { message: String },

    /// Transport-level HTTP failure (timeout, refused, TLS, ...)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a replication error
    pub fn replication(message: impl Into<String>) -> Self {
        Self::Replication {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DispatcherError>;

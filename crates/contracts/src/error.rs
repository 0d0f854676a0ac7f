//! Layered error definitions
//!
//! Categorized by source: config / storage / notification

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Collaborator Errors =====
    /// Persistence failure
    #[error("storage '{store}' error: {message}")]
    Storage { store: String, message: String },

    /// Notification sink failure
    #[error("notifier '{sink_name}' error: {message}")]
    Notification { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create storage error
    pub fn storage(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create notification error
    pub fn notification(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notification {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

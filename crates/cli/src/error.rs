//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed to parse or validate
    #[error("Configuration error: {0}")]
    Config(#[from] contracts::ContractError),

    /// Device could not be opened
    #[error("Device not available on {port}")]
    DeviceUnavailable { port: String },

    /// Device did not answer a request
    #[error("No response from device on {port} to {command}")]
    NoResponse { port: String, command: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn device_unavailable(port: impl Into<String>) -> Self {
        Self::DeviceUnavailable { port: port.into() }
    }

    pub fn no_response(port: impl Into<String>, command: impl Into<String>) -> Self {
        Self::NoResponse {
            port: port.into(),
            command: command.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

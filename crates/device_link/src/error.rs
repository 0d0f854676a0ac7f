//! Device Link error types

use thiserror::Error;

/// Device Link specific error
#[derive(Debug, Error)]
pub enum DeviceLinkError {
    /// Port could not be opened or prepared
    #[error("failed to connect to device on '{port}': {message}")]
    Connection { port: String, message: String },

    /// Operation needs an open connection
    #[error("device is not connected")]
    NotConnected,

    /// Read/write failure on an open connection
    #[error("device io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line is not a structured record
    #[error("unparseable device line '{line}': {message}")]
    Parse { line: String, message: String },

    /// Command arguments out of range
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl DeviceLinkError {
    /// Create connection error
    pub fn connection(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create parse error
    pub fn parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            line: line.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DeviceLinkError>;

//! Acquisition error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised while accepting a reading
///
/// None of these stop the loop; they are counted and logged per reading.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Store rejected the reading
    #[error("persist failed: {0}")]
    Persist(#[from] contracts::ContractError),

    /// Store did not answer in time
    #[error("persist to '{store}' timed out after {timeout:?}")]
    PersistTimeout { store: String, timeout: Duration },

    /// Blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),
}

impl AcquisitionError {
    pub fn persist_timeout(store: impl Into<String>, timeout: Duration) -> Self {
        Self::PersistTimeout {
            store: store.into(),
            timeout,
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, AcquisitionError>;

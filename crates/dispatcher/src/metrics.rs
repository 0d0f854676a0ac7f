//! Replicator metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Running counters of the remote replicator
///
/// Updated by whichever push task completes last; diagnostic only.
#[derive(Debug, Default)]
pub struct ReplicatorMetrics {
    /// Pushes answered with 2xx
    successful_count: AtomicU64,
    /// Pushes that failed for any reason
    failed_count: AtomicU64,
    last_sync: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
}

impl ReplicatorMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successful_count(&self) -> u64 {
        self.successful_count.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Count a success, stamp the sync time and clear the last error
    pub fn record_success(&self) {
        self.successful_count.fetch_add(1, Ordering::Relaxed);
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Count a failure and keep its diagnostic
    pub fn record_failure(&self, error: impl Into<String>) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.into());
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self, enabled: bool, endpoint: Option<String>) -> ReplicatorStats {
        ReplicatorStats {
            enabled,
            endpoint,
            successful_count: self.successful_count(),
            failed_count: self.failed_count(),
            last_sync: self.last_sync(),
            last_error: self.last_error(),
        }
    }
}

/// Snapshot of replicator metrics (for reporting)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicatorStats {
    pub enabled: bool,
    /// Only reported while enabled
    pub endpoint: Option<String>,
    pub successful_count: u64,
    pub failed_count: u64,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

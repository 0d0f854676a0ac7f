//! Acquisition counters, mode and the external status handle

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Reading, ReadingSource};
use dispatcher::ReplicatorStats;
use observability::ReadingSummary;
use serde::Serialize;

use crate::cache::CacheReader;

/// Where readings currently come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Device link active, readings arrive from the reader thread
    Connected,
    /// No device; the loop generates synthetic readings
    Simulated,
    /// Terminal
    Stopped,
}

impl AcquisitionMode {
    fn as_u8(self) -> u8 {
        match self {
            Self::Connected => 0,
            Self::Simulated => 1,
            Self::Stopped => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connected,
            1 => Self::Simulated,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "connected",
            Self::Simulated => "simulated",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Loop counters
///
/// Written by the loop only, readable from anywhere.
#[derive(Debug)]
pub struct AcquisitionCounters {
    mode: AtomicU8,
    readings: AtomicU64,
    device_readings: AtomicU64,
    synthetic_readings: AtomicU64,
    errors: AtomicU64,
    persisted: AtomicU64,
    persist_failures: AtomicU64,
    notifications_sent: AtomicU64,
    notification_failures: AtomicU64,
    notifications_suppressed: AtomicU64,
}

impl Default for AcquisitionCounters {
    fn default() -> Self {
        Self {
            mode: AtomicU8::new(AcquisitionMode::Simulated.as_u8()),
            readings: AtomicU64::new(0),
            device_readings: AtomicU64::new(0),
            synthetic_readings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            persisted: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            notification_failures: AtomicU64::new(0),
            notifications_suppressed: AtomicU64::new(0),
        }
    }
}

impl AcquisitionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AcquisitionMode {
        AcquisitionMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    pub fn set_mode(&self, mode: AcquisitionMode) {
        self.mode.store(mode.as_u8(), Ordering::SeqCst);
    }

    /// Count an accepted reading and return its sequence number (from 1)
    pub fn record_reading(&self, source: ReadingSource) -> u64 {
        match source {
            ReadingSource::Device => self.device_readings.fetch_add(1, Ordering::Relaxed),
            ReadingSource::Synthetic => self.synthetic_readings.fetch_add(1, Ordering::Relaxed),
        };
        self.readings.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_persist(&self, success: bool) {
        if success {
            self.persisted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.persist_failures.fetch_add(1, Ordering::Relaxed);
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_notification(&self, success: bool) {
        if success {
            self.notifications_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notification_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_suppressed(&self) {
        self.notifications_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AcquisitionStats {
        AcquisitionStats {
            mode: self.mode(),
            readings: self.readings.load(Ordering::Relaxed),
            device_readings: self.device_readings.load(Ordering::Relaxed),
            synthetic_readings: self.synthetic_readings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionStats {
    pub mode: AcquisitionMode,
    pub readings: u64,
    pub device_readings: u64,
    pub synthetic_readings: u64,
    pub errors: u64,
    pub persisted: u64,
    pub persist_failures: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    pub notifications_suppressed: u64,
}

/// Read-only access for dashboards, bots and the like
#[derive(Debug, Clone)]
pub struct StatusHandle {
    cache: CacheReader,
    counters: Arc<AcquisitionCounters>,
}

impl StatusHandle {
    pub(crate) fn new(cache: CacheReader, counters: Arc<AcquisitionCounters>) -> Self {
        Self { cache, counters }
    }

    /// Latest accepted reading
    pub fn latest(&self) -> Option<Arc<Reading>> {
        self.cache.latest()
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.counters.mode()
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.counters.snapshot()
    }
}

/// Final report produced on shutdown
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub duration: Duration,
    pub stats: AcquisitionStats,
    /// Records in the store at shutdown, if the store could tell
    pub stored_records: Option<u64>,
    pub replicator: ReplicatorStats,
    pub summary: ReadingSummary,
}

impl AcquisitionReport {
    /// Accepted readings per minute
    pub fn rate_per_minute(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.stats.readings as f64 * 60.0 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for AcquisitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "=== Acquisition Report ===")?;
        writeln!(f, "Duration: {:.1}s", self.duration.as_secs_f64())?;
        writeln!(
            f,
            "Readings: {} (device {}, synthetic {}, {:.2}/min)",
            s.readings,
            s.device_readings,
            s.synthetic_readings,
            self.rate_per_minute()
        )?;
        writeln!(f, "Errors: {}", s.errors)?;
        writeln!(
            f,
            "Persisted: {} (failures {})",
            s.persisted, s.persist_failures
        )?;
        match self.stored_records {
            Some(n) => writeln!(f, "Stored records: {n}")?,
            None => writeln!(f, "Stored records: unknown")?,
        }
        writeln!(
            f,
            "Notifications: {} sent, {} failed, {} suppressed",
            s.notifications_sent, s.notification_failures, s.notifications_suppressed
        )?;
        if self.replicator.enabled {
            writeln!(
                f,
                "Replicator: {} ok, {} failed",
                self.replicator.successful_count, self.replicator.failed_count
            )?;
            if let Some(error) = &self.replicator.last_error {
                writeln!(f, "Replicator last error: {error}")?;
            }
        } else {
            writeln!(f, "Replicator: disabled")?;
        }
        Ok(())
    }
}

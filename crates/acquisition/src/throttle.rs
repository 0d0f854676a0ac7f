//! Sink throttle - minimum spacing between emissions per channel

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Channel of the notification sink
pub const NOTIFICATION_CHANNEL: &str = "notification";
/// Channel pacing the synthetic generator
pub const SYNTHETIC_CHANNEL: &str = "synthetic";

/// Last-emit instant per channel
///
/// Only the acquisition loop mutates it, so check-then-mark never races.
#[derive(Debug, Default)]
pub struct SinkThrottle {
    last_emit: HashMap<String, Instant>,
}

impl SinkThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `channel` may emit at `now`; a channel that never emitted is due
    pub fn is_due(&self, channel: &str, interval: Duration, now: Instant) -> bool {
        match self.last_emit.get(channel) {
            Some(last) => now.saturating_duration_since(*last) >= interval,
            None => true,
        }
    }

    /// Record an emission
    pub fn mark(&mut self, channel: &str, now: Instant) {
        self.last_emit.insert(channel.to_string(), now);
    }

    /// `is_due` and, when due, `mark`
    pub fn try_fire(&mut self, channel: &str, interval: Duration, now: Instant) -> bool {
        if self.is_due(channel, interval, now) {
            self.mark(channel, now);
            true
        } else {
            false
        }
    }

    pub fn last_emit(&self, channel: &str) -> Option<Instant> {
        self.last_emit.get(channel).copied()
    }
}

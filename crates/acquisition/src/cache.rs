//! Reading cache - latest accepted reading
//!
//! One writer (the acquisition loop), any number of readers. The whole
//! reading is swapped as one `Arc`, so a reader never sees a half-updated
//! value.

use std::sync::{Arc, PoisonError, RwLock};

use contracts::Reading;

type Slot = Arc<RwLock<Option<Arc<Reading>>>>;

/// Writer side, owned by the acquisition loop
#[derive(Debug, Default)]
pub struct ReadingCache {
    slot: Slot,
}

impl ReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached reading
    pub fn update(&self, reading: Reading) {
        let reading = Arc::new(reading);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(reading);
    }

    pub fn latest(&self) -> Option<Arc<Reading>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read-only handle for external consumers
    pub fn reader(&self) -> CacheReader {
        CacheReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Read-only view of the cache
#[derive(Debug, Clone)]
pub struct CacheReader {
    slot: Slot,
}

impl CacheReader {
    pub fn latest(&self) -> Option<Arc<Reading>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

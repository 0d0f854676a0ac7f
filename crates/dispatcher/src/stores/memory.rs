//! MemoryStore - in-process reading store

use std::sync::{Arc, Mutex};

use contracts::{ContractError, ReadingStore, Reading};

/// Store keeping readings in a shared vector
///
/// Clones share the same records, so a test can keep one handle and give
/// the other to the acquisition loop.
#[derive(Clone, Default)]
pub struct MemoryStore {
    name: String,
    records: Arc<Mutex<Vec<Reading>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Snapshot of stored readings
    pub fn records(&self) -> Vec<Reading> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent inserts fail
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut flag) = self.fail.lock() {
            *flag = fail;
        }
    }
}

impl ReadingStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_reading(&mut self, reading: &Reading) -> Result<u64, ContractError> {
        if self.fail.lock().map(|f| *f).unwrap_or(false) {
            return Err(ContractError::storage(&self.name, "store unavailable"));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| ContractError::storage(&self.name, "lock poisoned"))?;
        records.push(reading.clone());
        Ok(records.len() as u64)
    }

    async fn reading_count(&self) -> Result<u64, ContractError> {
        Ok(self.len() as u64)
    }
}

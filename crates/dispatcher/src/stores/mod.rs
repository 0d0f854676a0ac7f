//! Reading store implementations
//!
//! Contains FileStore, MemoryStore and the runtime-selected `StoreSink`.

mod file;
mod memory;

pub use self::file::{FileStore, CSV_FILE, CSV_HEADER, JSONL_FILE};
pub use self::memory::MemoryStore;

use contracts::{ContractError, ReadingStore, Reading, StorageConfig, StorageKind};

use crate::error::{DispatcherError, Result};

/// Store selected from config at runtime
pub enum StoreSink {
    File(FileStore),
    Memory(MemoryStore),
}

impl StoreSink {
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.kind {
            StorageKind::File => FileStore::new("file", &config.path)
                .map(Self::File)
                .map_err(|e| DispatcherError::sink_creation("file", e.to_string())),
            StorageKind::Memory => Ok(Self::Memory(MemoryStore::new("memory"))),
        }
    }
}

impl ReadingStore for StoreSink {
    fn name(&self) -> &str {
        match self {
            Self::File(s) => s.name(),
            Self::Memory(s) => s.name(),
        }
    }

    async fn insert_reading(&mut self, reading: &Reading) -> std::result::Result<u64, ContractError> {
        match self {
            Self::File(s) => s.insert_reading(reading).await,
            Self::Memory(s) => s.insert_reading(reading).await,
        }
    }

    async fn reading_count(&self) -> std::result::Result<u64, ContractError> {
        match self {
            Self::File(s) => s.reading_count().await,
            Self::Memory(s) => s.reading_count().await,
        }
    }
}

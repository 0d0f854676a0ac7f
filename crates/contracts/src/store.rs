//! ReadingStore trait - persistence collaborator interface

use crate::{ContractError, Reading};

/// Persistence for accepted readings
///
/// The acquisition loop is the only writer. Implementations should not hang;
/// the loop bounds every call with a timeout and counts failures itself.
#[trait_variant::make(ReadingStore: Send)]
pub trait LocalReadingStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one reading and return its record id
    ///
    /// # Errors
    /// Returns a storage error (should include context)
    async fn insert_reading(&mut self, reading: &Reading) -> Result<u64, ContractError>;

    /// Total number of stored readings
    async fn reading_count(&self) -> Result<u64, ContractError>;
}

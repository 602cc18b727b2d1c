use async_trait::async_trait;
use thiserror::Error;

use slotwatch_core::diff::SlotSet;

pub mod memory;
pub mod slot;

pub use memory::InMemorySlotRepository;
pub use slot::SqlSlotRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable home of the last observed slot set.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Everything persisted by the last successful `replace`; empty on first run.
    async fn read(&self) -> Result<SlotSet, RepositoryError>;

    /// Atomically swaps the stored set for `slots`. Readers never observe a
    /// mix of old and new rows.
    async fn replace(&self, slots: &SlotSet) -> Result<(), RepositoryError>;
}

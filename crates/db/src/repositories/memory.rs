use tokio::sync::RwLock;

use slotwatch_core::diff::SlotSet;

use super::{RepositoryError, SlotRepository};

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: RwLock<SlotSet>,
}

impl InMemorySlotRepository {
    pub fn with_slots(slots: SlotSet) -> Self {
        Self { slots: RwLock::new(slots) }
    }
}

#[async_trait::async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn read(&self) -> Result<SlotSet, RepositoryError> {
        Ok(self.slots.read().await.clone())
    }

    async fn replace(&self, slots: &SlotSet) -> Result<(), RepositoryError> {
        *self.slots.write().await = slots.clone();
        Ok(())
    }
}

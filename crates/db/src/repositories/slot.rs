use sqlx::Row;

use slotwatch_core::diff::SlotSet;
use slotwatch_core::domain::slot::SlotKey;

use super::{RepositoryError, SlotRepository};
use crate::DbPool;

pub struct SqlSlotRepository {
    pool: DbPool,
}

impl SqlSlotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Number of persisted slots.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schedule")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_slot(row: &sqlx::sqlite::SqliteRow) -> Result<SlotKey, RepositoryError> {
    let date: String = row.try_get("date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let time: String = row.try_get("time").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Ok(SlotKey { date, time })
}

#[async_trait::async_trait]
impl SlotRepository for SqlSlotRepository {
    async fn read(&self) -> Result<SlotSet, RepositoryError> {
        let rows = sqlx::query("SELECT date, time FROM schedule").fetch_all(&self.pool).await?;
        rows.iter().map(row_to_slot).collect()
    }

    async fn replace(&self, slots: &SlotSet) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM schedule").execute(&mut *tx).await?;
        for slot in slots {
            sqlx::query("INSERT OR IGNORE INTO schedule (date, time) VALUES (?, ?)")
                .bind(&slot.date)
                .bind(&slot.time)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

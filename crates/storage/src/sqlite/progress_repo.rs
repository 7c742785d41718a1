use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use round_core::model::SessionDraft;
use sqlx::Row;

use super::SqliteRepository;
use crate::progress;
use crate::repository::{SessionStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SessionStore for SqliteRepository {
    async fn load(&self) -> Result<SessionDraft, StorageError> {
        let rows = sqlx::query("SELECT key, value FROM progress_entries")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key").map_err(ser)?;
            let value: String = row.try_get("value").map_err(ser)?;
            entries.insert(key, value);
        }
        progress::decode(&entries)
    }

    async fn save(&self, draft: &SessionDraft) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (key, value) in progress::encode(draft) {
            sqlx::query(
                r"
                INSERT INTO progress_entries (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(key.as_str())
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM progress_entries")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

//! PostgreSQL-backed record store.
//!
//! Records live in `queue_entries` as JSONB documents. Updates merge the
//! patch with `||` and take `sentAt` from the database clock.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::relay::{Document, RecordUpdate};

use super::backend::{RecordStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_queue_entries.sql");

pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `queue_entries` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("queue_entries schema ensured");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO queue_entries (collection, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::Value::Object(doc))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT doc FROM queue_entries WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((serde_json::Value::Object(doc),)) => Ok(Some(doc)),
            Some(_) => Err(StoreError::Corrupt(format!("{}/{}", collection, id))),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entries
            SET doc = doc || $3::jsonb
                    || CASE WHEN $4 THEN jsonb_build_object('sentAt', to_jsonb(NOW()))
                            ELSE '{}'::jsonb END,
                updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::Value::Object(update.fields()))
        .bind(update.stamps_sent_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }

        tracing::trace!(
            collection = %collection,
            id = %id,
            status = %update.status(),
            "Record updated in PostgreSQL"
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_table() {
        assert!(SCHEMA.contains("CREATE TABLE IF NOT EXISTS queue_entries"));
        assert!(SCHEMA.contains("PRIMARY KEY (collection, id)"));
    }
}

//! Backend trait for queue entry storage.
//!
//! The relay only needs three things from the document store: insert a
//! record if it does not exist yet, read it back, and merge a terminal
//! update into it. Implementations decide where the `sentAt` timestamp
//! comes from so that it reflects the store's clock.

use async_trait::async_trait;
use thiserror::Error;

use crate::relay::{Document, RecordUpdate};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value is not a JSON object
    #[error("Corrupt record {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend identifier for health reporting
    fn backend_name(&self) -> &'static str;

    /// Insert `doc` under `id` unless the id already exists.
    ///
    /// Returns `true` when the record was created by this call.
    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<bool, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merge `update` into an existing record, leaving other fields untouched.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Merge `patch` into `doc`, overwriting fields present in both.
pub fn merge_patch(doc: &mut Document, patch: Document) {
    for (key, value) in patch {
        doc.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_keeps_other_fields() {
        let mut doc = json!({"status": "pending", "tokens": ["A"], "userId": "u-1"})
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({"status": "error", "error": "No tokens"})
            .as_object()
            .cloned()
            .unwrap();

        merge_patch(&mut doc, patch);

        assert_eq!(
            serde_json::Value::Object(doc),
            json!({"status": "error", "error": "No tokens", "tokens": ["A"], "userId": "u-1"})
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::not_found("fcm_queue", "abc");
        assert_eq!(err.to_string(), "Record fcm_queue/abc not found");
    }
}

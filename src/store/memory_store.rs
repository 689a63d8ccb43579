//! In-memory record store using DashMap.
//!
//! Records are lost on restart. Used for development and tests, and as the
//! fallback when a persistent backend is misconfigured.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::relay::{Document, RecordUpdate};

use super::backend::{merge_patch, RecordStore, StoreError};

/// In-memory record store keyed by `(collection, id)`.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<(String, String), Document>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all collections
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<bool, StoreError> {
        match self.records.entry((collection.to_string(), id.to_string())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(doc);
                Ok(true)
            }
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .records
            .get(&(collection.to_string(), id.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(&(collection.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        merge_patch(record.value_mut(), update.to_patch(Utc::now()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

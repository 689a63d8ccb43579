//! Redis-backed record store.
//!
//! Each record is a hash at `{prefix}:{collection}:{id}` holding one
//! JSON-encoded value per top-level document field. Creation and updates
//! run as Lua scripts so the existence check and the write are atomic;
//! an update only sets the fields it carries and never rewrites the rest.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde_json::Value;

use crate::relay::{Document, RecordUpdate};

use super::backend::{RecordStore, StoreError};

/// Marker field written on creation; never part of the document.
const VERSION_FIELD: &str = "__v";
const VERSION: &str = "1";

lazy_static! {
    /// HSET only if the key does not exist yet.
    static ref CREATE_SCRIPT: Script = Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV))
        return 1
        "
    );

    /// HSET only if the key already exists.
    static ref UPDATE_SCRIPT: Script = Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV))
        return 1
        "
    );
}

pub struct RedisRecordStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRecordStore {
    pub fn new(conn: ConnectionManager, prefix: String) -> Self {
        Self { conn, prefix }
    }

    fn record_key(&self, collection: &str, id: &str) -> String {
        record_key(&self.prefix, collection, id)
    }

    /// Current time according to the Redis server.
    async fn server_time(&self) -> Result<DateTime<Utc>, StoreError> {
        let mut conn = self.conn.clone();
        let (secs, micros): (i64, i64) = redis::cmd("TIME").query_async(&mut conn).await?;

        Ok(Utc
            .timestamp_opt(secs, (micros * 1_000) as u32)
            .single()
            .unwrap_or_else(Utc::now))
    }

    async fn run_script(
        &self,
        script: &Script,
        key: &str,
        fields: Vec<(String, String)>,
    ) -> Result<bool, StoreError> {
        let mut invocation = script.prepare_invoke();
        invocation.key(key);
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let applied: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(applied == 1)
    }
}

fn record_key(prefix: &str, collection: &str, id: &str) -> String {
    format!("{}:{}:{}", prefix, collection, id)
}

/// Flatten a document into hash field/value pairs.
fn encode_fields(doc: &Document) -> Result<Vec<(String, String)>, StoreError> {
    doc.iter()
        .map(|(field, value)| Ok((field.clone(), serde_json::to_string(value)?)))
        .collect()
}

/// Rebuild a document from the hash, dropping the version marker.
fn decode_fields(key: &str, mut fields: HashMap<String, String>) -> Result<Document, StoreError> {
    if fields.remove(VERSION_FIELD).is_none() {
        return Err(StoreError::Corrupt(key.to_string()));
    }

    fields
        .into_iter()
        .map(|(field, raw)| Ok((field, serde_json::from_str::<Value>(&raw)?)))
        .collect()
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<bool, StoreError> {
        let key = self.record_key(collection, id);

        let mut fields = encode_fields(&doc)?;
        fields.push((VERSION_FIELD.to_string(), VERSION.to_string()));

        self.run_script(&CREATE_SCRIPT, &key, fields).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let key = self.record_key(collection, id);
        let mut conn = self.conn.clone();

        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_fields(&key, fields).map(Some)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<(), StoreError> {
        let key = self.record_key(collection, id);

        let patch = if update.stamps_sent_at() {
            update.to_patch(self.server_time().await?)
        } else {
            update.fields()
        };

        if !self.run_script(&UPDATE_SCRIPT, &key, encode_fields(&patch)?).await? {
            return Err(StoreError::not_found(collection, id));
        }

        tracing::trace!(key = %key, status = %update.status(), "Record updated in Redis");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

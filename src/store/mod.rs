//! Queue entry storage.
//!
//! The store is the relay's handle on records: triggers create entries
//! through it and the relay writes its single terminal update back.

mod backend;
mod factory;
mod memory_store;
mod postgres_store;
mod redis_store;

pub use backend::{merge_patch, RecordStore, StoreError};
pub use factory::create_record_store;
pub use memory_store::MemoryRecordStore;
pub use postgres_store::PostgresRecordStore;
pub use redis_store::RedisRecordStore;

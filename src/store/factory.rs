//! Record store factory

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use crate::config::StoreConfig;

use super::backend::RecordStore;
use super::memory_store::MemoryRecordStore;
use super::postgres_store::PostgresRecordStore;
use super::redis_store::RedisRecordStore;

/// Create a record store based on configuration.
///
/// - `"postgres"`: `PostgresRecordStore` if a pool is provided
/// - `"redis"`: `RedisRecordStore` if a Redis connection is provided
/// - `"memory"` (default): `MemoryRecordStore`
///
/// Missing connections fall back to memory with a warning.
pub fn create_record_store(
    settings: &StoreConfig,
    redis_conn: Option<ConnectionManager>,
    postgres_pool: Option<PgPool>,
) -> Arc<dyn RecordStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL record store");
                Arc::new(PostgresRecordStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryRecordStore::new())
            }
        }
        "redis" => {
            if let Some(conn) = redis_conn {
                tracing::info!(
                    backend = "redis",
                    prefix = %settings.redis_prefix,
                    "Creating Redis record store"
                );
                Arc::new(RedisRecordStore::new(conn, settings.redis_prefix.clone()))
            } else {
                tracing::warn!("Redis store requested but no connection provided, falling back to memory");
                Arc::new(MemoryRecordStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory record store");
            Arc::new(MemoryRecordStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_backend() {
        let store = create_record_store(&config("memory"), None, None);
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_missing_connections_fall_back_to_memory() {
        assert_eq!(
            create_record_store(&config("redis"), None, None).backend_name(),
            "memory"
        );
        assert_eq!(
            create_record_store(&config("postgres"), None, None).backend_name(),
            "memory"
        );
    }

    #[test]
    fn test_unknown_backend_is_memory() {
        let store = create_record_store(&config("firestore"), None, None);
        assert_eq!(store.backend_name(), "memory");
    }
}

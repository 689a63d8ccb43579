//! Redis connectivity
//!
//! - `connect`: multiplexed connection manager for the record store
//! - `ExponentialBackoff`: reconnection delays for the pub/sub trigger

mod backoff;

pub use backoff::{BackoffConfig, ExponentialBackoff};

use redis::aio::ConnectionManager;
use redis::{Client, RedisResult};

use crate::config::RedisConfig;

/// Open a self-reconnecting multiplexed connection.
pub async fn connect(config: &RedisConfig) -> RedisResult<ConnectionManager> {
    let client = Client::open(config.url.as_str())?;
    let conn = ConnectionManager::new(client).await?;
    tracing::info!("Redis connection established");
    Ok(conn)
}

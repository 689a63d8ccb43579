//! Creation triggers feeding the relay.
//!
//! - HTTP: `POST /api/v1/queue`
//! - Redis: pub/sub creation messages

mod http;
mod redis;

pub use http::{
    create_queue_entry, get_queue_entry, CreateQueueEntryRequest, CreateQueueEntryResponse,
};
pub use redis::{parse_message, RedisQueueMessage, RedisSubscriber};

use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::config::RedisConfig;
use crate::metrics::TriggerMetrics;
use crate::redis::ExponentialBackoff;
use crate::relay::{NotificationRecord, RelayService};

const TRIGGER: &str = "redis";

/// Creation message received from Redis Pub/Sub
#[derive(Debug, Deserialize)]
pub struct RedisQueueMessage {
    /// Record id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// The record content at creation time
    pub record: NotificationRecord,
}

/// Redis Pub/Sub creation trigger
pub struct RedisSubscriber {
    config: RedisConfig,
    relay: Arc<RelayService>,
    shutdown: broadcast::Sender<()>,
}

impl RedisSubscriber {
    pub fn new(config: RedisConfig, relay: Arc<RelayService>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            relay,
            shutdown,
        }
    }

    /// Get a shutdown signal sender
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Run the subscriber until shutdown, reconnecting with backoff.
    pub async fn start(&self) -> anyhow::Result<()> {
        if !self.config.enabled {
            tracing::info!("Redis trigger disabled, skipping Redis subscriber");
            return Ok(());
        }

        tracing::info!(channel = %self.config.trigger_channel, "Starting Redis subscriber");

        let mut backoff = ExponentialBackoff::new();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            match self.run_subscription_loop(&mut backoff).await {
                Ok(()) => {
                    tracing::info!("Redis subscriber stopped gracefully");
                    break;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    TriggerMetrics::record_redis_reconnect();
                    tracing::error!(
                        error = %e,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Redis subscription error, reconnecting"
                    );

                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Received shutdown signal while reconnecting");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        Ok(())
    }

    async fn run_subscription_loop(&self, backoff: &mut ExponentialBackoff) -> anyhow::Result<()> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        let channel = &self.config.trigger_channel;
        if channel.contains('*') || channel.contains('?') || channel.contains('[') {
            pubsub.psubscribe(channel).await?;
        } else {
            pubsub.subscribe(channel).await?;
        }

        tracing::info!(channel = %channel, "Redis subscription established");
        backoff.reset();

        let mut message_stream = pubsub.on_message();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    return Ok(());
                }
                msg = message_stream.next() => {
                    let Some(msg) = msg else {
                        anyhow::bail!("Redis message stream ended");
                    };

                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to get message payload");
                            continue;
                        }
                    };

                    self.handle_message(msg.get_channel_name(), &payload).await;
                }
            }
        }
    }

    /// Handle one creation message. Malformed messages are dropped.
    async fn handle_message(&self, channel: &str, payload: &str) {
        TriggerMetrics::record_redis_message();
        tracing::debug!(channel = %channel, "Received Redis message");

        let message = match parse_message(payload) {
            Ok(m) => m,
            Err(e) => {
                TriggerMetrics::record_rejected(TRIGGER);
                tracing::warn!(
                    error = %e,
                    channel = %channel,
                    "Failed to parse Redis queue message"
                );
                return;
            }
        };

        match self.relay.submit(TRIGGER, message.id, message.record).await {
            Ok(submission) => {
                tracing::debug!(
                    id = %submission.id,
                    created = submission.created,
                    "Queue entry submitted from Redis"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, channel = %channel, "Failed to store queue entry");
            }
        }
    }
}

pub fn parse_message(payload: &str) -> serde_json::Result<RedisQueueMessage> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::LogPushSender;
    use crate::relay::RelayDispatcher;
    use crate::store::MemoryRecordStore;

    #[test]
    fn test_parse_queue_message() {
        let message = parse_message(
            r#"{
                "id": "doc-1",
                "record": {
                    "status": "pending",
                    "tokens": ["A", "B"],
                    "notification": {"title": "Hi", "body": "there"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(message.id.as_deref(), Some("doc-1"));
        assert_eq!(message.record.tokens(), ["A", "B"]);
    }

    #[test]
    fn test_parse_message_without_id() {
        let message = parse_message(r#"{"record": {"estado": "pendiente"}}"#).unwrap();
        assert!(message.id.is_none());
        assert!(message.record.is_pending());
    }

    #[test]
    fn test_parse_message_requires_record() {
        assert!(parse_message(r#"{"id": "doc-1"}"#).is_err());
        assert!(parse_message("not json").is_err());
    }

    #[tokio::test]
    async fn test_disabled_subscriber_returns_immediately() {
        let dispatcher = RelayDispatcher::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(LogPushSender),
            "Default",
        );
        let relay = Arc::new(RelayService::new(Arc::new(dispatcher), "fcm_queue"));
        let subscriber = RedisSubscriber::new(RedisConfig::default(), relay);

        assert!(subscriber.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_message_creates_record() {
        let store = Arc::new(MemoryRecordStore::new());
        let dispatcher = RelayDispatcher::new(store.clone(), Arc::new(LogPushSender), "Default");
        let relay = Arc::new(RelayService::new(Arc::new(dispatcher), "fcm_queue"));
        let subscriber = RedisSubscriber::new(RedisConfig::default(), relay);

        subscriber
            .handle_message(
                "fcm_queue:created",
                r#"{"id": "doc-1", "record": {"status": "pending", "tokens": []}}"#,
            )
            .await;
        subscriber.handle_message("fcm_queue:created", "garbage").await;

        assert_eq!(store.len(), 1);
    }
}

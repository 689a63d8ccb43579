//! Development backend that only logs.

use async_trait::async_trait;

use crate::relay::{MulticastMessage, MulticastResponse};

use super::sender::{PushError, PushSender};

/// Logs each multicast and reports every token as delivered.
#[derive(Debug, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    fn backend_name(&self) -> &'static str {
        "log"
    }

    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastResponse, PushError> {
        tracing::info!(
            title = %message.title,
            body = %message.body,
            data_keys = message.data.len(),
            token_count = message.tokens.len(),
            "Push multicast (log backend)"
        );

        Ok(MulticastResponse {
            success_count: message.tokens.len() as u32,
            failure_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn test_reports_all_tokens_delivered() {
        let message = MulticastMessage {
            title: "Hi".to_string(),
            body: String::new(),
            data: HashMap::new(),
            tokens: vec!["A".to_string(), "A".to_string(), "B".to_string()],
        };

        let response = LogPushSender.send_multicast(&message).await.unwrap();
        assert_eq!(response.success_count, 3);
        assert_eq!(response.failure_count, 0);
    }
}

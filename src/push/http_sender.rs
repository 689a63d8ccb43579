//! Generic HTTP push gateway backend.
//!
//! Posts `{notification: {title, body}, data, tokens}` to a configured
//! endpoint and expects `{successCount, failureCount}` back.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::relay::{MulticastMessage, MulticastResponse};

use super::sender::{PushError, PushSender};

#[derive(Debug, Serialize)]
struct GatewayNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    notification: GatewayNotification<'a>,
    data: &'a HashMap<String, String>,
    tokens: &'a [String],
}

impl<'a> From<&'a MulticastMessage> for GatewayRequest<'a> {
    fn from(message: &'a MulticastMessage) -> Self {
        Self {
            notification: GatewayNotification {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
            tokens: &message.tokens,
        }
    }
}

pub struct HttpPushSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPushSender {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastResponse, PushError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GatewayRequest::from(message));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<MulticastResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_request_body() {
        let message = MulticastMessage {
            title: "Hi".to_string(),
            body: "there".to_string(),
            data: HashMap::from([("orderId".to_string(), "42".to_string())]),
            tokens: vec!["A".to_string(), "B".to_string()],
        };

        let body = serde_json::to_value(GatewayRequest::from(&message)).unwrap();
        assert_eq!(
            body,
            json!({
                "notification": {"title": "Hi", "body": "there"},
                "data": {"orderId": "42"},
                "tokens": ["A", "B"]
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_a_fault() {
        let sender = HttpPushSender::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/send".to_string(),
            None,
        );
        let message = MulticastMessage {
            title: "Hi".to_string(),
            body: String::new(),
            data: HashMap::new(),
            tokens: vec!["A".to_string()],
        };

        let result = sender.send_multicast(&message).await;
        assert!(matches!(result, Err(PushError::Request(_))));
    }
}

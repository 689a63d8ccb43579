//! Push delivery abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::relay::{MulticastMessage, MulticastResponse};

/// Faults raised by a push backend.
///
/// The relay does not distinguish between variants; the `Display` text is
/// what ends up in the record's `error` field.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Push backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Push configuration error: {0}")]
    Config(String),
}

/// A backend able to deliver one message to many device tokens.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Backend identifier for health reporting
    fn backend_name(&self) -> &'static str;

    /// Deliver `message` to every token in `message.tokens`.
    ///
    /// Per-token failures are reported through `failure_count`; an `Err`
    /// means the call as a whole failed.
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastResponse, PushError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PushError::HttpStatus {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Push backend returned HTTP 503: unavailable");

        let err = PushError::InvalidArgument("tokens must not be empty".to_string());
        assert_eq!(err.to_string(), "tokens must not be empty");
    }

    #[test]
    fn test_request_error_message() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = PushError::from(req_err);
        assert!(!err.to_string().is_empty());
    }
}

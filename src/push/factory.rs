//! Push sender factory

use std::sync::Arc;
use std::time::Duration;

use crate::config::PushConfig;

use super::fcm_sender::{FcmSender, ServiceAccount};
use super::http_sender::HttpPushSender;
use super::log_sender::LogPushSender;
use super::sender::{PushError, PushSender};

/// Environment variable consulted when `push.credentials_file` is unset
const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Create a push sender based on configuration.
///
/// - `"fcm"` (default): `FcmSender`, requires service-account credentials
/// - `"http"`: `HttpPushSender`, requires `push.endpoint`
/// - `"log"`: `LogPushSender`
///
/// Unlike the store factory this does not fall back silently: falling
/// back to the log sender would mark every record as sent without any
/// push being delivered.
pub fn create_push_sender(settings: &PushConfig) -> Result<Arc<dyn PushSender>, PushError> {
    match settings.backend.as_str() {
        "log" => {
            tracing::warn!(backend = "log", "Push notifications will only be logged");
            Ok(Arc::new(LogPushSender))
        }
        "http" => {
            let endpoint = settings
                .endpoint
                .clone()
                .ok_or_else(|| PushError::Config("push.endpoint is required for the http backend".into()))?;

            tracing::info!(backend = "http", endpoint = %endpoint, "Creating HTTP push sender");
            Ok(Arc::new(HttpPushSender::new(
                build_client(settings)?,
                endpoint,
                settings.api_key.clone(),
            )))
        }
        "fcm" => {
            let path = settings
                .credentials_file
                .clone()
                .or_else(|| std::env::var(CREDENTIALS_ENV).ok())
                .ok_or_else(|| {
                    PushError::Config(format!(
                        "push.credentials_file or {} is required for the fcm backend",
                        CREDENTIALS_ENV
                    ))
                })?;

            let account = ServiceAccount::from_file(&path)?;
            Ok(Arc::new(FcmSender::new(
                build_client(settings)?,
                account,
                settings.project_id.clone(),
                settings.max_concurrency,
            )?))
        }
        other => Err(PushError::Config(format!("unknown push backend '{}'", other))),
    }
}

fn build_client(settings: &PushConfig) -> Result<reqwest::Client, PushError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_backend() {
        let config = PushConfig {
            backend: "log".to_string(),
            ..Default::default()
        };
        let sender = create_push_sender(&config).unwrap();
        assert_eq!(sender.backend_name(), "log");
    }

    #[test]
    fn test_http_backend_requires_endpoint() {
        let config = PushConfig {
            backend: "http".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_push_sender(&config),
            Err(PushError::Config(_))
        ));

        let config = PushConfig {
            backend: "http".to_string(),
            endpoint: Some("http://localhost:9000/send".to_string()),
            ..Default::default()
        };
        assert_eq!(create_push_sender(&config).unwrap().backend_name(), "http");
    }

    #[test]
    fn test_fcm_backend_missing_credentials_file() {
        let config = PushConfig {
            backend: "fcm".to_string(),
            credentials_file: Some("/nonexistent/service-account.json".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            create_push_sender(&config),
            Err(PushError::Credentials(_))
        ));
    }

    #[test]
    fn test_unknown_backend() {
        let config = PushConfig {
            backend: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_push_sender(&config),
            Err(PushError::Config(_))
        ));
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Collection holding the queue entries
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Title used when a record carries none
    #[serde(default = "default_title")]
    pub default_title: String,
    /// How long shutdown waits for running relay invocations
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// "fcm", "http" or "log"
    #[serde(default = "default_push_backend")]
    pub backend: String,
    /// Gateway URL for the "http" backend
    pub endpoint: Option<String>,
    /// Bearer token for the "http" backend
    pub api_key: Option<String>,
    /// Service-account JSON for the "fcm" backend
    pub credentials_file: Option<String>,
    /// Overrides the project id found in the service-account file
    pub project_id: Option<String>,
    #[serde(default = "default_push_timeout")]
    pub timeout_seconds: u64,
    /// Maximum in-flight per-token requests (fcm)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// "memory", "redis" or "postgres"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Whether the pub/sub trigger is started
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_trigger_channel")]
    pub trigger_channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

/// OpenTelemetry exporter settings
#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_collection() -> String {
    "fcm_queue".to_string()
}

fn default_title() -> String {
    "Nueva notificación".to_string()
}

fn default_drain_timeout() -> u64 {
    10
}

fn default_push_backend() -> String {
    "fcm".to_string()
}

fn default_push_timeout() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    100
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_redis_prefix() -> String {
    "relay".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_trigger_channel() -> String {
    "fcm_queue:created".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u32 {
    10
}

fn default_idle_timeout() -> u32 {
    300 // 5 minutes
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "push-relay-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("relay.collection", "fcm_queue")?
            .set_default("push.backend", "fcm")?
            .set_default("store.backend", "memory")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, PUSH__BACKEND, RELAY__DEFAULT_TITLE, REDIS__ENABLED, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            default_title: default_title(),
            drain_timeout_seconds: default_drain_timeout(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            backend: default_push_backend(),
            endpoint: None,
            api_key: None,
            credentials_file: None,
            project_id: None,
            timeout_seconds: default_push_timeout(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            redis_prefix: default_redis_prefix(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            trigger_channel: default_trigger_channel(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            relay: RelayConfig::default(),
            push: PushConfig::default(),
            store: StoreConfig::default(),
            redis: RedisConfig::default(),
            database: DatabaseConfig::default(),
            otel: OtelConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8081);
    }

    #[test]
    fn test_relay_defaults() {
        let relay = RelayConfig::default();
        assert_eq!(relay.collection, "fcm_queue");
        assert_eq!(relay.default_title, "Nueva notificación");
        assert_eq!(relay.drain_timeout_seconds, 10);
    }

    #[test]
    fn test_backend_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.push.backend, "fcm");
        assert_eq!(settings.store.backend, "memory");
        assert!(!settings.redis.enabled);
        assert_eq!(settings.redis.trigger_channel, "fcm_queue:created");
        assert_eq!(settings.server_addr(), "0.0.0.0:8081");
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let json = serde_json::json!({
            "push": { "backend": "http", "endpoint": "http://gateway/send" },
            "relay": { "default_title": "New message" }
        });

        let settings: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.push.backend, "http");
        assert_eq!(settings.push.endpoint.as_deref(), Some("http://gateway/send"));
        assert_eq!(settings.push.timeout_seconds, 30);
        assert_eq!(settings.relay.default_title, "New message");
        assert_eq!(settings.relay.collection, "fcm_queue");
        assert_eq!(settings.server.port, 8081);
    }
}

mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, LogConfig, OtelConfig, PushConfig, RedisConfig, RelayConfig,
    ServerConfig, Settings, StoreConfig,
};

//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::relay::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
    pub push: PushHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PushHealthResponse {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub collection: String,
    pub uptime_seconds: u64,
    pub relay: DispatcherStatsSnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let dispatcher = state.relay.dispatcher();
    let store = dispatcher.store();

    let ping = store.ping().await;
    if let Err(ref e) = ping {
        tracing::warn!(backend = store.backend_name(), error = %e, "Store health check failed");
    }

    let status = if ping.is_ok() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: store.backend_name().to_string(),
            connected: ping.is_ok(),
            error: ping.err().map(|e| e.to_string()),
        },
        push: PushHealthResponse {
            backend: dispatcher.sender().backend_name().to_string(),
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        collection: state.relay.collection().to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        relay: state.relay.dispatcher().stats(),
    })
}

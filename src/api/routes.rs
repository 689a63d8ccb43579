use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};
use crate::triggers::{create_queue_entry, get_queue_entry};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Queue entries
        .nest(
            "/api/v1",
            Router::new()
                .route("/queue", post(create_queue_entry))
                .route("/queue/{id}", get(get_queue_entry))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}

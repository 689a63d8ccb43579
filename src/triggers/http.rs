//! HTTP creation trigger and record lookup

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::relay::{Document, NotificationRecord};
use crate::server::AppState;

const TRIGGER: &str = "http";

/// Body of `POST /api/v1/queue`: the record itself plus an optional id
#[derive(Debug, Deserialize)]
pub struct CreateQueueEntryRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub record: NotificationRecord,
}

#[derive(Debug, Serialize)]
pub struct CreateQueueEntryResponse {
    pub id: String,
    pub collection: String,
}

/// Create a queue entry and fire the relay for it
#[tracing::instrument(name = "http.create_queue_entry", skip(state, payload))]
pub async fn create_queue_entry(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateQueueEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateQueueEntryResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        crate::metrics::TriggerMetrics::record_rejected(TRIGGER);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::Validation(rejection.body_text())
        }
    })?;

    if request.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(AppError::Validation("id must not be empty".to_string()));
    }

    let submission = state
        .relay
        .submit(TRIGGER, request.id, request.record)
        .await?;

    if !submission.created {
        return Err(AppError::Conflict(format!(
            "Queue entry {} already exists",
            submission.id
        )));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateQueueEntryResponse {
            id: submission.id,
            collection: state.relay.collection().to_string(),
        }),
    ))
}

/// Read back a queue entry, including the relay's outcome fields
pub async fn get_queue_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    let collection = state.relay.collection();

    state
        .relay
        .dispatcher()
        .store()
        .get(collection, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Queue entry {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_with_id() {
        let request: CreateQueueEntryRequest = serde_json::from_value(json!({
            "id": "doc-1",
            "status": "pending",
            "tokens": ["A", "B"],
            "notification": {"title": "Hi", "body": "there"},
            "data": {"orderId": "42"}
        }))
        .unwrap();

        assert_eq!(request.id.as_deref(), Some("doc-1"));
        assert!(request.record.is_pending());
        assert_eq!(request.record.tokens(), ["A", "B"]);
        assert!(request.record.extra.get("id").is_none());
    }

    #[test]
    fn test_parse_request_without_id() {
        let request: CreateQueueEntryRequest = serde_json::from_value(json!({
            "estado": "pendiente",
            "tokens": []
        }))
        .unwrap();

        assert!(request.id.is_none());
        assert!(request.record.is_pending());
    }

    #[test]
    fn test_non_string_data_is_rejected() {
        let result: std::result::Result<CreateQueueEntryRequest, _> =
            serde_json::from_value(json!({
                "status": "pending",
                "tokens": ["A"],
                "data": {"count": 3}
            }));
        assert!(result.is_err());
    }
}

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored queue entry, as a JSON object.
pub type Document = serde_json::Map<String, Value>;

/// Error text written when a record has no recipients
pub const NO_TOKENS_ERROR: &str = "No tokens";

/// Lifecycle status of a queue entry.
///
/// Legacy client values (`pendiente`, `enviado`) are read as their
/// canonical counterparts. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    Pending,
    Sent,
    Error,
    Other(String),
}

impl RecordStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" | "pendiente" => Self::Pending,
            "sent" | "enviado" => Self::Sent,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title/body pair of a queue entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Aggregate outcome of a multicast send, as persisted on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    #[serde(rename = "exitos")]
    pub success_count: u32,
    #[serde(rename = "fallos")]
    pub failure_count: u32,
}

/// Notification request record.
///
/// Fields the relay does not know about are carried in `extra` so that a
/// stored document round-trips without losing producer data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(default, alias = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,

    #[serde(default, alias = "enviadoEn", skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "resultado", skip_serializing_if = "Option::is_none")]
    pub result: Option<DeliveryCounts>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub extra: Document,
}

impl NotificationRecord {
    /// A pending record addressed to `tokens`.
    pub fn pending(tokens: Vec<String>, title: Option<&str>, body: Option<&str>) -> Self {
        Self {
            status: Some(RecordStatus::Pending),
            tokens: Some(tokens),
            notification: Some(NotificationContent {
                title: title.map(str::to_string),
                body: body.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }

    /// Serialize into a document with canonical field names.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Document::new()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.as_ref().is_some_and(RecordStatus::is_pending)
    }

    pub fn tokens(&self) -> &[String] {
        self.tokens.as_deref().unwrap_or_default()
    }
}

/// Message handed to the push backend
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    pub tokens: Vec<String>,
}

impl MulticastMessage {
    /// Build the delivery message for a record, applying defaults.
    ///
    /// Tokens are passed through as given, without dedup or validation.
    pub fn from_record(record: &NotificationRecord, default_title: &str) -> Self {
        let content = record.notification.clone().unwrap_or_default();

        Self {
            title: content
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| default_title.to_string()),
            body: content.body.unwrap_or_default(),
            data: record.data.clone().unwrap_or_default(),
            tokens: record.tokens().to_vec(),
        }
    }
}

/// Aggregate result of a multicast send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticastResponse {
    pub success_count: u32,
    pub failure_count: u32,
}

impl From<MulticastResponse> for DeliveryCounts {
    fn from(response: MulticastResponse) -> Self {
        Self {
            success_count: response.success_count,
            failure_count: response.failure_count,
        }
    }
}

/// The single terminal write the relay performs on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordUpdate {
    Sent { result: DeliveryCounts },
    Failed { error: String },
}

impl RecordUpdate {
    pub fn no_tokens() -> Self {
        Self::Failed {
            error: NO_TOKENS_ERROR.to_string(),
        }
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Sent { .. } => RecordStatus::Sent,
            Self::Failed { .. } => RecordStatus::Error,
        }
    }

    /// Whether the store must stamp `sentAt` with its own clock
    pub fn stamps_sent_at(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Fields to merge, excluding the store-assigned `sentAt`.
    pub fn fields(&self) -> Document {
        let mut patch = Document::new();
        patch.insert("status".into(), Value::String(self.status().into()));

        match self {
            Self::Sent { result } => {
                patch.insert(
                    "result".into(),
                    serde_json::json!({
                        "exitos": result.success_count,
                        "fallos": result.failure_count,
                    }),
                );
            }
            Self::Failed { error } => {
                patch.insert("error".into(), Value::String(error.clone()));
            }
        }

        patch
    }

    /// Full patch, with `sentAt` taken from `now` when applicable.
    pub fn to_patch(&self, now: DateTime<Utc>) -> Document {
        let mut patch = self.fields();
        if self.stamps_sent_at() {
            patch.insert("sentAt".into(), Value::String(now.to_rfc3339()));
        }
        patch
    }
}

/// What a single relay invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Record was not pending; nothing written
    Skipped,
    /// Record had no tokens; marked as error
    NoTokens,
    Sent {
        success_count: u32,
        failure_count: u32,
    },
    Failed {
        error: String,
    },
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::NoTokens => "no_tokens",
            Self::Sent { .. } => "sent",
            Self::Failed { .. } => "error",
        }
    }
}

/// Creation event delivered to the relay
#[derive(Debug, Clone)]
pub struct RecordCreated {
    pub collection: String,
    pub id: String,
    pub record: NotificationRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_aliases() {
        assert_eq!(RecordStatus::from("pendiente".to_string()), RecordStatus::Pending);
        assert_eq!(RecordStatus::from("enviado".to_string()), RecordStatus::Sent);
        assert_eq!(RecordStatus::from("error".to_string()), RecordStatus::Error);
        assert_eq!(
            RecordStatus::from("queued".to_string()),
            RecordStatus::Other("queued".to_string())
        );
        assert_eq!(String::from(RecordStatus::Other("queued".into())), "queued");
    }

    #[test]
    fn test_parse_legacy_record() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "estado": "pendiente",
            "tokens": ["A", "B"],
            "notification": {"title": "Hola", "body": "mundo"},
            "userId": "u-1"
        }))
        .unwrap();

        assert!(record.is_pending());
        assert_eq!(record.tokens(), ["A", "B"]);
        assert_eq!(record.extra.get("userId"), Some(&json!("u-1")));

        let doc = record.to_document().unwrap();
        assert_eq!(doc.get("status"), Some(&json!("pending")));
        assert!(doc.get("estado").is_none());
        assert_eq!(doc.get("userId"), Some(&json!("u-1")));
    }

    #[test]
    fn test_missing_status_is_not_pending() {
        let record: NotificationRecord =
            serde_json::from_value(json!({"tokens": ["A"]})).unwrap();
        assert!(!record.is_pending());

        let record: NotificationRecord =
            serde_json::from_value(json!({"status": "processing"})).unwrap();
        assert!(!record.is_pending());
    }

    #[test]
    fn test_null_fields_default() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "status": "pending",
            "tokens": null,
            "notification": null,
            "data": null
        }))
        .unwrap();

        assert!(record.tokens().is_empty());
        let message = MulticastMessage::from_record(&record, "Default");
        assert_eq!(message.title, "Default");
        assert_eq!(message.body, "");
        assert!(message.data.is_empty());
    }

    #[test]
    fn test_message_defaults_title() {
        let mut record = NotificationRecord::pending(vec!["A".into()], None, Some("there"));
        record.data = Some(HashMap::from([("k".to_string(), "v".to_string())]));

        let message = MulticastMessage::from_record(&record, "Nueva notificación");
        assert_eq!(message.title, "Nueva notificación");
        assert_eq!(message.body, "there");
        assert_eq!(message.data.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_message_keeps_duplicate_tokens() {
        let record = NotificationRecord::pending(
            vec!["A".into(), "A".into(), "not a token".into()],
            Some("Hi"),
            None,
        );

        let message = MulticastMessage::from_record(&record, "Default");
        assert_eq!(message.tokens, vec!["A", "A", "not a token"]);
        assert_eq!(message.title, "Hi");
    }

    #[test]
    fn test_sent_patch_shape() {
        let now = Utc::now();
        let update = RecordUpdate::Sent {
            result: DeliveryCounts {
                success_count: 2,
                failure_count: 0,
            },
        };

        let patch = update.to_patch(now);
        assert_eq!(patch.len(), 3);
        assert_eq!(patch.get("status"), Some(&json!("sent")));
        assert_eq!(patch.get("result"), Some(&json!({"exitos": 2, "fallos": 0})));
        assert_eq!(patch.get("sentAt"), Some(&json!(now.to_rfc3339())));
    }

    #[test]
    fn test_error_patch_shape() {
        let patch = RecordUpdate::no_tokens().to_patch(Utc::now());
        assert_eq!(
            Value::Object(patch),
            json!({"status": "error", "error": "No tokens"})
        );
    }

    #[test]
    fn test_counts_from_response() {
        let response: MulticastResponse =
            serde_json::from_value(json!({"successCount": 3, "failureCount": 1})).unwrap();
        let counts = DeliveryCounts::from(response);
        assert_eq!(counts.success_count, 3);
        assert_eq!(counts.failure_count, 1);
    }
}

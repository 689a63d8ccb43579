use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use crate::metrics::TriggerMetrics;
use crate::store::StoreError;

use super::{DispatchOutcome, NotificationRecord, RecordCreated, RelayDispatcher};

/// Result of submitting a new queue entry
#[derive(Debug)]
pub struct Submission {
    pub id: String,
    /// False when the id already existed; the relay was not fired
    pub created: bool,
    /// Handle to the spawned relay invocation, if one was fired
    pub handle: Option<JoinHandle<DispatchOutcome>>,
}

/// Entry point shared by all creation triggers.
///
/// Creating a record is an insert-if-absent on the store; the relay fires
/// only when this call created the record, so replayed or duplicated
/// creation events never dispatch twice.
pub struct RelayService {
    dispatcher: Arc<RelayDispatcher>,
    collection: String,
    in_flight: TaskTracker,
}

impl RelayService {
    pub fn new(dispatcher: Arc<RelayDispatcher>, collection: impl Into<String>) -> Self {
        Self {
            dispatcher,
            collection: collection.into(),
            in_flight: TaskTracker::new(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<RelayDispatcher> {
        &self.dispatcher
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of relay invocations still running
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Wait for running relay invocations to finish their terminal write.
    ///
    /// Returns `false` if some were still running when `timeout` elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.in_flight.close();
        let pending = self.in_flight.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for in-flight relay invocations");
        }

        let drained = tokio::time::timeout(timeout, self.in_flight.wait())
            .await
            .is_ok();
        if !drained {
            tracing::warn!(
                remaining = self.in_flight.len(),
                timeout_ms = timeout.as_millis() as u64,
                "Drain timeout reached, records may stay pending"
            );
        }
        drained
    }

    /// Store a new record. Returns the creation event when it was created.
    pub async fn create(
        &self,
        id: Option<String>,
        record: NotificationRecord,
    ) -> Result<(String, Option<RecordCreated>), StoreError> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let doc = record.to_document()?;

        let created = self
            .dispatcher
            .store()
            .create(&self.collection, &id, doc)
            .await?;

        if !created {
            TriggerMetrics::record_duplicate();
            tracing::info!(collection = %self.collection, id = %id, "Record already exists, not dispatching");
            return Ok((id, None));
        }

        let event = RecordCreated {
            collection: self.collection.clone(),
            id: id.clone(),
            record,
        };
        Ok((id, Some(event)))
    }

    /// Create a record and, if new, run the relay for it in its own task.
    pub async fn submit(
        &self,
        trigger: &'static str,
        id: Option<String>,
        record: NotificationRecord,
    ) -> Result<Submission, StoreError> {
        TriggerMetrics::record_received(trigger);

        let (id, event) = self.create(id, record).await?;
        let Some(event) = event else {
            return Ok(Submission {
                id,
                created: false,
                handle: None,
            });
        };

        let dispatcher = self.dispatcher.clone();
        let span = tracing::info_span!("relay.trigger", trigger = trigger);
        let handle = self
            .in_flight
            .spawn(async move { dispatcher.dispatch(&event).await }.instrument(span));

        Ok(Submission {
            id,
            created: true,
            handle: Some(handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::LogPushSender;
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    fn service() -> RelayService {
        let dispatcher = RelayDispatcher::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(LogPushSender),
            "Default",
        );
        RelayService::new(Arc::new(dispatcher), "fcm_queue")
    }

    fn record() -> NotificationRecord {
        NotificationRecord::pending(vec!["A".into()], Some("Hi"), None)
    }

    #[tokio::test]
    async fn test_submit_dispatches_new_record() {
        let service = service();

        let submission = service
            .submit("test", Some("doc-1".into()), record())
            .await
            .unwrap();
        assert!(submission.created);
        assert_eq!(submission.id, "doc-1");

        let outcome = submission.handle.unwrap().await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Sent {
                success_count: 1,
                failure_count: 0
            }
        );

        let doc = service
            .dispatcher()
            .store()
            .get("fcm_queue", "doc-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.get("status"), Some(&json!("sent")));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_not_dispatched() {
        let service = service();

        let first = service
            .submit("test", Some("doc-1".into()), record())
            .await
            .unwrap();
        first.handle.unwrap().await.unwrap();

        let second = service
            .submit("test", Some("doc-1".into()), record())
            .await
            .unwrap();
        assert!(!second.created);
        assert!(second.handle.is_none());
        assert_eq!(service.dispatcher().stats().total_dispatched, 1);
    }

    #[tokio::test]
    async fn test_generates_id_when_absent() {
        let service = service();

        let submission = service.submit("test", None, record()).await.unwrap();
        assert!(Uuid::parse_str(&submission.id).is_ok());
        submission.handle.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_with_nothing_in_flight() {
        let service = service();
        assert_eq!(service.in_flight(), 0);
        assert!(service.drain(Duration::from_millis(10)).await);
    }
}

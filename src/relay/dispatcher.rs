use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::metrics::{PushMetrics, RelayMetrics};
use crate::push::PushSender;
use crate::store::RecordStore;

use super::{DispatchOutcome, MulticastMessage, RecordCreated, RecordUpdate};

/// Statistics for the relay dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Relay invocations
    pub total_dispatched: AtomicU64,
    /// Records ignored because they were not pending
    pub skipped: AtomicU64,
    /// Records failed for having no tokens
    pub no_tokens: AtomicU64,
    /// Records marked as sent
    pub sent: AtomicU64,
    /// Records marked as error after a push fault
    pub failed: AtomicU64,
    /// Terminal writes that could not be stored
    pub write_failures: AtomicU64,
    /// Tokens reported delivered by the push backend
    pub tokens_delivered: AtomicU64,
    /// Tokens reported failed by the push backend
    pub tokens_failed: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            no_tokens: self.no_tokens.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            tokens_delivered: self.tokens_delivered.load(Ordering::Relaxed),
            tokens_failed: self.tokens_failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &DispatchOutcome) {
        self.total_dispatched.fetch_add(1, Ordering::Relaxed);
        match outcome {
            DispatchOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            DispatchOutcome::NoTokens => {
                self.no_tokens.fetch_add(1, Ordering::Relaxed);
            }
            DispatchOutcome::Sent {
                success_count,
                failure_count,
            } => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                self.tokens_delivered
                    .fetch_add(*success_count as u64, Ordering::Relaxed);
                self.tokens_failed
                    .fetch_add(*failure_count as u64, Ordering::Relaxed);
            }
            DispatchOutcome::Failed { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_dispatched: u64,
    pub skipped: u64,
    pub no_tokens: u64,
    pub sent: u64,
    pub failed: u64,
    pub write_failures: u64,
    pub tokens_delivered: u64,
    pub tokens_failed: u64,
}

/// Runs the relay for one newly created record at a time.
///
/// Holds no per-record state; concurrent invocations for different
/// records are independent.
pub struct RelayDispatcher {
    store: Arc<dyn RecordStore>,
    sender: Arc<dyn PushSender>,
    default_title: String,
    stats: DispatcherStats,
}

impl RelayDispatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sender: Arc<dyn PushSender>,
        default_title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sender,
            default_title: default_title.into(),
            stats: DispatcherStats::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn sender(&self) -> &Arc<dyn PushSender> {
        &self.sender
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Relay one creation event: validate, send, write the outcome back.
    ///
    /// Never fails. Every non-skipped invocation performs exactly one
    /// write to the record; a failed write is logged and counted only.
    #[tracing::instrument(
        name = "relay.dispatch",
        skip(self, event),
        fields(collection = %event.collection, id = %event.id)
    )]
    pub async fn dispatch(&self, event: &RecordCreated) -> DispatchOutcome {
        let outcome = self.run(event).await;

        self.stats.record(&outcome);
        RelayMetrics::record_outcome(&outcome);
        outcome
    }

    async fn run(&self, event: &RecordCreated) -> DispatchOutcome {
        let record = &event.record;

        if !record.is_pending() {
            tracing::debug!(
                status = ?record.status.as_ref().map(|s| s.as_str()),
                "Record is not pending, ignoring"
            );
            return DispatchOutcome::Skipped;
        }

        if record.tokens().is_empty() {
            tracing::info!("Record has no tokens to send to");
            self.write(event, &RecordUpdate::no_tokens()).await;
            return DispatchOutcome::NoTokens;
        }

        let message = MulticastMessage::from_record(record, &self.default_title);
        let started = Instant::now();
        let result = self.sender.send_multicast(&message).await;
        PushMetrics::observe_latency(started.elapsed().as_secs_f64());

        let (outcome, update) = match result {
            Ok(response) => {
                PushMetrics::record_response(response.success_count, response.failure_count);
                tracing::info!(
                    success_count = response.success_count,
                    failure_count = response.failure_count,
                    "Push multicast sent"
                );
                (
                    DispatchOutcome::Sent {
                        success_count: response.success_count,
                        failure_count: response.failure_count,
                    },
                    RecordUpdate::Sent {
                        result: response.into(),
                    },
                )
            }
            Err(e) => {
                PushMetrics::record_fault();
                let error = e.to_string();
                tracing::error!(error = %error, "Push multicast failed");
                (
                    DispatchOutcome::Failed {
                        error: error.clone(),
                    },
                    RecordUpdate::Failed { error },
                )
            }
        };

        self.write(event, &update).await;
        outcome
    }

    async fn write(&self, event: &RecordCreated, update: &RecordUpdate) {
        if let Err(e) = self
            .store
            .update(&event.collection, &event.id, update)
            .await
        {
            self.stats.write_failures.fetch_add(1, Ordering::Relaxed);
            RelayMetrics::record_write_failure();
            tracing::error!(
                error = %e,
                status = %update.status(),
                "Failed to write relay outcome to record"
            );
        }
    }
}

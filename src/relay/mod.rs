//! Notification relay.
//!
//! Consumes newly created queue entries, sends them through the push
//! backend and writes the outcome back onto the same entry:
//!
//! - `types`: the record model, delivery message and terminal update
//! - `dispatcher`: the read-validate-send-write step for one record
//! - `service`: creation entry point shared by the triggers

mod dispatcher;
mod service;
mod types;

pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, RelayDispatcher};
pub use service::{RelayService, Submission};
pub use types::{
    DeliveryCounts, DispatchOutcome, Document, MulticastMessage, MulticastResponse,
    NotificationContent, NotificationRecord, RecordCreated, RecordStatus, RecordUpdate,
    NO_TOKENS_ERROR,
};

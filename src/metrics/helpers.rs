//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::relay::DispatchOutcome;

use super::{
    DISPATCH_OUTCOMES_TOTAL, PUSH_FAULTS_TOTAL, PUSH_SEND_LATENCY, PUSH_TOKENS_DELIVERED_TOTAL,
    PUSH_TOKENS_FAILED_TOTAL, RECORDS_DUPLICATE_TOTAL, RECORDS_RECEIVED_TOTAL,
    RECORDS_REJECTED_TOTAL, REDIS_MESSAGES_RECEIVED, REDIS_RECONNECTIONS_TOTAL,
    STORE_WRITE_FAILURES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording trigger metrics
pub struct TriggerMetrics;

impl TriggerMetrics {
    pub fn record_received(trigger: &str) {
        RECORDS_RECEIVED_TOTAL.with_label_values(&[trigger]).inc();
    }

    pub fn record_duplicate() {
        RECORDS_DUPLICATE_TOTAL.inc();
    }

    pub fn record_rejected(trigger: &str) {
        RECORDS_REJECTED_TOTAL.with_label_values(&[trigger]).inc();
    }

    pub fn record_redis_message() {
        REDIS_MESSAGES_RECEIVED.inc();
    }

    pub fn record_redis_reconnect() {
        REDIS_RECONNECTIONS_TOTAL.inc();
    }
}

/// Helper struct for recording relay metrics
pub struct RelayMetrics;

impl RelayMetrics {
    pub fn record_outcome(outcome: &DispatchOutcome) {
        DISPATCH_OUTCOMES_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn record_write_failure() {
        STORE_WRITE_FAILURES_TOTAL.inc();
    }
}

/// Helper struct for recording push metrics
pub struct PushMetrics;

impl PushMetrics {
    pub fn record_response(success_count: u32, failure_count: u32) {
        PUSH_TOKENS_DELIVERED_TOTAL.inc_by(success_count as u64);
        PUSH_TOKENS_FAILED_TOTAL.inc_by(failure_count as u64);
    }

    pub fn record_fault() {
        PUSH_FAULTS_TOTAL.inc();
    }

    pub fn observe_latency(seconds: f64) {
        PUSH_SEND_LATENCY.observe(seconds);
    }
}

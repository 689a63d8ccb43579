//! Prometheus metrics for the relay service.
//!
//! - Trigger metrics (records received, duplicate creations)
//! - Relay metrics (dispatch outcomes, store write failures)
//! - Push metrics (tokens delivered/failed, call latency)
//! - Redis trigger health

mod helpers;

pub use helpers::{encode_metrics, PushMetrics, RelayMetrics, TriggerMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "relay";

lazy_static! {
    // ============================================================================
    // Trigger Metrics
    // ============================================================================

    /// Creation events received, by trigger
    pub static ref RECORDS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_records_received_total", METRIC_PREFIX),
        "Total queue entry creation events received",
        &["trigger"]
    ).unwrap();

    /// Creation events for ids that already existed
    pub static ref RECORDS_DUPLICATE_TOTAL: IntCounter = register_int_counter!(
        format!("{}_records_duplicate_total", METRIC_PREFIX),
        "Creation events ignored because the record already existed"
    ).unwrap();

    /// Creation events that could not be parsed
    pub static ref RECORDS_REJECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_records_rejected_total", METRIC_PREFIX),
        "Creation events rejected as malformed",
        &["trigger"]
    ).unwrap();

    // ============================================================================
    // Relay Metrics
    // ============================================================================

    /// Relay invocations by outcome
    pub static ref DISPATCH_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_outcomes_total", METRIC_PREFIX),
        "Relay invocations by outcome",
        &["outcome"]
    ).unwrap();

    /// Terminal writes that failed
    pub static ref STORE_WRITE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_store_write_failures_total", METRIC_PREFIX),
        "Terminal record updates that could not be written"
    ).unwrap();

    // ============================================================================
    // Push Metrics
    // ============================================================================

    /// Tokens the push backend accepted
    pub static ref PUSH_TOKENS_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_tokens_delivered_total", METRIC_PREFIX),
        "Device tokens successfully delivered"
    ).unwrap();

    /// Tokens the push backend rejected
    pub static ref PUSH_TOKENS_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_tokens_failed_total", METRIC_PREFIX),
        "Device tokens that failed delivery"
    ).unwrap();

    /// Multicast calls that raised a fault
    pub static ref PUSH_FAULTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_faults_total", METRIC_PREFIX),
        "Multicast calls that failed as a whole"
    ).unwrap();

    /// Multicast call latency
    pub static ref PUSH_SEND_LATENCY: Histogram = register_histogram!(
        format!("{}_push_send_latency_seconds", METRIC_PREFIX),
        "Multicast send latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // ============================================================================
    // Redis Trigger Metrics
    // ============================================================================

    /// Redis pub/sub messages received
    pub static ref REDIS_MESSAGES_RECEIVED: IntCounter = register_int_counter!(
        format!("{}_redis_messages_received_total", METRIC_PREFIX),
        "Total messages received from Redis pub/sub"
    ).unwrap();

    /// Total Redis reconnection attempts
    pub static ref REDIS_RECONNECTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_redis_reconnections_total", METRIC_PREFIX),
        "Total Redis subscriber reconnection attempts"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registered() {
        RECORDS_RECEIVED_TOTAL.with_label_values(&["http"]).inc();
        DISPATCH_OUTCOMES_TOTAL.with_label_values(&["sent"]).inc();
        PUSH_SEND_LATENCY.observe(0.2);

        let output = encode_metrics().unwrap();
        assert!(output.contains("relay_records_received_total"));
        assert!(output.contains("relay_dispatch_outcomes_total"));
        assert!(output.contains("relay_push_send_latency_seconds"));
    }
}

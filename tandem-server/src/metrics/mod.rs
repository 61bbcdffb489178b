//! Prometheus metrics for the cache subsystem:
//! - tier operations (get/set/delete by outcome)
//! - response-cache outcomes (hit/miss/store/bypass)
//! - invalidated key counts per tier

use lazy_static::lazy_static;
use prometheus::{
    Encoder, IntCounterVec, TextEncoder, register_int_counter_vec,
};

lazy_static! {
    /// Cache tier operations by tier, operation and outcome
    pub static ref CACHE_OPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tandem_cache_operations_total",
        "Total cache tier operations by tier, operation and outcome",
        &["tier", "operation", "status"]
    ).unwrap();

    /// Response-cache middleware outcomes
    pub static ref RESPONSE_CACHE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tandem_response_cache_total",
        "Response-cache middleware outcomes",
        &["outcome"]
    ).unwrap();

    /// Keys removed by pattern invalidation, per tier
    pub static ref INVALIDATED_KEYS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tandem_invalidated_keys_total",
        "Keys removed by pattern invalidation per tier",
        &["tier"]
    ).unwrap();
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a cache tier operation
pub fn record_cache_op(tier: &str, operation: &str, status: &str) {
    CACHE_OPS_TOTAL
        .with_label_values(&[tier, operation, status])
        .inc();
}

/// Record a response-cache middleware outcome (hit/miss/store/bypass)
pub fn record_response_cache(outcome: &str) {
    RESPONSE_CACHE_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record keys removed by invalidation
pub fn record_invalidated(tier: &str, count: u64) {
    if count > 0 {
        INVALIDATED_KEYS_TOTAL.with_label_values(&[tier]).inc_by(count);
    }
}

/// Initialize metrics with default values
pub fn init_metrics() {
    // Force initialization by accessing the registries
    let _ = &*CACHE_OPS_TOTAL;
    let _ = &*RESPONSE_CACHE_TOTAL;
    let _ = &*INVALIDATED_KEYS_TOTAL;

    tracing::info!("Prometheus metrics initialized (3 metric types registered)");
}

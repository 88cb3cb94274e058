//! Prometheus metrics (default registry) and text exposition.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

pub static TODO_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "todo_operations_total",
        "Todo operations handled by the API, by operation and outcome",
        &["op", "outcome"]
    )
    .expect("register todo_operations_total")
});

/// Count one finished operation. `outcome` is `ok` or an error class.
pub fn record_operation(op: &str, outcome: &str) {
    TODO_OPERATIONS_TOTAL.with_label_values(&[op, outcome]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    // make sure the counter family shows up even before the first request
    Lazy::force(&TODO_OPERATIONS_TOTAL);
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

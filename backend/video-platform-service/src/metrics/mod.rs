//! Prometheus metrics for the video platform service.
//!
//! Exposes request and toggle collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Requests served, by method and response status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "HTTP requests segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register http_requests_total");

    /// Like and subscription toggles, by resource (video, comment, tweet, subscription)
    /// and outcome (added, removed).
    pub static ref TOGGLE_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "toggle_outcomes_total",
        "Toggle operations segmented by resource and outcome",
        &["resource", "outcome"]
    )
    .expect("failed to register toggle_outcomes_total");
}

pub fn record_toggle(resource: &str, outcome: &str) {
    TOGGLE_OUTCOMES_TOTAL
        .with_label_values(&[resource, outcome])
        .inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

//! Prometheus metrics for HTTP traffic, ingestion and the batch cycle
use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    static ref HTTP_REQUESTS: HistogramVec = register_histogram_vec!(
        "trending_http_request_duration_seconds",
        "HTTP request latency by method, path and status",
        &["method", "path", "status"]
    )
    .expect("metric registration");
    static ref EVENTS_INGESTED: IntCounterVec = register_int_counter_vec!(
        "trending_events_ingested_total",
        "Engagement events ingested by kind",
        &["kind"]
    )
    .expect("metric registration");
    static ref CYCLE_RUNS: HistogramVec = register_histogram_vec!(
        "trending_cycle_duration_seconds",
        "Trending cycle duration by outcome",
        &["status"]
    )
    .expect("metric registration");
    static ref TRENDING_SET_SIZE: IntGauge = register_int_gauge!(
        "trending_set_size",
        "Number of posts currently marked trending"
    )
    .expect("metric registration");
}

pub fn observe_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS
        .with_label_values(&[method, path, &status.to_string()])
        .observe(duration.as_secs_f64());
}

pub fn record_event_ingested(kind: &str) {
    EVENTS_INGESTED.with_label_values(&[kind]).inc();
}

pub fn record_cycle(status: &str, duration: Duration, trending_count: usize) {
    CYCLE_RUNS
        .with_label_values(&[status])
        .observe(duration.as_secs_f64());
    if status == "success" {
        TRENDING_SET_SIZE.set(trending_count as i64);
    }
}

/// GET /metrics
pub async fn serve_metrics() -> HttpResponse {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = TextEncoder::new().encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "reel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reel_http_request_duration_seconds";

    pub const SSE_CONNECTIONS_TOTAL: &str = "reel_sse_connections_total";
    pub const SSE_CONNECTIONS_ACTIVE: &str = "reel_sse_connections_active";

    pub const JOBS_ENQUEUED_TOTAL: &str = "reel_jobs_enqueued_total";
    pub const UPLOADS_INITIATED_TOTAL: &str = "reel_uploads_initiated_total";
    pub const UPLOADS_ABORTED_TOTAL: &str = "reel_uploads_aborted_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new SSE subscription.
pub fn record_sse_connection() {
    counter!(names::SSE_CONNECTIONS_TOTAL).increment(1);
}

/// Update the active SSE connection gauge.
pub fn set_sse_active_connections(count: i64) {
    gauge!(names::SSE_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record job enqueued.
pub fn record_job_enqueued() {
    counter!(names::JOBS_ENQUEUED_TOTAL).increment(1);
}

/// Record upload initiated.
pub fn record_upload_initiated(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::UPLOADS_INITIATED_TOTAL, &labels).increment(1);
}

/// Record upload aborted.
pub fn record_upload_aborted() {
    counter!(names::UPLOADS_ABORTED_TOTAL).increment(1);
}

/// Replace path segments that look like identifiers to bound cardinality.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty()
                && (segment.len() >= 16 || segment.chars().any(|c| c.is_ascii_digit()))
            {
                ":id".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware recording request counts and latencies.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_sanitization_bounds_cardinality() {
        assert_eq!(
            sanitize_path("/api/jobs/550e8400-e29b-41d4-a716-446655440000/status"),
            "/api/jobs/:id/status"
        );
        assert_eq!(sanitize_path("/api/upload/initiate"), "/api/upload/initiate");
    }
}

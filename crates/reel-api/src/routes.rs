//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::analysis::analyze_duration;
use crate::handlers::jobs::get_job_status;
use crate::handlers::progress::stream_job_progress;
use crate::handlers::upload::{
    abort_multipart_upload, complete_multipart_upload, complete_upload,
    finalize_multipart_upload, initiate_multipart_upload, initiate_upload, upload_part,
};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let upload_routes = Router::new()
        .route("/upload/initiate", post(initiate_upload))
        .route("/upload/initiate-multipart", post(initiate_multipart_upload))
        .route("/upload/part", post(upload_part))
        .route("/upload/finalize-multipart", post(finalize_multipart_upload))
        .route("/upload/complete-multipart", post(complete_multipart_upload))
        .route("/upload/abort-multipart", post(abort_multipart_upload))
        .route("/upload/complete", post(complete_upload));

    let job_routes = Router::new()
        .route("/jobs/:job_id/status", get(get_job_status))
        .route("/job-progress/:job_id/stream", get(stream_job_progress));

    let analysis_routes = Router::new().route("/video/analyze-duration", post(analyze_duration));

    let api_routes = Router::new()
        .merge(upload_routes)
        .merge(job_routes)
        .merge(analysis_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

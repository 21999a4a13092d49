//! SSE progress gateway.
//!
//! One subscription per client connection, relaying the job's progress
//! channel. No history is replayed; a client joining mid-run sees only
//! subsequent events and reconciles via the status endpoint.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;
use tracing::{info, warn};

use reel_models::JobId;

use crate::metrics;
use crate::state::AppState;

/// Global counter for active SSE connections.
static ACTIVE_SSE_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Decrements the active-connection gauge when the stream is dropped,
/// including on client disconnect.
struct ConnectionGuard;

impl ConnectionGuard {
    fn new() -> Self {
        let count = ACTIVE_SSE_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_sse_active_connections(count);
        metrics::record_sse_connection();
        Self
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let count = ACTIVE_SSE_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_sse_active_connections(count);
    }
}

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Stream progress events for a job.
///
/// The initial event is a `connected` marker; each subsequent event is a
/// `progress` event with the serialized update in `data`. The stream ends
/// after a terminal event. A server-side failure emits a final `error`
/// event instead.
pub async fn stream_job_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Sse<EventStream> {
    let job_id = JobId::from_string(job_id);
    info!(job_id = %job_id, "SSE progress stream opened");

    let connected = stream::once(async move {
        Ok::<_, Infallible>(Event::default()
            .event("connected")
            .data(json!({ "type": "connected" }).to_string()))
    });

    let stream: EventStream = match state.progress.subscribe(&job_id).await {
        Ok(events) => {
            let guard = ConnectionGuard::new();

            // Pass terminal events through, then end the stream.
            let progress = events
                .scan(false, |done, event| {
                    let next = if *done {
                        None
                    } else {
                        if event.stage.is_terminal() {
                            *done = true;
                        }
                        Some(event)
                    };
                    futures_util::future::ready(next)
                })
                .map(move |event| {
                    let _guard = &guard;
                    let data = serde_json::to_string(&event)
                        .unwrap_or_else(|_| "{}".to_string());
                    Ok::<_, Infallible>(Event::default().event("progress").data(data))
                });

            Box::pin(connected.chain(progress))
        }
        Err(e) => {
            warn!(job_id = %job_id, "Progress subscription failed: {}", e);
            let error = stream::once(async move {
                Ok::<_, Infallible>(Event::default()
                    .event("error")
                    .data(json!({ "detail": "progress subscription failed" }).to_string()))
            });
            Box::pin(connected.chain(error))
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

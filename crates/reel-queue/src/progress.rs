//! Progress fan-out via Redis Pub/Sub.
//!
//! One channel per job, named `job_progress_{job_id}`. Events are
//! fire-and-forget: nothing is persisted, so a subscriber joining mid-run
//! sees only events published after subscription. Reconnecting clients
//! reconcile by reading the job record.

use redis::AsyncCommands;
use tracing::debug;

use reel_models::{JobId, ProcessingStage, ProgressUpdate};

use crate::error::QueueResult;

/// Channel for publishing/subscribing to progress events.
#[derive(Clone)]
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    /// Create a new progress channel.
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> QueueResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    /// Get the channel name for a job.
    pub fn channel_name(job_id: &JobId) -> String {
        format!("job_progress_{}", job_id)
    }

    /// Publish a progress event.
    pub async fn publish(&self, event: &ProgressUpdate) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.job_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing progress event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish an event at a stage's canonical anchor percentage.
    pub async fn stage(
        &self,
        job_id: &JobId,
        stage: ProcessingStage,
        message: impl Into<String>,
    ) -> QueueResult<()> {
        self.publish(&ProgressUpdate::stage(job_id.clone(), stage, message))
            .await
    }

    /// Publish a per-segment event with interpolated percentage.
    pub async fn segment(
        &self,
        job_id: &JobId,
        message: impl Into<String>,
        current: u32,
        total: u32,
        output_keys: Vec<String>,
    ) -> QueueResult<()> {
        self.publish(
            &ProgressUpdate::segment(job_id.clone(), message, current, total)
                .with_output_keys(output_keys),
        )
        .await
    }

    /// Publish a terminal failure event.
    pub async fn failed(&self, job_id: &JobId, error: impl Into<String>) -> QueueResult<()> {
        self.publish(&ProgressUpdate::failed(job_id.clone(), error))
            .await
    }

    /// Subscribe to progress events for a job.
    /// Returns a pinned stream that can be polled with `.next()`. Dropping
    /// the stream releases the subscription.
    pub async fn subscribe(
        &self,
        job_id: &JobId,
    ) -> QueueResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = ProgressUpdate> + Send>>>
    {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(job_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_named_per_job() {
        let job_id = JobId::from_string("abc-123");
        assert_eq!(
            ProgressChannel::channel_name(&job_id),
            "job_progress_abc-123"
        );
    }
}

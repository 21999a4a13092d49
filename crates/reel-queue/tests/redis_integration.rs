//! Redis-backed queue and progress integration tests.

use std::time::Duration;

use futures_util::StreamExt;

use reel_models::{CuttingOptions, JobId, ProcessingStage, ProgressUpdate, TextInput};
use reel_queue::{JobQueue, ProcessVideoJob, ProgressChannel};

fn test_job(user: &str) -> ProcessVideoJob {
    ProcessVideoJob::new(
        JobId::new(),
        user,
        "uploads/test/20250101_000000_clip.mp4",
        CuttingOptions::Fixed {
            duration_seconds: 30,
        },
        TextInput::one_for_all("Hello"),
    )
}

/// Test Redis connection and basic operations.
#[tokio::test]
#[ignore = "requires Redis"]
async fn redis_connection() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let len = queue.len().await.expect("Failed to get queue length");
    println!("Queue length: {}", len);
}

/// Test job enqueue and dequeue cycle.
#[tokio::test]
#[ignore = "requires Redis"]
async fn job_enqueue_dequeue() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let job = test_job("test_user_123");
    let job_id = job.job_id.clone();

    let message_id = queue.enqueue(&job).await.expect("Failed to enqueue");
    println!("Enqueued job {} with message ID {}", job_id, message_id);

    let jobs = queue
        .consume("test-consumer", 1000, 1)
        .await
        .expect("Failed to consume");

    assert_eq!(jobs.len(), 1);
    let (msg_id, consumed_job) = &jobs[0];
    assert_eq!(consumed_job.job_id, job_id);

    queue.ack(msg_id).await.expect("Failed to ack");
    queue.clear_dedup(&job).await.expect("Failed to clear dedup");
}

/// Duplicate enqueues within the dedup window are rejected.
#[tokio::test]
#[ignore = "requires Redis"]
async fn duplicate_enqueue_rejected() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let job = test_job("test_dedup_user");
    queue.enqueue(&job).await.expect("Failed to enqueue");
    assert!(queue.enqueue(&job).await.is_err());

    queue.clear_dedup(&job).await.expect("Failed to clear dedup");
}

/// Test DLQ functionality.
#[tokio::test]
#[ignore = "requires Redis"]
async fn dead_letter_queue() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let job = test_job("test_dlq_user");
    queue.enqueue(&job).await.expect("Failed to enqueue");

    let jobs = queue
        .consume("test-dlq-consumer", 1000, 1)
        .await
        .expect("Failed to consume");
    assert!(!jobs.is_empty());

    let (message_id, consumed) = &jobs[0];
    queue
        .dlq(message_id, consumed, "Test error")
        .await
        .expect("Failed to move to DLQ");

    let dlq_len = queue.dlq_len().await.expect("Failed to get DLQ length");
    assert!(dlq_len > 0);

    queue.clear_dedup(&job).await.expect("Failed to clear dedup");
}

/// Progress events arrive at subscribers in publication order.
#[tokio::test]
#[ignore = "requires Redis"]
async fn progress_pubsub_ordering() {
    dotenvy::dotenv().ok();

    let channel = ProgressChannel::from_env().expect("Failed to create channel");
    let job_id = JobId::new();

    let mut stream = channel
        .subscribe(&job_id)
        .await
        .expect("Failed to subscribe");

    // Give the subscription a moment to register before publishing.
    tokio::time::sleep(Duration::from_millis(100)).await;

    channel
        .publish(&ProgressUpdate::stage(
            job_id.clone(),
            ProcessingStage::Queued,
            "queued",
        ))
        .await
        .expect("Failed to publish");
    channel
        .publish(&ProgressUpdate::stage(
            job_id.clone(),
            ProcessingStage::Downloading,
            "downloading",
        ))
        .await
        .expect("Failed to publish");

    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("Timed out")
        .expect("Stream ended");
    let second = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("Timed out")
        .expect("Stream ended");

    assert_eq!(first.stage, ProcessingStage::Queued);
    assert_eq!(second.stage, ProcessingStage::Downloading);
    assert!(second.progress_percentage >= first.progress_percentage);
}

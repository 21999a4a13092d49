//! Per-job processing pipeline.
//!
//! Fetch the source, probe it, plan the windows, resolve the overlays,
//! render each segment, upload, and emit progress at every stage. Any error
//! escaping the pipeline leaves the job record terminal (FAILED with the
//! message) and publishes a `failed` event.

use reel_media::{validate_video, MediaError, SegmentArtifact, SegmentRequest};
use reel_models::{
    plan_segments, seed_for_job, segment_progress, ProcessingStage, ProgressUpdate,
};
use reel_queue::ProcessVideoJob;
use reel_storage::output_key;
use reel_textgen::resolve_overlays;

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::retry::{retry_async_if, RetryConfig};

/// Execute one claimed job end to end.
///
/// A duplicate claim (another worker already owns the job) is not an error;
/// the job is skipped. All other errors fail the job terminally.
pub async fn process_job(ctx: &ProcessingContext, job: &ProcessVideoJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id);
    logger.start(&format!("source {}", job.source_key));

    ctx.progress
        .stage(
            &job.job_id,
            ProcessingStage::Queued,
            "Job received, initializing...",
        )
        .await
        .ok();

    if let Err(e) = ctx.jobstore.claim_job(&job.job_id).await {
        let err = WorkerError::from(e);
        if err.is_duplicate_claim() {
            logger.warning("Job already claimed elsewhere, skipping");
            return Ok(());
        }
        return Err(err);
    }

    match run_pipeline(ctx, job, &logger).await {
        Ok(()) => {
            logger.completion("all segments uploaded");
            Ok(())
        }
        Err(e) => {
            logger.error(&e.to_string());
            // The record must end terminal even if this write also fails.
            if let Err(store_err) = ctx.jobstore.fail_job(&job.job_id, &e.to_string()).await {
                logger.error(&format!("Failed to mark job FAILED: {}", store_err));
            }
            ctx.progress.failed(&job.job_id, e.to_string()).await.ok();
            Err(e)
        }
    }
}

async fn run_pipeline(
    ctx: &ProcessingContext,
    job: &ProcessVideoJob,
    logger: &JobLogger,
) -> WorkerResult<()> {
    let job_id = &job.job_id;

    ctx.progress
        .stage(
            job_id,
            ProcessingStage::Downloading,
            "Downloading video from S3...",
        )
        .await
        .ok();
    ctx.jobstore
        .update_stage(job_id, ProcessingStage::Downloading, 2)
        .await?;

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    let scratch = tempfile::Builder::new()
        .prefix(&format!("reelsplit_{}_", job_id))
        .tempdir_in(&ctx.config.work_dir)?;

    let local_input = scratch
        .path()
        .join(format!("input_{}", input_filename(&job.source_key)));

    let download_retry = transient_retry(ctx, "download_source");
    retry_async_if(
        &download_retry,
        || ctx.storage.download_file(&job.source_key, &local_input),
        |e| e.is_retryable(),
    )
    .await?;

    ctx.progress
        .stage(
            job_id,
            ProcessingStage::Probing,
            "Analyzing video duration...",
        )
        .await
        .ok();
    ctx.jobstore
        .update_stage(job_id, ProcessingStage::Probing, 5)
        .await?;

    // The duration cached at upload time is advisory; this probe of the
    // actual bytes is what the plan is built on.
    let video_info = validate_video(&local_input).await?;
    ctx.jobstore.set_duration(job_id, video_info.duration).await?;

    let plan = plan_segments(
        video_info.duration,
        &job.cutting_options,
        seed_for_job(job_id),
    )?;
    let total = plan.num_segments();
    logger.progress(&format!(
        "Planned {} segments over {:.2}s",
        total, video_info.duration
    ));

    ctx.progress
        .stage(
            job_id,
            ProcessingStage::GeneratingText,
            "AI generating text variations...",
        )
        .await
        .ok();
    ctx.jobstore
        .update_stage(job_id, ProcessingStage::GeneratingText, 10)
        .await?;

    let overlays = resolve_overlays(&job.text_input, total, ctx.generator.as_ref()).await;

    let mut uploaded_keys: Vec<String> = Vec::with_capacity(total as usize);

    for (i, window) in plan.windows.iter().enumerate() {
        let number = i as u32 + 1;
        logger.progress(&format!(
            "Processing segment {}/{}: {:.2}s - {:.2}s",
            number, total, window.start, window.end
        ));

        let segment_key = output_key(job_id, number);
        let request = SegmentRequest {
            source_key: job.source_key.clone(),
            output_key: segment_key.clone(),
            local_input: local_input.clone(),
            local_output: scratch.path().join(format!("segment_{:03}.mp4", number)),
            start: window.start,
            end: window.end,
            overlay_text: overlays[i].clone(),
            video_info: video_info.clone(),
        };

        let segment_retry = transient_retry(ctx, "process_segment");
        let artifact = retry_async_if(
            &segment_retry,
            || ctx.processor.process_segment(&request),
            MediaError::is_transient,
        )
        .await?;

        if let SegmentArtifact::LocalFile(path) = artifact {
            let upload_retry = transient_retry(ctx, "upload_segment");
            retry_async_if(
                &upload_retry,
                || ctx.storage.upload_file(&path, &segment_key, "video/mp4"),
                |e| e.is_retryable(),
            )
            .await?;
        }

        ctx.jobstore.append_output_key(job_id, &segment_key).await?;
        uploaded_keys.push(segment_key);

        let percent = segment_progress(number, total);
        ctx.jobstore
            .update_stage(job_id, ProcessingStage::ProcessingSegment, percent as u8)
            .await?;
        ctx.progress
            .segment(
                job_id,
                format!("Segment {} uploaded.", number),
                number,
                total,
                uploaded_keys.clone(),
            )
            .await
            .ok();
    }

    ctx.progress
        .stage(
            job_id,
            ProcessingStage::UploadingResults,
            "Finalizing upload to S3...",
        )
        .await
        .ok();
    ctx.jobstore
        .update_stage(job_id, ProcessingStage::UploadingResults, 95)
        .await?;

    ctx.jobstore.complete_job(job_id, &uploaded_keys).await?;
    ctx.progress
        .publish(
            &ProgressUpdate::stage(
                job_id.clone(),
                ProcessingStage::Completed,
                "Video processing completed successfully!",
            )
            .with_output_keys(uploaded_keys),
        )
        .await
        .ok();

    // Scratch dir is removed on drop, success and failure alike.
    Ok(())
}

fn transient_retry(ctx: &ProcessingContext, operation: &str) -> RetryConfig {
    RetryConfig::new(operation)
        .with_max_retries(ctx.config.transient_retries)
        .with_base_delay(ctx.config.retry_base_delay)
}

fn input_filename(source_key: &str) -> &str {
    source_key.rsplit('/').next().unwrap_or("source.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_filename_takes_basename() {
        assert_eq!(
            input_filename("uploads/j1/20250101_000000_clip.mp4"),
            "20250101_000000_clip.mp4"
        );
        assert_eq!(input_filename("clip.mp4"), "clip.mp4");
    }
}

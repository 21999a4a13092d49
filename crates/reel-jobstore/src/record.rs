//! Conversion between job records and DynamoDB items.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};

use reel_models::{JobId, JobRecord, JobStatus, ProcessingStage, UploadMetadata};

use crate::error::{JobStoreError, JobStoreResult};

pub(crate) fn record_to_item(record: &JobRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("job_id".into(), AttributeValue::S(record.job_id.to_string()));
    item.insert("user_id".into(), AttributeValue::S(record.user_id.clone()));
    item.insert(
        "source_key".into(),
        AttributeValue::S(record.source_key.clone()),
    );
    item.insert(
        "status".into(),
        AttributeValue::S(record.status.as_str().to_string()),
    );
    item.insert(
        "stage".into(),
        AttributeValue::S(record.stage.as_str().to_string()),
    );
    item.insert(
        "progress".into(),
        AttributeValue::N(record.progress.to_string()),
    );
    if let Some(duration) = record.video_duration {
        item.insert(
            "video_duration".into(),
            AttributeValue::N(duration.to_string()),
        );
    }
    item.insert(
        "output_keys".into(),
        AttributeValue::L(
            record
                .output_keys
                .iter()
                .map(|k| AttributeValue::S(k.clone()))
                .collect(),
        ),
    );
    if let Some(error) = &record.error_message {
        item.insert("error_message".into(), AttributeValue::S(error.clone()));
    }
    item.insert(
        "filename".into(),
        AttributeValue::S(record.metadata.filename.clone()),
    );
    item.insert(
        "file_size".into(),
        AttributeValue::N(record.metadata.file_size.to_string()),
    );
    item.insert(
        "content_type".into(),
        AttributeValue::S(record.metadata.content_type.clone()),
    );
    if let Some(title) = &record.metadata.title {
        item.insert("title".into(), AttributeValue::S(title.clone()));
    }
    item.insert(
        "created_at".into(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );
    item.insert(
        "updated_at".into(),
        AttributeValue::S(record.updated_at.to_rfc3339()),
    );
    item
}

pub(crate) fn item_to_record(
    item: &HashMap<String, AttributeValue>,
) -> JobStoreResult<JobRecord> {
    let job_id = get_s(item, "job_id")?;
    let status = JobStatus::parse(&get_s(item, "status")?)
        .ok_or_else(|| JobStoreError::Serialization(format!("bad status for job {}", job_id)))?;
    let stage = ProcessingStage::parse(&get_s(item, "stage")?)
        .ok_or_else(|| JobStoreError::Serialization(format!("bad stage for job {}", job_id)))?;

    let output_keys = match item.get("output_keys") {
        Some(AttributeValue::L(list)) => list
            .iter()
            .filter_map(|v| v.as_s().ok().cloned())
            .collect(),
        _ => Vec::new(),
    };

    Ok(JobRecord {
        job_id: JobId::from_string(job_id),
        user_id: get_s(item, "user_id")?,
        source_key: get_s(item, "source_key")?,
        status,
        stage,
        progress: get_n(item, "progress")?.unwrap_or(0.0) as u8,
        video_duration: get_n(item, "video_duration")?,
        output_keys,
        error_message: get_opt_s(item, "error_message"),
        metadata: UploadMetadata {
            filename: get_opt_s(item, "filename").unwrap_or_default(),
            file_size: get_n(item, "file_size")?.unwrap_or(0.0) as u64,
            content_type: get_opt_s(item, "content_type").unwrap_or_default(),
            title: get_opt_s(item, "title"),
        },
        created_at: get_ts(item, "created_at")?,
        updated_at: get_ts(item, "updated_at")?,
    })
}

fn get_s(item: &HashMap<String, AttributeValue>, key: &str) -> JobStoreResult<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| JobStoreError::Serialization(format!("missing attribute {}", key)))
}

fn get_opt_s(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).cloned()
}

fn get_n(item: &HashMap<String, AttributeValue>, key: &str) -> JobStoreResult<Option<f64>> {
    match item.get(key) {
        Some(AttributeValue::N(n)) => n
            .parse::<f64>()
            .map(Some)
            .map_err(|_| JobStoreError::Serialization(format!("bad number in {}", key))),
        _ => Ok(None),
    }
}

fn get_ts(item: &HashMap<String, AttributeValue>, key: &str) -> JobStoreResult<DateTime<Utc>> {
    let raw = get_s(item, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| JobStoreError::Serialization(format!("bad timestamp in {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_item() {
        let record = JobRecord::new(
            JobId::from_string("job-42"),
            "user-7",
            "uploads/job-42/20250101_120000_clip.mp4",
            UploadMetadata {
                filename: "clip.mp4".into(),
                file_size: 123_456,
                content_type: "video/mp4".into(),
                title: Some("My clip".into()),
            },
        )
        .with_duration(95.5);

        let restored = item_to_record(&record_to_item(&record)).unwrap();

        assert_eq!(restored.job_id, record.job_id);
        assert_eq!(restored.user_id, record.user_id);
        assert_eq!(restored.source_key, record.source_key);
        assert_eq!(restored.status, JobStatus::Queued);
        assert_eq!(restored.video_duration, Some(95.5));
        assert_eq!(restored.metadata.title.as_deref(), Some("My clip"));
        assert_eq!(restored.created_at, record.created_at);
    }

    #[test]
    fn output_keys_and_error_survive_round_trip() {
        let record = JobRecord::new(
            JobId::from_string("j"),
            "u",
            "uploads/j/x.mp4",
            UploadMetadata::default(),
        )
        .start()
        .fail("ffmpeg exited 1");

        let mut with_outputs = record.clone();
        with_outputs.output_keys = vec![
            "processed/j/segment_001.mp4".into(),
            "processed/j/segment_002.mp4".into(),
        ];

        let restored = item_to_record(&record_to_item(&with_outputs)).unwrap();
        assert_eq!(restored.output_keys.len(), 2);
        assert_eq!(restored.status, JobStatus::Failed);
        assert_eq!(restored.error_message.as_deref(), Some("ffmpeg exited 1"));
    }

    #[test]
    fn missing_required_attribute_is_an_error() {
        let record = JobRecord::new(
            JobId::from_string("j"),
            "u",
            "uploads/j/x.mp4",
            UploadMetadata::default(),
        );
        let mut item = record_to_item(&record);
        item.remove("status");
        assert!(item_to_record(&item).is_err());
    }
}

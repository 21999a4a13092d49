//! DynamoDB job store client.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::config::{Builder, Region};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use tracing::{debug, info};

use reel_models::{JobId, JobRecord, JobStatus, ProcessingStage};

use crate::error::{JobStoreError, JobStoreResult};
use crate::record::{item_to_record, record_to_item};
use crate::retry::{with_retry, RetryConfig};

/// Configuration for the job store.
#[derive(Debug, Clone)]
pub struct JobStoreConfig {
    /// Table name
    pub table_name: String,
    /// Region
    pub region: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Optional custom endpoint (local test stacks)
    pub endpoint_url: Option<String>,
}

impl JobStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> JobStoreResult<Self> {
        Ok(Self {
            table_name: std::env::var("JOBS_TABLE_NAME")
                .map_err(|_| JobStoreError::config_error("JOBS_TABLE_NAME not set"))?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID")
                .map_err(|_| JobStoreError::config_error("AWS_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY")
                .map_err(|_| JobStoreError::config_error("AWS_SECRET_ACCESS_KEY not set"))?,
            endpoint_url: std::env::var("DYNAMODB_ENDPOINT_URL").ok(),
        })
    }
}

/// Durable mapping from job id to job record.
#[derive(Clone)]
pub struct JobStore {
    client: Client,
    table: String,
    retry: RetryConfig,
}

impl JobStore {
    /// Create a new job store from configuration.
    pub fn new(config: JobStoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "reelsplit",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table: config.table_name,
            retry: RetryConfig::from_env(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> JobStoreResult<Self> {
        Ok(Self::new(JobStoreConfig::from_env()?))
    }

    /// Create a new job record. Fails with a conflict if the id exists.
    pub async fn create_job(&self, record: &JobRecord) -> JobStoreResult<()> {
        let item = record_to_item(record);
        with_retry(&self.retry, "create_job", || {
            let item = item.clone();
            async move {
                self.client
                    .put_item()
                    .table_name(&self.table)
                    .set_item(Some(item))
                    .condition_expression("attribute_not_exists(job_id)")
                    .send()
                    .await
                    .map_err(|e| map_sdk_error("create_job", &format!("{:?}", e)))?;
                Ok(())
            }
        })
        .await?;

        info!(job_id = %record.job_id, "Created job record");
        Ok(())
    }

    /// Fetch a job record.
    pub async fn get_job(&self, job_id: &JobId) -> JobStoreResult<Option<JobRecord>> {
        let output = with_retry(&self.retry, "get_job", || async {
            self.client
                .get_item()
                .table_name(&self.table)
                .key("job_id", AttributeValue::S(job_id.to_string()))
                .send()
                .await
                .map_err(|e| map_sdk_error("get_job", &format!("{:?}", e)))
        })
        .await?;

        match output.item() {
            Some(item) => Ok(Some(item_to_record(item)?)),
            None => Ok(None),
        }
    }

    /// Claim a queued job for processing.
    ///
    /// Conditional on the record still being QUEUED; a second worker racing
    /// on the same job gets a conflict instead of re-processing.
    pub async fn claim_job(&self, job_id: &JobId) -> JobStoreResult<()> {
        self.client
            .update_item()
            .table_name(&self.table)
            .key("job_id", AttributeValue::S(job_id.to_string()))
            .update_expression("SET #status = :processing, stage = :stage, updated_at = :now")
            .condition_expression("#status = :queued")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(
                ":processing",
                AttributeValue::S(JobStatus::Processing.as_str().into()),
            )
            .expression_attribute_values(
                ":stage",
                AttributeValue::S(ProcessingStage::Downloading.as_str().into()),
            )
            .expression_attribute_values(
                ":queued",
                AttributeValue::S(JobStatus::Queued.as_str().into()),
            )
            .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
            .send()
            .await
            .map_err(|e| map_sdk_error("claim_job", &format!("{:?}", e)))?;

        debug!(job_id = %job_id, "Claimed job");
        Ok(())
    }

    /// Update stage and progress mid-run.
    pub async fn update_stage(
        &self,
        job_id: &JobId,
        stage: ProcessingStage,
        progress: u8,
    ) -> JobStoreResult<()> {
        with_retry(&self.retry, "update_stage", || async {
            self.client
                .update_item()
                .table_name(&self.table)
                .key("job_id", AttributeValue::S(job_id.to_string()))
                .update_expression("SET stage = :stage, progress = :progress, updated_at = :now")
                .condition_expression("attribute_exists(job_id)")
                .expression_attribute_values(
                    ":stage",
                    AttributeValue::S(stage.as_str().into()),
                )
                .expression_attribute_values(
                    ":progress",
                    AttributeValue::N(progress.min(100).to_string()),
                )
                .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
                .send()
                .await
                .map_err(|e| map_sdk_error("update_stage", &format!("{:?}", e)))?;
            Ok(())
        })
        .await
    }

    /// Persist the probed source duration.
    pub async fn set_duration(&self, job_id: &JobId, duration: f64) -> JobStoreResult<()> {
        with_retry(&self.retry, "set_duration", || async {
            self.client
                .update_item()
                .table_name(&self.table)
                .key("job_id", AttributeValue::S(job_id.to_string()))
                .update_expression("SET video_duration = :duration, updated_at = :now")
                .condition_expression("attribute_exists(job_id)")
                .expression_attribute_values(
                    ":duration",
                    AttributeValue::N(duration.to_string()),
                )
                .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
                .send()
                .await
                .map_err(|e| map_sdk_error("set_duration", &format!("{:?}", e)))?;
            Ok(())
        })
        .await
    }

    /// Append one uploaded segment key to the record's output list.
    pub async fn append_output_key(&self, job_id: &JobId, key: &str) -> JobStoreResult<()> {
        with_retry(&self.retry, "append_output_key", || async {
            self.client
                .update_item()
                .table_name(&self.table)
                .key("job_id", AttributeValue::S(job_id.to_string()))
                .update_expression(
                    "SET output_keys = list_append(if_not_exists(output_keys, :empty), :new), \
                     updated_at = :now",
                )
                .condition_expression("attribute_exists(job_id)")
                .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
                .expression_attribute_values(
                    ":new",
                    AttributeValue::L(vec![AttributeValue::S(key.to_string())]),
                )
                .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
                .send()
                .await
                .map_err(|e| map_sdk_error("append_output_key", &format!("{:?}", e)))?;
            Ok(())
        })
        .await
    }

    /// Mark the job COMPLETED with its final output list.
    ///
    /// Conditional on PROCESSING so only the owning worker can finish it.
    pub async fn complete_job(
        &self,
        job_id: &JobId,
        output_keys: &[String],
    ) -> JobStoreResult<()> {
        let keys: Vec<AttributeValue> = output_keys
            .iter()
            .map(|k| AttributeValue::S(k.clone()))
            .collect();

        with_retry(&self.retry, "complete_job", || {
            let keys = keys.clone();
            async move {
                self.client
                    .update_item()
                    .table_name(&self.table)
                    .key("job_id", AttributeValue::S(job_id.to_string()))
                    .update_expression(
                        "SET #status = :completed, stage = :stage, progress = :progress, \
                         output_keys = :keys, updated_at = :now",
                    )
                    .condition_expression("#status = :processing")
                    .expression_attribute_names("#status", "status")
                    .expression_attribute_values(
                        ":completed",
                        AttributeValue::S(JobStatus::Completed.as_str().into()),
                    )
                    .expression_attribute_values(
                        ":processing",
                        AttributeValue::S(JobStatus::Processing.as_str().into()),
                    )
                    .expression_attribute_values(
                        ":stage",
                        AttributeValue::S(ProcessingStage::Completed.as_str().into()),
                    )
                    .expression_attribute_values(":progress", AttributeValue::N("100".into()))
                    .expression_attribute_values(":keys", AttributeValue::L(keys))
                    .expression_attribute_values(
                        ":now",
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    )
                    .send()
                    .await
                    .map_err(|e| map_sdk_error("complete_job", &format!("{:?}", e)))?;
                Ok(())
            }
        })
        .await?;

        info!(job_id = %job_id, outputs = output_keys.len(), "Job completed");
        Ok(())
    }

    /// Mark the job FAILED with an error message.
    pub async fn fail_job(&self, job_id: &JobId, error: &str) -> JobStoreResult<()> {
        with_retry(&self.retry, "fail_job", || async {
            self.client
                .update_item()
                .table_name(&self.table)
                .key("job_id", AttributeValue::S(job_id.to_string()))
                .update_expression(
                    "SET #status = :failed, stage = :stage, error_message = :error, \
                     updated_at = :now",
                )
                .condition_expression("attribute_exists(job_id)")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(
                    ":failed",
                    AttributeValue::S(JobStatus::Failed.as_str().into()),
                )
                .expression_attribute_values(
                    ":stage",
                    AttributeValue::S(ProcessingStage::Failed.as_str().into()),
                )
                .expression_attribute_values(":error", AttributeValue::S(error.to_string()))
                .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
                .send()
                .await
                .map_err(|e| map_sdk_error("fail_job", &format!("{:?}", e)))?;
            Ok(())
        })
        .await?;

        info!(job_id = %job_id, error = error, "Job failed");
        Ok(())
    }

    /// Check connectivity by describing the table.
    pub async fn check_connectivity(&self) -> JobStoreResult<()> {
        self.client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
            .map_err(|e| JobStoreError::request_failed(format!("describe_table failed: {}", e)))?;
        Ok(())
    }
}

fn map_sdk_error(operation: &str, message: &str) -> JobStoreError {
    if message.contains("ConditionalCheckFailed") {
        JobStoreError::conflict(format!("{}: condition failed", operation))
    } else if message.contains("ResourceNotFound") {
        JobStoreError::not_found(format!("{}: table or item missing", operation))
    } else {
        JobStoreError::request_failed(format!("{}: {}", operation, message))
    }
}

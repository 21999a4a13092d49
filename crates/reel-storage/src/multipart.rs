//! Multi-part upload session operations.
//!
//! The coordinator is stateless: the client carries the session identifier
//! (the S3 upload id) and the collected part tags between calls. Partial
//! parts are discarded by the object store on abort.

use std::time::Duration;

use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::S3Client;
use crate::error::{StorageError, StorageResult};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Chunking parameters handed to the client at initiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// Chunk size in bytes
    pub chunk_size: u64,
    /// Maximum concurrent part uploads
    pub max_concurrent_uploads: u32,
}

/// Pick chunk size and upload concurrency from the declared file size and
/// a client-is-mobile hint.
pub fn chunk_plan(file_size: u64, is_mobile: bool) -> ChunkPlan {
    let (chunk_size, max_concurrent_uploads) = if is_mobile {
        if file_size <= 100 * MIB {
            (5 * MIB, 2)
        } else if file_size <= 500 * MIB {
            (8 * MIB, 3)
        } else if file_size <= GIB {
            (10 * MIB, 3)
        } else {
            (15 * MIB, 4)
        }
    } else if file_size <= 100 * MIB {
        (10 * MIB, 4)
    } else if file_size <= 500 * MIB {
        (15 * MIB, 6)
    } else if file_size <= GIB {
        (20 * MIB, 6)
    } else {
        (25 * MIB, 8)
    };

    ChunkPlan {
        chunk_size,
        max_concurrent_uploads,
    }
}

/// One completed part as reported by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedPartSpec {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

impl S3Client {
    /// Start a multi-part upload session. Returns the session's upload id.
    pub async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        let response = self
            .inner()
            .create_multipart_upload()
            .bucket(self.bucket())
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(e.to_string()))?;

        let upload_id = response
            .upload_id()
            .ok_or_else(|| StorageError::multipart_failed("no upload id in response"))?
            .to_string();

        info!(key = key, upload_id = %upload_id, "Initiated multipart upload");
        Ok(upload_id)
    }

    /// Presign an UploadPart URL for one chunk.
    pub async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = aws_sdk_s3::presigning::PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .inner()
            .upload_part()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        debug!(key = key, part_number, "Presigned upload part");
        Ok(presigned.uri().to_string())
    }

    /// Complete a multi-part upload. Parts are sorted ascending by number
    /// before submission. Returns the durable object's S3 URL.
    pub async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<CompletedPartSpec>,
    ) -> StorageResult<String> {
        if parts.is_empty() {
            return Err(StorageError::multipart_failed("no parts to complete"));
        }
        parts.sort_by_key(|p| p.part_number);

        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        let multipart = CompletedMultipartUpload::builder()
            .set_parts(Some(completed))
            .build();

        let response = self
            .inner()
            .complete_multipart_upload()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(multipart)
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(e.to_string()))?;

        let location = response
            .location()
            .map(str::to_string)
            .unwrap_or_else(|| format!("s3://{}/{}", self.bucket(), key));

        info!(key = key, parts = parts.len(), "Completed multipart upload");
        Ok(location)
    }

    /// Abort a multi-part upload session. Idempotent from the caller's
    /// perspective: an already-aborted session only logs a warning.
    pub async fn abort_multipart(&self, key: &str, upload_id: &str) -> StorageResult<()> {
        match self
            .inner()
            .abort_multipart_upload()
            .bucket(self.bucket())
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            Ok(_) => {
                info!(key = key, upload_id = upload_id, "Aborted multipart upload");
                Ok(())
            }
            Err(e) => {
                warn!(key = key, "Failed to abort multipart upload: {}", e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_chunk_table() {
        assert_eq!(chunk_plan(50 * MIB, false), ChunkPlan { chunk_size: 10 * MIB, max_concurrent_uploads: 4 });
        assert_eq!(chunk_plan(250 * MIB, false), ChunkPlan { chunk_size: 15 * MIB, max_concurrent_uploads: 6 });
        assert_eq!(chunk_plan(800 * MIB, false), ChunkPlan { chunk_size: 20 * MIB, max_concurrent_uploads: 6 });
        assert_eq!(chunk_plan(2 * GIB, false), ChunkPlan { chunk_size: 25 * MIB, max_concurrent_uploads: 8 });
    }

    #[test]
    fn mobile_chunk_table() {
        assert_eq!(chunk_plan(50 * MIB, true), ChunkPlan { chunk_size: 5 * MIB, max_concurrent_uploads: 2 });
        assert_eq!(chunk_plan(250 * MIB, true), ChunkPlan { chunk_size: 8 * MIB, max_concurrent_uploads: 3 });
        assert_eq!(chunk_plan(800 * MIB, true), ChunkPlan { chunk_size: 10 * MIB, max_concurrent_uploads: 3 });
        assert_eq!(chunk_plan(2 * GIB, true), ChunkPlan { chunk_size: 15 * MIB, max_concurrent_uploads: 4 });
    }

    #[test]
    fn boundaries_stay_in_lower_bracket() {
        assert_eq!(chunk_plan(100 * MIB, false).chunk_size, 10 * MIB);
        assert_eq!(chunk_plan(100 * MIB + 1, false).chunk_size, 15 * MIB);
        assert_eq!(chunk_plan(GIB, false).chunk_size, 20 * MIB);
        assert_eq!(chunk_plan(GIB + 1, false).chunk_size, 25 * MIB);
    }

    #[test]
    fn part_spec_wire_form_matches_s3() {
        let spec: CompletedPartSpec =
            serde_json::from_str(r#"{"PartNumber":3,"ETag":"\"abc\""}"#).unwrap();
        assert_eq!(spec.part_number, 3);
        assert_eq!(spec.etag, "\"abc\"");
    }
}

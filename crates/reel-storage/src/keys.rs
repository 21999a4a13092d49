//! Object key conventions.
//!
//! Sources:  `uploads/{job_id}/{YYYYMMDD_HHMMSS}_{sanitized_filename}`
//! Outputs:  `processed/{job_id}/segment_{NNN}.mp4` (1-based, zero-padded)

use chrono::Utc;

use reel_models::JobId;

/// Clean a filename for use inside an object key.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '(' | ')' => None,
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => Some('_'),
        })
        .collect()
}

/// Key for an uploaded source blob.
pub fn source_key(job_id: &JobId, filename: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("uploads/{}/{}_{}", job_id, timestamp, sanitize_filename(filename))
}

/// Key for a processed segment. `segment_number` is 1-based.
pub fn output_key(job_id: &JobId, segment_number: u32) -> String {
    format!("processed/{}/segment_{:03}.mp4", job_id, segment_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_spaces_and_parens() {
        assert_eq!(sanitize_filename("my clip (final).mp4"), "my_clip_final.mp4");
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("weird/..\\name.mp4"), "weird_.._name.mp4");
    }

    #[test]
    fn source_key_shape() {
        let job_id = JobId::from_string("job-1");
        let key = source_key(&job_id, "a b.mp4");
        assert!(key.starts_with("uploads/job-1/"));
        assert!(key.ends_with("_a_b.mp4"));
        // uploads/{job}/{YYYYMMDD_HHMMSS}_{name}
        let ts = key
            .strip_prefix("uploads/job-1/")
            .unwrap()
            .strip_suffix("_a_b.mp4")
            .unwrap();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }

    #[test]
    fn output_key_is_one_based_zero_padded() {
        let job_id = JobId::from_string("j");
        assert_eq!(output_key(&job_id, 1), "processed/j/segment_001.mp4");
        assert_eq!(output_key(&job_id, 17), "processed/j/segment_017.mp4");
        assert_eq!(output_key(&job_id, 120), "processed/j/segment_120.mp4");
    }
}

//! Cutting policy options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::plan::PlanError;

/// How segment time windows are computed.
///
/// Wire form: `{"type": "fixed", "duration_seconds": 30}` or
/// `{"type": "random", "min_duration": 15, "max_duration": 25}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CuttingOptions {
    /// Fixed-length segments
    Fixed {
        /// Segment duration in seconds
        duration_seconds: u32,
    },
    /// Random-length segments drawn uniformly from [min, max]
    Random {
        /// Minimum segment duration in seconds
        min_duration: u32,
        /// Maximum segment duration in seconds
        max_duration: u32,
    },
}

impl Default for CuttingOptions {
    fn default() -> Self {
        Self::Fixed {
            duration_seconds: 30,
        }
    }
}

impl CuttingOptions {
    /// Validate policy parameters.
    pub fn validate(&self) -> Result<(), PlanError> {
        match self {
            CuttingOptions::Fixed { duration_seconds } => {
                if *duration_seconds == 0 {
                    return Err(PlanError::BadPolicy(
                        "fixed duration must be positive".into(),
                    ));
                }
            }
            CuttingOptions::Random {
                min_duration,
                max_duration,
            } => {
                if *min_duration == 0 || *max_duration == 0 {
                    return Err(PlanError::BadPolicy(
                        "random durations must be positive".into(),
                    ));
                }
                if min_duration > max_duration {
                    return Err(PlanError::BadPolicy(format!(
                        "min_duration {} exceeds max_duration {}",
                        min_duration, max_duration
                    )));
                }
            }
        }
        Ok(())
    }

    /// Shortest segment length this policy can require.
    pub fn min_required_seconds(&self) -> u32 {
        match self {
            CuttingOptions::Fixed { duration_seconds } => *duration_seconds,
            CuttingOptions::Random { min_duration, .. } => *min_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_fixed() {
        let opts: CuttingOptions =
            serde_json::from_str(r#"{"type":"fixed","duration_seconds":30}"#).unwrap();
        assert_eq!(
            opts,
            CuttingOptions::Fixed {
                duration_seconds: 30
            }
        );
    }

    #[test]
    fn wire_form_random() {
        let opts: CuttingOptions =
            serde_json::from_str(r#"{"type":"random","min_duration":15,"max_duration":25}"#)
                .unwrap();
        assert_eq!(
            opts,
            CuttingOptions::Random {
                min_duration: 15,
                max_duration: 25
            }
        );
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let opts = CuttingOptions::Random {
            min_duration: 25,
            max_duration: 15,
        };
        assert!(matches!(opts.validate(), Err(PlanError::BadPolicy(_))));
    }

    #[test]
    fn validate_rejects_zero_durations() {
        assert!(CuttingOptions::Fixed { duration_seconds: 0 }
            .validate()
            .is_err());
        assert!(CuttingOptions::Random {
            min_duration: 0,
            max_duration: 10
        }
        .validate()
        .is_err());
    }
}

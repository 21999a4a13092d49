//! Pure segment planner.
//!
//! Turns (total duration, cutting policy) into an ordered list of
//! contiguous, non-overlapping time windows covering `[0, total]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cutting::CuttingOptions;
use crate::job::JobId;

pub type PlanResult<T> = Result<T, PlanError>;

/// Planner errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanError {
    #[error("Video is too short ({total:.1}s) for minimum segment duration {required}s")]
    VideoTooShort { total: f64, required: u32 },

    #[error("Bad cutting policy: {0}")]
    BadPolicy(String),

    #[error("Invalid video duration: {0}")]
    InvalidDuration(f64),
}

/// One segment time window, in seconds from the start of the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentWindow {
    pub start: f64,
    pub end: f64,
}

impl SegmentWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Planner output: the ordered segment windows for one job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SegmentPlan {
    pub total_duration: f64,
    pub windows: Vec<SegmentWindow>,
}

impl SegmentPlan {
    /// Number of planned segments.
    pub fn num_segments(&self) -> u32 {
        self.windows.len() as u32
    }

    /// Duration of each window, in order.
    pub fn segment_durations(&self) -> Vec<f64> {
        self.windows.iter().map(|w| w.duration()).collect()
    }
}

// Sub-second float drift from repeated addition must not spawn a phantom
// tail window.
const EPSILON: f64 = 1e-9;

/// Plan segment windows with a seeded random source.
///
/// Fixed policies are deterministic; random policies are reproducible for a
/// given seed (derive it from the job id via [`seed_for_job`]).
pub fn plan_segments(
    total_duration: f64,
    options: &CuttingOptions,
    seed: u64,
) -> PlanResult<SegmentPlan> {
    let mut rng = StdRng::seed_from_u64(seed);
    plan_segments_with(total_duration, options, |lo, hi| {
        rng.random_range(lo..=hi)
    })
}

/// Plan segment windows with an explicit uniform-draw function.
///
/// `draw(lo, hi)` must return a value in `[lo, hi]`. Exposed so tests can
/// script exact draws.
pub fn plan_segments_with<F>(
    total_duration: f64,
    options: &CuttingOptions,
    mut draw: F,
) -> PlanResult<SegmentPlan>
where
    F: FnMut(f64, f64) -> f64,
{
    options.validate()?;

    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(PlanError::InvalidDuration(total_duration));
    }

    let required = options.min_required_seconds();
    if f64::from(required) > total_duration {
        return Err(PlanError::VideoTooShort {
            total: total_duration,
            required,
        });
    }

    let mut windows = Vec::new();
    match options {
        CuttingOptions::Fixed { duration_seconds } => {
            let d = f64::from(*duration_seconds);
            let mut t = 0.0;
            while total_duration - t > EPSILON {
                let end = (t + d).min(total_duration);
                windows.push(SegmentWindow { start: t, end });
                t = end;
            }
        }
        CuttingOptions::Random {
            min_duration,
            max_duration,
        } => {
            let min = f64::from(*min_duration);
            let max = f64::from(*max_duration);
            let mut t = 0.0;
            while total_duration - t > EPSILON {
                let remaining = total_duration - t;
                if remaining < min {
                    // Sub-minimum tail is absorbed into a final short window.
                    windows.push(SegmentWindow {
                        start: t,
                        end: total_duration,
                    });
                    break;
                }
                let lo = min;
                let hi = max.min(remaining);
                let u = draw(lo, hi);
                let end = (t + u).min(total_duration);
                windows.push(SegmentWindow { start: t, end });
                t = end;
            }
        }
    }

    Ok(SegmentPlan {
        total_duration,
        windows,
    })
}

/// Derive a planner seed from a job id (FNV-1a over the id bytes).
pub fn seed_for_job(job_id: &JobId) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in job_id.as_str().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_plan_invariants(plan: &SegmentPlan) {
        assert!(!plan.windows.is_empty());
        assert_eq!(plan.windows[0].start, 0.0);
        assert!((plan.windows.last().unwrap().end - plan.total_duration).abs() < 1e-6);
        for pair in plan.windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
        for w in &plan.windows {
            assert!(w.duration() > 0.0);
        }
    }

    #[test]
    fn fixed_cut_95s_into_30s_segments() {
        // 95s at 30s per segment: (0,30) (30,60) (60,90) (90,95).
        let plan = plan_segments(
            95.0,
            &CuttingOptions::Fixed {
                duration_seconds: 30,
            },
            0,
        )
        .unwrap();

        assert_eq!(plan.num_segments(), 4);
        assert_plan_invariants(&plan);
        assert_eq!(plan.windows[0].end, 30.0);
        assert_eq!(plan.windows[2].end, 90.0);
        assert_eq!(plan.windows[3].start, 90.0);
        assert_eq!(plan.windows[3].end, 95.0);
    }

    #[test]
    fn fixed_cut_exact_multiple_has_no_tail() {
        let plan = plan_segments(
            60.0,
            &CuttingOptions::Fixed {
                duration_seconds: 30,
            },
            0,
        )
        .unwrap();
        assert_eq!(plan.num_segments(), 2);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn fixed_cut_duration_equal_to_total_is_single_window() {
        let plan = plan_segments(
            30.0,
            &CuttingOptions::Fixed {
                duration_seconds: 30,
            },
            0,
        )
        .unwrap();
        assert_eq!(plan.num_segments(), 1);
        assert_eq!(plan.windows[0].duration(), 30.0);
    }

    #[test]
    fn fixed_cut_too_short_video_rejected() {
        let err = plan_segments(
            8.0,
            &CuttingOptions::Fixed {
                duration_seconds: 30,
            },
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlanError::VideoTooShort {
                total: 8.0,
                required: 30
            }
        );
    }

    #[test]
    fn random_cut_with_scripted_draws() {
        // 60s with draws [20, 22, 18]: (0,20) (20,42) (42,60).
        let mut draws = vec![20.0, 22.0, 18.0].into_iter();
        let plan = plan_segments_with(
            60.0,
            &CuttingOptions::Random {
                min_duration: 15,
                max_duration: 25,
            },
            |lo, hi| {
                let u = draws.next().unwrap();
                assert!(u >= lo && u <= hi);
                u
            },
        )
        .unwrap();

        assert_eq!(plan.num_segments(), 3);
        assert_plan_invariants(&plan);
        assert_eq!(plan.windows[1].start, 20.0);
        assert_eq!(plan.windows[1].end, 42.0);
        assert_eq!(plan.windows[2].end, 60.0);
    }

    #[test]
    fn random_cut_absorbs_sub_minimum_tail() {
        // 31s at [10,12] with draws [11, 11]: after t=22 only 9s remain,
        // below the minimum, so the tail becomes a final short window.
        let mut draws = vec![11.0, 11.0].into_iter();
        let plan = plan_segments_with(
            31.0,
            &CuttingOptions::Random {
                min_duration: 10,
                max_duration: 12,
            },
            |_, _| draws.next().unwrap(),
        )
        .unwrap();

        assert_eq!(plan.num_segments(), 3);
        assert_plan_invariants(&plan);
        assert_eq!(plan.windows[2].start, 22.0);
        assert_eq!(plan.windows[2].end, 31.0);
    }

    #[test]
    fn random_cut_duration_equal_to_min_is_single_window() {
        let plan = plan_segments(
            15.0,
            &CuttingOptions::Random {
                min_duration: 15,
                max_duration: 25,
            },
            7,
        )
        .unwrap();
        assert_eq!(plan.num_segments(), 1);
        assert_eq!(plan.windows[0].end, 15.0);
    }

    #[test]
    fn random_cut_too_short_video_rejected() {
        let err = plan_segments(
            9.0,
            &CuttingOptions::Random {
                min_duration: 10,
                max_duration: 12,
            },
            0,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::VideoTooShort { .. }));
    }

    #[test]
    fn random_cut_window_lengths_within_bounds() {
        let plan = plan_segments(
            300.0,
            &CuttingOptions::Random {
                min_duration: 15,
                max_duration: 25,
            },
            42,
        )
        .unwrap();
        assert_plan_invariants(&plan);
        // All windows except possibly the last are within [min, max];
        // the last is within (0, max].
        let n = plan.windows.len();
        for (i, w) in plan.windows.iter().enumerate() {
            let d = w.duration();
            if i + 1 < n {
                assert!((15.0..=25.0).contains(&d), "window {} length {}", i, d);
            } else {
                assert!(d > 0.0 && d <= 25.0);
            }
        }
    }

    #[test]
    fn same_seed_plans_identical_windows() {
        let opts = CuttingOptions::Random {
            min_duration: 10,
            max_duration: 20,
        };
        let a = plan_segments(123.0, &opts, 99).unwrap();
        let b = plan_segments(123.0, &opts, 99).unwrap();
        assert_eq!(a.windows, b.windows);
    }

    #[test]
    fn seed_for_job_is_stable() {
        let id = JobId::from_string("abc-123");
        assert_eq!(seed_for_job(&id), seed_for_job(&id));
        assert_ne!(seed_for_job(&id), seed_for_job(&JobId::from_string("abc-124")));
    }

    #[test]
    fn invalid_duration_rejected() {
        let opts = CuttingOptions::default();
        assert!(matches!(
            plan_segments(0.0, &opts, 0),
            Err(PlanError::InvalidDuration(_))
        ));
        assert!(matches!(
            plan_segments(-5.0, &opts, 0),
            Err(PlanError::InvalidDuration(_))
        ));
    }
}

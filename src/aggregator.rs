//! Per-target sample collection and reduction.
//!
//! During calibration every frame yields one noisy [`RawSample`] for the
//! target currently on screen. Once enough frames are buffered the
//! aggregator reduces them to a single [`CalibrationExample`] by
//! arithmetic mean. Mean rather than median: the volume of stable frames
//! around an occasional bad landmark read (a blink, a dropped iris)
//! outweighs it, and outlier handling proper happens at training time via
//! sample weights and at runtime in the filter stage.

use crate::constants::FEATURE_DIM;
use crate::features::GazeFeatures;
use crate::grid::CalibrationTarget;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One frame's measurement during calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    /// Left eye iris ratio
    pub left_eye: (f64, f64),
    /// Right eye iris ratio
    pub right_eye: (f64, f64),
    /// Nose tip position ratio
    pub nose: (f64, f64),
    /// Index of the owning calibration target
    pub target_index: usize,
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

/// The reduced training row for one calibration target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationExample {
    /// Engineered feature vector (mean over the target's samples)
    pub features: [f64; FEATURE_DIM],
    /// Target x in pixels
    pub screen_x: f64,
    /// Target y in pixels
    pub screen_y: f64,
    /// Index of the owning calibration target
    pub target_index: usize,
}

/// Progress of sample collection for the current target
#[derive(Debug, Clone)]
pub enum PointStatus {
    /// Still collecting frames for this target
    Collecting {
        /// Frames buffered so far
        collected: usize,
        /// Frames required before reduction
        needed: usize,
    },
    /// Enough frames collected; the reduced example is ready
    Complete(CalibrationExample),
}

/// Collects repeated feature samples for one calibration target and
/// reduces them to a single training example
pub struct SampleAggregator {
    frames_per_point: usize,
    target: Option<CalibrationTarget>,
    buffer: Vec<RawSample>,
    completed: Vec<RawSample>,
}

impl SampleAggregator {
    /// Create an aggregator collecting `frames_per_point` samples per target
    ///
    /// # Panics
    ///
    /// Panics if `frames_per_point` is zero
    #[must_use]
    pub fn new(frames_per_point: usize) -> Self {
        assert!(frames_per_point > 0, "frames_per_point must be greater than 0");
        Self {
            frames_per_point,
            target: None,
            buffer: Vec::with_capacity(frames_per_point),
            completed: Vec::new(),
        }
    }

    /// Reset the per-point buffer and begin collecting for a new target
    pub fn begin_point(&mut self, target: CalibrationTarget) {
        self.buffer.clear();
        self.target = Some(target);
    }

    /// Append one frame's features for the current target.
    ///
    /// Returns [`PointStatus::Complete`] with the averaged example once
    /// the required frame count is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if no target collection is in progress.
    pub fn add_sample(&mut self, features: &GazeFeatures) -> Result<PointStatus> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("no calibration target active".to_string()))?;

        self.buffer.push(RawSample {
            left_eye: features.left_eye,
            right_eye: features.right_eye,
            nose: features.nose,
            target_index: target.index,
            timestamp_ms: now_ms(),
        });

        if self.buffer.len() < self.frames_per_point {
            return Ok(PointStatus::Collecting {
                collected: self.buffer.len(),
                needed: self.frames_per_point,
            });
        }

        let example = Self::reduce(&self.buffer, target);
        self.completed.append(&mut self.buffer);
        self.target = None;

        Ok(PointStatus::Complete(example))
    }

    /// Take ownership of every raw sample consumed by completed targets,
    /// for persistence alongside the trained model
    pub fn drain_raw_samples(&mut self) -> Vec<RawSample> {
        std::mem::take(&mut self.completed)
    }

    /// Discard all buffered state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.completed.clear();
        self.target = None;
    }

    /// Frames required per target
    #[must_use]
    pub const fn frames_per_point(&self) -> usize {
        self.frames_per_point
    }

    fn reduce(samples: &[RawSample], target: &CalibrationTarget) -> CalibrationExample {
        let n = samples.len() as f64;
        let mean =
            |f: &dyn Fn(&RawSample) -> f64| samples.iter().map(|s| f(s)).sum::<f64>() / n;

        let avg = GazeFeatures::new(
            (mean(&|s| s.left_eye.0), mean(&|s| s.left_eye.1)),
            (mean(&|s| s.right_eye.0), mean(&|s| s.right_eye.1)),
            (mean(&|s| s.nose.0), mean(&|s| s.nose.1)),
        );

        CalibrationExample {
            features: avg.feature_vector(),
            screen_x: f64::from(target.x),
            screen_y: f64::from(target.y),
            target_index: target.index,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

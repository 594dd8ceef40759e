//! Smoothing filters for the raw predicted-coordinate stream.
//!
//! Raw per-frame predictions jitter too much to drive a cursor directly.
//! The filters here turn that stream into a stable trajectory; all of
//! them support an explicit reset, required after recalibration or a
//! deliberate large jump so stale history does not fight the new signal.

/// Outlier clamp + moving average + exponential blend cascade
pub mod blend;

/// Constant-velocity Kalman filter
pub mod kalman;

/// Plain moving average over a coordinate ring buffer
pub mod moving_average;

/// Exponential smoothing
pub mod exponential;

use crate::constants::{
    DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_KALMAN_MEASUREMENT_NOISE, DEFAULT_KALMAN_PROCESS_NOISE,
    DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_OUTLIER_THRESHOLD_PX, DEFAULT_SMOOTH_FACTOR,
    DEFAULT_SMOOTH_WINDOW,
};
use crate::Result;

/// Trait for all gaze coordinate filters
pub trait GazeFilter: Send {
    /// Feed one raw predicted coordinate, get the smoothed coordinate
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64);

    /// Clear all history and state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl GazeFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a gaze filter by type name with default parameters
///
/// # Errors
///
/// Returns a filter error for an unknown type name.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn GazeFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "blend" => Ok(Box::new(blend::BlendFilter::new(
            DEFAULT_SMOOTH_WINDOW,
            DEFAULT_SMOOTH_FACTOR,
            DEFAULT_OUTLIER_THRESHOLD_PX,
        ))),
        "kalman" => Ok(Box::new(kalman::KalmanFilter::new(
            DEFAULT_KALMAN_PROCESS_NOISE,
            DEFAULT_KALMAN_MEASUREMENT_NOISE,
        ))),
        "moving_average" | "movingaverage" => Ok(Box::new(moving_average::MovingAverageFilter::new(
            DEFAULT_MOVING_AVERAGE_WINDOW,
        ))),
        "exponential" => Ok(Box::new(exponential::ExponentialFilter::new(
            DEFAULT_EXPONENTIAL_ALPHA,
        ))),
        _ => Err(crate::Error::FilterError(format!(
            "unknown filter type: {filter_type}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        let (x, y) = filter.apply(500.0, 300.0);
        assert_eq!(x, 500.0);
        assert_eq!(y, 300.0);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("blend").is_ok());
        assert!(create_filter("kalman").is_ok());
        assert!(create_filter("moving_average").is_ok());
        assert!(create_filter("exponential").is_ok());
        assert!(create_filter("unknown").is_err());
    }
}

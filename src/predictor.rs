//! Live prediction: trained mapping to raw screen coordinates.
//!
//! Evaluates the fitted model on one frame's features, applies the
//! output-gain transform about screen center and clamps to the screen.
//! Before a first calibration completes the predictor degrades to a
//! simple linear scaling of the averaged eye ratios instead of failing.

use crate::constants::{GAIN_DEFAULT, GAIN_MAX, GAIN_MIN};
use crate::features::GazeFeatures;
use crate::trainer::MappingModel;
use crate::{Error, Result};

/// Output gain, clamped to a configured range at all times.
///
/// Amplifies or dampens cursor travel about screen center without
/// retraining: raw regression range is pinned by the calibration-point
/// extremes, but comfortable cursor throw varies by user and monitor.
#[derive(Debug, Clone, Copy)]
pub struct OutputGain {
    value: f64,
    min: f64,
    max: f64,
}

impl OutputGain {
    /// Create a gain with the given bounds; the initial value is clamped
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bounds are not positive and
    /// ordered.
    pub fn new(initial: f64, min: f64, max: f64) -> Result<Self> {
        if min <= 0.0 || max < min {
            return Err(Error::ConfigError(format!(
                "invalid gain bounds [{min}, {max}]"
            )));
        }
        Ok(Self {
            value: initial.clamp(min, max),
            min,
            max,
        })
    }

    /// Current gain value
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Adjust by `delta`, clamping to the configured bounds
    pub fn adjust(&mut self, delta: f64) -> f64 {
        self.value = (self.value + delta).clamp(self.min, self.max);
        self.value
    }
}

impl Default for OutputGain {
    fn default() -> Self {
        Self {
            value: GAIN_DEFAULT,
            min: GAIN_MIN,
            max: GAIN_MAX,
        }
    }
}

/// Maps one live feature vector to a raw (pre-filter) screen coordinate
pub struct Predictor {
    screen_width: u32,
    screen_height: u32,
    gain: OutputGain,
}

impl Predictor {
    /// Create a predictor for the active screen
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either dimension is zero.
    pub fn new(screen_width: u32, screen_height: u32, gain: OutputGain) -> Result<Self> {
        if screen_width == 0 || screen_height == 0 {
            return Err(Error::ConfigError(format!(
                "screen dimensions must be positive, got {screen_width}x{screen_height}"
            )));
        }
        Ok(Self {
            screen_width,
            screen_height,
            gain,
        })
    }

    /// Evaluate the trained model on one frame's features.
    ///
    /// Applies `out = center + (pred - center) * gain` per axis and
    /// clamps to `[0, dim - 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelIncompatible`] when the feature shape does
    /// not match the model.
    pub fn predict(&self, model: &MappingModel, features: &GazeFeatures) -> Result<(f64, f64)> {
        let (raw_x, raw_y) = model.evaluate(&features.feature_vector())?;

        let center_x = f64::from(self.screen_width) / 2.0;
        let center_y = f64::from(self.screen_height) / 2.0;
        let gain = self.gain.value();

        let x = gain.mul_add(raw_x - center_x, center_x);
        let y = gain.mul_add(raw_y - center_y, center_y);

        Ok(self.clamp_to_screen(x, y))
    }

    /// Degraded mapping used before any calibration exists: the averaged
    /// eye ratio scaled linearly to the screen
    #[must_use]
    pub fn predict_uncalibrated(&self, features: &GazeFeatures) -> (f64, f64) {
        let (avg_x, avg_y) = features.average_eye();
        self.clamp_to_screen(
            avg_x * f64::from(self.screen_width),
            avg_y * f64::from(self.screen_height),
        )
    }

    /// Adjust the output gain, returning the clamped new value
    pub fn adjust_gain(&mut self, delta: f64) -> f64 {
        self.gain.adjust(delta)
    }

    /// Current output gain
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.gain.value()
    }

    /// Screen dimensions this predictor clamps to
    #[must_use]
    pub const fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn clamp_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(0.0, f64::from(self.screen_width - 1)),
            y.clamp(0.0, f64::from(self.screen_height - 1)),
        )
    }
}

//! Configuration management for the gaze tracker

use crate::constants::{
    DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_FRAMES_PER_POINT, DEFAULT_KALMAN_MEASUREMENT_NOISE,
    DEFAULT_KALMAN_PROCESS_NOISE, DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_OUTLIER_THRESHOLD_PX,
    DEFAULT_SMOOTH_FACTOR, DEFAULT_SMOOTH_WINDOW, GAIN_DEFAULT, GAIN_MAX, GAIN_MIN, GAIN_STEP,
    SMOOTH_WINDOW_MAX, SMOOTH_WINDOW_MIN,
};
use crate::filters::{blend::BlendFilter, exponential::ExponentialFilter, kalman::KalmanFilter,
    moving_average::MovingAverageFilter, GazeFilter};
use crate::grid::GridSize;
use crate::trainer::TrainerConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Calibration collection configuration
    pub calibration: CalibrationConfig,

    /// Trainer hyperparameters
    pub trainer: TrainerConfig,

    /// Filter configuration
    pub filter: FilterConfig,

    /// Output gain configuration
    pub gain: GainConfig,
}

/// Calibration collection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Frames collected per target before averaging
    pub frames_per_point: usize,

    /// Default grid size when none is requested explicitly (9, 15 or 21)
    pub default_points: usize,
}

/// Filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Default filter type
    pub default_filter: String,

    /// Blend filter ring buffer length (7-15)
    pub smooth_window: usize,

    /// Blend weight between buffer mean and last stable position
    pub smooth_factor: f64,

    /// Per-axis outlier threshold in pixels
    pub outlier_threshold: f64,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,

    /// Kalman process noise level
    pub kalman_process_noise: f64,

    /// Kalman measurement noise level
    pub kalman_measurement_noise: f64,
}

/// Output gain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainConfig {
    /// Gain applied at session start
    pub initial: f64,

    /// Lower clamp bound
    pub min: f64,

    /// Upper clamp bound
    pub max: f64,

    /// Increment used by gain adjustment commands
    pub step: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frames_per_point: DEFAULT_FRAMES_PER_POINT,
            default_points: GridSize::Nine.point_count(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_filter: "blend".to_string(),
            smooth_window: DEFAULT_SMOOTH_WINDOW,
            smooth_factor: DEFAULT_SMOOTH_FACTOR,
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD_PX,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
            kalman_process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            kalman_measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
        }
    }
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            initial: GAIN_DEFAULT,
            min: GAIN_MIN,
            max: GAIN_MAX,
            step: GAIN_STEP,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create the configured default filter
    ///
    /// # Errors
    ///
    /// Returns a filter error for an unknown filter name.
    pub fn create_filter(&self) -> Result<Box<dyn GazeFilter>> {
        match self.filter.default_filter.as_str() {
            "blend" => Ok(Box::new(BlendFilter::new(
                self.filter.smooth_window,
                self.filter.smooth_factor,
                self.filter.outlier_threshold,
            ))),
            "kalman" => Ok(Box::new(KalmanFilter::new(
                self.filter.kalman_process_noise,
                self.filter.kalman_measurement_noise,
            ))),
            "moving_average" => Ok(Box::new(MovingAverageFilter::new(
                self.filter.moving_average_window,
            ))),
            "exponential" => Ok(Box::new(ExponentialFilter::new(self.filter.exponential_alpha))),
            name => crate::filters::create_filter(name),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.calibration.frames_per_point == 0 {
            return Err(Error::ConfigError(
                "frames_per_point must be greater than 0".to_string(),
            ));
        }
        GridSize::try_from(self.calibration.default_points)?;

        if self.trainer.poly_degree == 0 {
            return Err(Error::ConfigError("poly_degree must be greater than 0".to_string()));
        }
        if self.trainer.ridge_alpha <= 0.0 {
            return Err(Error::ConfigError("ridge_alpha must be positive".to_string()));
        }
        if self.trainer.edge_weight_factor < 0.0 {
            return Err(Error::ConfigError(
                "edge_weight_factor must be non-negative".to_string(),
            ));
        }

        if !(SMOOTH_WINDOW_MIN..=SMOOTH_WINDOW_MAX).contains(&self.filter.smooth_window) {
            return Err(Error::ConfigError(format!(
                "smooth_window must be between {SMOOTH_WINDOW_MIN} and {SMOOTH_WINDOW_MAX}"
            )));
        }
        if !(0.0..=1.0).contains(&self.filter.smooth_factor) || self.filter.smooth_factor == 0.0 {
            return Err(Error::ConfigError("smooth_factor must be in (0, 1]".to_string()));
        }
        if self.filter.outlier_threshold <= 0.0 {
            return Err(Error::ConfigError("outlier_threshold must be positive".to_string()));
        }
        if self.filter.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "moving_average_window must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.exponential_alpha) || self.filter.exponential_alpha == 0.0 {
            return Err(Error::ConfigError("exponential_alpha must be in (0, 1]".to_string()));
        }
        if self.filter.kalman_process_noise <= 0.0 || self.filter.kalman_measurement_noise <= 0.0 {
            return Err(Error::ConfigError("kalman noise levels must be positive".to_string()));
        }

        if self.gain.min <= 0.0 || self.gain.max < self.gain.min {
            return Err(Error::ConfigError(format!(
                "gain bounds [{}, {}] are invalid",
                self.gain.min, self.gain.max
            )));
        }
        if !(self.gain.min..=self.gain.max).contains(&self.gain.initial) {
            return Err(Error::ConfigError(
                "initial gain must lie within the configured bounds".to_string(),
            ));
        }
        if self.gain.step <= 0.0 {
            return Err(Error::ConfigError("gain step must be positive".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Tracker Configuration

# Calibration collection
calibration:
  frames_per_point: 60
  default_points: 9

# Mapping trainer (empirically tuned defaults, adjust per user)
trainer:
  poly_degree: 3
  ridge_alpha: 0.01
  edge_weight_factor: 8.0

# Smoothing
filter:
  default_filter: "blend"
  smooth_window: 7
  smooth_factor: 0.5
  outlier_threshold: 200.0
  moving_average_window: 5
  exponential_alpha: 0.3
  kalman_process_noise: 0.1
  kalman_measurement_noise: 1.0

# Output gain
gain:
  initial: 1.0
  min: 0.5
  max: 2.0
  step: 0.1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.calibration.frames_per_point, 60);
        assert_eq!(config.trainer.poly_degree, 3);
    }

    #[test]
    fn test_invalid_point_count_rejected() {
        let mut config = Config::default();
        config.calibration.default_points = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smooth_window_bounds_enforced() {
        let mut config = Config::default();
        config.filter.smooth_window = 3;
        assert!(config.validate().is_err());
        config.filter.smooth_window = 16;
        assert!(config.validate().is_err());
        config.filter.smooth_window = 15;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gain_bounds_enforced() {
        let mut config = Config::default();
        config.gain.initial = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_filter_from_config() {
        let mut config = Config::default();
        assert_eq!(config.create_filter().unwrap().name(), "BlendFilter");

        config.filter.default_filter = "kalman".to_string();
        assert_eq!(config.create_filter().unwrap().name(), "KalmanFilter");

        config.filter.default_filter = "bogus".to_string();
        assert!(config.create_filter().is_err());
    }
}

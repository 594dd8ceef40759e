//! Constants used throughout the crate

/// Length of the engineered feature vector (left x/y, right x/y,
/// average x/y, difference x/y, nose x/y)
pub const FEATURE_DIM: usize = 10;

/// Frames collected per calibration target before averaging
pub const DEFAULT_FRAMES_PER_POINT: usize = 60;

/// Polynomial expansion degree for the eye-to-screen mapping
pub const DEFAULT_POLY_DEGREE: usize = 3;

/// Ridge regularization weight
pub const DEFAULT_RIDGE_ALPHA: f64 = 0.01;

/// Edge emphasis: sample weight is `1 + factor * distance_from_center`
pub const DEFAULT_EDGE_WEIGHT_FACTOR: f64 = 8.0;

/// Absolute minimum calibration examples for a 2D fit
pub const MIN_CALIBRATION_EXAMPLES: usize = 4;

/// Below this count training still runs but accuracy suffers
pub const RECOMMENDED_CALIBRATION_EXAMPLES: usize = 9;

/// Default ring buffer length for the blend filter
pub const DEFAULT_SMOOTH_WINDOW: usize = 7;

/// Valid ring buffer range for the blend filter
pub const SMOOTH_WINDOW_MIN: usize = 7;
pub const SMOOTH_WINDOW_MAX: usize = 15;

/// Blend weight between buffer mean and last stable position
pub const DEFAULT_SMOOTH_FACTOR: f64 = 0.5;

/// Per-axis jump beyond which a raw prediction is treated as an outlier
pub const DEFAULT_OUTLIER_THRESHOLD_PX: f64 = 200.0;

/// Default window size for the standalone moving average filter
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;

/// Default alpha for the standalone exponential filter
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.3;

/// Kalman filter noise defaults (fixed diagonal covariances)
pub const DEFAULT_KALMAN_PROCESS_NOISE: f64 = 0.1;
pub const DEFAULT_KALMAN_MEASUREMENT_NOISE: f64 = 1.0;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Output gain bounds and step
pub const GAIN_MIN: f64 = 0.5;
pub const GAIN_MAX: f64 = 2.0;
pub const GAIN_DEFAULT: f64 = 1.0;
pub const GAIN_STEP: f64 = 0.1;

/// Version stamp written into persisted model blobs
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Co-located persistence artifacts
pub const CALIBRATION_RECORD_FILE: &str = "calibration.json";
pub const MODEL_BLOB_FILE: &str = "model.bin";

/// Guard against zero-size eye boxes in ratio computation
pub const RATIO_EPSILON: f64 = 1e-6;

use super::GazeFilter;
use crate::constants::DEFAULT_FPS;
use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};

/// Constant-velocity Kalman filter over cursor position.
///
/// State is `[x, y, vx, vy]`; the transition assumes constant velocity
/// over one frame interval. Compared to the blend cascade this adapts
/// its smoothing implicitly: consistent motion raises state confidence
/// and the cursor tracks deliberate sweeps faster, while near-still gaze
/// gets heavier smoothing.
pub struct KalmanFilter {
    state: Vector4<f64>,
    covariance: Matrix4<f64>,
    process_noise: Matrix4<f64>,
    measurement_noise: Matrix2<f64>,
    transition: Matrix4<f64>,
    measurement: Matrix2x4<f64>,
    initialized: bool,
}

impl KalmanFilter {
    /// Create a filter with the given process/measurement noise levels.
    /// Both are fixed diagonal tunables, not learned.
    ///
    /// # Panics
    ///
    /// Panics if either noise level is not positive.
    #[must_use]
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        assert!(process_noise > 0.0, "Process noise must be positive");
        assert!(measurement_noise > 0.0, "Measurement noise must be positive");

        let dt: f64 = 1.0 / DEFAULT_FPS;

        let transition = Matrix4::new(
            1.0, 0.0, dt, 0.0,
            0.0, 1.0, 0.0, dt,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        // Only position is measured
        let measurement = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );

        let q = process_noise;
        let process_noise = Matrix4::new(
            q * dt.powi(4) / 4.0, 0.0, q * dt.powi(3) / 2.0, 0.0,
            0.0, q * dt.powi(4) / 4.0, 0.0, q * dt.powi(3) / 2.0,
            q * dt.powi(3) / 2.0, 0.0, q * dt.powi(2), 0.0,
            0.0, q * dt.powi(3) / 2.0, 0.0, q * dt.powi(2),
        );

        let r = measurement_noise;
        let measurement_noise = Matrix2::new(
            r, 0.0,
            0.0, r,
        );

        Self {
            state: Vector4::zeros(),
            covariance: Matrix4::identity(),
            process_noise,
            measurement_noise,
            transition,
            measurement,
            initialized: false,
        }
    }

    fn predict(&mut self) {
        self.state = self.transition * self.state;
        self.covariance =
            self.transition * self.covariance * self.transition.transpose() + self.process_noise;
    }

    fn update(&mut self, measurement: Vector2<f64>) {
        let innovation = measurement - self.measurement * self.state;
        let innovation_cov =
            self.measurement * self.covariance * self.measurement.transpose() + self.measurement_noise;

        // R keeps the innovation covariance positive definite; a failed
        // inversion means degenerate state, so keep the prediction.
        let Some(inverse) = innovation_cov.try_inverse() else {
            return;
        };
        let gain = self.covariance * self.measurement.transpose() * inverse;

        self.state += gain * innovation;
        self.covariance = (Matrix4::identity() - gain * self.measurement) * self.covariance;
    }
}

impl GazeFilter for KalmanFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        if !self.initialized {
            // First measurement seeds the state directly with zero
            // velocity; running predict with no prior would drag the
            // estimate toward the origin.
            self.state = Vector4::new(x, y, 0.0, 0.0);
            self.covariance = Matrix4::identity() * self.measurement_noise[(0, 0)];
            self.initialized = true;
            return (x, y);
        }

        self.predict();
        self.update(Vector2::new(x, y));

        (self.state[0], self.state[1])
    }

    fn reset(&mut self) {
        self.state = Vector4::zeros();
        self.covariance = Matrix4::identity();
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_measurement_initializes_state() {
        let mut filter = KalmanFilter::new(0.1, 1.0);

        let (x, y) = filter.apply(640.0, 360.0);
        assert_eq!(x, 640.0);
        assert_eq!(y, 360.0);
    }

    #[test]
    fn test_smoothing_between_measurements() {
        let mut filter = KalmanFilter::new(0.1, 1.0);

        filter.apply(500.0, 500.0);
        let (x, y) = filter.apply(520.0, 510.0);

        assert!(x > 500.0 && x < 520.0);
        assert!(y > 500.0 && y < 510.0);
    }

    #[test]
    fn test_constant_input_converges() {
        let mut filter = KalmanFilter::new(0.1, 1.0);

        let mut out = (0.0, 0.0);
        for _ in 0..30 {
            out = filter.apply(500.0, 500.0);
        }

        assert!((out.0 - 500.0).abs() < 1.0);
        assert!((out.1 - 500.0).abs() < 1.0);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut filter = KalmanFilter::new(0.1, 1.0);
        for _ in 0..10 {
            filter.apply(500.0, 500.0);
        }

        filter.reset();
        let (x, y) = filter.apply(100.0, 900.0);
        assert_eq!(x, 100.0);
        assert_eq!(y, 900.0);
    }
}

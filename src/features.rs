//! Feature extraction interface and feature engineering.
//!
//! The landmark detector is an external collaborator; this module defines
//! the boundary it feeds. A front-end derives per-eye iris ratios and a
//! normalized nose position with [`eye_ratio`] and [`nose_ratio`], packs
//! them into [`GazeFeatures`], and everything downstream (aggregation,
//! training, prediction) works on the engineered 10-feature vector.

use crate::constants::{FEATURE_DIM, RATIO_EPSILON};

/// One frame's normalized gaze measurements.
///
/// Each pair is `(horizontal, vertical)` in `[0, 1]`: for the eyes, the
/// iris center's position within its socket bounding box; for the nose,
/// the tip's position within the camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeFeatures {
    /// Left eye iris ratio
    pub left_eye: (f64, f64),
    /// Right eye iris ratio
    pub right_eye: (f64, f64),
    /// Nose tip position ratio
    pub nose: (f64, f64),
}

impl GazeFeatures {
    /// Create a feature set from the three ratio pairs
    #[must_use]
    pub const fn new(left_eye: (f64, f64), right_eye: (f64, f64), nose: (f64, f64)) -> Self {
        Self {
            left_eye,
            right_eye,
            nose,
        }
    }

    /// Build the engineered feature vector.
    ///
    /// Order: left x/y, right x/y, average x/y, difference x/y, nose x/y.
    /// The eye average is the main gaze indicator; the right-minus-left
    /// difference diverges when the head yaws, letting the regression
    /// factor head rotation out of the gaze estimate.
    #[must_use]
    pub fn feature_vector(&self) -> [f64; FEATURE_DIM] {
        let (lx, ly) = self.left_eye;
        let (rx, ry) = self.right_eye;
        let (nx, ny) = self.nose;

        let avg_x = (lx + rx) / 2.0;
        let avg_y = (ly + ry) / 2.0;
        let diff_x = rx - lx;
        let diff_y = ry - ly;

        [lx, ly, rx, ry, avg_x, avg_y, diff_x, diff_y, nx, ny]
    }

    /// Unweighted average of the two eye ratios, used by the
    /// uncalibrated fallback mapping
    #[must_use]
    pub fn average_eye(&self) -> (f64, f64) {
        (
            (self.left_eye.0 + self.right_eye.0) / 2.0,
            (self.left_eye.1 + self.right_eye.1) / 2.0,
        )
    }
}

/// Compute the iris-within-socket ratio pair for one eye.
///
/// `iris` is any set of landmark points covering the iris (their centroid
/// is taken as the iris center). The socket box is described by its left
/// and right corners plus top and bottom edge midpoints, all in frame
/// pixels. Both ratios are clamped to `[0, 1]`.
#[must_use]
pub fn eye_ratio(
    iris: &[(f64, f64)],
    eye_left: (f64, f64),
    eye_right: (f64, f64),
    eye_top: (f64, f64),
    eye_bottom: (f64, f64),
) -> (f64, f64) {
    let n = iris.len().max(1) as f64;
    let iris_cx = iris.iter().map(|p| p.0).sum::<f64>() / n;
    let iris_cy = iris.iter().map(|p| p.1).sum::<f64>() / n;

    let eye_width = ((eye_right.0 - eye_left.0).powi(2) + (eye_right.1 - eye_left.1).powi(2)).sqrt();
    let eye_height = ((eye_bottom.0 - eye_top.0).powi(2) + (eye_bottom.1 - eye_top.1).powi(2)).sqrt();

    let horizontal = (iris_cx - eye_left.0) / (eye_width + RATIO_EPSILON);
    let vertical = (iris_cy - eye_top.1) / (eye_height + RATIO_EPSILON);

    (horizontal.clamp(0.0, 1.0), vertical.clamp(0.0, 1.0))
}

/// Normalize a nose tip position against the frame dimensions
#[must_use]
pub fn nose_ratio(nose_tip: (f64, f64), frame_width: f64, frame_height: f64) -> (f64, f64) {
    (
        nose_tip.0 / (frame_width + RATIO_EPSILON),
        nose_tip.1 / (frame_height + RATIO_EPSILON),
    )
}

/// Expand a feature vector into all monomials of total degree `<= degree`.
///
/// The expansion includes the bias term and enumerates terms in a fixed
/// order (bias, then degree 1, degree 2, ... with non-decreasing index
/// combinations), so a model trained on the expansion can evaluate live
/// vectors expanded by the same function. Must be called with the same
/// `degree` at training and prediction time.
#[must_use]
pub fn polynomial_expansion(features: &[f64], degree: usize) -> Vec<f64> {
    let n = features.len();
    let mut terms = Vec::with_capacity(expanded_dim(n, degree));
    terms.push(1.0);

    // Each entry carries (last factor index, running product); extending
    // only with indices >= the last one enumerates every multiset once.
    let mut frontier: Vec<(usize, f64)> = vec![(0, 1.0)];
    for _ in 0..degree {
        let mut next = Vec::new();
        for &(start, product) in &frontier {
            for j in start..n {
                let term = product * features[j];
                terms.push(term);
                next.push((j, term));
            }
        }
        frontier = next;
    }

    terms
}

/// Number of terms produced by [`polynomial_expansion`] for `n` base
/// features at the given degree: C(n + degree, degree)
#[must_use]
pub fn expanded_dim(n: usize, degree: usize) -> usize {
    // binomial(n + degree, degree) computed incrementally to avoid overflow
    let mut result: usize = 1;
    for k in 1..=degree {
        result = result * (n + k) / k;
    }
    result
}

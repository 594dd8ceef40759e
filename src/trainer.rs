//! Mapping model training.
//!
//! Fits two independent ridge regressions (screen X and screen Y) from
//! the polynomially expanded feature vector to pixel coordinates. Samples
//! are weighted by distance from screen center so that edge and corner
//! targets, where the eye-rotation-to-ratio mapping saturates and
//! accuracy matters most, dominate the fit.

use crate::aggregator::CalibrationExample;
use crate::constants::{
    DEFAULT_EDGE_WEIGHT_FACTOR, DEFAULT_POLY_DEGREE, DEFAULT_RIDGE_ALPHA, FEATURE_DIM,
    MIN_CALIBRATION_EXAMPLES, MODEL_FORMAT_VERSION, RECOMMENDED_CALIBRATION_EXAMPLES,
};
use crate::features::{expanded_dim, polynomial_expansion};
use crate::{Error, Result};
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trainer hyperparameters.
///
/// The polynomial degree and edge-weight factor are empirically tuned
/// values carried over as defaults, not contracts; adjust per user if
/// accuracy at the extremes is unsatisfactory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Polynomial expansion degree
    pub poly_degree: usize,
    /// Ridge regularization weight
    pub ridge_alpha: f64,
    /// Edge emphasis factor in `weight = 1 + factor * dist_from_center`
    pub edge_weight_factor: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            poly_degree: DEFAULT_POLY_DEGREE,
            ridge_alpha: DEFAULT_RIDGE_ALPHA,
            edge_weight_factor: DEFAULT_EDGE_WEIGHT_FACTOR,
        }
    }
}

/// Trained regression state mapping eye features to screen coordinates.
///
/// Effectively immutable once trained: recalibration builds a new model
/// off to the side and replaces this one wholesale, so readers never
/// observe a half-trained state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingModel {
    /// Persisted format version, checked on load
    pub format_version: u32,
    /// Fitted coefficients for the X predictor
    pub x_coeffs: DVector<f64>,
    /// Fitted coefficients for the Y predictor
    pub y_coeffs: DVector<f64>,
    /// Base feature dimensionality the model was trained on
    pub feature_dim: usize,
    /// Polynomial expansion degree used at training time
    pub poly_degree: usize,
    /// Length of the expanded feature vector
    pub expanded_dim: usize,
    /// Regularization weight used for the fit
    pub ridge_alpha: f64,
    /// Screen resolution the model was trained for
    pub screen_width: u32,
    /// Screen resolution the model was trained for
    pub screen_height: u32,
    /// In-sample mean absolute pixel error, X axis
    pub train_error_x: f64,
    /// In-sample mean absolute pixel error, Y axis
    pub train_error_y: f64,
    /// Training time, seconds since the Unix epoch
    pub trained_at_secs: u64,
}

impl MappingModel {
    /// Evaluate both fitted predictors on a live feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelIncompatible`] if the feature vector length
    /// does not match the dimensionality the model was trained on.
    pub fn evaluate(&self, features: &[f64]) -> Result<(f64, f64)> {
        if features.len() != self.feature_dim {
            return Err(Error::ModelIncompatible(format!(
                "feature vector has {} entries, model was trained on {}",
                features.len(),
                self.feature_dim
            )));
        }

        let expanded = polynomial_expansion(features, self.poly_degree);
        if expanded.len() != self.expanded_dim {
            return Err(Error::ModelIncompatible(format!(
                "expanded vector has {} terms, model expects {}",
                expanded.len(),
                self.expanded_dim
            )));
        }

        let phi = DVector::from_vec(expanded);
        Ok((self.x_coeffs.dot(&phi), self.y_coeffs.dot(&phi)))
    }
}

/// Weight applied to a calibration example at normalized screen position
/// `(norm_x, norm_y)`: 1 at screen center, `1 + factor * sqrt(0.5)` at
/// the corners. Strictly increasing in distance from center.
#[must_use]
pub fn sample_weight(norm_x: f64, norm_y: f64, edge_weight_factor: f64) -> f64 {
    let dist = ((norm_x - 0.5).powi(2) + (norm_y - 0.5).powi(2)).sqrt();
    edge_weight_factor.mul_add(dist, 1.0)
}

/// Fit a [`MappingModel`] from a complete set of calibration examples.
///
/// # Errors
///
/// - [`Error::InsufficientCalibrationData`] with fewer than 4 examples
/// - [`Error::NumericalFitFailure`] on a singular system or non-finite
///   input/output values; no silent fallback to a degenerate model
pub fn train(
    examples: &[CalibrationExample],
    screen_width: u32,
    screen_height: u32,
    config: &TrainerConfig,
) -> Result<MappingModel> {
    if examples.len() < MIN_CALIBRATION_EXAMPLES {
        return Err(Error::InsufficientCalibrationData {
            got: examples.len(),
            required: MIN_CALIBRATION_EXAMPLES,
        });
    }
    if examples.len() < RECOMMENDED_CALIBRATION_EXAMPLES {
        warn!(
            "training with {} examples; {} or more recommended",
            examples.len(),
            RECOMMENDED_CALIBRATION_EXAMPLES
        );
    }

    let n = examples.len();
    let m = expanded_dim(FEATURE_DIM, config.poly_degree);

    let mut design = DMatrix::zeros(n, m);
    let mut target_x = DVector::zeros(n);
    let mut target_y = DVector::zeros(n);
    let mut weights = DVector::zeros(n);

    for (row, example) in examples.iter().enumerate() {
        if example.features.iter().any(|v| !v.is_finite()) {
            return Err(Error::NumericalFitFailure(format!(
                "non-finite feature value in example for target {}",
                example.target_index
            )));
        }

        let expanded = polynomial_expansion(&example.features, config.poly_degree);
        for (col, value) in expanded.into_iter().enumerate() {
            design[(row, col)] = value;
        }

        target_x[row] = example.screen_x;
        target_y[row] = example.screen_y;
        weights[row] = sample_weight(
            example.screen_x / f64::from(screen_width),
            example.screen_y / f64::from(screen_height),
            config.edge_weight_factor,
        );
    }

    info!("training on {n} edge-weighted calibration examples ({m} expanded terms)");

    let x_coeffs = solve_weighted_ridge(&design, &target_x, &weights, config.ridge_alpha)?;
    let y_coeffs = solve_weighted_ridge(&design, &target_y, &weights, config.ridge_alpha)?;

    // In-sample residual: the operating point is always this user, right
    // now, so a held-out estimate buys nothing here.
    let pred_x = &design * &x_coeffs;
    let pred_y = &design * &y_coeffs;
    let train_error_x = (pred_x - &target_x).abs().sum() / n as f64;
    let train_error_y = (pred_y - &target_y).abs().sum() / n as f64;

    info!("calibration fit complete, in-sample MAE x={train_error_x:.1}px y={train_error_y:.1}px");

    Ok(MappingModel {
        format_version: MODEL_FORMAT_VERSION,
        x_coeffs,
        y_coeffs,
        feature_dim: FEATURE_DIM,
        poly_degree: config.poly_degree,
        expanded_dim: m,
        ridge_alpha: config.ridge_alpha,
        screen_width,
        screen_height,
        train_error_x,
        train_error_y,
        trained_at_secs: now_secs(),
    })
}

/// Solve `(X^T W X + alpha I) beta = X^T W y` via Cholesky
fn solve_weighted_ridge(
    design: &DMatrix<f64>,
    targets: &DVector<f64>,
    weights: &DVector<f64>,
    alpha: f64,
) -> Result<DVector<f64>> {
    let m = design.ncols();

    // Scale rows by sqrt(w) so the weighted normal equations come out of
    // a plain Gram product.
    let mut scaled = design.clone();
    let mut scaled_targets = targets.clone();
    for row in 0..design.nrows() {
        let s = weights[row].sqrt();
        for col in 0..m {
            scaled[(row, col)] *= s;
        }
        scaled_targets[row] *= s;
    }

    let gram = scaled.transpose() * &scaled + DMatrix::identity(m, m) * alpha;
    let rhs = scaled.transpose() * scaled_targets;

    let cholesky = gram
        .cholesky()
        .ok_or_else(|| Error::NumericalFitFailure("normal equations matrix is singular".to_string()))?;
    let coeffs = cholesky.solve(&rhs);

    if coeffs.iter().any(|v| !v.is_finite()) {
        return Err(Error::NumericalFitFailure(
            "fit produced non-finite coefficients".to_string(),
        ));
    }

    Ok(coeffs)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

//! Error types for the gaze tracking library.
//!
//! A frame with no detected face is deliberately not an error: it
//! reaches the pipeline as an absent `Option` and simply produces no
//! cursor update.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Too few calibration examples to fit a mapping
    #[error("insufficient calibration data: {got} examples, {required} required")]
    InsufficientCalibrationData {
        /// Examples actually available
        got: usize,
        /// Examples needed for a fit
        required: usize,
    },

    /// Regression produced a singular system or non-finite values
    #[error("numerical fit failure: {0}")]
    NumericalFitFailure(String),

    /// A persisted model does not match the active session
    #[error("incompatible calibration model: {0}")]
    ModelIncompatible(String),

    /// File I/O failed while loading or saving calibration data
    #[error("I/O error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Encoding or decoding of persisted artifacts failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid input parameters provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filter construction or selection error
    #[error("filter error: {0}")]
    FilterError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

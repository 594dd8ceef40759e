//! Gaze calibration and cursor mapping core.
//!
//! This library turns a stream of per-frame eye measurements into screen
//! cursor coordinates. It covers the numeric pipeline only: an external
//! landmark detector produces normalized iris/nose ratios per frame, and
//! an external actuator consumes the pixel coordinates this crate emits.
//!
//! The pipeline:
//! 1. Grid generation places calibration targets across the screen
//! 2. The sample aggregator reduces noisy per-frame measurements at each
//!    target to one averaged training example
//! 3. The trainer fits edge-weighted ridge regressions over a polynomial
//!    feature expansion, one per screen axis
//! 4. The predictor evaluates the mapping live, with an output-gain
//!    transform about screen center
//! 5. A smoothing filter converts the raw prediction stream into a
//!    stable cursor trajectory
//!
//! # Examples
//!
//! ## Driving a session
//!
//! ```no_run
//! use gaze_tracker::config::Config;
//! use gaze_tracker::features::GazeFeatures;
//! use gaze_tracker::session::TrackerSession;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = TrackerSession::new(Config::default(), 1920, 1080, ".gaze")?;
//!
//! // Calibration: feed frames while the user fixates each target
//! session.start_calibration(9)?;
//! # let frame_features = GazeFeatures::new((0.5, 0.5), (0.5, 0.5), (0.5, 0.5));
//! while session.state() == gaze_tracker::session::SessionState::Calibrating {
//!     let progress = session.calibration_frame(&frame_features)?;
//! }
//!
//! // Tracking: one call per video frame
//! let features = Some(&frame_features);
//! if let Some((x, y)) = session.process_frame(features) {
//!     println!("{x} {y}"); // hand off to the cursor actuator
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the pieces directly
//!
//! ```
//! use gaze_tracker::filters::{create_filter, GazeFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("kalman")?;
//! let (x, y) = filter.apply(640.0, 360.0);
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Per-target sample collection and mean reduction
pub mod aggregator;

/// Configuration management
pub mod config;

/// Constants used throughout the crate
pub mod constants;

/// Error types and result handling
pub mod error;

/// Feature extraction interface and polynomial expansion
pub mod features;

/// Smoothing filters for the predicted-coordinate stream
pub mod filters;

/// Calibration target grid generation
pub mod grid;

/// Calibration persistence (JSON record + binary model blob)
pub mod persistence;

/// Live prediction and output gain
pub mod predictor;

/// Session object owning the pipeline, with the command surface
pub mod session;

/// Mapping model training
pub mod trainer;

pub use error::{Error, Result};

//! Tracker session: single owner of model, filter and mode state.
//!
//! The session is the one logical owner the concurrency model requires:
//! the tracking loop drives it frame by frame, while other threads (a
//! control panel, a hotkey listener) send [`Command`]s over an mpsc
//! channel instead of mutating filter or model state directly. A
//! recalibration builds its model fully off to the side and the session
//! swaps it in wholesale, so the prediction path never observes a
//! half-trained mapping.

use crate::aggregator::{CalibrationExample, PointStatus, RawSample, SampleAggregator};
use crate::config::Config;
use crate::features::GazeFeatures;
use crate::filters::GazeFilter;
use crate::grid::{generate_grid, CalibrationTarget, GridSize};
use crate::persistence::{CalibrationRecord, CalibrationStore};
use crate::predictor::{OutputGain, Predictor};
use crate::trainer::{train, MappingModel};
use crate::{Error, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Commands a control surface may issue to a running session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Begin a fresh calibration with the given point count
    Recalibrate(usize),
    /// Remove persisted calibration and drop the active model
    DeleteCalibration,
    /// Enable or disable cursor coordinate emission
    ToggleCursorControl,
    /// Enable or disable the smoothing stage
    ToggleSmoothing,
    /// Adjust output gain by a delta (clamped)
    AdjustGain(f64),
    /// Clear all filter history
    ResetFilters,
    /// Persist the active calibration and stop the session
    QuitAndSave,
}

/// Lifecycle state of a tracker session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable calibration; predictions use the degraded fallback
    Idle,
    /// Collecting calibration samples
    Calibrating,
    /// Trained model active
    Tracking,
}

/// Progress report for one calibration frame
#[derive(Debug, Clone)]
pub enum CalibrationProgress {
    /// Still collecting frames for the current target
    Collecting {
        /// Index of the target being collected
        point: usize,
        /// Total targets in the grid
        total: usize,
        /// Frames buffered for this target
        collected: usize,
        /// Frames required per target
        needed: usize,
    },
    /// One target finished, more remain
    PointComplete {
        /// Targets completed so far
        completed: usize,
        /// Total targets in the grid
        total: usize,
    },
    /// All targets collected and the model trained successfully
    Finished {
        /// In-sample mean absolute pixel error, X axis
        train_error_x: f64,
        /// In-sample mean absolute pixel error, Y axis
        train_error_y: f64,
    },
}

/// Create the channel pair a control surface uses to reach the session
#[must_use]
pub fn command_channel() -> (Sender<Command>, Receiver<Command>) {
    mpsc::channel()
}

/// Owns the full calibration/prediction/filtering pipeline for one
/// tracked face on one screen
pub struct TrackerSession {
    config: Config,
    store: CalibrationStore,
    state: SessionState,
    grid: Vec<CalibrationTarget>,
    current_point: usize,
    aggregator: SampleAggregator,
    examples: Vec<CalibrationExample>,
    raw_samples: Vec<RawSample>,
    model: Option<MappingModel>,
    predictor: Predictor,
    filter: Box<dyn GazeFilter>,
    cursor_control_enabled: bool,
    smoothing_enabled: bool,
    running: bool,
    fallback_reported: bool,
}

impl TrackerSession {
    /// Create a session for the active screen, loading any persisted
    /// calibration. An incompatible or missing calibration leaves the
    /// session in the degraded uncalibrated state rather than failing.
    ///
    /// # Errors
    ///
    /// Returns configuration errors for invalid config or screen
    /// dimensions, and I/O errors if the data directory is unusable.
    pub fn new<P: AsRef<Path>>(
        config: Config,
        screen_width: u32,
        screen_height: u32,
        data_dir: P,
    ) -> Result<Self> {
        config.validate()?;

        let gain = OutputGain::new(config.gain.initial, config.gain.min, config.gain.max)?;
        let predictor = Predictor::new(screen_width, screen_height, gain)?;
        let filter = config.create_filter()?;
        let store = CalibrationStore::new(data_dir)?;
        let aggregator = SampleAggregator::new(config.calibration.frames_per_point);

        let mut session = Self {
            config,
            store,
            state: SessionState::Idle,
            grid: Vec::new(),
            current_point: 0,
            aggregator,
            examples: Vec::new(),
            raw_samples: Vec::new(),
            model: None,
            predictor,
            filter,
            cursor_control_enabled: true,
            smoothing_enabled: true,
            running: true,
            fallback_reported: false,
        };
        session.load_persisted(screen_width, screen_height);

        Ok(session)
    }

    fn load_persisted(&mut self, screen_width: u32, screen_height: u32) {
        match self.store.load(screen_width, screen_height) {
            Ok((record, model)) => {
                info!(
                    "loaded calibration: {} examples, MAE x={:.1}px y={:.1}px",
                    record.examples.len(),
                    model.train_error_x,
                    model.train_error_y
                );
                self.grid = record.grid;
                self.examples = record.examples;
                self.raw_samples = record.raw_samples;
                self.model = Some(model);
                self.state = SessionState::Tracking;
            }
            Err(Error::ModelIncompatible(reason)) => {
                warn!("persisted calibration unusable ({reason}); recalibration required");
            }
            Err(Error::Persistence(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no persisted calibration found");
            }
            Err(e) => {
                warn!("failed to load calibration: {e}");
            }
        }
    }

    /// Begin a calibration run with the given point count.
    ///
    /// Any previously active model stays in place until the new one
    /// trains successfully.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unsupported point counts.
    pub fn start_calibration(&mut self, points: usize) -> Result<()> {
        let size = GridSize::try_from(points)?;
        let (width, height) = self.predictor.screen_size();

        self.grid = generate_grid(width, height, size)?;
        self.current_point = 0;
        self.examples.clear();
        self.raw_samples.clear();
        self.aggregator.reset();
        self.aggregator.begin_point(self.grid[0].clone());
        self.state = SessionState::Calibrating;

        info!(
            "starting {points}-point calibration, {} frames per target",
            self.aggregator.frames_per_point()
        );
        Ok(())
    }

    /// Abort an in-progress calibration, discarding partial samples.
    /// The previously active model, if any, is untouched.
    pub fn abort_calibration(&mut self) {
        if self.state != SessionState::Calibrating {
            return;
        }
        self.aggregator.reset();
        self.examples.clear();
        self.grid.clear();
        self.state = if self.model.is_some() {
            SessionState::Tracking
        } else {
            SessionState::Idle
        };
        info!("calibration aborted");
    }

    /// Feed one frame's features during calibration.
    ///
    /// After the final target completes, training runs automatically;
    /// on success the new model replaces the old one and both artifacts
    /// are persisted (persistence failures are logged, not raised).
    ///
    /// # Errors
    ///
    /// Returns an error if no calibration is in progress, or propagates
    /// training failures. A failed training leaves any previous model
    /// active.
    pub fn calibration_frame(&mut self, features: &GazeFeatures) -> Result<CalibrationProgress> {
        if self.state != SessionState::Calibrating {
            return Err(Error::InvalidInput("no calibration in progress".to_string()));
        }

        match self.aggregator.add_sample(features)? {
            PointStatus::Collecting { collected, needed } => Ok(CalibrationProgress::Collecting {
                point: self.current_point,
                total: self.grid.len(),
                collected,
                needed,
            }),
            PointStatus::Complete(example) => {
                debug!(
                    "calibration target {} complete ({}/{})",
                    example.target_index,
                    self.current_point + 1,
                    self.grid.len()
                );
                self.examples.push(example);
                self.current_point += 1;

                if self.current_point < self.grid.len() {
                    self.aggregator.begin_point(self.grid[self.current_point].clone());
                    Ok(CalibrationProgress::PointComplete {
                        completed: self.current_point,
                        total: self.grid.len(),
                    })
                } else {
                    self.finish_calibration()
                }
            }
        }
    }

    fn finish_calibration(&mut self) -> Result<CalibrationProgress> {
        self.raw_samples = self.aggregator.drain_raw_samples();
        let (width, height) = self.predictor.screen_size();

        match train(&self.examples, width, height, &self.config.trainer) {
            Ok(model) => {
                let errors = (model.train_error_x, model.train_error_y);
                self.model = Some(model);
                self.state = SessionState::Tracking;
                self.filter.reset();
                self.fallback_reported = false;

                if let Err(e) = self.save() {
                    warn!("calibration trained but could not be saved: {e}");
                }

                Ok(CalibrationProgress::Finished {
                    train_error_x: errors.0,
                    train_error_y: errors.1,
                })
            }
            Err(e) => {
                // Previous model (if any) stays active; a first-ever
                // failure leaves the degraded fallback mode.
                warn!("calibration failed: {e}");
                self.state = if self.model.is_some() {
                    SessionState::Tracking
                } else {
                    SessionState::Idle
                };
                self.grid.clear();
                self.examples.clear();
                Err(e)
            }
        }
    }

    /// Map one live frame to a smoothed cursor coordinate.
    ///
    /// `None` features (no face detected) and frames during calibration
    /// produce no update. Output is suppressed while cursor control is
    /// toggled off.
    pub fn process_frame(&mut self, features: Option<&GazeFeatures>) -> Option<(i32, i32)> {
        let features = features?;
        if self.state == SessionState::Calibrating {
            return None;
        }

        let raw = match &self.model {
            Some(model) => match self.predictor.predict(model, features) {
                Ok(coords) => coords,
                Err(e) => {
                    if !self.fallback_reported {
                        warn!("prediction failed ({e}); falling back to linear mapping");
                        self.fallback_reported = true;
                    }
                    self.predictor.predict_uncalibrated(features)
                }
            },
            None => self.predictor.predict_uncalibrated(features),
        };

        let (x, y) = if self.smoothing_enabled {
            self.filter.apply(raw.0, raw.1)
        } else {
            raw
        };

        if !self.cursor_control_enabled {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let pixel = (x.round() as i32, y.round() as i32);
        Some(pixel)
    }

    /// Apply one control-surface command
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying operation (unsupported
    /// point count, persistence failure on delete).
    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Recalibrate(points) => self.start_calibration(points),
            Command::DeleteCalibration => {
                self.store.delete()?;
                self.model = None;
                self.examples.clear();
                self.raw_samples.clear();
                self.grid.clear();
                self.filter.reset();
                self.state = SessionState::Idle;
                info!("calibration deleted; running uncalibrated");
                Ok(())
            }
            Command::ToggleCursorControl => {
                self.cursor_control_enabled = !self.cursor_control_enabled;
                info!(
                    "cursor control {}",
                    if self.cursor_control_enabled { "enabled" } else { "disabled" }
                );
                Ok(())
            }
            Command::ToggleSmoothing => {
                self.smoothing_enabled = !self.smoothing_enabled;
                if !self.smoothing_enabled {
                    self.filter.reset();
                }
                info!(
                    "smoothing {}",
                    if self.smoothing_enabled { "enabled" } else { "disabled" }
                );
                Ok(())
            }
            Command::AdjustGain(delta) => {
                let gain = self.predictor.adjust_gain(delta);
                info!("output gain now {gain:.2}");
                Ok(())
            }
            Command::ResetFilters => {
                self.filter.reset();
                info!("smoothing filters reset");
                Ok(())
            }
            Command::QuitAndSave => {
                if self.model.is_some() {
                    if let Err(e) = self.save() {
                        warn!("failed to save calibration on quit: {e}");
                    }
                }
                self.running = false;
                Ok(())
            }
        }
    }

    /// Drain and apply every queued command; call once per loop
    /// iteration from the owning tracking loop
    pub fn drain_commands(&mut self, commands: &Receiver<Command>) {
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if let Err(e) = self.handle_command(command) {
                        warn!("command failed: {e}");
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Persist the active calibration
    ///
    /// # Errors
    ///
    /// Returns an error if no model is trained or the write fails.
    pub fn save(&self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("no trained model to save".to_string()))?;

        let record = CalibrationRecord {
            screen_width: model.screen_width,
            screen_height: model.screen_height,
            grid: self.grid.clone(),
            examples: self.examples.clone(),
            raw_samples: self.raw_samples.clone(),
            train_error_x: model.train_error_x,
            train_error_y: model.train_error_y,
        };
        self.store.save(&record, model)
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// False once a quit command has been handled
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The target currently being collected, if calibrating
    #[must_use]
    pub fn current_target(&self) -> Option<&CalibrationTarget> {
        if self.state == SessionState::Calibrating {
            self.grid.get(self.current_point)
        } else {
            None
        }
    }

    /// Current output gain
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.predictor.gain()
    }

    /// The active trained model, if any
    #[must_use]
    pub const fn model(&self) -> Option<&MappingModel> {
        self.model.as_ref()
    }
}

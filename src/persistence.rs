//! Calibration persistence.
//!
//! Two co-located artifacts are written together: a human-readable JSON
//! record (screen resolution, grid, examples, raw samples, training
//! errors) and a binary blob holding the fitted coefficients with an
//! explicit format version. Loading validates version, resolution and
//! feature dimensionality; any mismatch means "no usable calibration",
//! never a silently wrong prediction.

use crate::aggregator::{CalibrationExample, RawSample};
use crate::constants::{CALIBRATION_RECORD_FILE, FEATURE_DIM, MODEL_BLOB_FILE, MODEL_FORMAT_VERSION};
use crate::features::expanded_dim;
use crate::grid::CalibrationTarget;
use crate::trainer::MappingModel;
use crate::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// The inspectable half of a persisted calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Screen width the calibration was collected for
    pub screen_width: u32,
    /// Screen height the calibration was collected for
    pub screen_height: u32,
    /// The target grid used during collection
    pub grid: Vec<CalibrationTarget>,
    /// Reduced training examples, one per target
    pub examples: Vec<CalibrationExample>,
    /// Raw per-frame samples behind the examples
    pub raw_samples: Vec<RawSample>,
    /// In-sample mean absolute pixel error, X axis
    pub train_error_x: f64,
    /// In-sample mean absolute pixel error, Y axis
    pub train_error_y: f64,
}

/// Handles the calibration artifact pair under one directory
pub struct CalibrationStore {
    record_path: PathBuf,
    model_path: PathBuf,
}

impl CalibrationStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            record_path: dir.join(CALIBRATION_RECORD_FILE),
            model_path: dir.join(MODEL_BLOB_FILE),
        })
    }

    /// Path of the JSON record artifact
    #[must_use]
    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Path of the binary model artifact
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// True if both artifacts are present on disk
    #[must_use]
    pub fn exists(&self) -> bool {
        self.record_path.exists() && self.model_path.exists()
    }

    /// Write both artifacts.
    ///
    /// # Errors
    ///
    /// Returns persistence or serialization errors; callers in a live
    /// tracking loop report these and continue rather than aborting.
    pub fn save(&self, record: &CalibrationRecord, model: &MappingModel) -> Result<()> {
        let record_file = File::create(&self.record_path)?;
        serde_json::to_writer_pretty(BufWriter::new(record_file), record)
            .map_err(|e| Error::Serialization(format!("failed to encode calibration record: {e}")))?;

        let blob = bincode::serialize(model)
            .map_err(|e| Error::Serialization(format!("failed to encode model blob: {e}")))?;
        let mut model_file = BufWriter::new(File::create(&self.model_path)?);
        model_file.write_all(&blob)?;
        model_file.flush()?;

        info!(
            "calibration saved to {} / {}",
            self.record_path.display(),
            self.model_path.display()
        );
        Ok(())
    }

    /// Load and validate both artifacts against the active screen.
    ///
    /// # Errors
    ///
    /// - [`Error::Persistence`] when either artifact is missing/unreadable
    /// - [`Error::Serialization`] on decode failure
    /// - [`Error::ModelIncompatible`] when the persisted model's format
    ///   version, resolution or dimensionality does not fit this session
    pub fn load(&self, screen_width: u32, screen_height: u32) -> Result<(CalibrationRecord, MappingModel)> {
        let record_file = File::open(&self.record_path)?;
        let record: CalibrationRecord = serde_json::from_reader(BufReader::new(record_file))
            .map_err(|e| Error::Serialization(format!("failed to decode calibration record: {e}")))?;

        let blob = fs::read(&self.model_path)?;
        let model: MappingModel = bincode::deserialize(&blob)
            .map_err(|e| Error::Serialization(format!("failed to decode model blob: {e}")))?;

        validate(&record, &model, screen_width, screen_height)?;

        debug!(
            "calibration loaded: {} examples, MAE x={:.1}px y={:.1}px",
            record.examples.len(),
            model.train_error_x,
            model.train_error_y
        );
        Ok((record, model))
    }

    /// Remove both artifacts; missing files are not an error
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a present artifact cannot be removed.
    pub fn delete(&self) -> Result<()> {
        for path in [&self.record_path, &self.model_path] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        info!("calibration artifacts deleted");
        Ok(())
    }
}

fn validate(
    record: &CalibrationRecord,
    model: &MappingModel,
    screen_width: u32,
    screen_height: u32,
) -> Result<()> {
    if model.format_version != MODEL_FORMAT_VERSION {
        return Err(Error::ModelIncompatible(format!(
            "model format version {} (current {})",
            model.format_version, MODEL_FORMAT_VERSION
        )));
    }
    if model.screen_width != screen_width || model.screen_height != screen_height {
        return Err(Error::ModelIncompatible(format!(
            "model trained for {}x{}, active display is {}x{}",
            model.screen_width, model.screen_height, screen_width, screen_height
        )));
    }
    if record.screen_width != model.screen_width || record.screen_height != model.screen_height {
        return Err(Error::ModelIncompatible(
            "record and model disagree on screen resolution".to_string(),
        ));
    }
    if model.feature_dim != FEATURE_DIM {
        return Err(Error::ModelIncompatible(format!(
            "model trained on {} base features (current {})",
            model.feature_dim, FEATURE_DIM
        )));
    }
    let expected = expanded_dim(model.feature_dim, model.poly_degree);
    if model.expanded_dim != expected
        || model.x_coeffs.len() != expected
        || model.y_coeffs.len() != expected
    {
        return Err(Error::ModelIncompatible(format!(
            "coefficient count {} does not match degree-{} expansion of {} features",
            model.x_coeffs.len(),
            model.poly_degree,
            model.feature_dim
        )));
    }

    Ok(())
}

//! Calibration grid generation.
//!
//! Produces the deterministic sequence of on-screen targets the user
//! fixates on during calibration. Grid positions are biased toward 0.05
//! and 0.95 rather than the true screen edges because landmark noise
//! grows as gaze approaches the facial extremes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Supported calibration grid sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSize {
    /// 3x3 grid
    Nine,
    /// Three 5-column rows (top, center, bottom)
    Fifteen,
    /// 5-3-5-3-5 layout with denser mid rows
    TwentyOne,
}

impl GridSize {
    /// Number of targets this grid produces
    #[must_use]
    pub const fn point_count(self) -> usize {
        match self {
            Self::Nine => 9,
            Self::Fifteen => 15,
            Self::TwentyOne => 21,
        }
    }
}

impl TryFrom<usize> for GridSize {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            9 => Ok(Self::Nine),
            15 => Ok(Self::Fifteen),
            21 => Ok(Self::TwentyOne),
            other => Err(Error::ConfigError(format!(
                "unsupported calibration point count: {other} (supported: 9, 15, 21)"
            ))),
        }
    }
}

/// One designated on-screen calibration location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationTarget {
    /// Pixel x coordinate
    pub x: i32,
    /// Pixel y coordinate
    pub y: i32,
    /// Position in the calibration sequence
    pub index: usize,
    /// Human-readable label
    pub label: Option<String>,
}

/// Column positions shared by the 5-point rows
const WIDE_COLS: [f64; 5] = [0.05, 0.275, 0.5, 0.725, 0.95];
/// Column positions for the 3-point mid rows of the 21-point grid
const NARROW_COLS: [f64; 3] = [0.275, 0.5, 0.725];

/// Generate the ordered calibration target sequence.
///
/// Pure: identical inputs always yield identical output. Ordering only
/// matters for UI progression; training is order-independent.
///
/// # Errors
///
/// Returns a configuration error if either screen dimension is zero.
pub fn generate_grid(screen_width: u32, screen_height: u32, size: GridSize) -> Result<Vec<CalibrationTarget>> {
    if screen_width == 0 || screen_height == 0 {
        return Err(Error::ConfigError(format!(
            "screen dimensions must be positive, got {screen_width}x{screen_height}"
        )));
    }

    let normalized: Vec<(f64, f64)> = match size {
        GridSize::Nine => {
            let edges = [0.05, 0.5, 0.95];
            edges
                .iter()
                .flat_map(|&row| edges.iter().map(move |&col| (col, row)))
                .collect()
        }
        GridSize::Fifteen => [0.05, 0.5, 0.95]
            .iter()
            .flat_map(|&row| WIDE_COLS.iter().map(move |&col| (col, row)))
            .collect(),
        GridSize::TwentyOne => {
            let mut points = Vec::with_capacity(21);
            for &row in &[0.05, 0.3, 0.5, 0.7, 0.95] {
                // the mid rows carry 3 points, all others 5
                let cols: &[f64] = if row == 0.3 || row == 0.7 { &NARROW_COLS } else { &WIDE_COLS };
                points.extend(cols.iter().map(|&col| (col, row)));
            }
            points
        }
    };

    #[allow(clippy::cast_possible_truncation)]
    let targets = normalized
        .into_iter()
        .enumerate()
        .map(|(index, (col, row))| CalibrationTarget {
            x: (col * f64::from(screen_width)) as i32,
            y: (row * f64::from(screen_height)) as i32,
            index,
            label: Some(format!("P{}", index + 1)),
        })
        .collect();

    Ok(targets)
}

use crate::error::{Error, Result};
use nalgebra::Vector2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calibrated view angles `(phi_x, phi_y)` in radians for one detector column.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LookAngleEntry {
    pub col: i64,
    pub angles: Vector2<f64>,
}

impl LookAngleEntry {
    pub fn new(col: i64, phi_x: f64, phi_y: f64) -> Self {
        Self {
            col,
            angles: Vector2::new(phi_x, phi_y),
        }
    }
}

/// Per-column look angles, possibly sub-sampled across the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct LookAngleTable {
    entries: Vec<LookAngleEntry>,
}

impl LookAngleTable {
    /// Creates a table from `entries` sorted by strictly increasing column.
    pub fn new(entries: Vec<LookAngleEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidModel("look angle table is empty".into()));
        }

        if let Some(pair) = entries.windows(2).find(|pair| pair[1].col <= pair[0].col) {
            return Err(Error::InvalidModel(format!(
                "look angle columns must be strictly increasing but {} follows {}",
                pair[1].col, pair[0].col
            )));
        }

        if entries
            .iter()
            .any(|e| !(e.angles.x.is_finite() && e.angles.y.is_finite()))
        {
            return Err(Error::InvalidModel("look angles must be finite".into()));
        }

        Ok(Self { entries })
    }

    /// Lowest and highest calibrated column.
    pub fn col_range(&self) -> (i64, i64) {
        (self.entries[0].col, self.entries[self.entries.len() - 1].col)
    }

    /// Returns `true` if every column of `[0, cols)` is covered.
    pub fn covers(&self, cols: usize) -> bool {
        let (min, max) = self.col_range();
        min <= 0
            && cols
                .checked_sub(1)
                .and_then(|last| i64::try_from(last).ok())
                .is_some_and(|last| max >= last)
    }

    pub fn entries(&self) -> &[LookAngleEntry] {
        &self.entries
    }

    /// Linearly interpolates the look angles at a fractional `col`.
    pub fn local_angles(&self, col: f64) -> Result<Vector2<f64>> {
        let (min, max) = self.col_range();
        let (min, max) = (min as f64, max as f64);
        if !(min..=max).contains(&col) {
            return Err(Error::out_of_range("column", col, min, max));
        }

        let upper = self.entries.partition_point(|e| e.col as f64 <= col);
        let lo = &self.entries[upper - 1];
        if lo.col as f64 == col {
            return Ok(lo.angles);
        }

        let hi = &self.entries[upper];
        let u = (col - lo.col as f64) / (hi.col as f64 - lo.col as f64);
        Ok(lo.angles.lerp(&hi.angles, u))
    }
}

use crate::error::{Error, Result};
use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A possibly fractional image location. Rows run along the flight direction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pixel {
    pub row: f64,
    pub col: f64,
}

impl Pixel {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

impl AsRef<Pixel> for Pixel {
    fn as_ref(&self) -> &Pixel {
        self
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageSize {
    pub rows: usize,
    pub cols: usize,
}

impl ImageSize {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of pixels, saturating at `usize::MAX`.
    pub fn pixel_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn contains(&self, pixel: impl AsRef<Pixel>) -> bool {
        self.check(pixel).is_ok()
    }

    /// Fails with `OutOfRange` naming the offending axis if `pixel` is not
    /// inside the image.
    pub fn check(&self, pixel: impl AsRef<Pixel>) -> Result<()> {
        let pixel = pixel.as_ref();
        let (rows, cols) = (self.rows as f64, self.cols as f64);

        if !(0.0..rows).contains(&pixel.row) {
            return Err(Error::out_of_bounds("row", pixel.row, 0.0, rows));
        }

        if !(0.0..cols).contains(&pixel.col) {
            return Err(Error::out_of_bounds("column", pixel.col, 0.0, cols));
        }

        Ok(())
    }

    /// Row major pixels with spacing `step`, starting at the origin.
    pub fn grid(&self, step: usize) -> impl Iterator<Item = Pixel> + use<> {
        let step = step.max(1);
        let cols = self.cols;
        (0..self.rows).step_by(step).flat_map(move |row| {
            (0..cols)
                .step_by(step)
                .map(move |col| Pixel::new(row as f64, col as f64))
        })
    }
}

/// A viewing ray in the planet fixed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Camera center at the acquisition time.
    pub origin: Vector3<f64>,

    /// Unit length viewing direction.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction * t
    }
}

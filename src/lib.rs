//! Pixel to ray camera models for satellite imagers.
//!
//! A [`LinescanCamera`] images one line per instant as the satellite moves.
//! It maps image lines to acquisition times, interpolates the ephemeris and
//! attitude at that time and carries each column's calibrated look angles
//! through the local orbital frame into a planet fixed viewing ray. A
//! [`PinholeCamera`] exposes a whole frame at once. Both implement
//! [`CameraModel`], which is what triangulation and bundle adjustment consume.
//!
//! Built models are immutable and `Sync`, so rays for large pixel batches are
//! computed in parallel with [`CameraModel::par_pixels_to_rays`].

#[allow(missing_docs)]
pub mod error;

pub mod batch;
pub mod camera;
#[cfg(feature = "serde")]
pub mod config;
pub mod frame;
pub mod interp;
pub mod look;
pub mod ray;
pub mod state;
pub mod time;

pub use batch::{PixelFailure, RayBatch};
pub use camera::{Camera, CameraModel, LinescanCamera, PinholeCamera};
pub use error::{Error, Result};
pub use ray::{ImageSize, Pixel, Ray};

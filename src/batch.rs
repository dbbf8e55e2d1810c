//! Parallel pixel to ray conversion over many pixels.

use crate::{
    camera::CameraModel,
    error::Error,
    ray::{Pixel, Ray},
};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// A pixel that could not be converted and why.
#[derive(Clone, Debug, Error, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[error("pixel ({}, {}): {error}", .pixel.row, .pixel.col)]
pub struct PixelFailure {
    pub pixel: Pixel,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
    pub error: Error,
}

#[cfg(feature = "serde")]
fn serialize_display<S: serde::Serializer>(error: &Error, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Outcome of converting a batch of pixels, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RayBatch {
    pub rays: Vec<(Pixel, Ray)>,
    pub failures: Vec<PixelFailure>,
}

impl RayBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub(crate) fn par_pixels_to_rays<M>(model: &M, pixels: &[Pixel]) -> RayBatch
where
    M: CameraModel + Sync + ?Sized,
{
    let results: Vec<_> = pixels
        .par_iter()
        .map(|&pixel| (pixel, model.pixel_to_ray(pixel)))
        .collect();

    let mut batch = RayBatch::default();
    for (pixel, result) in results {
        match result {
            Ok(ray) => batch.rays.push((pixel, ray)),
            Err(error) => batch.failures.push(PixelFailure { pixel, error }),
        }
    }

    debug!(
        rays = batch.rays.len(),
        failures = batch.failures.len(),
        "converted pixel batch"
    );
    batch
}

pub(crate) fn try_par_pixels_to_rays<M>(
    model: &M,
    pixels: &[Pixel],
) -> Result<Vec<Ray>, PixelFailure>
where
    M: CameraModel + Sync + ?Sized,
{
    pixels
        .par_iter()
        .map(|&pixel| {
            model
                .pixel_to_ray(pixel)
                .map_err(|error| PixelFailure { pixel, error })
        })
        .collect()
}

//! Camera models mapping image pixels to viewing rays.

mod linescan;
mod pinhole;

use crate::{
    batch::{self, PixelFailure, RayBatch},
    error::Result,
    ray::{ImageSize, Pixel, Ray},
};
pub use linescan::{LinescanCamera, SPEED_OF_LIGHT};
use nalgebra::{UnitQuaternion, Vector3};
pub use pinhole::{MetricLensDistortion, PinholeCamera, PinholeIntrinsics};

/// The interface triangulation and bundle adjustment consume.
///
/// Implementations are immutable once built, so every method may be called
/// concurrently.
pub trait CameraModel {
    fn image_size(&self) -> ImageSize;

    /// Camera center at `time` in the planet fixed frame.
    fn camera_center(&self, time: f64) -> Result<Vector3<f64>>;

    fn camera_velocity(&self, time: f64) -> Result<Vector3<f64>>;

    fn camera_pose(&self, time: f64) -> Result<UnitQuaternion<f64>>;

    /// Acquisition time of image line `line`.
    fn time_at_line(&self, line: f64) -> f64;

    /// Viewing ray through `pixel`, anchored at the camera center.
    fn pixel_to_ray(&self, pixel: Pixel) -> Result<Ray>;

    /// Converts `pixels` in parallel, collecting per-pixel failures.
    fn par_pixels_to_rays(&self, pixels: &[Pixel]) -> RayBatch
    where
        Self: Sync,
    {
        batch::par_pixels_to_rays(self, pixels)
    }

    /// Converts `pixels` in parallel, stopping at the first failure.
    fn try_par_pixels_to_rays(
        &self,
        pixels: &[Pixel],
    ) -> std::result::Result<Vec<Ray>, PixelFailure>
    where
        Self: Sync,
    {
        batch::try_par_pixels_to_rays(self, pixels)
    }
}

/// A camera of any supported sensor family, chosen at construction.
#[derive(Clone, Debug, PartialEq)]
pub enum Camera {
    Linescan(LinescanCamera),
    Pinhole(PinholeCamera),
}

impl From<LinescanCamera> for Camera {
    fn from(camera: LinescanCamera) -> Self {
        Camera::Linescan(camera)
    }
}

impl From<PinholeCamera> for Camera {
    fn from(camera: PinholeCamera) -> Self {
        Camera::Pinhole(camera)
    }
}

impl CameraModel for Camera {
    fn image_size(&self) -> ImageSize {
        match self {
            Camera::Linescan(camera) => camera.image_size(),
            Camera::Pinhole(camera) => camera.image_size(),
        }
    }

    fn camera_center(&self, time: f64) -> Result<Vector3<f64>> {
        match self {
            Camera::Linescan(camera) => camera.camera_center(time),
            Camera::Pinhole(camera) => camera.camera_center(time),
        }
    }

    fn camera_velocity(&self, time: f64) -> Result<Vector3<f64>> {
        match self {
            Camera::Linescan(camera) => camera.camera_velocity(time),
            Camera::Pinhole(camera) => camera.camera_velocity(time),
        }
    }

    fn camera_pose(&self, time: f64) -> Result<UnitQuaternion<f64>> {
        match self {
            Camera::Linescan(camera) => camera.camera_pose(time),
            Camera::Pinhole(camera) => camera.camera_pose(time),
        }
    }

    fn time_at_line(&self, line: f64) -> f64 {
        match self {
            Camera::Linescan(camera) => camera.time_at_line(line),
            Camera::Pinhole(camera) => camera.time_at_line(line),
        }
    }

    fn pixel_to_ray(&self, pixel: Pixel) -> Result<Ray> {
        match self {
            Camera::Linescan(camera) => camera.pixel_to_ray(pixel),
            Camera::Pinhole(camera) => camera.pixel_to_ray(pixel),
        }
    }
}

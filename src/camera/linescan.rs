use super::CameraModel;
use crate::{
    error::{Error, Result},
    frame::{BoresightOffsets, local_look_vector, orbital_frame},
    look::LookAngleTable,
    ray::{ImageSize, Pixel, Ray},
    state::Trajectory,
    time::TimeModel,
};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use tracing::debug;

/// Speed of light in meters per second.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// A pushbroom camera that images one line per instant.
///
/// Line numbers map to acquisition times, columns to calibrated look angles.
/// A pixel's ray is the column's look vector carried through the boresight
/// offsets, the interpolated attitude and the local orbital frame:
///
/// ```text
/// direction = [X2 | Y2 | Z2] * R(pose) * Mp * Mr * My * u1
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LinescanCamera {
    time: TimeModel,
    trajectory: Trajectory,
    look_angles: LookAngleTable,
    boresight: BoresightOffsets,
    boresight_rotation: Matrix3<f64>,
    image_size: ImageSize,
    correct_velocity_aberration: bool,
}

impl LinescanCamera {
    /// Creates a `LinescanCamera`.
    ///
    /// Returns `InvalidModel` if the image is empty or `look_angles` does not
    /// cover every image column.
    pub fn new(
        time: TimeModel,
        trajectory: Trajectory,
        look_angles: LookAngleTable,
        boresight: BoresightOffsets,
        image_size: ImageSize,
    ) -> Result<Self> {
        if image_size.is_empty() {
            return Err(Error::InvalidModel(format!(
                "image must have at least one pixel but is {} x {}",
                image_size.rows, image_size.cols
            )));
        }

        if !look_angles.covers(image_size.cols) {
            let (min, max) = look_angles.col_range();
            return Err(Error::InvalidModel(format!(
                "look angles cover columns [{min}, {max}] but the image has {} columns",
                image_size.cols
            )));
        }

        debug!(
            rows = image_size.rows,
            cols = image_size.cols,
            first_line_time = time.time_at_line(0.0),
            line_period = time.rate(),
            "built linescan camera"
        );

        Ok(Self {
            time,
            trajectory,
            look_angles,
            boresight_rotation: boresight.rotation(),
            boresight,
            image_size,
            correct_velocity_aberration: false,
        })
    }

    /// Enables the first order velocity aberration correction of ray
    /// directions. Positions and velocities must then be in meters.
    pub fn with_velocity_aberration(mut self, correct: bool) -> Self {
        self.correct_velocity_aberration = correct;
        self
    }

    pub fn time_model(&self) -> &TimeModel {
        &self.time
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn look_angles(&self) -> &LookAngleTable {
        &self.look_angles
    }

    pub fn boresight(&self) -> &BoresightOffsets {
        &self.boresight
    }

    pub fn corrects_velocity_aberration(&self) -> bool {
        self.correct_velocity_aberration
    }

    /// Unit look vector of column `col` in the sensor frame.
    pub fn local_pixel_vector(&self, col: f64) -> Result<Vector3<f64>> {
        Ok(local_look_vector(&self.look_angles.local_angles(col)?))
    }
}

impl CameraModel for LinescanCamera {
    fn image_size(&self) -> ImageSize {
        self.image_size
    }

    fn camera_center(&self, time: f64) -> Result<Vector3<f64>> {
        self.trajectory.position_at_time(time)
    }

    fn camera_velocity(&self, time: f64) -> Result<Vector3<f64>> {
        self.trajectory.velocity_at_time(time)
    }

    fn camera_pose(&self, time: f64) -> Result<UnitQuaternion<f64>> {
        self.trajectory.pose_at_time(time)
    }

    fn time_at_line(&self, line: f64) -> f64 {
        self.time.time_at_line(line)
    }

    fn pixel_to_ray(&self, pixel: Pixel) -> Result<Ray> {
        self.image_size.check(pixel)?;

        let time = self.time_at_line(pixel.row);
        let position = self.camera_center(time)?;
        let velocity = self.camera_velocity(time)?;
        let pose = self.camera_pose(time)?;
        let local = self.local_pixel_vector(pixel.col)?;

        let orbital_to_world =
            orbital_frame(&position, &velocity)? * pose.to_rotation_matrix().into_inner();
        let mut direction = orbital_to_world * (self.boresight_rotation * local);

        if self.correct_velocity_aberration {
            direction = direction.normalize() - velocity / SPEED_OF_LIGHT;
        }

        Ok(Ray::new(position, direction))
    }
}

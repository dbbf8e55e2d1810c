//! JSON descriptions of camera models.
//!
//! A description is tagged with the sensor family in its `"type"` field:
//!
//! ```json
//! {
//!   "type": "linescan",
//!   "image_size": { "rows": 12000, "cols": 1000 },
//!   "time": { "t0": 0.0, "rate": 0.00075 },
//!   "ephemeris": [{ "time": 0.0, "position": [7.0e6, 0.0, 0.0], "velocity": [0.0, 7.5e3, 0.0] }],
//!   "attitude": [{ "time": 0.0, "orientation": [0.0, 0.0, 0.0, 1.0] }],
//!   "look_angles": [{ "col": 0, "angles": [-0.05, 0.0] }],
//!   "boresight": { "yaw": 0.0, "pitch": 0.0, "roll": 0.0 },
//!   "interpolation": { "lagrange_order": 8, "extrapolation": "reject" }
//! }
//! ```
//!
//! Vectors are `[x, y, z]` and quaternions `[x, y, z, w]`. Look angles are in
//! radians, boresight offsets in degrees.

use crate::{
    camera::{Camera, LinescanCamera, MetricLensDistortion, PinholeCamera, PinholeIntrinsics},
    error::{Error, Result},
    frame::BoresightDegrees,
    interp::{DEFAULT_LAGRANGE_ORDER, ExtrapolationPolicy},
    look::{LookAngleEntry, LookAngleTable},
    ray::ImageSize,
    state::{AttitudeSample, EphemerisSample, Trajectory},
    time::{TimeModel, TimeSample},
};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A camera model of either sensor family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraConfig {
    Linescan(LinescanConfig),
    Pinhole(PinholeConfig),
}

impl CameraConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidModel(format!("malformed camera description: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::InvalidModel(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Validates the description and builds the camera it describes.
    pub fn build(&self) -> Result<Camera> {
        match self {
            CameraConfig::Linescan(config) => config.build().map(Camera::from),
            CameraConfig::Pinhole(config) => config.build().map(Camera::from),
        }
    }
}

/// Either the linear time relation itself or samples to fit it to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeConfig {
    Linear { t0: f64, rate: f64 },
    Samples { samples: Vec<TimeSample> },
}

impl TimeConfig {
    pub fn build(&self) -> Result<TimeModel> {
        match self {
            TimeConfig::Linear { t0, rate } => TimeModel::new(*t0, *rate),
            TimeConfig::Samples { samples } => TimeModel::fit(samples),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    #[serde(default = "default_lagrange_order")]
    pub lagrange_order: usize,

    #[serde(default)]
    pub extrapolation: ExtrapolationPolicy,
}

fn default_lagrange_order() -> usize {
    DEFAULT_LAGRANGE_ORDER
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            lagrange_order: DEFAULT_LAGRANGE_ORDER,
            extrapolation: ExtrapolationPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinescanConfig {
    pub image_size: ImageSize,
    pub time: TimeConfig,
    pub ephemeris: Vec<EphemerisSample>,
    pub attitude: Vec<AttitudeSample>,
    pub look_angles: Vec<LookAngleEntry>,

    #[serde(default)]
    pub boresight: BoresightDegrees,

    #[serde(default)]
    pub interpolation: InterpolationConfig,

    #[serde(default)]
    pub correct_velocity_aberration: bool,
}

impl LinescanConfig {
    pub fn build(&self) -> Result<LinescanCamera> {
        let trajectory = Trajectory::new(
            &self.ephemeris,
            &self.attitude,
            self.interpolation.lagrange_order,
            self.interpolation.extrapolation,
        )?;

        Ok(LinescanCamera::new(
            self.time.build()?,
            trajectory,
            LookAngleTable::new(self.look_angles.clone())?,
            self.boresight.into(),
            self.image_size,
        )?
        .with_velocity_aberration(self.correct_velocity_aberration))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeConfig {
    pub image_size: ImageSize,

    /// Exposure time.
    pub time: f64,
    pub center: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub pose: UnitQuaternion<f64>,
    pub intrinsics: PinholeIntrinsics,
    pub distortion: Option<MetricLensDistortion>,
}

impl PinholeConfig {
    pub fn build(&self) -> Result<PinholeCamera> {
        let camera = PinholeCamera::new(
            self.time,
            self.center,
            self.velocity,
            self.pose,
            self.intrinsics,
            self.image_size,
        )?;

        match self.distortion {
            Some(distortion) => camera.with_distortion(distortion),
            None => Ok(camera),
        }
    }
}

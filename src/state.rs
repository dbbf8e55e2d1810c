use crate::{
    error::Result,
    frame::look_quaternion,
    interp::{ExtrapolationPolicy, LagrangianInterpolation, SlerpPoseInterpolation},
};
use nalgebra::{UnitQuaternion, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;
use uom::si::f64::Angle;

/// Satellite position and velocity at one instant, in a planet fixed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EphemerisSample {
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl EphemerisSample {
    pub fn new(time: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            time,
            position,
            velocity,
        }
    }
}

/// Sensor attitude at one instant, rotating sensor vectors into the orbital
/// frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttitudeSample {
    pub time: f64,
    pub orientation: UnitQuaternion<f64>,
}

impl AttitudeSample {
    pub fn new(time: f64, orientation: UnitQuaternion<f64>) -> Self {
        Self { time, orientation }
    }

    /// Attitude given as yaw, pitch and roll angles about the orbital frame.
    pub fn from_yaw_pitch_roll(time: f64, yaw: Angle, pitch: Angle, roll: Angle) -> Self {
        Self::new(time, look_quaternion(yaw, pitch, roll))
    }
}

/// Position, velocity and attitude of a body at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub pose: UnitQuaternion<f64>,
}

/// Source of body states, such as a loaded navigation kernel database.
///
/// Loaders depend on an injected service instead of process wide state. A
/// built camera model holds no reference to one.
pub trait BodyStateService {
    fn body_state(&self, time: f64) -> Result<BodyState>;
}

/// Interpolated ephemeris and attitude of a satellite.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    position: LagrangianInterpolation,
    velocity: LagrangianInterpolation,
    pose: SlerpPoseInterpolation,
}

impl Trajectory {
    /// Builds the position and velocity interpolators from `ephemeris` and the
    /// pose interpolator from `attitude`.
    pub fn new(
        ephemeris: &[EphemerisSample],
        attitude: &[AttitudeSample],
        lagrange_order: usize,
        policy: ExtrapolationPolicy,
    ) -> Result<Self> {
        let times: Vec<f64> = ephemeris.iter().map(|s| s.time).collect();
        let position = LagrangianInterpolation::new(
            times.clone(),
            ephemeris.iter().map(|s| s.position).collect(),
            lagrange_order,
            policy,
        )?;
        let velocity = LagrangianInterpolation::new(
            times,
            ephemeris.iter().map(|s| s.velocity).collect(),
            lagrange_order,
            policy,
        )?;
        let pose = SlerpPoseInterpolation::new(
            attitude.iter().map(|s| s.time).collect(),
            attitude.iter().map(|s| s.orientation).collect(),
            policy,
        )?;

        debug!(
            ephemeris = ephemeris.len(),
            attitude = attitude.len(),
            ephemeris_span = ?position.time_range(),
            attitude_span = ?pose.time_range(),
            "built trajectory"
        );

        Ok(Self {
            position,
            velocity,
            pose,
        })
    }

    pub fn position_at_time(&self, time: f64) -> Result<Vector3<f64>> {
        self.position.at(time)
    }

    pub fn velocity_at_time(&self, time: f64) -> Result<Vector3<f64>> {
        self.velocity.at(time)
    }

    pub fn pose_at_time(&self, time: f64) -> Result<UnitQuaternion<f64>> {
        self.pose.at(time)
    }
}

impl BodyStateService for Trajectory {
    fn body_state(&self, time: f64) -> Result<BodyState> {
        Ok(BodyState {
            position: self.position_at_time(time)?,
            velocity: self.velocity_at_time(time)?,
            pose: self.pose_at_time(time)?,
        })
    }
}

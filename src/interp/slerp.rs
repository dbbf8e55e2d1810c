use super::{ExtrapolationPolicy, validate_times};
use crate::error::{Error, Result};
use nalgebra::{Quaternion, UnitQuaternion};

/// Above this cosine the two endpoints are treated as the same rotation and
/// blended linearly.
const NLERP_THRESHOLD: f64 = 1.0 - 1e-12;

/// Samples further than this from unit norm are renormalized.
const UNIT_TOLERANCE: f64 = 1e-12;

/// Spherical linear interpolation between the two attitude samples bracketing
/// a query time.
#[derive(Clone, Debug, PartialEq)]
pub struct SlerpPoseInterpolation {
    times: Vec<f64>,
    poses: Vec<UnitQuaternion<f64>>,
    policy: ExtrapolationPolicy,
}

impl SlerpPoseInterpolation {
    pub fn new(
        times: Vec<f64>,
        poses: Vec<UnitQuaternion<f64>>,
        policy: ExtrapolationPolicy,
    ) -> Result<Self> {
        validate_times("attitude", &times)?;

        if times.len() != poses.len() {
            return Err(Error::InvalidModel(format!(
                "got {} attitude times but {} poses",
                times.len(),
                poses.len()
            )));
        }

        if poses
            .iter()
            .any(|q| !(q.coords.iter().all(|c| c.is_finite()) && q.norm() > 0.0))
        {
            return Err(Error::InvalidModel(
                "attitude quaternions must be finite and non-zero".into(),
            ));
        }

        // Deserialized quaternions are not guaranteed to be unit length.
        let poses = poses
            .into_iter()
            .map(|q| match (q.norm() - 1.0).abs() > UNIT_TOLERANCE {
                true => UnitQuaternion::new_normalize(q.into_inner()),
                false => q,
            })
            .collect();

        Ok(Self {
            times,
            poses,
            policy,
        })
    }

    pub fn time_range(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    pub fn policy(&self) -> ExtrapolationPolicy {
        self.policy
    }

    /// Evaluates the attitude at `time`.
    pub fn at(&self, time: f64) -> Result<UnitQuaternion<f64>> {
        let (first, last) = self.time_range();
        let time = self.policy.resolve(time, first, last)?;

        let upper = self.times.partition_point(|&t| t <= time);
        if upper > 0 && self.times[upper - 1] == time {
            return Ok(self.poses[upper - 1]);
        }

        // Past either end the edge pair is extended.
        let i = upper.clamp(1, self.times.len() - 1) - 1;
        let u = (time - self.times[i]) / (self.times[i + 1] - self.times[i]);

        Ok(slerp(&self.poses[i], &self.poses[i + 1], u))
    }
}

/// Interpolates from `from` (at `u = 0`) to `to` (at `u = 1`) along the
/// shorter arc.
pub fn slerp(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, u: f64) -> UnitQuaternion<f64> {
    let a: Quaternion<f64> = *from.quaternion();
    let mut b: Quaternion<f64> = *to.quaternion();

    // q and -q are the same rotation; pick the sign that keeps the arc short.
    let mut cos = a.coords.dot(&b.coords);
    if cos < 0.0 {
        b = -b;
        cos = -cos;
    }

    if cos > NLERP_THRESHOLD {
        return UnitQuaternion::new_normalize(a * (1.0 - u) + b * u);
    }

    let theta = cos.acos();
    let sin = theta.sin();
    let wa = ((1.0 - u) * theta).sin() / sin;
    let wb = (u * theta).sin() / sin;

    UnitQuaternion::new_normalize(a * wa + b * wb)
}

//! Reference frames relating the sensor to the satellite orbit.
//!
//! Three frames are involved:
//!
//! ```text
//! O1  sensor (navigation) frame, in which the look angles are calibrated
//! O2  local orbital frame, built from position and velocity
//! W   planet fixed frame the ephemeris is expressed in
//! ```
//!
//! The look angles are stated in an auxiliary frame with `Xa = -X1`,
//! `Ya = -Y1` and `Za = Z1`. A look vector in that frame is flipped into O1,
//! rotated into O2 by `Mp * Mr * My` and into W by `[X2 | Y2 | Z2]`.

use crate::error::{Error, Result};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector2, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{angle::radian, f64::Angle};

/// Relative tolerance below which a vector or cross product is treated as zero.
pub const FRAME_TOLERANCE: f64 = 1e-12;

/// Builds the local orbital frame `[X2 | Y2 | Z2]` at `position` moving with
/// `velocity`.
///
/// - `Z2` points from the body center through the satellite.
/// - `X2` is `velocity x Z2`, normal to the orbital plane.
/// - `Y2` is `Z2 x X2`, close to but not exactly along the velocity.
pub fn orbital_frame(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Result<Matrix3<f64>> {
    let z2 = position
        .try_normalize(0.0)
        .filter(|_| position.iter().all(|c| c.is_finite()))
        .ok_or_else(|| {
            Error::DegenerateGeometry(format!("position {position:?} has no direction"))
        })?;

    let speed = velocity.norm();
    if !(speed.is_finite() && speed > 0.0) {
        return Err(Error::DegenerateGeometry(format!(
            "velocity {velocity:?} has no direction"
        )));
    }

    let normal = velocity.cross(&z2);
    if normal.norm() <= FRAME_TOLERANCE * speed {
        return Err(Error::DegenerateGeometry(
            "velocity is parallel to position".into(),
        ));
    }

    let x2 = normal.normalize();
    let y2 = z2.cross(&x2);

    Ok(Matrix3::from_columns(&[x2, y2, z2]))
}

/// Returns `Mp * Mr * My`, rotating an O1 look vector into the orbital frame.
///
/// ```text
/// Mp = [1,  0,     0    ]   Mr = [cr, 0, -sr]   My = [cy, -sy, 0]
///      [0,  cp,    sp   ]        [0,  1,  0 ]        [sy,  cy, 0]
///      [0, -sp,    cp   ]        [sr, 0,  cr]        [0,   0,  1]
/// ```
pub fn look_rotation(yaw: Angle, pitch: Angle, roll: Angle) -> Matrix3<f64> {
    let (sy, cy) = yaw.get::<radian>().sin_cos();
    let (sp, cp) = pitch.get::<radian>().sin_cos();
    let (sr, cr) = roll.get::<radian>().sin_cos();

    #[rustfmt::skip]
    let mp = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0,  cp,  sp,
        0.0, -sp,  cp,
    );
    #[rustfmt::skip]
    let mr = Matrix3::new(
         cr, 0.0, -sr,
        0.0, 1.0, 0.0,
         sr, 0.0,  cr,
    );
    #[rustfmt::skip]
    let my = Matrix3::new(
         cy, -sy, 0.0,
         sy,  cy, 0.0,
        0.0, 0.0, 1.0,
    );

    mp * mr * my
}

/// Unit look vector in O1 for the view angles `(phi_x, phi_y)`.
///
/// The angles give the tangent of the look vector's tilt along each axis of
/// the auxiliary frame, with the nadir at `-Za`. X and Y are then negated to
/// move into O1.
pub fn local_look_vector(angles: &Vector2<f64>) -> Vector3<f64> {
    let auxiliary = Vector3::new(angles.x.tan(), angles.y.tan(), -1.0).normalize();
    Vector3::new(-auxiliary.x, -auxiliary.y, auxiliary.z)
}

/// Fixed misalignment of the sensor with respect to the nominal orbital frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoresightOffsets {
    pub yaw: Angle,
    pub pitch: Angle,
    pub roll: Angle,
}

impl BoresightOffsets {
    pub fn new(yaw: Angle, pitch: Angle, roll: Angle) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn zero() -> Self {
        let zero = Angle::new::<radian>(0.0);
        Self::new(zero, zero, zero)
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        look_rotation(self.yaw, self.pitch, self.roll)
    }
}

impl Default for BoresightOffsets {
    fn default() -> Self {
        Self::zero()
    }
}

/// Quaternion form of [`look_rotation`].
pub fn look_quaternion(yaw: Angle, pitch: Angle, roll: Angle) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(look_rotation(
        yaw, pitch, roll,
    )))
}

/// Boresight offsets in degrees as they appear in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoresightDegrees {
    #[cfg_attr(feature = "serde", serde(default))]
    pub yaw: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pitch: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub roll: f64,
}

impl From<BoresightDegrees> for BoresightOffsets {
    fn from(deg: BoresightDegrees) -> Self {
        use uom::si::angle::degree;
        Self::new(
            Angle::new::<degree>(deg.yaw),
            Angle::new::<degree>(deg.pitch),
            Angle::new::<degree>(deg.roll),
        )
    }
}

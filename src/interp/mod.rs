//! Time indexed interpolation of ephemeris and attitude samples.

mod lagrange;
mod slerp;

use crate::error::{Error, Result};
pub use lagrange::{DEFAULT_LAGRANGE_ORDER, LagrangianInterpolation};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
pub use slerp::{SlerpPoseInterpolation, slerp};
use tracing::warn;

/// How an interpolator answers queries outside its sampled time range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExtrapolationPolicy {
    /// Fail with `OutOfRange` for any time outside the samples.
    #[default]
    Reject,

    /// Evaluate at the nearest end of the sampled range.
    Clamp,

    /// Evaluate the edge interpolant up to `margin` seconds past either end.
    Extrapolate { margin: f64 },
}

impl ExtrapolationPolicy {
    /// Resolves `time` against the sampled range `[first, last]`, returning the
    /// time the interpolant should be evaluated at.
    pub(crate) fn resolve(&self, time: f64, first: f64, last: f64) -> Result<f64> {
        if !time.is_finite() {
            return Err(Error::out_of_range("time", time, first, last));
        }

        if (first..=last).contains(&time) {
            return Ok(time);
        }

        match *self {
            ExtrapolationPolicy::Reject => Err(Error::out_of_range("time", time, first, last)),
            ExtrapolationPolicy::Clamp => {
                warn!(time, first, last, "clamping time to the sampled range");
                Ok(time.clamp(first, last))
            }
            ExtrapolationPolicy::Extrapolate { margin } => {
                let (min, max) = (first - margin, last + margin);
                if (min..=max).contains(&time) {
                    warn!(time, first, last, "extrapolating past the sampled range");
                    Ok(time)
                } else {
                    Err(Error::out_of_range("time", time, min, max))
                }
            }
        }
    }
}

/// Checks that `times` has at least two entries, all finite and strictly
/// increasing.
pub(crate) fn validate_times(what: &str, times: &[f64]) -> Result<()> {
    if times.len() < 2 {
        return Err(Error::InvalidModel(format!(
            "need at least 2 {what} samples, got {}",
            times.len()
        )));
    }

    if let Some(t) = times.iter().find(|t| !t.is_finite()) {
        return Err(Error::InvalidModel(format!(
            "{what} sample time must be finite but got: {t}"
        )));
    }

    if let Some(pair) = times.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(Error::InvalidModel(format!(
            "{what} sample times must be strictly increasing but {} follows {}",
            pair[1], pair[0]
        )));
    }

    Ok(())
}

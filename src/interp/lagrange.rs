use super::{ExtrapolationPolicy, validate_times};
use crate::error::{Error, Result};
use nalgebra::Vector3;

/// Number of samples each Lagrange polynomial is fit through.
pub const DEFAULT_LAGRANGE_ORDER: usize = 8;

/// Polynomial interpolation of a vector quantity over time tagged samples.
///
/// Each query fits a Lagrange polynomial through the `order` samples nearest
/// to the query time. Queries at a sample time return that sample exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct LagrangianInterpolation {
    times: Vec<f64>,
    values: Vec<Vector3<f64>>,
    order: usize,
    policy: ExtrapolationPolicy,
}

impl LagrangianInterpolation {
    pub fn new(
        times: Vec<f64>,
        values: Vec<Vector3<f64>>,
        order: usize,
        policy: ExtrapolationPolicy,
    ) -> Result<Self> {
        validate_times("ephemeris", &times)?;

        if times.len() != values.len() {
            return Err(Error::InvalidModel(format!(
                "got {} ephemeris times but {} values",
                times.len(),
                values.len()
            )));
        }

        if values.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidModel("ephemeris values must be finite".into()));
        }

        if order < 2 {
            return Err(Error::InvalidModel(format!(
                "lagrange order must be at least 2 but got: {order}"
            )));
        }

        Ok(Self {
            times,
            values,
            order,
            policy,
        })
    }

    /// First and last sample time.
    pub fn time_range(&self) -> (f64, f64) {
        // Construction guarantees at least two samples.
        (self.times[0], self.times[self.times.len() - 1])
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn policy(&self) -> ExtrapolationPolicy {
        self.policy
    }

    /// Evaluates the interpolant at `time`.
    pub fn at(&self, time: f64) -> Result<Vector3<f64>> {
        let (first, last) = self.time_range();
        let time = self.policy.resolve(time, first, last)?;

        // Index of the first sample strictly after `time`.
        let upper = self.times.partition_point(|&t| t <= time);
        if upper > 0 && self.times[upper - 1] == time {
            return Ok(self.values[upper - 1]);
        }

        let window = self.order.min(self.times.len());
        let start = upper
            .saturating_sub(window / 2)
            .min(self.times.len() - window);
        let times = &self.times[start..start + window];
        let values = &self.values[start..start + window];

        Ok(times
            .iter()
            .zip(values)
            .enumerate()
            .map(|(j, (&tj, vj))| {
                let basis = times
                    .iter()
                    .enumerate()
                    .filter(|&(m, _)| m != j)
                    .map(|(_, &tm)| (time - tm) / (tj - tm))
                    .product::<f64>();
                vj * basis
            })
            .sum())
    }
}

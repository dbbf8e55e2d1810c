use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A measured acquisition time for an image line.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSample {
    pub line: f64,
    pub time: f64,
}

impl TimeSample {
    pub fn new(line: f64, time: f64) -> Self {
        Self { line, time }
    }
}

/// Maps image lines to acquisition times with `time = t0 + rate * line`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeModel {
    t0: f64,

    /// Seconds per line.
    rate: f64,
}

impl TimeModel {
    /// Creates a `TimeModel` from the time of line zero and the line period.
    ///
    /// Returns `InvalidModel` if `rate` is not a positive finite number.
    pub fn new(t0: f64, rate: f64) -> Result<Self> {
        if !t0.is_finite() {
            return Err(Error::InvalidModel(format!(
                "time of line zero must be finite but got: {t0}"
            )));
        }

        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::InvalidModel(format!(
                "line period must be positive but got: {rate}"
            )));
        }

        Ok(Self { t0, rate })
    }

    /// Fits the linear relation to `samples` by least squares.
    ///
    /// Requires at least two samples, strictly increasing in both line and
    /// time. Exactly linear samples are reproduced to floating point
    /// precision.
    pub fn fit(samples: &[TimeSample]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(Error::InvalidModel(format!(
                "need at least 2 time samples, got {}",
                samples.len()
            )));
        }

        if samples
            .iter()
            .any(|s| !s.line.is_finite() || !s.time.is_finite())
        {
            return Err(Error::InvalidModel("time samples must be finite".into()));
        }

        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[1].line <= pair[0].line || pair[1].time <= pair[0].time)
        {
            return Err(Error::InvalidModel(format!(
                "time samples must increase in line and time but {:?} follows {:?}",
                pair[1], pair[0]
            )));
        }

        let n = samples.len() as f64;
        let mean_line = samples.iter().map(|s| s.line).sum::<f64>() / n;
        let mean_time = samples.iter().map(|s| s.time).sum::<f64>() / n;

        let (sxy, sxx) = samples.iter().fold((0.0, 0.0), |(sxy, sxx), s| {
            let dl = s.line - mean_line;
            (sxy + dl * (s.time - mean_time), sxx + dl * dl)
        });

        let rate = sxy / sxx;
        Self::new(mean_time - rate * mean_line, rate)
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn time_at_line(&self, line: f64) -> f64 {
        self.t0 + self.rate * line
    }

    /// Inverse of [`TimeModel::time_at_line`].
    pub fn line_at_time(&self, time: f64) -> f64 {
        (time - self.t0) / self.rate
    }

    /// Returns the UTC instant `line` was acquired, where the model's time axis
    /// counts seconds from `epoch`.
    ///
    /// Returns `None` if the instant is not representable.
    pub fn datetime_at_line(&self, line: f64, epoch: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let nanos = self.time_at_line(line) * 1e9;
        if !nanos.is_finite() || nanos.abs() > i64::MAX as f64 {
            return None;
        }

        epoch.checked_add_signed(TimeDelta::nanoseconds(nanos.round() as i64))
    }
}

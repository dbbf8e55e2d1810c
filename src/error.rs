use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while building or evaluating a camera model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Construction data is malformed or insufficient.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A query falls outside the supported interpolation domain.
    #[error(
        "{quantity} {value} is outside the supported range [{min}, {max}{}",
        closing_bracket(.max_inclusive)
    )]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,

        /// Whether `max` itself is inside the range.
        max_inclusive: bool,
    },

    /// Position and velocity do not define an orbital frame.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

fn closing_bracket(max_inclusive: &bool) -> char {
    if *max_inclusive { ']' } else { ')' }
}

impl Error {
    /// `value` is outside `[min, max]`.
    pub(crate) fn out_of_range(quantity: &'static str, value: f64, min: f64, max: f64) -> Self {
        Error::OutOfRange {
            quantity,
            value,
            min,
            max,
            max_inclusive: true,
        }
    }

    /// `value` is outside `[min, max)`.
    pub(crate) fn out_of_bounds(quantity: &'static str, value: f64, min: f64, max: f64) -> Self {
        Error::OutOfRange {
            quantity,
            value,
            min,
            max,
            max_inclusive: false,
        }
    }
}

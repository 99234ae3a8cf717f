use std::sync::Arc;

use crate::error::{ConfigurationError, Result};
use crate::grain::{Grainer, Strength};

/// Parameters of one luma band
#[derive(Debug, Clone)]
pub struct Band {
    /// Luma value, in the frame's working range, at the center of the transition
    pub threshold: f32,
    pub strength: Strength,
    /// Downsampling divisor of the grain layer
    pub size: f32,
    /// Up-sampling sharpness; 50 is Catmull-Rom
    pub sharp: f32,
    /// Half-width of the transition zone as a fraction of the peak value
    pub overflow: f32,
    pub grainer: Arc<dyn Grainer>,
}

/// A per-band parameter given as nothing, one value, or a list
///
/// Lists shorter than the band count repeat their last element; longer lists
/// are cut to the band count.
#[derive(Debug, Clone)]
pub enum PerBand<T> {
    Unset,
    All(T),
    Each(Vec<T>),
}

impl<T> Default for PerBand<T> {
    fn default() -> Self {
        PerBand::Unset
    }
}

impl<T> From<T> for PerBand<T> {
    fn from(value: T) -> Self {
        PerBand::All(value)
    }
}

impl<T: Clone> PerBand<T> {
    /// Build from a list, keeping the list semantics
    pub fn each<I: IntoIterator<Item = T>>(values: I) -> Self {
        PerBand::Each(values.into_iter().collect())
    }

    /// Expand to exactly `len` values
    pub fn fill<D>(self, len: usize, parameter: &str, default: D) -> Result<Vec<T>>
    where
        D: FnOnce() -> T,
    {
        match self {
            PerBand::Unset => Ok(vec![default(); len]),
            PerBand::All(value) => Ok(vec![value; len]),
            PerBand::Each(mut values) => {
                let last = values.last().cloned().ok_or_else(|| ConfigurationError::EmptyParameterList {
                    parameter: parameter.to_string(),
                })?;
                values.truncate(len);
                values.resize(len, last);
                Ok(values)
            }
        }
    }
}

/// Default overflow: the luma range shared evenly between bands
pub fn default_overflow(bands: usize) -> f32 {
    1.0 / bands as f32
}

pub(crate) fn check_band(index: usize, size: f32, overflow: f32) -> Result<()> {
    if !size.is_finite() || size <= 0.0 {
        return Err(ConfigurationError::InvalidParameter {
            parameter: format!("sizes[{}]", index),
            value: size.to_string(),
        }
        .into());
    }
    if !overflow.is_finite() || overflow < 0.0 {
        return Err(ConfigurationError::InvalidParameter {
            parameter: format!("overflows[{}]", index),
            value: overflow.to_string(),
        }
        .into());
    }
    Ok(())
}

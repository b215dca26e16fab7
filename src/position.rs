//! Policies choosing where in a field value an error is injected.

use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};

use crate::constants::position::GAUSSIAN_STD_DEV;
use crate::errors::GeneratorError;

/// Chooses the character position an error is applied at.
///
/// `direction` widens (or narrows) the admissible range: for a value of
/// length `L` the returned position lies in `[0, L - 1 + direction]`.
/// Insertion passes `+1`, so one-past-the-end is a valid position.
/// Returns `None` when the value cannot be modified (it is empty).
pub trait PositionPolicy: Send + Sync {
    /// Position in `value`, or `None` for an empty value.
    fn error_position(&self, value: &str, direction: isize, rng: &mut dyn RngCore)
    -> Option<usize>;
}

fn max_position(len: usize, direction: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    usize::try_from(len as isize - 1 + direction).ok()
}

/// Normal distribution centred just past the middle of the value, rounded and clamped.
#[derive(Clone, Copy, Debug)]
pub struct GaussianPosition {
    std_dev: f64,
}

impl GaussianPosition {
    /// Policy with the given spread; `std_dev` must be finite and non-negative.
    pub fn new(std_dev: f64) -> Result<Self, GeneratorError> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(GeneratorError::Configuration(format!(
                "position std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        Ok(Self { std_dev })
    }
}

impl Default for GaussianPosition {
    fn default() -> Self {
        Self {
            std_dev: GAUSSIAN_STD_DEV,
        }
    }
}

impl PositionPolicy for GaussianPosition {
    fn error_position(
        &self,
        value: &str,
        direction: isize,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let len = value.chars().count();
        let max = max_position(len, direction)?;
        let mid = ((len as isize + direction) / 2 + 1) as f64;
        let z: f64 = StandardNormal.sample(rng);
        let drawn = (mid + self.std_dev * z).round().max(0.0) as usize;
        Some(drawn.min(max))
    }
}

/// Every admissible position equally likely.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPosition;

impl PositionPolicy for UniformPosition {
    fn error_position(
        &self,
        value: &str,
        direction: isize,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let max = max_position(value.chars().count(), direction)?;
        Some(rng.random_range(0..=max))
    }
}

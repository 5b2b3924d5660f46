//! Uniform random fills for half-precision buffers.

use half::f16;
use hgemm_common::{F16_MAX, MatrixError};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};

/// Lower bound of the default fill range.
pub const DEFAULT_MIN: f32 = -2.0;
/// Upper bound (exclusive) of the default fill range.
pub const DEFAULT_MAX: f32 = 2.0;

/// Half-open range `[min, max)` for uniform fills.
///
/// `min == max` is accepted and produces a constant fill. Both bounds must
/// be representable as finite `f16`, i.e. within `[-65504, 65504]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: f32,
    max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Result<Self, MatrixError> {
        if !min.is_finite() || !max.is_finite() || min > max || !(max - min).is_finite() {
            return Err(MatrixError::InvalidRange { min, max });
        }
        if min.abs() > F16_MAX || max.abs() > F16_MAX {
            return Err(MatrixError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Degenerate range that fills every element with `value`.
    pub fn constant(value: f32) -> Result<Self, MatrixError> {
        Self::new(value, value)
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: DEFAULT_MIN, max: DEFAULT_MAX }
    }
}

/// Overwrite `dst` with independent draws from `range`, rounded to f16.
pub fn fill_uniform<R: Rng + ?Sized>(rng: &mut R, range: ValueRange, dst: &mut [f16]) {
    if range.is_degenerate() {
        dst.fill(f16::from_f32(range.min));
        return;
    }
    let uniform = Uniform::new(range.min, range.max);
    for v in dst.iter_mut() {
        *v = f16::from_f32(uniform.sample(rng));
    }
    log::debug!("filled {} elements from [{}, {})", dst.len(), range.min, range.max);
}

//! Element-wise divergence between two half-precision buffers.

use half::f16;
use hgemm_common::MatrixError;

/// Maximum and mean absolute difference between two buffers.
///
/// Differences are taken after widening both operands to `f64`, so f16
/// rounding of the subtraction cannot hide the true error. A NaN on either
/// side makes both statistics NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffStats {
    pub max_diff: f64,
    pub avg_diff: f64,
}

impl DiffStats {
    pub fn between(lhs: &[f16], rhs: &[f16]) -> Result<Self, MatrixError> {
        if lhs.len() != rhs.len() {
            return Err(MatrixError::ElementCountMismatch {
                expected: lhs.len(),
                actual: rhs.len(),
            });
        }
        if lhs.is_empty() {
            return Ok(Self::default());
        }

        let mut max_diff = 0.0f64;
        let mut sum = 0.0f64;
        for (a, b) in lhs.iter().zip(rhs) {
            let diff = (a.to_f64() - b.to_f64()).abs();
            if diff > max_diff || diff.is_nan() {
                max_diff = diff;
            }
            sum += diff;
        }

        Ok(Self { max_diff, avg_diff: sum / lhs.len() as f64 })
    }

    /// True when the largest difference does not exceed `tolerance`.
    pub fn within(&self, tolerance: f64) -> bool {
        self.max_diff <= tolerance
    }
}

impl std::fmt::Display for DiffStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "max diff: {:.6}, avg diff: {:.6}", self.max_diff, self.avg_diff)
    }
}

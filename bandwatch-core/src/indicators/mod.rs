//! Rolling-statistics band indicators.
//!
//! Indicators are pure functions: close series in, aligned band out. The
//! first `lookback()` values of every band series are `f64::NAN` (warmup).
//! The crossing detector only sees the resulting [`Band`], so any
//! implementation of [`BandIndicator`] can be swapped in.

pub mod bollinger;

pub use bollinger::Bollinger;

use serde::{Deserialize, Serialize};

/// Upper/middle/lower envelope aligned index-for-index with a close series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl Band {
    /// A band of `len` missing values.
    pub fn missing(len: usize) -> Self {
        Self {
            upper: vec![f64::NAN; len],
            middle: vec![f64::NAN; len],
            lower: vec![f64::NAN; len],
        }
    }

    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    /// Index of the first point where all three series are defined.
    pub fn first_valid(&self) -> Option<usize> {
        let n = self.upper.len().min(self.middle.len()).min(self.lower.len());
        (0..n).find(|&i| {
            !(self.upper[i].is_nan() || self.middle[i].is_nan() || self.lower[i].is_nan())
        })
    }

    /// The entries at `indices`, in that order. Out-of-range indices read
    /// as missing.
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |series: &[f64]| -> Vec<f64> {
            indices
                .iter()
                .map(|&i| series.get(i).copied().unwrap_or(f64::NAN))
                .collect()
        };
        Self {
            upper: pick(&self.upper),
            middle: pick(&self.middle),
            lower: pick(&self.lower),
        }
    }
}

/// Trait for band indicators.
///
/// # Look-ahead contamination guard
/// No band value at index t may depend on a close at t+1 or later.
pub trait BandIndicator: Send + Sync {
    /// Human-readable name (e.g., "bollinger_20_2").
    fn name(&self) -> &str;

    /// Number of points before the band produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the band for the entire close series.
    ///
    /// Every returned series has the same length as `closes`.
    fn compute(&self, closes: &[f64]) -> Band;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

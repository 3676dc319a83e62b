//! Search-space bounds for calibration parameters.
//!
//! Bounds are fixed for the run. Boundary policy is **clamp, never
//! reject**: a coordinate leaving `[min, max]` after a velocity step is
//! truncated to the bound. Rejection sampling would bias the search away
//! from boundary optima.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EnjambreError, Result};

/// Per-dimension `[min, max]` box constraints.
///
/// # Example
///
/// ```
/// use enjambre::SearchBounds;
///
/// let bounds = SearchBounds::continuous(2, -5.0, 5.0).unwrap();
/// assert_eq!(bounds.dimension(), 2);
/// assert_eq!(bounds.min(0), -5.0);
/// assert_eq!(bounds.max(1), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl SearchBounds {
    /// Create bounds with the same `[lo, hi]` interval in every dimension.
    pub fn continuous(dim: usize, lo: f64, hi: f64) -> Result<Self> {
        Self::from_intervals(vec![lo; dim], vec![hi; dim])
    }

    /// Create bounds from explicit per-dimension lower/upper vectors.
    pub fn from_intervals(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(EnjambreError::InvalidBounds {
                dim: lower.len().min(upper.len()),
                lower: f64::NAN,
                upper: f64::NAN,
            });
        }
        for (d, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(EnjambreError::InvalidBounds {
                    dim: d,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Number of dimensions.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Lower bound of dimension `dim`.
    #[must_use]
    pub fn min(&self, dim: usize) -> f64 {
        self.lower[dim]
    }

    /// Upper bound of dimension `dim`.
    #[must_use]
    pub fn max(&self, dim: usize) -> f64 {
        self.upper[dim]
    }

    /// Width of dimension `dim`. May be zero for pinned parameters.
    #[must_use]
    pub fn span(&self, dim: usize) -> f64 {
        self.upper[dim] - self.lower[dim]
    }

    /// Truncate every coordinate of `x` to its `[min, max]` interval.
    pub fn clamp(&self, x: &mut [f64]) {
        for (xi, (&lo, &hi)) in x.iter_mut().zip(self.lower.iter().zip(self.upper.iter())) {
            *xi = xi.clamp(lo, hi);
        }
    }

    /// Whether every coordinate of `x` lies within its interval.
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        x.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(xi, (&lo, &hi))| *xi >= lo && *xi <= hi)
    }

    /// Draw a uniformly random point inside the box.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<f64> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| if lo < hi { rng.gen_range(lo..=hi) } else { lo })
            .collect()
    }

    /// Map `x` into normalized `[0, 1]` coordinates. Zero-width dimensions
    /// map to 0.
    #[must_use]
    pub fn normalize(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(d, &xi)| {
                let span = self.span(d);
                if span > 0.0 {
                    (xi - self.lower[d]) / span
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Map normalized `[0, 1]` coordinates back to raw parameter space.
    #[must_use]
    pub fn denormalize(&self, u: &[f64]) -> Vec<f64> {
        u.iter()
            .enumerate()
            .map(|(d, &ui)| self.lower[d] + ui * self.span(d))
            .collect()
    }
}

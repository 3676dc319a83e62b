//! Multimodal benchmark landscapes for optimizer evaluation.
//!
//! All functions are **maximized**, matching the optimizer's fitness
//! orientation; classic minimization surfaces appear here inverted.
//! The selection follows the CEC 2013 niching competition style.
//!
//! Reference: Li et al. (2013) "Benchmark Functions for CEC'2013 Special
//! Session and Competition on Niching Methods for Multimodal Function
//! Optimization"

use std::f64::consts::PI;

/// Two equal Gaussian peaks at x = −2 and x = 2 (1-D).
///
/// Global maxima: f(±2) ≈ 1. Search domain: [-5, 5].
///
/// # Example
/// ```
/// use enjambre::benchmarks::twin_gaussians;
/// assert!(twin_gaussians(&[2.0]) > 0.99);
/// assert!(twin_gaussians(&[-2.0]) > 0.99);
/// assert!(twin_gaussians(&[0.0]) < 0.05);
/// ```
#[must_use]
pub fn twin_gaussians(x: &[f64]) -> f64 {
    let xi = x[0];
    (-(xi - 2.0) * (xi - 2.0)).exp() + (-(xi + 2.0) * (xi + 2.0)).exp()
}

/// Five equal maxima (1-D): sin⁵(5πx).
///
/// Global maxima: f = 1 at x ∈ {0.1, 0.3, 0.5, 0.7, 0.9}.
/// Search domain: [0, 1].
///
/// # Example
/// ```
/// use enjambre::benchmarks::equal_maxima;
/// assert!((equal_maxima(&[0.1]) - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn equal_maxima(x: &[f64]) -> f64 {
    (5.0 * PI * x[0]).sin().powi(5)
}

/// Inverted Rastrigin - multimodal, separable.
///
/// Global maximum: f(0, ..., 0) = 0, with a regular lattice of local
/// maxima roughly one unit apart. Search domain: [-5.12, 5.12]^D.
///
/// # Example
/// ```
/// use enjambre::benchmarks::inverted_rastrigin;
/// assert!(inverted_rastrigin(&[0.0, 0.0]).abs() < 1e-10);
/// assert!(inverted_rastrigin(&[0.5, 0.5]) < -10.0);
/// ```
#[must_use]
pub fn inverted_rastrigin(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    -(10.0 * n
        + x.iter()
            .map(|xi| xi * xi - 10.0 * (2.0 * PI * xi).cos())
            .sum::<f64>())
}

/// Inverted Himmelblau (2-D) - four equal global maxima.
///
/// Global maxima: f = 0 at (3, 2), (-2.805, 3.131), (-3.779, -3.283),
/// (3.584, -1.848). Search domain: [-6, 6]^2.
///
/// # Example
/// ```
/// use enjambre::benchmarks::inverted_himmelblau;
/// assert!(inverted_himmelblau(&[3.0, 2.0]).abs() < 1e-10);
/// ```
#[must_use]
pub fn inverted_himmelblau(x: &[f64]) -> f64 {
    let (a, b) = (x[0], x[1]);
    let t1 = a * a + b - 11.0;
    let t2 = a + b * b - 7.0;
    -(t1 * t1 + t2 * t2)
}

/// Uneven decreasing maxima (1-D): five peaks of decreasing height at
/// unevenly spaced positions.
///
/// Global maximum: f ≈ 1 near x = 0.08. Search domain: [0, 1].
#[must_use]
pub fn uneven_decreasing_maxima(x: &[f64]) -> f64 {
    let xi = x[0];
    let envelope = (-2.0 * ((xi - 0.08) / 0.854).powi(2) * std::f64::consts::LN_2).exp();
    let peaks = (5.0 * PI * (xi.powf(0.75) - 0.05)).sin().powi(6);
    envelope * peaks
}

/// Benchmark landscape metadata.
#[derive(Debug, Clone)]
pub struct BenchmarkInfo {
    /// Landscape name
    pub name: &'static str,
    /// Dimensionality (0 = any)
    pub dim: usize,
    /// Recommended search bounds [lower, upper]
    pub bounds: (f64, f64),
    /// Number of global maxima
    pub global_optima: usize,
    /// Global maximum value
    pub peak: f64,
}

/// Metadata for the full landscape set.
#[must_use]
pub fn all_benchmarks() -> Vec<BenchmarkInfo> {
    vec![
        BenchmarkInfo {
            name: "TwinGaussians",
            dim: 1,
            bounds: (-5.0, 5.0),
            global_optima: 2,
            peak: 1.0,
        },
        BenchmarkInfo {
            name: "EqualMaxima",
            dim: 1,
            bounds: (0.0, 1.0),
            global_optima: 5,
            peak: 1.0,
        },
        BenchmarkInfo {
            name: "InvertedRastrigin",
            dim: 0,
            bounds: (-5.12, 5.12),
            global_optima: 1,
            peak: 0.0,
        },
        BenchmarkInfo {
            name: "InvertedHimmelblau",
            dim: 2,
            bounds: (-6.0, 6.0),
            global_optima: 4,
            peak: 0.0,
        },
        BenchmarkInfo {
            name: "UnevenDecreasingMaxima",
            dim: 1,
            bounds: (0.0, 1.0),
            global_optima: 1,
            peak: 1.0,
        },
    ]
}

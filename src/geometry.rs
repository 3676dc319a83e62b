//! Distance metrics and sphere sampling shared by both optimizer variants.
//!
//! The niching variant measures raw Euclidean distance; the multi-swarm
//! variant uses a per-dimension-normalized Euclidean distance divided by
//! dimensionality so distances are comparable across problems with
//! differently scaled axes. Zero-width dimensions contribute nothing to the
//! normalized metric.

use rand::prelude::*;

use crate::bounds::SearchBounds;

/// Raw Euclidean distance between two points.
#[must_use]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

/// Normalized Euclidean distance divided by dimensionality.
///
/// Each axis is rescaled by its bound span before the norm is taken;
/// zero-width axes are skipped rather than divided through.
#[must_use]
pub fn normalized_distance(a: &[f64], b: &[f64], bounds: &SearchBounds) -> f64 {
    let dim = bounds.dimension();
    let sum: f64 = (0..dim)
        .map(|d| {
            let span = bounds.span(d);
            if span > 0.0 {
                let delta = (a[d] - b[d]) / span;
                delta * delta
            } else {
                0.0
            }
        })
        .sum();
    sum.sqrt() / dim as f64
}

/// Geometric midpoint of two points.
#[must_use]
pub fn midpoint(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(ai, bi)| 0.5 * (ai + bi)).collect()
}

/// Standard normal draw via Box–Muller.
///
/// `rand_distr` stays out of the dependency tree; two uniforms are enough.
fn gaussian(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Uniformly distributed direction on the unit sphere, Marsaglia-style:
/// normalized Gaussian coordinates, then a random sign flip per axis.
pub fn unit_sphere_vector(dim: usize, rng: &mut impl Rng) -> Vec<f64> {
    let mut v: Vec<f64> = (0..dim).map(|_| gaussian(rng)).collect();
    let norm = v.iter().map(|vi| vi * vi).sum::<f64>().sqrt();
    if norm > 0.0 {
        for vi in &mut v {
            *vi /= norm;
        }
    } else {
        // Degenerate draw: fall back to an axis direction.
        v[0] = 1.0;
    }
    for vi in &mut v {
        if rng.gen::<bool>() {
            *vi = -*vi;
        }
    }
    v
}

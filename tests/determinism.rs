//! Seeded runs must be bit-for-bit reproducible: all member and index
//! mutation happens strictly between generations, driven by one RNG.

use enjambre::benchmarks::{inverted_himmelblau, twin_gaussians};
use enjambre::prelude::*;

fn run_niche(seed: u64) -> MultimodalResult {
    let bounds = SearchBounds::continuous(2, -6.0, 6.0).unwrap();
    let mut opt = NichePso::new(NichePsoConfig::default(), bounds, 24)
        .unwrap()
        .with_seed(seed);
    let mut ctx = EvalContext::new(EvalBudget::new(400));
    let mut oracle = |x: &[f64]| inverted_himmelblau(x);
    opt.run(&mut oracle, &mut ctx).unwrap()
}

fn run_nmmso(seed: u64) -> MultimodalResult {
    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let config = NmmsoConfig {
        n: 5,
        max_inc: 4,
        ..Default::default()
    };
    let mut opt = Nmmso::new(config, bounds, 60).unwrap().with_seed(seed);
    let mut ctx = EvalContext::new(EvalBudget::new(400));
    let mut oracle = |x: &[f64]| twin_gaussians(x);
    opt.run(&mut oracle, &mut ctx).unwrap()
}

#[test]
fn niche_pso_is_deterministic_for_a_fixed_seed() {
    let a = run_niche(1234);
    let b = run_niche(1234);
    assert_eq!(a.best.position, b.best.position);
    assert_eq!(a.best.fitness, b.best.fitness);
    assert_eq!(a.evaluations, b.evaluations);
    assert_eq!(a.generations, b.generations);
    assert_eq!(a.history, b.history);
    assert_eq!(a.modes.len(), b.modes.len());
    for (ma, mb) in a.modes.iter().zip(b.modes.iter()) {
        assert_eq!(ma.position, mb.position);
        assert_eq!(ma.fitness, mb.fitness);
    }
}

#[test]
fn nmmso_is_deterministic_for_a_fixed_seed() {
    let a = run_nmmso(5678);
    let b = run_nmmso(5678);
    assert_eq!(a.best.position, b.best.position);
    assert_eq!(a.evaluations, b.evaluations);
    assert_eq!(a.history, b.history);
    assert_eq!(a.modes.len(), b.modes.len());
    for (ma, mb) in a.modes.iter().zip(b.modes.iter()) {
        assert_eq!(ma.position, mb.position);
    }
}

#[test]
fn different_seeds_explore_differently() {
    let a = run_nmmso(1);
    let b = run_nmmso(2);
    // Same budget, different trajectories.
    assert!(a.best.position != b.best.position || a.history != b.history);
}

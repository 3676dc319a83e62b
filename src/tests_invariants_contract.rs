// =========================================================================
// Contract tests: the optimizer state machine's testable properties.
//
//   C1 partition    - every slot in exactly one of {free pool, one swarm}
//   C2 capacity     - multi-swarm member count never exceeds n × dimension
//   C3 monotonicity - global-best fitness is non-decreasing
//   C4 containment  - every coordinate stays inside [min, max]
//   C5 budget       - real oracle calls never exceed the configured budget
//   C6 memoization  - bit-identical candidates cost the budget once
// =========================================================================

use proptest::prelude::*;

use crate::benchmarks::{inverted_rastrigin, twin_gaussians};
use crate::budget::EvalBudget;
use crate::niche_pso::{NichePso, NichePsoConfig};
use crate::nmmso::{Nmmso, NmmsoConfig};
use crate::oracle::EvalContext;
use crate::traits::{MultimodalOptimizer, StepOutcome};
use crate::SearchBounds;

fn nmmso_config() -> NmmsoConfig {
    NmmsoConfig {
        n: 5,
        max_inc: 4,
        ..Default::default()
    }
}

#[test]
fn contract_c1_partition_holds_every_generation_niche_pso() {
    let bounds = SearchBounds::continuous(2, -5.0, 5.0).unwrap();
    let mut opt = NichePso::new(NichePsoConfig::default(), bounds, 24)
        .unwrap()
        .with_seed(17);
    let mut ctx = EvalContext::new(EvalBudget::new(800));
    let mut oracle = |x: &[f64]| inverted_rastrigin(x);

    while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
        assert!(opt.partition_ok(), "C1 violated at generation {}", opt.generations());
    }
    assert!(opt.partition_ok());
}

#[test]
fn contract_c1_partition_holds_every_generation_nmmso() {
    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let mut opt = Nmmso::new(nmmso_config(), bounds, 60).unwrap().with_seed(17);
    let mut ctx = EvalContext::new(EvalBudget::new(800));
    let mut oracle = |x: &[f64]| twin_gaussians(x);

    while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
        assert!(opt.partition_ok(), "C1 violated at generation {}", opt.generations());
    }
    assert!(opt.partition_ok());
}

#[test]
fn contract_c2_capacity_bound_holds_including_after_merges() {
    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let mut opt = Nmmso::new(nmmso_config(), bounds, 60).unwrap().with_seed(23);
    let capacity = opt.capacity();
    let mut ctx = EvalContext::new(EvalBudget::new(800));
    let mut oracle = |x: &[f64]| twin_gaussians(x);

    while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
        for (i, swarm) in opt.swarm_list().iter().enumerate() {
            assert!(
                swarm.len() <= capacity,
                "C2 violated: swarm {i} holds {} > {capacity}",
                swarm.len()
            );
        }
    }
}

#[test]
fn contract_c3_global_best_is_monotone_both_variants() {
    let bounds = SearchBounds::continuous(2, -5.0, 5.0).unwrap();

    let mut niche = NichePso::new(NichePsoConfig::default(), bounds.clone(), 20)
        .unwrap()
        .with_seed(31);
    let mut ctx = EvalContext::new(EvalBudget::new(600));
    let result = niche
        .run(&mut |x: &[f64]| inverted_rastrigin(x), &mut ctx)
        .unwrap();
    for pair in result.history.windows(2) {
        assert!(pair[1] >= pair[0], "C3 violated for NichePso: {pair:?}");
    }

    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let mut nmmso = Nmmso::new(nmmso_config(), bounds, 60).unwrap().with_seed(31);
    let mut ctx = EvalContext::new(EvalBudget::new(600));
    let result = nmmso
        .run(&mut |x: &[f64]| twin_gaussians(x), &mut ctx)
        .unwrap();
    for pair in result.history.windows(2) {
        assert!(pair[1] >= pair[0], "C3 violated for Nmmso: {pair:?}");
    }
}

#[test]
fn contract_c4_boundary_containment_every_generation() {
    let bounds = SearchBounds::continuous(2, -1.5, 1.5).unwrap();
    let mut opt = NichePso::new(NichePsoConfig::default(), bounds.clone(), 16)
        .unwrap()
        .with_seed(37);
    let mut ctx = EvalContext::new(EvalBudget::new(400));
    let mut oracle = |x: &[f64]| inverted_rastrigin(x);

    while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
        for p in opt.particles() {
            assert!(
                bounds.contains(&p.position),
                "C4 violated: particle {} at {:?}",
                p.slot,
                p.position
            );
        }
    }
}

#[test]
fn contract_c5_oracle_calls_never_exceed_budget() {
    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let limit = 123;
    let mut calls = 0u64;
    {
        let mut oracle = |x: &[f64]| {
            calls += 1;
            twin_gaussians(x)
        };
        let mut opt = Nmmso::new(nmmso_config(), bounds, 40).unwrap().with_seed(41);
        let mut ctx = EvalContext::new(EvalBudget::new(limit));
        let result = opt.run(&mut oracle, &mut ctx).unwrap();
        assert_eq!(result.evaluations, ctx.budget().used());
    }
    assert!(calls <= limit, "C5 violated: {calls} oracle calls > {limit}");
}

#[test]
fn contract_c6_memoization_means_calls_equal_unique_candidates() {
    let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
    let mut calls = 0u64;
    let unique;
    {
        let mut oracle = |x: &[f64]| {
            calls += 1;
            twin_gaussians(x)
        };
        let mut opt = Nmmso::new(nmmso_config(), bounds, 40).unwrap().with_seed(43);
        let mut ctx = EvalContext::new(EvalBudget::new(300));
        opt.run(&mut oracle, &mut ctx).unwrap();
        unique = ctx.unique_evaluations();
    }
    assert_eq!(
        calls as usize, unique,
        "C6 violated: repeat candidates reached the oracle"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// C1 + C4 + C5 under random seeds and sizes, niching variant.
    #[test]
    fn prop_niche_pso_invariants(seed in 0u64..1000, pop in 4usize..24, limit in 60u64..240) {
        let bounds = SearchBounds::continuous(2, -5.0, 5.0).unwrap();
        let mut opt = NichePso::new(NichePsoConfig::default(), bounds.clone(), pop)
            .unwrap()
            .with_seed(seed);
        let mut ctx = EvalContext::new(EvalBudget::new(limit));
        let mut oracle = |x: &[f64]| inverted_rastrigin(x);

        while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
            prop_assert!(opt.partition_ok());
            for p in opt.particles() {
                prop_assert!(bounds.contains(&p.position));
            }
        }
        prop_assert!(ctx.budget().used() <= limit);
    }

    /// C1 + C2 + C5 under random seeds and sizes, multi-swarm variant.
    #[test]
    fn prop_nmmso_invariants(seed in 0u64..1000, pop in 50usize..90, limit in 60u64..200) {
        let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
        let mut opt = Nmmso::new(nmmso_config(), bounds, pop)
            .unwrap()
            .with_seed(seed);
        let capacity = opt.capacity();
        let mut ctx = EvalContext::new(EvalBudget::new(limit));
        let mut oracle = |x: &[f64]| twin_gaussians(x);

        while opt.step(&mut oracle, &mut ctx).unwrap() == StepOutcome::Advanced {
            prop_assert!(opt.partition_ok());
            for swarm in opt.swarm_list() {
                prop_assert!(swarm.len() <= capacity);
            }
        }
        prop_assert!(ctx.budget().used() <= limit);
    }
}

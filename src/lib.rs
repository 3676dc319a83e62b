//! Enjambre: multimodal niching swarm optimization.
//!
//! Enjambre calibrates simulation models whose parameter landscapes are
//! non-convex and multimodal. Instead of collapsing onto a single global
//! optimum, a fixed population of particles is dynamically partitioned
//! into self-managed sub-swarms, each tracking one mode, under a strict
//! global evaluation budget with exact-match memoization.
//!
//! Two related variants are provided:
//!
//! - [`NichePso`]: radius/merge-based niching PSO with stdev-triggered
//!   swarm formation and a guaranteed-convergence leader update.
//! - [`Nmmso`]: capacity-bounded multi-swarm optimizer with
//!   midpoint-merge, increment and hiving.
//!
//! Fitness is **maximized**; the external oracle must be pure for
//! identical inputs.
//!
//! # Quick Start
//!
//! ```
//! use enjambre::prelude::*;
//! use enjambre::benchmarks::twin_gaussians;
//!
//! let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
//! let mut optimizer = Nmmso::new(NmmsoConfig::default(), bounds, 60)
//!     .unwrap()
//!     .with_seed(42);
//!
//! let mut ctx = EvalContext::new(EvalBudget::new(500));
//! let mut oracle = |x: &[f64]| twin_gaussians(x);
//! let result = optimizer.run(&mut oracle, &mut ctx).unwrap();
//!
//! assert!(result.evaluations <= 500);
//! assert!(!result.modes.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`bounds`]: per-dimension box constraints with clamp semantics
//! - [`budget`]: shared evaluation counter
//! - [`oracle`]: fitness oracle contract and memoizing evaluation context
//! - [`particle`]: population arena unit
//! - [`swarm`]: sub-swarm bookkeeping
//! - [`niche_pso`]: niching PSO variant
//! - [`nmmso`]: multi-swarm variant
//! - [`benchmarks`]: multimodal peak landscapes for evaluation
//! - [`traits`]: the [`MultimodalOptimizer`] contract and strategy enum

pub mod benchmarks;
pub mod bounds;
pub mod budget;
pub mod error;
pub mod geometry;
pub mod niche_pso;
pub mod nmmso;
pub mod oracle;
pub mod particle;
pub mod prelude;
pub mod swarm;
pub mod traits;

pub use bounds::SearchBounds;
pub use budget::EvalBudget;
pub use error::{EnjambreError, Result};
pub use niche_pso::{NichePso, NichePsoConfig};
pub use nmmso::{Nmmso, NmmsoConfig};
pub use oracle::{EvalContext, FitnessOracle};
pub use particle::Particle;
pub use swarm::SubSwarm;
pub use traits::{Mode, MultimodalOptimizer, MultimodalResult, OptimizerKind, StepOutcome};

#[cfg(test)]
#[path = "tests_invariants_contract.rs"]
mod tests_invariants_contract;

//! Optimizer contract shared by both swarm variants.
//!
//! The original host framework instantiated optimizer classes by name from
//! a config file. Here the variant is an explicit strategy enum selected at
//! construction time and dispatched through [`MultimodalOptimizer`].

use serde::{Deserialize, Serialize};

use crate::error::{EnjambreError, Result};
use crate::niche_pso::{NichePso, NichePsoConfig};
use crate::nmmso::{Nmmso, NmmsoConfig};
use crate::oracle::{EvalContext, FitnessOracle};
use crate::SearchBounds;

/// One mode estimate: a sub-swarm leader's position and fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    /// Leader position in parameter space.
    pub position: Vec<f64>,
    /// Leader fitness.
    pub fitness: f64,
}

/// What a generation accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The generation ran; state advanced.
    Advanced,
    /// The evaluation budget is exhausted; the generation was a no-op and
    /// every further one will be too.
    Exhausted,
}

/// Final result set handed back to the calibration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultimodalResult {
    /// Current sub-swarm leaders, one per tracked mode.
    pub modes: Vec<Mode>,
    /// Best solution seen across the whole run.
    pub best: Mode,
    /// Real oracle calls consumed.
    pub evaluations: u64,
    /// Generations completed.
    pub generations: usize,
    /// Global-best fitness after each generation.
    pub history: Vec<f64>,
}

/// A multimodal optimizer advancing one generation at a time against a
/// budgeted, memoizing evaluation context.
pub trait MultimodalOptimizer {
    /// Build and evaluate the initial population.
    fn initialize(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<StepOutcome>;

    /// Advance one generation. No-op once the budget is exhausted.
    fn step(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<StepOutcome>;

    /// Current sub-swarm leaders. Valid at any generation boundary.
    fn modes(&self) -> Vec<Mode>;

    /// Best solution seen so far, if anything was evaluated.
    fn global_best(&self) -> Option<Mode>;

    /// Generations completed so far.
    fn generations(&self) -> usize;

    /// Drive generations until the budget is exhausted and collect the
    /// result set.
    fn run(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<MultimodalResult> {
        self.initialize(oracle, ctx)?;
        let mut history = Vec::new();
        if let Some(best) = self.global_best() {
            history.push(best.fitness);
        }
        while self.step(oracle, ctx)? == StepOutcome::Advanced {
            if let Some(best) = self.global_best() {
                history.push(best.fitness);
            }
        }
        let best = self
            .global_best()
            .ok_or(EnjambreError::InsufficientBudget {
                needed: 1,
                available: ctx.budget().remaining(),
            })?;
        Ok(MultimodalResult {
            modes: self.modes(),
            best,
            evaluations: ctx.budget().used(),
            generations: self.generations(),
            history,
        })
    }
}

/// Which optimizer variant to run, with its configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// Radius/merge-based niching PSO.
    NichePso(NichePsoConfig),
    /// Capacity-bounded multi-swarm optimizer with midpoint-merge and
    /// hiving.
    Nmmso(NmmsoConfig),
}

impl OptimizerKind {
    /// Construct the selected optimizer over `bounds` with a fixed
    /// population of `population` particles.
    pub fn build(
        self,
        bounds: SearchBounds,
        population: usize,
        seed: Option<u64>,
    ) -> Result<Box<dyn MultimodalOptimizer>> {
        match self {
            OptimizerKind::NichePso(config) => {
                let mut opt = NichePso::new(config, bounds, population)?;
                if let Some(seed) = seed {
                    opt = opt.with_seed(seed);
                }
                Ok(Box::new(opt))
            }
            OptimizerKind::Nmmso(config) => {
                let mut opt = Nmmso::new(config, bounds, population)?;
                if let Some(seed) = seed {
                    opt = opt.with_seed(seed);
                }
                Ok(Box::new(opt))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvalBudget;

    fn peak(x: &[f64]) -> f64 {
        -(x[0] * x[0])
    }

    #[test]
    fn test_kind_builds_niche_pso() {
        let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
        let kind = OptimizerKind::NichePso(NichePsoConfig::default());
        let mut opt = kind.build(bounds, 10, Some(42)).unwrap();
        let mut ctx = EvalContext::new(EvalBudget::new(200));
        let result = opt.run(&mut peak, &mut ctx).unwrap();
        assert!(result.evaluations <= 200);
    }

    #[test]
    fn test_kind_builds_nmmso() {
        let bounds = SearchBounds::continuous(1, -5.0, 5.0).unwrap();
        let kind = OptimizerKind::Nmmso(NmmsoConfig::default());
        let mut opt = kind.build(bounds, 30, Some(42)).unwrap();
        let mut ctx = EvalContext::new(EvalBudget::new(200));
        let result = opt.run(&mut peak, &mut ctx).unwrap();
        assert!(result.evaluations <= 200);
        assert!(!result.modes.is_empty());
    }

    #[test]
    fn test_kind_serde_roundtrip() {
        let kind = OptimizerKind::Nmmso(NmmsoConfig::default());
        let json = serde_json::to_string(&kind).unwrap();
        let back: OptimizerKind = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, OptimizerKind::Nmmso(_)));
    }
}

//! Fitness oracle contract and memoizing evaluation context.
//!
//! The oracle is the expensive step — for calibration it is a full ABM
//! Monte Carlo run. The optimizer must never call it twice for bit-identical
//! candidate vectors within a run, so every evaluation goes through
//! [`EvalContext`], which holds the exact-match memoization cache and the
//! shared [`EvalBudget`]. Cache hits are free; only real calls consume
//! budget.

use std::collections::HashMap;

use crate::budget::EvalBudget;
use crate::error::Result;

/// External fitness function. Fitness is maximized.
///
/// Must be idempotent and pure for identical inputs. Failures surface as a
/// fatal error to the caller and are not retried.
///
/// Any `FnMut(&[f64]) -> f64` closure is an oracle that never fails:
///
/// ```
/// use enjambre::FitnessOracle;
///
/// let mut oracle = |x: &[f64]| -(x[0] * x[0]);
/// assert_eq!(oracle.evaluate(&[2.0]).unwrap(), -4.0);
/// ```
pub trait FitnessOracle {
    /// Evaluate one candidate vector.
    fn evaluate(&mut self, candidate: &[f64]) -> Result<f64>;
}

impl<F> FitnessOracle for F
where
    F: FnMut(&[f64]) -> f64,
{
    fn evaluate(&mut self, candidate: &[f64]) -> Result<f64> {
        Ok(self(candidate))
    }
}

/// Exact-match cache key: the bit pattern of the full coordinate vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CandidateKey(Vec<u64>);

impl CandidateKey {
    fn from_candidate(x: &[f64]) -> Self {
        Self(x.iter().map(|xi| xi.to_bits()).collect())
    }
}

/// Budget-aware, memoizing evaluation context shared across all sub-swarms.
///
/// Owned by the calibration driver that embeds the optimizer; threaded
/// through every generation as `&mut`.
#[derive(Debug, Clone)]
pub struct EvalContext {
    budget: EvalBudget,
    cache: HashMap<CandidateKey, f64>,
    hits: u64,
}

impl EvalContext {
    /// Context with a fresh cache and the given budget.
    #[must_use]
    pub fn new(budget: EvalBudget) -> Self {
        Self {
            budget,
            cache: HashMap::new(),
            hits: 0,
        }
    }

    /// Evaluate `x`, consulting the cache first.
    ///
    /// Returns `Ok(None)` when the candidate is uncached and the budget is
    /// exhausted — the caller must treat the operation as a no-op. Oracle
    /// failures propagate.
    pub fn evaluate(&mut self, oracle: &mut dyn FitnessOracle, x: &[f64]) -> Result<Option<f64>> {
        let key = CandidateKey::from_candidate(x);
        if let Some(&fitness) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(Some(fitness));
        }
        if self.budget.is_exhausted() {
            return Ok(None);
        }
        let fitness = oracle.evaluate(x)?;
        self.budget.consume(1);
        self.cache.insert(key, fitness);
        Ok(Some(fitness))
    }

    /// The embedded budget.
    #[must_use]
    pub fn budget(&self) -> &EvalBudget {
        &self.budget
    }

    /// Whether no real evaluations remain.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.budget.is_exhausted()
    }

    /// Number of distinct candidates evaluated for real.
    #[must_use]
    pub fn unique_evaluations(&self) -> usize {
        self.cache.len()
    }

    /// Number of cache hits served without touching the oracle.
    #[must_use]
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_identical_candidate_consumes_budget_once() {
        let calls = Cell::new(0u32);
        let mut oracle = |x: &[f64]| {
            calls.set(calls.get() + 1);
            x[0] + x[1]
        };
        let mut ctx = EvalContext::new(EvalBudget::new(10));

        let a = ctx.evaluate(&mut oracle, &[1.0, 2.0]).unwrap();
        let b = ctx.evaluate(&mut oracle, &[1.0, 2.0]).unwrap();

        assert_eq!(a, Some(3.0));
        assert_eq!(b, Some(3.0));
        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.budget().used(), 1);
        assert_eq!(ctx.cache_hits(), 1);
    }

    #[test]
    fn test_bit_identical_key_distinguishes_negative_zero() {
        let mut oracle = |x: &[f64]| x[0];
        let mut ctx = EvalContext::new(EvalBudget::new(10));

        ctx.evaluate(&mut oracle, &[0.0]).unwrap();
        ctx.evaluate(&mut oracle, &[-0.0]).unwrap();

        // 0.0 and -0.0 differ in bit pattern, so both are real calls.
        assert_eq!(ctx.budget().used(), 2);
    }

    #[test]
    fn test_exhausted_budget_returns_none() {
        let mut oracle = |x: &[f64]| x[0];
        let mut ctx = EvalContext::new(EvalBudget::new(1));

        assert_eq!(ctx.evaluate(&mut oracle, &[1.0]).unwrap(), Some(1.0));
        assert_eq!(ctx.evaluate(&mut oracle, &[2.0]).unwrap(), None);
        // Cached candidates still resolve after exhaustion.
        assert_eq!(ctx.evaluate(&mut oracle, &[1.0]).unwrap(), Some(1.0));
    }

    #[test]
    fn test_oracle_failure_propagates() {
        struct Failing;
        impl FitnessOracle for Failing {
            fn evaluate(&mut self, _candidate: &[f64]) -> Result<f64> {
                Err(crate::EnjambreError::Oracle {
                    message: "boom".to_string(),
                })
            }
        }

        let mut ctx = EvalContext::new(EvalBudget::new(10));
        let err = ctx.evaluate(&mut Failing, &[1.0]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

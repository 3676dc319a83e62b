//! Radius/merge-based niching particle swarm optimizer.
//!
//! A fixed population is dynamically partitioned into a main swarm (the
//! free pool) and a variable number of sub-swarms, each tracking one mode:
//!
//! ```text
//! Per generation:
//!   1. Move main-swarm particles with a cognition-only random walk
//!   2. Move each sub-swarm leader (GCPSO) and its followers (leader as
//!      sole informant)
//!   3. Adapt the shared GCPSO perturbation radius ρ
//!   4. Merge nearby sub-swarms (leader distance < tol, or midpoint test)
//!   5. Absorb free particles that wander inside a sub-swarm's radius
//!   6. Form new 2-member sub-swarms around stagnated free particles
//! ```
//!
//! # References
//!
//! - Brits, Engelbrecht & van den Bergh (2002): "A Niching Particle Swarm
//!   Optimizer"
//! - van den Bergh & Engelbrecht (2002): "A New Locally Convergent
//!   Particle Swarm Optimiser" (GCPSO)

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bounds::SearchBounds;
use crate::error::{EnjambreError, Result};
use crate::geometry::{euclidean, midpoint};
use crate::oracle::{EvalContext, FitnessOracle};
use crate::particle::Particle;
use crate::swarm::{fold_and_evict, SubSwarm};
use crate::traits::{Mode, MultimodalOptimizer, StepOutcome};

/// Configuration for [`NichePso`]. All values validated at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NichePsoConfig {
    /// Inertia weight applied to the previous velocity.
    pub velocity_coeff: f64,
    /// Upper bound of the uniform cognitive coefficient.
    pub personal_coeff: f64,
    /// Upper bound of the uniform informant coefficient (followers only).
    pub informant_coeff: f64,
    /// Upper bound of the uniform global-best coefficient. Zero keeps the
    /// follower rule informant-only.
    pub global_coeff: f64,
    /// Initial GCPSO perturbation radius ρ.
    pub rho: f64,
    /// Stagnation threshold: a main-swarm particle whose fitness stddev
    /// over its last three evaluations falls below this seeds a sub-swarm.
    pub delta: f64,
    /// Leader-to-leader distance below which two sub-swarms merge.
    pub tol: f64,
    /// Consecutive improving generations before ρ doubles.
    pub success_threshold: u32,
    /// Consecutive non-improving generations before ρ halves.
    pub failure_threshold: u32,
}

impl Default for NichePsoConfig {
    fn default() -> Self {
        Self {
            velocity_coeff: 0.729_844,
            personal_coeff: 1.496_180,
            informant_coeff: 1.496_180,
            global_coeff: 0.0,
            rho: 1.0,
            delta: 1e-4,
            tol: 0.1,
            success_threshold: 15,
            failure_threshold: 5,
        }
    }
}

impl NichePsoConfig {
    fn validate(&self) -> Result<()> {
        let nonneg = [
            ("velocity_coeff", self.velocity_coeff),
            ("personal_coeff", self.personal_coeff),
            ("informant_coeff", self.informant_coeff),
            ("global_coeff", self.global_coeff),
            ("rho", self.rho),
            ("delta", self.delta),
            ("tol", self.tol),
        ];
        for (param, value) in nonneg {
            if !value.is_finite() || value < 0.0 {
                return Err(EnjambreError::invalid_parameter(param, value, ">= 0"));
            }
        }
        if self.success_threshold == 0 {
            return Err(EnjambreError::invalid_parameter(
                "success_threshold",
                0.0,
                "> 0",
            ));
        }
        if self.failure_threshold == 0 {
            return Err(EnjambreError::invalid_parameter(
                "failure_threshold",
                0.0,
                "> 0",
            ));
        }
        Ok(())
    }
}

/// Niching PSO over a fixed population arena.
#[derive(Debug)]
pub struct NichePso {
    config: NichePsoConfig,
    bounds: SearchBounds,
    population_size: usize,
    rng: StdRng,

    population: Vec<Particle>,
    free: Vec<usize>,
    swarms: Vec<SubSwarm>,

    // GCPSO adaptation state, shared across all sub-swarm leaders.
    rho: f64,
    successes: u32,
    failures: u32,

    global_best: Option<Mode>,
    generations: usize,
    initialized: bool,
}

impl NichePso {
    /// Create an optimizer over `bounds` with `population_size` particles.
    pub fn new(
        config: NichePsoConfig,
        bounds: SearchBounds,
        population_size: usize,
    ) -> Result<Self> {
        config.validate()?;
        if population_size < 2 {
            return Err(EnjambreError::PopulationTooSmall {
                got: population_size,
                min: 2,
            });
        }
        let rho = config.rho;
        Ok(Self {
            config,
            bounds,
            population_size,
            rng: StdRng::from_entropy(),
            population: Vec::new(),
            free: Vec::new(),
            swarms: Vec::new(),
            rho,
            successes: 0,
            failures: 0,
            global_best: None,
            generations: 0,
            initialized: false,
        })
    }

    /// Set the random seed for a deterministic run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of live sub-swarms.
    #[must_use]
    pub fn num_swarms(&self) -> usize {
        self.swarms.len()
    }

    /// Number of particles still in the main swarm.
    #[must_use]
    pub fn free_particles(&self) -> usize {
        self.free.len()
    }

    /// Current GCPSO perturbation radius.
    #[must_use]
    pub fn rho(&self) -> f64 {
        self.rho
    }

    fn note_global(&mut self, position: &[f64], fitness: f64) {
        if self.global_best.as_ref().map_or(true, |b| fitness > b.fitness) {
            self.global_best = Some(Mode {
                position: position.to_vec(),
                fitness,
            });
        }
    }

    fn eval(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
        x: &[f64],
    ) -> Result<Option<f64>> {
        match ctx.evaluate(oracle, x)? {
            Some(fitness) => {
                self.note_global(x, fitness);
                Ok(Some(fitness))
            }
            None => Ok(None),
        }
    }

    /// Verify the slot-index invariant. Mismatch is a fatal caller bug.
    fn check_slots(&self) -> Result<()> {
        for (index, p) in self.population.iter().enumerate() {
            if p.slot != index {
                return Err(EnjambreError::SlotMismatch {
                    slot: p.slot,
                    index,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.population
    }

    pub(crate) fn swarm_list(&self) -> &[SubSwarm] {
        &self.swarms
    }

    /// Partition invariant: every slot in exactly one of {free pool, one
    /// sub-swarm}.
    pub(crate) fn partition_ok(&self) -> bool {
        let mut seen = vec![0u32; self.population.len()];
        for &slot in &self.free {
            seen[slot] += 1;
        }
        for swarm in &self.swarms {
            for &slot in &swarm.members {
                seen[slot] += 1;
            }
        }
        seen.iter().all(|&count| count == 1)
    }

    /// Cognition-only walk of the main swarm. Returns false on budget
    /// exhaustion.
    fn move_main_swarm(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<bool> {
        let free_slots = self.free.clone();
        for slot in free_slots {
            let dim = self.bounds.dimension();
            {
                let w = self.config.velocity_coeff;
                let p = &mut self.population[slot];
                for d in 0..dim {
                    let beta: f64 = self.rng.gen_range(0.0..=self.config.personal_coeff);
                    p.velocity[d] =
                        w * p.velocity[d] + beta * (p.best_position[d] - p.position[d]);
                    p.position[d] += p.velocity[d];
                }
                self.bounds.clamp(&mut p.position);
            }
            let position = self.population[slot].position.clone();
            match self.eval(oracle, ctx, &position)? {
                Some(fitness) => self.population[slot].record(fitness),
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// GCPSO leader move plus standard follower moves for every sub-swarm.
    /// Returns (improved_any, still_in_budget).
    fn move_sub_swarms(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<(bool, bool)> {
        let dim = self.bounds.dimension();
        let mut improved_any = false;

        for s in 0..self.swarms.len() {
            let leader_slot = self.swarms[s].leader_slot();

            // Leader: guaranteed-convergence update around its own best.
            {
                let rho = self.rho;
                let w = self.config.velocity_coeff;
                let p = &mut self.population[leader_slot];
                for d in 0..dim {
                    let u: f64 = self.rng.gen();
                    p.velocity[d] = -p.position[d]
                        + p.best_position[d]
                        + rho * (1.0 - 2.0 * u)
                        + w * p.velocity[d];
                }
                for d in 0..dim {
                    p.position[d] += p.velocity[d];
                }
                self.bounds.clamp(&mut p.position);
            }
            let position = self.population[leader_slot].position.clone();
            match self.eval(oracle, ctx, &position)? {
                Some(fitness) => self.population[leader_slot].record(fitness),
                None => return Ok((improved_any, false)),
            }

            // Followers: standard rule guided by the leader.
            let leader_best = self.population[leader_slot].best_position.clone();
            let leader_fitness = self.population[leader_slot].best_fitness;
            let global = self.global_best.clone();
            let members = self.swarms[s].members.clone();
            for slot in members {
                if slot == leader_slot {
                    continue;
                }
                {
                    let w = self.config.velocity_coeff;
                    let p = &mut self.population[slot];
                    p.guide = Some((leader_best.clone(), leader_fitness));
                    for d in 0..dim {
                        let b: f64 = self.rng.gen_range(0.0..=self.config.personal_coeff);
                        let c: f64 = self.rng.gen_range(0.0..=self.config.informant_coeff);
                        let mut v = w * p.velocity[d]
                            + b * (p.best_position[d] - p.position[d])
                            + c * (leader_best[d] - p.position[d]);
                        if self.config.global_coeff > 0.0 {
                            if let Some(gb) = &global {
                                let g: f64 =
                                    self.rng.gen_range(0.0..=self.config.global_coeff);
                                v += g * (gb.position[d] - p.position[d]);
                            }
                        }
                        p.velocity[d] = v;
                        p.position[d] += p.velocity[d];
                    }
                    self.bounds.clamp(&mut p.position);
                }
                let position = self.population[slot].position.clone();
                match self.eval(oracle, ctx, &position)? {
                    Some(fitness) => self.population[slot].record(fitness),
                    None => return Ok((improved_any, false)),
                }
            }

            if self.swarms[s].recompute_best(&self.population) {
                self.swarms[s].dirty = true;
                improved_any = true;
            }
            self.swarms[s].recompute_radius(&self.population);
        }
        Ok((improved_any, true))
    }

    /// Double ρ after enough consecutive improving generations, halve it
    /// after enough consecutive non-improving ones.
    fn adapt_rho(&mut self, improved: bool) {
        if improved {
            self.successes += 1;
            self.failures = 0;
            if self.successes >= self.config.success_threshold {
                self.rho *= 2.0;
                self.successes = 0;
                trace!(rho = self.rho, "rho doubled");
            }
        } else {
            self.failures += 1;
            self.successes = 0;
            if self.failures >= self.config.failure_threshold {
                self.rho *= 0.5;
                self.failures = 0;
                trace!(rho = self.rho, "rho halved");
            }
        }
    }

    /// Merge dirty sub-swarms with their nearest neighbor when the leaders
    /// are within `tol`, or when the midpoint between the leaders is no
    /// worse than the receiving leader.
    ///
    /// The pass is bounded by the sub-swarm count at entry, which
    /// guarantees termination of the fixed-point recursion.
    fn merge_pass(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<()> {
        let max_iterations = self.swarms.len();
        for _ in 0..max_iterations {
            if self.swarms.len() < 2 {
                break;
            }
            let Some(s) = self.swarms.iter().position(|sw| sw.dirty) else {
                break;
            };
            self.swarms[s].dirty = false;

            let leader_s = self.swarms[s].leader_position(&self.population).to_vec();
            let (t, dist) = self
                .swarms
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != s)
                .map(|(i, sw)| (i, euclidean(&leader_s, sw.leader_position(&self.population))))
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .expect("at least two swarms");

            // Receiving swarm is the fitter of the two.
            let (receiver, absorbed) = if self.swarms[s].best_fitness >= self.swarms[t].best_fitness
            {
                (s, t)
            } else {
                (t, s)
            };

            let merge = if dist < self.config.tol {
                true
            } else {
                let mid = midpoint(
                    &leader_s,
                    self.swarms[t].leader_position(&self.population),
                );
                match self.eval(oracle, ctx, &mid)? {
                    Some(fitness) => fitness >= self.swarms[receiver].best_fitness,
                    None => false,
                }
            };

            if merge {
                debug!(
                    receiver,
                    absorbed,
                    dist,
                    swarms = self.swarms.len() - 1,
                    "merged sub-swarms"
                );
                self.merge_swarms(receiver, absorbed);
            }
        }
        Ok(())
    }

    fn merge_swarms(&mut self, receiver: usize, absorbed: usize) {
        let src = self.swarms.swap_remove(absorbed);
        // swap_remove may have moved the receiver into the vacated index.
        let receiver = if receiver == self.swarms.len() {
            absorbed
        } else {
            receiver
        };
        let dst = &mut self.swarms[receiver];
        fold_and_evict(
            dst,
            src,
            &mut self.population,
            &mut self.free,
            usize::MAX,
            &self.bounds,
            &mut self.rng,
        );
        dst.recompute_radius(&self.population);
        dst.dirty = true;
    }

    /// Absorb free particles that lie within a sub-swarm's radius of its
    /// best, repeating to a fixed point bounded by the population size.
    fn absorb_pass(&mut self) {
        for _ in 0..self.population.len() {
            let mut absorbed_any = false;
            let free_now = self.free.clone();
            for slot in free_now {
                let position = self.population[slot].position.clone();
                let target = self
                    .swarms
                    .iter()
                    .enumerate()
                    .map(|(i, sw)| {
                        (i, euclidean(&position, sw.leader_position(&self.population)), sw.radius)
                    })
                    .filter(|(_, d, radius)| d < radius)
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(i, _, _)| i);
                if let Some(i) = target {
                    self.free.retain(|&f| f != slot);
                    self.swarms[i].push_member(slot);
                    self.swarms[i].recompute_best(&self.population);
                    self.swarms[i].recompute_radius(&self.population);
                    trace!(slot, swarm = i, "absorbed free particle");
                    absorbed_any = true;
                }
            }
            if !absorbed_any {
                break;
            }
        }
    }

    /// Pair stagnated free particles with their nearest free neighbor into
    /// new 2-member sub-swarms until no further pair qualifies.
    fn creation_pass(&mut self) {
        while self.free.len() >= 2 {
            let candidate = self.free.iter().copied().find(|&slot| {
                self.population[slot]
                    .history
                    .stddev()
                    .map_or(false, |sd| sd < self.config.delta)
            });
            let Some(a) = candidate else { break };

            let position = &self.population[a].position;
            let (b, _) = self
                .free
                .iter()
                .copied()
                .filter(|&slot| slot != a)
                .map(|slot| (slot, euclidean(position, &self.population[slot].position)))
                .min_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal))
                .expect("free pool holds at least two slots");

            self.free.retain(|&slot| slot != a && slot != b);
            let swarm = SubSwarm::pair(a, b, &self.population);
            debug!(a, b, swarms = self.swarms.len() + 1, "formed sub-swarm from stagnated pair");
            self.swarms.push(swarm);
        }
    }
}

impl MultimodalOptimizer for NichePso {
    fn initialize(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<StepOutcome> {
        self.population = (0..self.population_size)
            .map(|slot| Particle::new(slot, &self.bounds, &mut self.rng))
            .collect();
        self.free = (0..self.population_size).collect();
        self.swarms.clear();
        self.rho = self.config.rho;
        self.successes = 0;
        self.failures = 0;
        self.global_best = None;
        self.generations = 0;
        self.initialized = true;

        for slot in 0..self.population_size {
            let position = self.population[slot].position.clone();
            match self.eval(oracle, ctx, &position)? {
                Some(fitness) => self.population[slot].record(fitness),
                None => return Ok(StepOutcome::Exhausted),
            }
        }
        Ok(StepOutcome::Advanced)
    }

    fn step(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<StepOutcome> {
        if !self.initialized {
            if self.initialize(oracle, ctx)? == StepOutcome::Exhausted {
                return Ok(StepOutcome::Exhausted);
            }
        }
        if ctx.is_exhausted() {
            return Ok(StepOutcome::Exhausted);
        }
        self.check_slots()?;

        if !self.move_main_swarm(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
        }
        let (improved, in_budget) = self.move_sub_swarms(oracle, ctx)?;
        if !in_budget {
            return Ok(StepOutcome::Exhausted);
        }
        self.adapt_rho(improved);
        self.merge_pass(oracle, ctx)?;
        self.absorb_pass();
        self.creation_pass();

        debug_assert!(self.partition_ok(), "partition invariant violated");
        self.generations += 1;
        Ok(StepOutcome::Advanced)
    }

    fn modes(&self) -> Vec<Mode> {
        self.swarms
            .iter()
            .map(|sw| Mode {
                position: sw.leader_position(&self.population).to_vec(),
                fitness: sw.best_fitness,
            })
            .collect()
    }

    fn global_best(&self) -> Option<Mode> {
        self.global_best.clone()
    }

    fn generations(&self) -> usize {
        self.generations
    }
}

#[cfg(test)]
#[path = "niche_pso_tests.rs"]
mod tests;

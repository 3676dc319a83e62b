//! Capacity-bounded multi-swarm optimizer with midpoint-merge and hiving.
//!
//! Swarms hold at most `n × dimension` members and advance only through
//! the increment step; free particles are a reservoir, not a moving main
//! swarm. Whether two swarms track the same basin is decided by evaluating
//! the midpoint between their leaders:
//!
//! ```text
//! Per generation:
//!   1. Merge dirty swarms whose nearest neighbor is within tol, or whose
//!      leader midpoint is no worse than one of the leaders
//!   2. Increment up to max_inc swarms: spawn near the leader while below
//!      capacity, otherwise take a guided step with one random member
//!   3. Hive: try to split one member out of a random full swarm
//!   4. Create one new swarm from a free particle or leader crossover
//! ```
//!
//! Distances are per-dimension normalized and divided by dimensionality so
//! `tol` is comparable across problems with differently scaled axes.
//!
//! # References
//!
//! - Fieldsend (2014): "Running Up Those Hills: Multi-Modal Search with
//!   the Niching Migratory Multi-Swarm Optimiser"

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bounds::SearchBounds;
use crate::error::{EnjambreError, Result};
use crate::geometry::{midpoint, normalized_distance, unit_sphere_vector};
use crate::oracle::{EvalContext, FitnessOracle};
use crate::particle::Particle;
use crate::swarm::{fold_and_evict, SubSwarm};
use crate::traits::{Mode, MultimodalOptimizer, StepOutcome};

/// Configuration for [`Nmmso`]. All values validated at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NmmsoConfig {
    /// Inertia weight for the guided member step.
    pub velocity_coeff: f64,
    /// Upper bound of the uniform cognitive coefficient.
    pub personal_coeff: f64,
    /// Upper bound of the uniform informant coefficient.
    pub informant_coeff: f64,
    /// Normalized leader distance below which two swarms merge without a
    /// midpoint evaluation.
    pub tol: f64,
    /// Swarm capacity factor: each swarm holds at most `n × dimension`
    /// members.
    pub n: usize,
    /// Maximum number of swarms incremented per generation.
    pub max_inc: usize,
    /// When more than `max_inc` swarms qualify, pick a uniform random
    /// subset instead of the fittest.
    pub random_subsample: bool,
}

impl Default for NmmsoConfig {
    fn default() -> Self {
        Self {
            velocity_coeff: 0.1,
            personal_coeff: 2.0,
            informant_coeff: 2.0,
            tol: 1e-6,
            n: 10,
            max_inc: 100,
            random_subsample: false,
        }
    }
}

impl NmmsoConfig {
    fn validate(&self) -> Result<()> {
        let nonneg = [
            ("velocity_coeff", self.velocity_coeff),
            ("personal_coeff", self.personal_coeff),
            ("informant_coeff", self.informant_coeff),
            ("tol", self.tol),
        ];
        for (param, value) in nonneg {
            if !value.is_finite() || value < 0.0 {
                return Err(EnjambreError::invalid_parameter(param, value, ">= 0"));
            }
        }
        if self.n == 0 {
            return Err(EnjambreError::invalid_parameter("n", 0.0, "> 0"));
        }
        if self.max_inc == 0 {
            return Err(EnjambreError::invalid_parameter("max_inc", 0.0, "> 0"));
        }
        Ok(())
    }
}

/// Niching migratory multi-swarm optimizer over a fixed population arena.
#[derive(Debug)]
pub struct Nmmso {
    config: NmmsoConfig,
    bounds: SearchBounds,
    population_size: usize,
    capacity: usize,
    rng: StdRng,

    population: Vec<Particle>,
    free: Vec<usize>,
    swarms: Vec<SubSwarm>,

    global_best: Option<Mode>,
    generations: usize,
    initialized: bool,
}

impl Nmmso {
    /// Create an optimizer over `bounds` with `population_size` particles.
    pub fn new(config: NmmsoConfig, bounds: SearchBounds, population_size: usize) -> Result<Self> {
        config.validate()?;
        if population_size < 2 {
            return Err(EnjambreError::PopulationTooSmall {
                got: population_size,
                min: 2,
            });
        }
        let capacity = config.n * bounds.dimension();
        Ok(Self {
            config,
            bounds,
            population_size,
            capacity,
            rng: StdRng::from_entropy(),
            population: Vec::new(),
            free: Vec::new(),
            swarms: Vec::new(),
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

    /// Member cap per swarm (`n × dimension`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live sub-swarms.
    #[must_use]
    pub fn num_swarms(&self) -> usize {
        self.swarms.len()
    }

    /// Number of particles in the free reservoir.
    #[must_use]
    pub fn free_particles(&self) -> usize {
        self.free.len()
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

    /// Normalized leader-to-leader distance from swarm `s` to its nearest
    /// neighbor, or a half-domain fallback when `s` is the only swarm.
    fn nearest_neighbor(&self, s: usize) -> (Option<usize>, f64) {
        let fallback = 0.5 / (self.bounds.dimension() as f64).sqrt();
        let leader = self.swarms[s].leader_position(&self.population);
        self.swarms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != s)
            .map(|(i, sw)| {
                (
                    Some(i),
                    normalized_distance(leader, sw.leader_position(&self.population), &self.bounds),
                )
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((None, fallback))
    }

    /// Take a uniformly random slot out of the free pool; fatal when empty.
    fn take_free_slot(&mut self, operation: &'static str) -> Result<usize> {
        if self.free.is_empty() {
            return Err(EnjambreError::FreePoolExhausted { operation });
        }
        let i = self.rng.gen_range(0..self.free.len());
        Ok(self.free.swap_remove(i))
    }

    fn merge_swarms(&mut self, receiver: usize, absorbed: usize) {
        let src = self.swarms.swap_remove(absorbed);
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
            self.capacity,
            &self.bounds,
            &mut self.rng,
        );
        dst.dirty = true;
    }

    /// Merge pass over dirty swarms, bounded by the swarm count at entry.
    /// Returns false on budget exhaustion.
    fn merge_pass(&mut self, oracle: &mut dyn FitnessOracle, ctx: &mut EvalContext) -> Result<bool> {
        let max_iterations = self.swarms.len();
        for _ in 0..max_iterations {
            if self.swarms.len() < 2 {
                break;
            }
            let Some(s) = self.swarms.iter().position(|sw| sw.dirty) else {
                break;
            };
            self.swarms[s].dirty = false;

            let (nearest, dist) = self.nearest_neighbor(s);
            self.swarms[s].radius = dist;
            let Some(t) = nearest else { break };

            // Receiving swarm is the fitter of the two.
            let (receiver, absorbed) = if self.swarms[s].best_fitness >= self.swarms[t].best_fitness
            {
                (s, t)
            } else {
                (t, s)
            };

            if dist < self.config.tol {
                debug!(receiver, absorbed, dist, "merged swarms under tol");
                self.merge_swarms(receiver, absorbed);
                continue;
            }

            // Midpoint test: same basin iff the midpoint does not dip
            // below the worse leader.
            let mid = midpoint(
                self.swarms[receiver].leader_position(&self.population),
                self.swarms[absorbed].leader_position(&self.population),
            );
            let Some(mid_fitness) = self.eval(oracle, ctx, &mid)? else {
                return Ok(false);
            };

            let mut merge = false;
            if mid_fitness > self.swarms[absorbed].best_fitness {
                // Midpoint beats the worse leader: promote it there, then
                // fold the swarms together.
                let slot = self.swarms[absorbed].leader_slot();
                self.population[slot].relocate(&mid, mid_fitness);
                self.swarms[absorbed].recompute_best(&self.population);
                self.swarms[absorbed].dirty = true;
                merge = true;
            } else if mid_fitness > self.swarms[receiver].best_fitness {
                merge = true;
            }

            if merge {
                debug!(receiver, absorbed, mid_fitness, "merged swarms via midpoint");
                self.merge_swarms(receiver, absorbed);
            }
        }
        Ok(true)
    }

    /// Indices of the swarms to increment this generation.
    fn increment_selection(&mut self) -> Vec<usize> {
        let mut ranked: Vec<usize> = (0..self.swarms.len()).collect();
        if ranked.len() <= self.config.max_inc {
            return ranked;
        }
        if self.config.random_subsample {
            for i in 0..self.config.max_inc {
                let j = self.rng.gen_range(i..ranked.len());
                ranked.swap(i, j);
            }
        } else {
            ranked.sort_by(|&a, &b| {
                self.swarms[b]
                    .best_fitness
                    .partial_cmp(&self.swarms[a].best_fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        ranked.truncate(self.config.max_inc);
        ranked
    }

    /// Advance selected swarms by one member each: spawn below capacity,
    /// guided step at capacity. Returns false on budget exhaustion.
    fn increment_pass(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<bool> {
        let selected = self.increment_selection();
        for s in selected {
            if self.swarms[s].len() < self.capacity {
                if !self.spawn_member(oracle, ctx, s)? {
                    return Ok(false);
                }
            } else if !self.guided_step(oracle, ctx, s)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Spawn a new member near the leader via uniform-sphere sampling
    /// scaled by the swarm's nearest-neighbor distance.
    fn spawn_member(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
        s: usize,
    ) -> Result<bool> {
        if self.free.is_empty() {
            return Err(EnjambreError::FreePoolExhausted {
                operation: "increment",
            });
        }
        let (_, d_nn) = self.nearest_neighbor(s);
        let dim = self.bounds.dimension();
        let leader_norm = self
            .bounds
            .normalize(self.swarms[s].leader_position(&self.population));
        let direction = unit_sphere_vector(dim, &mut self.rng);
        let scale: f64 = self.rng.gen::<f64>() * d_nn;
        let candidate_norm: Vec<f64> = leader_norm
            .iter()
            .zip(direction.iter())
            .map(|(&l, &u)| l + scale * u)
            .collect();
        let mut candidate = self.bounds.denormalize(&candidate_norm);
        self.bounds.clamp(&mut candidate);

        let Some(fitness) = self.eval(oracle, ctx, &candidate)? else {
            return Ok(false);
        };
        let slot = self.take_free_slot("increment")?;
        self.population[slot].relocate(&candidate, fitness);
        self.swarms[s].push_member(slot);
        if self.swarms[s].recompute_best(&self.population) {
            self.swarms[s].dirty = true;
        }
        trace!(swarm = s, slot, fitness, "spawned member near leader");
        Ok(true)
    }

    /// Move one random member with a guided PSO step, leader as sole
    /// informant.
    fn guided_step(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
        s: usize,
    ) -> Result<bool> {
        let leader_slot = self.swarms[s].leader_slot();
        let movers: Vec<usize> = self.swarms[s]
            .members
            .iter()
            .copied()
            .filter(|&slot| slot != leader_slot || self.swarms[s].len() == 1)
            .collect();
        let slot = movers[self.rng.gen_range(0..movers.len())];

        let leader_best = self.population[leader_slot].best_position.clone();
        let leader_fitness = self.population[leader_slot].best_fitness;
        let dim = self.bounds.dimension();

        // Propose the move first; commit only if the evaluation lands
        // inside the budget.
        let mut velocity = self.population[slot].velocity.clone();
        let mut position = self.population[slot].position.clone();
        for d in 0..dim {
            let b: f64 = self.rng.gen_range(0.0..=self.config.personal_coeff);
            let c: f64 = self.rng.gen_range(0.0..=self.config.informant_coeff);
            velocity[d] = self.config.velocity_coeff * velocity[d]
                + b * (self.population[slot].best_position[d] - position[d])
                + c * (leader_best[d] - position[d]);
            position[d] += velocity[d];
        }
        self.bounds.clamp(&mut position);

        let Some(fitness) = self.eval(oracle, ctx, &position)? else {
            return Ok(false);
        };
        let p = &mut self.population[slot];
        p.velocity = velocity;
        p.position = position;
        p.guide = Some((leader_best, leader_fitness));
        p.record(fitness);
        if self.swarms[s].recompute_best(&self.population) {
            self.swarms[s].dirty = true;
        }
        Ok(true)
    }

    /// Try to split one member out of a random full swarm. Returns false
    /// on budget exhaustion.
    fn hive_pass(&mut self, oracle: &mut dyn FitnessOracle, ctx: &mut EvalContext) -> Result<bool> {
        let full: Vec<usize> = (0..self.swarms.len())
            .filter(|&s| self.swarms[s].len() == self.capacity && self.swarms[s].len() >= 2)
            .collect();
        if full.is_empty() {
            return Ok(true);
        }
        let s = full[self.rng.gen_range(0..full.len())];

        let leader_slot = self.swarms[s].leader_slot();
        let others: Vec<usize> = self.swarms[s]
            .members
            .iter()
            .copied()
            .filter(|&slot| slot != leader_slot)
            .collect();
        let member = others[self.rng.gen_range(0..others.len())];

        let mid = midpoint(
            &self.population[leader_slot].best_position,
            &self.population[member].best_position,
        );
        let Some(mid_fitness) = self.eval(oracle, ctx, &mid)? else {
            return Ok(false);
        };

        if mid_fitness > self.population[member].best_fitness {
            // Split the member out into a brand-new swarm at the midpoint.
            self.swarms[s].remove_member(member);
            self.swarms[s].recompute_best(&self.population);
            self.population[member].relocate(&mid, mid_fitness);
            self.swarms.push(SubSwarm::seed(member, mid_fitness));
            debug!(swarm = s, slot = member, mid_fitness, "hived new swarm");
        } else if mid_fitness > self.population[leader_slot].best_fitness {
            // No split, but the midpoint improves the leader in place.
            self.population[leader_slot].relocate(&mid, mid_fitness);
            self.swarms[s].recompute_best(&self.population);
            self.swarms[s].dirty = true;
        }
        Ok(true)
    }

    /// Seed one new swarm from a free particle or from leader crossover.
    /// Returns false on budget exhaustion.
    fn create_pass(
        &mut self,
        oracle: &mut dyn FitnessOracle,
        ctx: &mut EvalContext,
    ) -> Result<bool> {
        let promote = self.swarms.len() < 2 || self.rng.gen_bool(0.5);
        if promote {
            if self.free.is_empty() {
                return Err(EnjambreError::FreePoolExhausted {
                    operation: "new-swarm creation",
                });
            }
            let i = self.rng.gen_range(0..self.free.len());
            let slot = self.free[i];
            let position = self.population[slot].position.clone();
            let Some(fitness) = self.eval(oracle, ctx, &position)? else {
                return Ok(false);
            };
            self.free.swap_remove(i);
            self.population[slot].record(fitness);
            self.swarms.push(SubSwarm::seed(slot, fitness));
            debug!(slot, fitness, "promoted free particle to new swarm");
        } else {
            if self.free.is_empty() {
                return Err(EnjambreError::FreePoolExhausted {
                    operation: "new-swarm creation",
                });
            }
            let (a, b) = self.crossover_parents();
            let child: Vec<f64> = (0..self.bounds.dimension())
                .map(|d| {
                    if self.rng.gen_bool(0.5) {
                        self.population[self.swarms[a].leader_slot()].best_position[d]
                    } else {
                        self.population[self.swarms[b].leader_slot()].best_position[d]
                    }
                })
                .collect();
            let Some(fitness) = self.eval(oracle, ctx, &child)? else {
                return Ok(false);
            };
            let slot = self.take_free_slot("new-swarm creation")?;
            self.population[slot].relocate(&child, fitness);
            self.swarms.push(SubSwarm::seed(slot, fitness));
            debug!(slot, fitness, "seeded new swarm from leader crossover");
        }
        Ok(true)
    }

    /// Two distinct parent swarms: the two fittest, or two at random.
    fn crossover_parents(&mut self) -> (usize, usize) {
        debug_assert!(self.swarms.len() >= 2);
        if self.rng.gen_bool(0.5) {
            let mut ranked: Vec<usize> = (0..self.swarms.len()).collect();
            ranked.sort_by(|&a, &b| {
                self.swarms[b]
                    .best_fitness
                    .partial_cmp(&self.swarms[a].best_fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            (ranked[0], ranked[1])
        } else {
            let a = self.rng.gen_range(0..self.swarms.len());
            let mut b = self.rng.gen_range(0..self.swarms.len() - 1);
            if b >= a {
                b += 1;
            }
            (a, b)
        }
    }
}

impl MultimodalOptimizer for Nmmso {
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
        self.global_best = None;
        self.generations = 0;
        self.initialized = true;

        // The run starts from a single random swarm; creation keeps the
        // count growing from there.
        if !self.create_pass(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
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

        if !self.merge_pass(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
        }
        if !self.increment_pass(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
        }
        if !self.hive_pass(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
        }
        if !self.create_pass(oracle, ctx)? {
            return Ok(StepOutcome::Exhausted);
        }

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
#[path = "nmmso_tests.rs"]
mod tests;

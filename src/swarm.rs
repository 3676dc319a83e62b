//! Sub-swarm bookkeeping: a dynamically managed group of particles
//! collectively tracking one mode of the fitness landscape.
//!
//! A sub-swarm owns an index-set into the population arena, its current
//! best member, and a derived radius. It is created by hiving or explicit
//! creation, grows by increment or absorption, and is destroyed by being
//! merged into another swarm.

use rand::prelude::*;
use tracing::debug;

use crate::bounds::SearchBounds;
use crate::geometry::euclidean;
use crate::particle::Particle;

/// A group of particle slots tracking a single mode.
#[derive(Debug, Clone)]
pub struct SubSwarm {
    /// Member slots, unique, first-come order.
    pub members: Vec<usize>,
    /// Index into `members` of the current best member.
    best_member: usize,
    /// Personal-best fitness of the best member.
    pub best_fitness: f64,
    /// Max distance from the best member to any member, or a
    /// nearest-neighbor estimate depending on the variant.
    pub radius: f64,
    /// Improved this generation; triggers a merge/hive check next cycle.
    pub dirty: bool,
}

impl SubSwarm {
    /// One-member swarm around `slot`.
    #[must_use]
    pub fn seed(slot: usize, fitness: f64) -> Self {
        Self {
            members: vec![slot],
            best_member: 0,
            best_fitness: fitness,
            radius: 0.0,
            dirty: true,
        }
    }

    /// Two-member swarm from a stagnated particle and its nearest neighbor.
    #[must_use]
    pub fn pair(a: usize, b: usize, population: &[Particle]) -> Self {
        let mut swarm = Self {
            members: vec![a, b],
            best_member: 0,
            best_fitness: f64::NEG_INFINITY,
            radius: euclidean(&population[a].position, &population[b].position),
            dirty: true,
        };
        swarm.recompute_best(population);
        swarm
    }

    /// Number of member slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the swarm has no members. Only transiently true during a
    /// merge; an empty swarm is discarded immediately.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `slot` belongs to this swarm.
    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        self.members.contains(&slot)
    }

    /// Arena slot of the current best member (the leader).
    #[must_use]
    pub fn leader_slot(&self) -> usize {
        self.members[self.best_member]
    }

    /// Personal-best position of the leader.
    #[must_use]
    pub fn leader_position<'a>(&self, population: &'a [Particle]) -> &'a [f64] {
        &population[self.leader_slot()].best_position
    }

    /// Add a member slot.
    pub fn push_member(&mut self, slot: usize) {
        debug_assert!(!self.contains(slot), "slot {slot} already a member");
        self.members.push(slot);
    }

    /// Remove a member slot. The best index is left for the caller to
    /// refresh via [`SubSwarm::recompute_best`].
    pub fn remove_member(&mut self, slot: usize) {
        if let Some(i) = self.members.iter().position(|&m| m == slot) {
            self.members.swap_remove(i);
        }
    }

    /// Refresh the best member by personal-best fitness.
    ///
    /// Returns `true` when the best fitness improved.
    pub fn recompute_best(&mut self, population: &[Particle]) -> bool {
        let previous = self.best_fitness;
        let (idx, fitness) = self
            .members
            .iter()
            .enumerate()
            .map(|(i, &slot)| (i, population[slot].best_fitness))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, f64::NEG_INFINITY));
        self.best_member = idx;
        self.best_fitness = fitness;
        fitness > previous
    }

    /// Refresh the radius as the max distance from the leader's best
    /// position to any member's current position (niching semantics).
    pub fn recompute_radius(&mut self, population: &[Particle]) {
        let leader = self.leader_position(population).to_vec();
        self.radius = self
            .members
            .iter()
            .map(|&slot| euclidean(&leader, &population[slot].position))
            .fold(0.0, f64::max);
    }

    /// Evict the worst member (by personal-best fitness, never the leader)
    /// back to an unevaluated free state. Returns the evicted slot.
    pub fn evict_worst(
        &mut self,
        population: &mut [Particle],
        bounds: &SearchBounds,
        rng: &mut impl Rng,
    ) -> usize {
        debug_assert!(self.len() > 1, "cannot evict from a singleton swarm");
        let leader = self.best_member;
        let worst = self
            .members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != leader)
            .min_by(|a, b| {
                population[*a.1]
                    .best_fitness
                    .partial_cmp(&population[*b.1].best_fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        let slot = self.members.swap_remove(worst);
        population[slot].reset(bounds, rng);
        self.recompute_best(population);
        debug!(slot, "evicted worst member over capacity");
        slot
    }
}

/// Fold `src` into `dst` and restore the capacity bound by repeatedly
/// evicting the single worst member back to the free pool.
///
/// The niching variant calls this with `capacity = usize::MAX`, where the
/// eviction loop is inert.
pub(crate) fn fold_and_evict(
    dst: &mut SubSwarm,
    src: SubSwarm,
    population: &mut [Particle],
    free: &mut Vec<usize>,
    capacity: usize,
    bounds: &SearchBounds,
    rng: &mut impl Rng,
) {
    for slot in src.members {
        dst.push_member(slot);
    }
    dst.recompute_best(population);
    while dst.len() > capacity {
        let slot = dst.evict_worst(population, bounds, rng);
        free.push(slot);
    }
}

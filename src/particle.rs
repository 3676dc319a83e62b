//! Particle state: the unit of the fixed-size population arena.
//!
//! A particle is created once at population-initialization time and never
//! destroyed. When it is recycled out of a merged or shrunk sub-swarm it is
//! reset — position and velocity re-randomized, auxiliary state cleared —
//! and returned to the free pool.

use rand::prelude::*;

use crate::bounds::SearchBounds;

/// Bounded queue of the last few fitness values, used for the stagnation
/// statistic that triggers sub-swarm formation.
#[derive(Debug, Clone, Default)]
pub struct FitnessWindow {
    values: [f64; Self::CAPACITY],
    len: usize,
    next: usize,
}

impl FitnessWindow {
    /// Window length required before the statistic is defined.
    pub const CAPACITY: usize = 3;

    /// Push a fitness observation, evicting the oldest once full.
    pub fn push(&mut self, fitness: f64) {
        self.values[self.next] = fitness;
        self.next = (self.next + 1) % Self::CAPACITY;
        self.len = (self.len + 1).min(Self::CAPACITY);
    }

    /// Whether the window holds a full set of observations.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == Self::CAPACITY
    }

    /// Sample standard deviation of the window, once full.
    #[must_use]
    pub fn stddev(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        let n = Self::CAPACITY as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let var = self
            .values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / (n - 1.0);
        Some(var.sqrt())
    }

    /// Drop all observations.
    pub fn clear(&mut self) {
        self.len = 0;
        self.next = 0;
    }
}

/// One candidate solution: position/velocity vectors, personal best, guide
/// state, and the stagnation window.
///
/// `slot` is the particle's stable identity inside the population arena and
/// must equal its actual array position after any reordering; a mismatch is
/// a caller bug, checked fatally by the optimizers.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable arena index.
    pub slot: usize,
    /// Current position in parameter space.
    pub position: Vec<f64>,
    /// Current velocity.
    pub velocity: Vec<f64>,
    /// Fitness of the current position; `NEG_INFINITY` until evaluated.
    pub fitness: f64,
    /// Personal-best position.
    pub best_position: Vec<f64>,
    /// Personal-best fitness.
    pub best_fitness: f64,
    /// Informant best used this generation, if any.
    pub guide: Option<(Vec<f64>, f64)>,
    /// Recent fitness values for the stagnation statistic.
    pub history: FitnessWindow,
}

impl Particle {
    /// Particle at a random position with a random velocity.
    ///
    /// The cognition-only walk has no social pull, so a zero initial
    /// velocity would leave a particle pinned at its own personal best.
    pub fn new(slot: usize, bounds: &SearchBounds, rng: &mut impl Rng) -> Self {
        let position = bounds.sample(rng);
        Self {
            slot,
            best_position: position.clone(),
            position,
            velocity: Self::random_velocity(bounds, rng),
            fitness: f64::NEG_INFINITY,
            best_fitness: f64::NEG_INFINITY,
            guide: None,
            history: FitnessWindow::default(),
        }
    }

    fn random_velocity(bounds: &SearchBounds, rng: &mut impl Rng) -> Vec<f64> {
        (0..bounds.dimension())
            .map(|d| {
                let half = bounds.span(d) * 0.5;
                if half > 0.0 {
                    rng.gen_range(-half..=half)
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Record an evaluation of the current position: updates the current
    /// fitness, the stagnation window, and the personal best.
    pub fn record(&mut self, fitness: f64) {
        self.fitness = fitness;
        self.history.push(fitness);
        if fitness > self.best_fitness {
            self.best_fitness = fitness;
            self.best_position.copy_from_slice(&self.position);
        }
    }

    /// Recycle the particle back to an unevaluated state at a fresh random
    /// position. Keeps the slot identity.
    pub fn reset(&mut self, bounds: &SearchBounds, rng: &mut impl Rng) {
        self.position = bounds.sample(rng);
        self.velocity = Self::random_velocity(bounds, rng);
        self.fitness = f64::NEG_INFINITY;
        self.best_position.copy_from_slice(&self.position);
        self.best_fitness = f64::NEG_INFINITY;
        self.guide = None;
        self.history.clear();
    }

    /// Overwrite position and personal best in one step, as when a leader
    /// is replaced by a midpoint candidate.
    pub fn relocate(&mut self, position: &[f64], fitness: f64) {
        self.position.copy_from_slice(position);
        self.velocity.iter_mut().for_each(|v| *v = 0.0);
        self.fitness = fitness;
        self.best_position.copy_from_slice(position);
        self.best_fitness = fitness;
        self.history.push(fitness);
    }
}

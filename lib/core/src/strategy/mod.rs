//! Phase selection strategies injected into a [`Solver`](crate::solver::Solver) backend.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assignment::Assignment;
use crate::lit::Lit;

pub use sample::SampleDistribution;

mod sample;

/// Decides the polarity of every branching variable.
///
/// The backend reports each literal it assigns and each variable it unassigns, in
/// chronological order, so stateful strategies can follow the search.
pub trait PhaseStrategy: Debug {
    /// Returns `true` to branch on the positive literal of `var`.
    fn select(&mut self, var: u32) -> bool;

    fn assign(&mut self, _lit: Lit) {}

    fn undo(&mut self, _var: u32) {}

    /// Registers a finalized sample. Only called between solves.
    fn observe(&mut self, _sample: &Assignment) {}
}

#[derive(Debug, Copy, Clone)]
pub struct FixedPhase {
    positive: bool,
}

impl FixedPhase {
    pub const fn positive() -> Self {
        Self { positive: true }
    }

    pub const fn negative() -> Self {
        Self { positive: false }
    }
}

impl PhaseStrategy for FixedPhase {
    fn select(&mut self, _var: u32) -> bool {
        self.positive
    }
}

#[derive(Debug)]
pub struct RandomPhase {
    rng: StdRng,
}

impl RandomPhase {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PhaseStrategy for RandomPhase {
    fn select(&mut self, _var: u32) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// Picks, for every variable, the phase that is under-represented among the samples
/// consistent with the current partial assignment.
#[derive(Debug)]
pub struct SampleBiasedPhase {
    distribution: SampleDistribution,
    rng: StdRng,
}

impl SampleBiasedPhase {
    pub fn new(num_vars: usize, seed: u64) -> Self {
        Self::with_distribution(SampleDistribution::new(num_vars), seed)
    }

    pub fn with_distribution(distribution: SampleDistribution, seed: u64) -> Self {
        Self {
            distribution,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn distribution(&self) -> &SampleDistribution {
        &self.distribution
    }
}

impl PhaseStrategy for SampleBiasedPhase {
    fn select(&mut self, var: u32) -> bool {
        self.distribution.random_literal(var, &mut self.rng).is_positive()
    }

    fn assign(&mut self, lit: Lit) {
        self.distribution.set(lit);
    }

    fn undo(&mut self, var: u32) {
        self.distribution.unset(var);
    }

    fn observe(&mut self, sample: &Assignment) {
        self.distribution.add_sample(sample.clone());
    }
}

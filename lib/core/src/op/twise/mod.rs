//! t-wise sampling: configurations such that every valid combination of `t` presence
//! conditions holds in at least one of them.

use log::{debug, info, warn};
use snafu::{ensure, Snafu};

use crate::assignment::Assignment;
use crate::lit::Lit;
use crate::monitor::Monitor;
use crate::oracle::Oracle;
use crate::solver::{BacktrackSolver, SolveResponse, Solver, SolverError};
use crate::strategy::SampleBiasedPhase;

pub use condition::PresenceCondition;
pub use configuration::Configuration;
pub use cover::{CombinationStatus, CoverStats, CoverStrategy, CoveringEngine, Stage};
pub use iter::{binomial, unrank, CombinationError, CombinationIter, RandomPartitionIter};

mod condition;
mod configuration;
mod cover;
mod iter;

#[derive(Debug, Snafu)]
pub enum TWiseError {
    #[snafu(context(false), display("{}", source))]
    Solver { source: SolverError },
    #[snafu(context(false), display("{}", source))]
    Combination { source: CombinationError },
    #[snafu(display(
        "Presence condition #{} uses literal {} outside of the {} variables",
        index,
        lit,
        num_vars
    ))]
    UnknownLiteral { index: usize, lit: Lit, num_vars: usize },
}

pub type Result<T, E = TWiseError> = std::result::Result<T, E>;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SampleStats {
    pub combinations: u64,
    pub cover: CoverStats,
    pub completed: usize,
    pub incomplete: usize,
    pub cancelled: bool,
}

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct Sample {
    pub configurations: Vec<Configuration>,
    /// Combinations (as indices into the presence conditions) that no model satisfies.
    pub invalid: Vec<Vec<usize>>,
    pub stats: SampleStats,
}

impl Sample {
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> + '_ {
        self.configurations.iter().map(|config| config.assignment())
    }
}

#[derive(Debug, Clone)]
pub struct TWiseSampler {
    conditions: Vec<PresenceCondition>,
    t: usize,
    seed: u64,
    strategy: CoverStrategy,
    history_capacity: usize,
}

impl TWiseSampler {
    pub fn new(conditions: Vec<PresenceCondition>, t: usize) -> Self {
        Self {
            conditions,
            t,
            seed: RandomPartitionIter::DEFAULT_SEED,
            strategy: CoverStrategy::cover_all(),
            history_capacity: 1000,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: CoverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn conditions(&self) -> &[PresenceCondition] {
        &self.conditions
    }

    /// Covers every combination with the help of `oracle`, then completes each configuration
    /// into a full model.
    ///
    /// The assumption stack of `oracle` is left untouched; its phase strategy is replaced by
    /// a sample-biased one.
    pub fn sample<S, M>(&self, oracle: &mut Oracle<S>, mut monitor: M) -> Result<Sample>
    where
        S: Solver,
        M: Monitor,
    {
        let num_vars = oracle.num_vars();
        self.check_conditions(num_vars)?;
        oracle.remember_solution_history(self.history_capacity);
        oracle.set_phase_strategy(SampleBiasedPhase::new(num_vars, self.seed));

        let engine = CoveringEngine::new(Some(&mut *oracle), num_vars, self.strategy.clone());
        let mut sample = self.run(engine, &mut monitor)?;

        if !sample.stats.cancelled {
            self.complete(oracle, &mut sample, &mut monitor)?;
        }
        info!(
            "Sampled {} configurations ({} complete) covering {} combinations, {} invalid",
            sample.configurations.len(),
            sample.stats.completed,
            sample.stats.combinations,
            sample.invalid.len()
        );
        Ok(sample)
    }

    /// Covers every combination without an oracle.
    ///
    /// Invalid combinations can only be recognized when they are contradictory in themselves,
    /// and configurations stay partial.
    pub fn sample_without_oracle<M>(&self, num_vars: usize, mut monitor: M) -> Result<Sample>
    where
        M: Monitor,
    {
        self.check_conditions(num_vars)?;
        let engine = CoveringEngine::<BacktrackSolver>::new(None, num_vars, self.strategy.clone());
        let sample = self.run(engine, &mut monitor)?;
        info!(
            "Sampled {} partial configurations covering {} combinations",
            sample.configurations.len(),
            sample.stats.combinations
        );
        Ok(sample)
    }

    fn check_conditions(&self, num_vars: usize) -> Result<()> {
        for (index, condition) in self.conditions.iter().enumerate() {
            for &lit in condition.terms().iter().flatten() {
                ensure!(
                    !lit.is_zero() && lit.var() as usize <= num_vars,
                    UnknownLiteralSnafu { index, lit, num_vars }
                );
            }
        }
        Ok(())
    }

    fn run<S>(&self, mut engine: CoveringEngine<'_, S>, monitor: &mut dyn Monitor) -> Result<Sample>
    where
        S: Solver,
    {
        let iter = RandomPartitionIter::with_seed(self.conditions.len(), self.t, self.seed)?;
        debug!(
            "Covering {} combinations of {} presence conditions (t = {})",
            iter.total(),
            self.conditions.len(),
            self.t
        );

        let mut invalid = Vec::new();
        let mut combinations = 0;
        let mut cancelled = false;
        for combination in iter {
            if monitor.is_cancelled() {
                cancelled = true;
                break;
            }
            let conditions: Vec<&PresenceCondition> = combination.iter().map(|&i| &self.conditions[i]).collect();
            let combined = PresenceCondition::combine(&conditions);
            match engine.cover(&combined, monitor)? {
                CombinationStatus::Covered => {}
                CombinationStatus::Invalid => invalid.push(combination),
                CombinationStatus::Uncovered => {
                    cancelled = true;
                    break;
                }
            }
            combinations += 1;
        }

        let (configurations, cover) = engine.finish();
        Ok(Sample {
            configurations,
            invalid,
            stats: SampleStats {
                combinations,
                cover,
                cancelled,
                ..SampleStats::default()
            },
        })
    }

    fn complete<S>(&self, oracle: &mut Oracle<S>, sample: &mut Sample, monitor: &mut dyn Monitor) -> Result<()>
    where
        S: Solver,
    {
        for config in sample.configurations.iter_mut() {
            if config.is_complete() {
                oracle.observe_sample(config.assignment());
                sample.stats.completed += 1;
                continue;
            }
            if monitor.is_cancelled() {
                sample.stats.cancelled = true;
                sample.stats.incomplete += 1;
                continue;
            }
            let model = {
                let mut scope = oracle.scope();
                for lit in config.assignment().literals() {
                    scope.push(lit);
                }
                match scope.has_solution()? {
                    SolveResponse::Sat => scope.last_model().cloned(),
                    SolveResponse::Unsat => {
                        warn!("Configuration {} cannot be completed", config);
                        None
                    }
                    SolveResponse::Timeout => {
                        monitor.report_timeout();
                        None
                    }
                }
            };
            match model {
                Some(model) => {
                    config.complete(model);
                    oracle.observe_sample(config.assignment());
                    sample.stats.completed += 1;
                }
                None => sample.stats.incomplete += 1,
            }
        }
        Ok(())
    }
}

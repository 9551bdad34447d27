use std::borrow::Cow;
use std::fmt::Display;

use rand::RngCore;

use crate::lit::Lit;
use crate::strategy::PhaseStrategy;

use super::types::*;

// `Solver` trait is object-safe.
const _: Option<&dyn Solver> = None;

/// Backend contract consumed by [`Oracle`](crate::oracle::Oracle).
///
/// A backend is a plain incremental solver: clauses are added once, and every
/// [`solve`](Solver::solve) call receives the full list of assumptions to respect.
pub trait Solver: Display {
    /// Return the signature of the solver.
    fn signature(&self) -> Cow<str>;

    fn num_vars(&self) -> usize;
    fn num_clauses(&self) -> usize;

    /// Create a new variable and return its positive literal.
    fn new_var(&mut self) -> Lit;

    /// Add a clause. Variables missing from the solver are created on the fly.
    fn add_clause(&mut self, lits: &[Lit]);

    /// Solve under the given assumptions.
    ///
    /// [`SolveResponse::Timeout`] is a regular outcome, not an error.
    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResponse>;

    /// Value of `lit` in the model found by the last SAT call.
    fn value(&self, lit: Lit) -> LitValue;

    fn set_phase_strategy(&mut self, strategy: Box<dyn PhaseStrategy>);
    fn phase_strategy_mut(&mut self) -> &mut dyn PhaseStrategy;

    /// Permute the decision order, diversifying subsequent models.
    fn shuffle_order(&mut self, rng: &mut dyn RngCore);
}

impl<S> Solver for Box<S>
where
    S: Solver + ?Sized,
{
    fn signature(&self) -> Cow<str> {
        (**self).signature()
    }

    fn num_vars(&self) -> usize {
        (**self).num_vars()
    }

    fn num_clauses(&self) -> usize {
        (**self).num_clauses()
    }

    fn new_var(&mut self) -> Lit {
        (**self).new_var()
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        (**self).add_clause(lits)
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResponse> {
        (**self).solve(assumptions)
    }

    fn value(&self, lit: Lit) -> LitValue {
        (**self).value(lit)
    }

    fn set_phase_strategy(&mut self, strategy: Box<dyn PhaseStrategy>) {
        (**self).set_phase_strategy(strategy)
    }

    fn phase_strategy_mut(&mut self) -> &mut dyn PhaseStrategy {
        (**self).phase_strategy_mut()
    }

    fn shuffle_order(&mut self, rng: &mut dyn RngCore) {
        (**self).shuffle_order(rng)
    }
}

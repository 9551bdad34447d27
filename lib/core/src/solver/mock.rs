use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use rand::RngCore;

use crate::lit::Lit;
use crate::strategy::PhaseStrategy;

use super::backtrack::BacktrackSolver;
use super::types::*;
use super::Solver;

/// Wrapper that answers [`SolveResponse::Timeout`] once the inner solver
/// has been called `timeout_after` times.
#[derive(Debug)]
pub struct MockSolver<S = BacktrackSolver> {
    inner: S,
    timeout_after: usize,
    calls: usize,
}

impl MockSolver {
    /// Backend on which every `solve()` times out.
    pub fn always_timeout() -> Self {
        Self::timeout_after(BacktrackSolver::new(), 0)
    }
}

impl<S> MockSolver<S>
where
    S: Solver,
{
    pub fn timeout_after(inner: S, calls: usize) -> Self {
        Self {
            inner,
            timeout_after: calls,
            calls: 0,
        }
    }

    pub fn num_calls(&self) -> usize {
        self.calls
    }
}

impl<S> Display for MockSolver<S>
where
    S: Solver,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockSolver({}, timeout_after={})", self.inner, self.timeout_after)
    }
}

impl<S> Solver for MockSolver<S>
where
    S: Solver,
{
    fn signature(&self) -> Cow<str> {
        "mock".into()
    }

    fn num_vars(&self) -> usize {
        self.inner.num_vars()
    }
    fn num_clauses(&self) -> usize {
        self.inner.num_clauses()
    }

    fn new_var(&mut self) -> Lit {
        self.inner.new_var()
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        self.inner.add_clause(lits)
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResponse> {
        self.calls += 1;
        if self.calls > self.timeout_after {
            return Ok(SolveResponse::Timeout);
        }
        self.inner.solve(assumptions)
    }

    fn value(&self, lit: Lit) -> LitValue {
        self.inner.value(lit)
    }

    fn set_phase_strategy(&mut self, strategy: Box<dyn PhaseStrategy>) {
        self.inner.set_phase_strategy(strategy)
    }

    fn phase_strategy_mut(&mut self) -> &mut dyn PhaseStrategy {
        self.inner.phase_strategy_mut()
    }

    fn shuffle_order(&mut self, rng: &mut dyn RngCore) {
        self.inner.shuffle_order(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_solver() -> color_eyre::Result<()> {
        let mut solver = MockSolver::timeout_after(BacktrackSolver::new(), 2);
        assert_eq!(solver.signature(), "mock");

        let a = solver.new_var();
        let b = solver.new_var();
        solver.add_clause(&[a, b]);
        assert_eq!(solver.num_clauses(), 1);

        assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
        assert_eq!(solver.solve(&[-a, -b])?, SolveResponse::Unsat);
        assert_eq!(solver.solve(&[])?, SolveResponse::Timeout);
        assert_eq!(solver.num_calls(), 3);

        Ok(())
    }

    #[test]
    fn test_always_timeout() -> color_eyre::Result<()> {
        let mut solver = MockSolver::always_timeout();
        solver.add_clause(&[Lit::new(1)]);
        assert_eq!(solver.solve(&[])?, SolveResponse::Timeout);
        Ok(())
    }
}

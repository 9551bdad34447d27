//! Incremental solver oracle: a [`Solver`] backend plus an assumption stack, the last model
//! and a bounded history of models.

use std::fmt::{Display, Formatter};

use log::trace;
use rand::RngCore;

use crate::assignment::Assignment;
use crate::cnf::Cnf;
use crate::lit::Lit;
use crate::solver::{Result, SolveResponse, Solver};
use crate::strategy::PhaseStrategy;
use crate::utils::bootstrap_solver_from_cnf;

pub use assumptions::Assumptions;
pub use history::SolutionHistory;
pub use scope::AssumptionScope;

mod assumptions;
mod history;
mod scope;

#[derive(Debug)]
pub struct Oracle<S> {
    solver: S,
    assumptions: Assumptions,
    history: SolutionHistory,
    last_model: Option<Assignment>,
}

impl<S> Oracle<S>
where
    S: Solver,
{
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            assumptions: Assumptions::new(),
            history: SolutionHistory::default(),
            last_model: None,
        }
    }

    pub fn from_cnf(mut solver: S, cnf: &Cnf) -> Self {
        bootstrap_solver_from_cnf(&mut solver, cnf);
        Self::new(solver)
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn into_solver(self) -> S {
        self.solver
    }

    pub fn num_vars(&self) -> usize {
        self.solver.num_vars()
    }

    pub fn set_phase_strategy<P>(&mut self, strategy: P)
    where
        P: PhaseStrategy + 'static,
    {
        self.solver.set_phase_strategy(Box::new(strategy));
    }

    /// Forwards a finalized sample to the current phase strategy.
    pub fn observe_sample(&mut self, sample: &Assignment) {
        self.solver.phase_strategy_mut().observe(sample);
    }

    /// Solves under the current assumption stack.
    ///
    /// On SAT the model becomes [`last_model`](Self::last_model) and enters the history.
    pub fn has_solution(&mut self) -> Result<SolveResponse> {
        let response = self.solver.solve(self.assumptions.as_slice())?;
        trace!("{} under {:?}", response, self.assumptions.as_slice());
        match response {
            SolveResponse::Sat => {
                let model = self.read_model();
                self.history.remember(&model);
                self.last_model = Some(model);
            }
            SolveResponse::Unsat | SolveResponse::Timeout => {}
        }
        Ok(response)
    }

    /// Like [`has_solution`](Self::has_solution), returning the model on SAT.
    pub fn find_solution(&mut self) -> Result<Option<Assignment>> {
        match self.has_solution()? {
            SolveResponse::Sat => Ok(self.last_model.clone()),
            SolveResponse::Unsat | SolveResponse::Timeout => Ok(None),
        }
    }

    fn read_model(&self) -> Assignment {
        let num_vars = self.solver.num_vars();
        let lits = (1..=num_vars as u32)
            .map(|var| self.solver.value(Lit::new(var as i32)).to_lit(var))
            .filter(|lit| !lit.is_zero());
        Assignment::from_lits(num_vars, lits)
    }

    pub fn shuffle_order(&mut self, rng: &mut dyn RngCore) {
        self.solver.shuffle_order(rng);
    }
}

impl<S> Oracle<S> {
    /// Model found by the most recent SAT answer.
    pub fn last_model(&self) -> Option<&Assignment> {
        self.last_model.as_ref()
    }

    /// Starts a fresh history keeping the last `capacity` models (0 disables it).
    ///
    /// Models remembered before the call are dropped: they may have been found under
    /// assumptions that no longer hold.
    pub fn remember_solution_history(&mut self, capacity: usize) {
        self.history = SolutionHistory::new(capacity);
    }

    pub fn solution_history(&self) -> &SolutionHistory {
        &self.history
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn push(&mut self, lit: Lit) {
        self.assumptions.push(lit);
    }

    pub fn pop(&mut self) -> Option<Lit> {
        self.assumptions.pop()
    }

    pub fn replace_last(&mut self, lit: Lit) {
        self.assumptions.replace_last(lit);
    }

    pub fn clear(&mut self, from: usize) {
        self.assumptions.clear(from);
    }

    pub fn as_array(&self, from: usize, to: usize) -> &[Lit] {
        self.assumptions.as_array(from, to)
    }

    pub fn size(&self) -> usize {
        self.assumptions.size()
    }

    /// Opens an [`AssumptionScope`]: everything pushed through it is popped when it drops.
    pub fn scope(&mut self) -> AssumptionScope<'_, S> {
        AssumptionScope::new(self)
    }
}

impl<S> Display for Oracle<S>
where
    S: Solver,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", tynm::type_name::<Self>(), self.solver)
    }
}

#[cfg(test)]
mod tests {
    use crate::solver::BacktrackSolver;
    use crate::strategy::FixedPhase;

    use super::*;

    fn oracle() -> Oracle<BacktrackSolver> {
        let cnf = Cnf::from([vec![1, 2], vec![-1, 3]]);
        Oracle::from_cnf(BacktrackSolver::new(), &cnf)
    }

    #[test]
    fn test_find_solution() -> color_eyre::Result<()> {
        let mut oracle = oracle();
        oracle.set_phase_strategy(FixedPhase::positive());
        let model = oracle.find_solution()?.expect("formula is satisfiable");
        assert_eq!(model, Assignment::from_lits(3, [1, 2, 3]));
        assert_eq!(oracle.last_model(), Some(&model));
        Ok(())
    }

    #[test]
    fn test_assumptions_are_respected() -> color_eyre::Result<()> {
        let mut oracle = oracle();
        oracle.push(Lit::new(1));
        oracle.push(Lit::new(-3));
        assert_eq!(oracle.has_solution()?, SolveResponse::Unsat);
        oracle.replace_last(Lit::new(3));
        assert_eq!(oracle.has_solution()?, SolveResponse::Sat);
        assert!(oracle.last_model().is_some_and(|m| m.contains_all(&[Lit::new(1), Lit::new(3)])));
        Ok(())
    }

    #[test]
    fn test_scope_pops_on_drop() -> color_eyre::Result<()> {
        let mut oracle = oracle();
        oracle.push(Lit::new(2));
        {
            let mut scope = oracle.scope();
            assert_eq!(scope.mark(), 1);
            scope.push(Lit::new(1));
            scope.push(Lit::new(-3));
            assert_eq!(scope.has_solution()?, SolveResponse::Unsat);
        }
        assert_eq!(oracle.assumptions().as_slice(), &[Lit::new(2)]);
        assert_eq!(oracle.has_solution()?, SolveResponse::Sat);
        Ok(())
    }

    #[test]
    fn test_scope_pops_on_early_return() {
        fn bail(oracle: &mut Oracle<BacktrackSolver>, stop: Option<()>) -> Option<()> {
            let mut scope = oracle.scope();
            scope.push(Lit::new(1));
            stop?;
            scope.push(Lit::new(2));
            Some(())
        }
        let mut oracle = oracle();
        assert!(bail(&mut oracle, None).is_none());
        assert_eq!(oracle.size(), 0);
    }

    #[test]
    fn test_solution_history() -> color_eyre::Result<()> {
        let mut oracle = oracle();
        oracle.remember_solution_history(2);
        for lit in [1, -1, 3] {
            let mut scope = oracle.scope();
            scope.push(Lit::new(lit));
            scope.has_solution()?;
        }
        assert_eq!(oracle.solution_history().len(), 2);
        let newest = oracle.solution_history().iter().next().expect("history is not empty");
        assert!(newest.contains(Lit::new(3)));
        Ok(())
    }

    #[test]
    fn test_history_restarts() -> color_eyre::Result<()> {
        let mut oracle = oracle();
        oracle.remember_solution_history(10);
        oracle.push(Lit::new(1));
        oracle.has_solution()?;
        oracle.pop();
        assert_eq!(oracle.solution_history().len(), 1);

        oracle.push(Lit::new(-1));
        oracle.remember_solution_history(10);
        assert!(oracle.solution_history().is_empty());
        oracle.has_solution()?;
        let assumptions = oracle.assumptions().as_slice().to_vec();
        assert_eq!(oracle.solution_history().consistent_with(&assumptions).count(), 1);
        Ok(())
    }
}

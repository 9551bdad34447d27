//! Atomic sets: maximal groups of literals that take the same value in every model.
//!
//! The first group holds the core and dead literals (true in every model); each further
//! group is an equivalence class of the remaining variables, seeded by its smallest variable.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::lit::Lit;
use crate::monitor::Monitor;
use crate::oracle::Oracle;
use crate::solver::{Result, SolveResponse, Solver};
use crate::strategy::{FixedPhase, RandomPhase};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Mark {
    Unprocessed,
    Tentative,
    Done,
}

#[derive(Debug, Clone)]
pub struct AtomicSetAnalysis {
    variables: Option<Vec<u32>>,
    history_capacity: usize,
    seed: u64,
}

impl AtomicSetAnalysis {
    pub fn new() -> Self {
        Self {
            variables: None,
            history_capacity: 1000,
            seed: 42,
        }
    }

    /// Restricts the analysis to the given variables; all others are never reported.
    pub fn with_variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        self.variables = Some(variables.into_iter().collect());
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Computes the atomic sets of the formula loaded into `oracle`.
    ///
    /// Returns an empty list if the formula is unsatisfiable (or the very first solve times
    /// out). On cancellation, the groups completed so far are returned. The assumption stack
    /// is left as it was found; the oracle keeps a random phase strategy afterwards.
    pub fn analyze<S, M>(&self, oracle: &mut Oracle<S>, mut monitor: M) -> Result<Vec<Vec<Lit>>>
    where
        S: Solver,
        M: Monitor,
    {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut result = Vec::new();
        let mut solver = oracle.scope();
        let base = solver.mark();
        solver.remember_solution_history(self.history_capacity);

        solver.set_phase_strategy(FixedPhase::positive());
        let model1 = match solver.has_solution()? {
            SolveResponse::Sat => solver.last_model().cloned(),
            SolveResponse::Unsat => None,
            SolveResponse::Timeout => {
                monitor.report_timeout();
                None
            }
        };
        let Some(model1) = model1 else {
            info!("No model found, formula has no atomic sets");
            return Ok(result);
        };

        // Literals on which the two extremal models agree are the only core/dead candidates.
        solver.set_phase_strategy(FixedPhase::negative());
        let mut candidate = model1.clone();
        match solver.has_solution()? {
            SolveResponse::Sat => {
                if let Some(model2) = solver.last_model() {
                    candidate.reset_conflicts(model2);
                }
            }
            SolveResponse::Unsat => {}
            SolveResponse::Timeout => monitor.report_timeout(),
        }
        solver.set_phase_strategy(FixedPhase::positive());

        let num_vars = model1.len();
        let mut done = vec![Mark::Unprocessed; num_vars];
        if let Some(variables) = &self.variables {
            let mut inside = vec![false; num_vars];
            for &var in variables {
                if var >= 1 && var as usize <= num_vars {
                    inside[var as usize - 1] = true;
                }
            }
            for (i, &inside) in inside.iter().enumerate() {
                if !inside {
                    done[i] = Mark::Done;
                    candidate.unset(i as u32 + 1);
                }
            }
        }

        for i in 0..num_vars {
            let x = candidate[i];
            if x.is_zero() {
                continue;
            }
            if monitor.is_cancelled() {
                let size = solver.size();
                result.push(solver.as_array(base, size).to_vec());
                return Ok(result);
            }
            solver.push(-x);
            match solver.has_solution()? {
                SolveResponse::Unsat => {
                    done[i] = Mark::Done;
                    solver.replace_last(x);
                }
                SolveResponse::Timeout => {
                    solver.pop();
                    monitor.report_timeout();
                }
                SolveResponse::Sat => {
                    solver.pop();
                    if let Some(model) = solver.last_model() {
                        candidate.reset_conflicts(model);
                    }
                    solver.shuffle_order(&mut rng);
                }
            }
        }
        let fixed_size = solver.size();
        result.push(solver.as_array(base, fixed_size).to_vec());
        debug!("Found {} core/dead literals", fixed_size - base);

        solver.set_phase_strategy(RandomPhase::new(rng.gen()));

        'seeds: for i in 0..num_vars {
            if done[i] != Mark::Unprocessed {
                continue;
            }
            if monitor.is_cancelled() {
                break;
            }
            done[i] = Mark::Done;

            // Positions of `working` that are still set agree with every model seen under the
            // current hypothesis.
            let mut working = model1.clone();
            let mx0 = model1[i];
            let mut tentative = Vec::new();
            solver.push(mx0);

            for j in (i + 1)..num_vars {
                let my0 = working[j];
                if my0.is_zero() || done[j] != Mark::Unprocessed {
                    continue;
                }
                let separated = solver
                    .solution_history()
                    .consistent_with(solver.as_array(0, base))
                    .any(|solution| (solution[i] == mx0) != (solution[j] == my0));
                if separated {
                    continue;
                }
                if monitor.is_cancelled() {
                    break 'seeds;
                }

                solver.push(-my0);
                match solver.has_solution()? {
                    SolveResponse::Unsat => {
                        done[j] = Mark::Tentative;
                        tentative.push(j);
                    }
                    SolveResponse::Timeout => monitor.report_timeout(),
                    SolveResponse::Sat => {
                        if let Some(model) = solver.last_model() {
                            working.reset_conflicts(model);
                        }
                        solver.shuffle_order(&mut rng);
                    }
                }
                solver.pop();
            }

            if monitor.is_cancelled() {
                break;
            }
            solver.replace_last(-mx0);
            match solver.has_solution()? {
                SolveResponse::Unsat => {
                    // The seed is entailed, and so is every literal it implies.
                    solver.replace_last(mx0);
                    for j in tentative.drain(..) {
                        done[j] = Mark::Done;
                        solver.push(model1[j]);
                    }
                }
                SolveResponse::Timeout => {
                    for j in tentative.drain(..) {
                        done[j] = Mark::Unprocessed;
                    }
                    monitor.report_timeout();
                }
                SolveResponse::Sat => {
                    if let Some(model) = solver.last_model() {
                        working = model.clone();
                    }
                }
            }

            // Confirm the converse implication for every tentative member.
            for j in tentative {
                let my0 = working[j];
                if my0.is_zero() || my0 == model1[j] {
                    done[j] = Mark::Unprocessed;
                    continue;
                }
                if monitor.is_cancelled() {
                    break 'seeds;
                }
                solver.push(-my0);
                match solver.has_solution()? {
                    SolveResponse::Unsat => {
                        done[j] = Mark::Done;
                        solver.replace_last(my0);
                    }
                    SolveResponse::Timeout => {
                        done[j] = Mark::Unprocessed;
                        solver.pop();
                        monitor.report_timeout();
                    }
                    SolveResponse::Sat => {
                        done[j] = Mark::Unprocessed;
                        if let Some(model) = solver.last_model() {
                            working.reset_conflicts(model);
                        }
                        solver.shuffle_order(&mut rng);
                        solver.pop();
                    }
                }
            }

            let size = solver.size();
            let group = solver.as_array(fixed_size, size).to_vec();
            debug!("Atomic set #{} seeded by x{}: {:?}", result.len(), i + 1, group);
            result.push(group);
            solver.clear(fixed_size);
        }

        info!(
            "Found {} atomic sets ({} core/dead literals)",
            result.len(),
            result.first().map_or(0, |core| core.len())
        );
        Ok(result)
    }
}

impl Default for AtomicSetAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use itertools::Itertools;

    use crate::cnf::Cnf;
    use crate::monitor::{CountingMonitor, NullMonitor};
    use crate::solver::mock::MockSolver;
    use crate::solver::BacktrackSolver;

    use super::*;

    fn analyze(cnf: &Cnf) -> Vec<Vec<Lit>> {
        let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), cnf);
        let sets = AtomicSetAnalysis::new().analyze(&mut oracle, NullMonitor).unwrap();
        assert_eq!(oracle.size(), 0, "assumptions leaked");
        sets
    }

    fn vars(set: &[Lit]) -> Vec<u32> {
        set.iter().map(|lit| lit.var()).sorted().collect()
    }

    #[test_log::test]
    fn test_no_core_no_groups() {
        let cnf = Cnf::from([vec![1, 2], vec![-1, 3]]);
        let sets = analyze(&cnf);
        assert!(sets[0].is_empty());
        assert_eq!(sets.len(), 4);
        for set in &sets[1..] {
            assert_eq!(set.len(), 1);
        }
    }

    #[test_log::test]
    fn test_equivalence_is_grouped() {
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1]]);
        let sets = analyze(&cnf);
        assert!(sets[0].is_empty());
        assert_eq!(sets.len(), 2);
        assert_eq!(vars(&sets[1]), vec![1, 2]);
        // Both literals share a polarity: they are equal in every model.
        assert_eq!(sets[1][0].sign(), sets[1][1].sign());
    }

    #[test_log::test]
    fn test_anti_equivalence_is_grouped() {
        // x1 <-> not x2
        let cnf = Cnf::from([vec![1, 2], vec![-1, -2]]);
        let sets = analyze(&cnf);
        assert_eq!(sets.len(), 2);
        assert_eq!(vars(&sets[1]), vec![1, 2]);
        assert_ne!(sets[1][0].sign(), sets[1][1].sign());
    }

    #[test_log::test]
    fn test_core_and_dead() {
        // x1 is core, x2 is dead, x3 <-> x1 makes x3 core too, x4 is free.
        let cnf = Cnf::from([vec![1], vec![-2], vec![-1, 3], vec![-3, 1], vec![4, -4]]);
        let sets = analyze(&cnf);
        let core: HashSet<i32> = sets[0].iter().map(|lit| lit.get()).collect();
        assert_eq!(core, HashSet::from([1, -2, 3]));
        assert_eq!(sets.len(), 2);
        assert_eq!(vars(&sets[1]), vec![4]);
    }

    #[test_log::test]
    fn test_unsat_formula_has_no_sets() {
        let cnf = Cnf::from([vec![1], vec![-1]]);
        assert!(analyze(&cnf).is_empty());
    }

    #[test_log::test]
    fn test_variable_universe() {
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1], vec![3]]);
        let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), &cnf);
        let sets = AtomicSetAnalysis::new()
            .with_variables([1, 3])
            .analyze(&mut oracle, NullMonitor)
            .unwrap();
        assert_eq!(sets[0], vec![Lit::new(3)]);
        assert_eq!(sets.len(), 2);
        assert_eq!(vars(&sets[1]), vec![1]);
    }

    #[test_log::test]
    fn test_always_timeout() {
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1]]);
        let mut oracle = Oracle::from_cnf(MockSolver::always_timeout(), &cnf);
        let mut monitor = CountingMonitor::new();
        let sets = AtomicSetAnalysis::new().analyze(&mut oracle, &mut monitor).unwrap();
        assert!(sets.is_empty());
        assert_eq!(monitor.timeouts(), 1);
        assert_eq!(oracle.size(), 0);
    }

    #[test_log::test]
    fn test_cancelled_before_grouping() {
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1], vec![3]]);
        let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), &cnf);
        let mut monitor = CountingMonitor::new();
        monitor.cancel_handle().cancel();
        let sets = AtomicSetAnalysis::new().analyze(&mut oracle, &mut monitor).unwrap();
        // Only the (empty) partial core group survives.
        assert_eq!(sets, vec![Vec::<Lit>::new()]);
        assert_eq!(oracle.size(), 0);
    }

    #[test_log::test]
    fn test_existing_assumptions_are_kept() {
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1]]);
        let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), &cnf);
        oracle.push(Lit::new(1));
        let sets = AtomicSetAnalysis::new().analyze(&mut oracle, NullMonitor).unwrap();
        // Outer assumptions act as unit clauses.
        let core: HashSet<i32> = sets[0].iter().map(|lit| lit.get()).collect();
        assert_eq!(core, HashSet::from([1, 2]));
        assert_eq!(oracle.assumptions().as_slice(), &[Lit::new(1)]);
    }

    #[test_log::test]
    fn test_repeated_analysis_on_same_oracle() {
        // x1 -> x2, x2 -> (x1 or x3): under not x3 the two are equivalent.
        let cnf = Cnf::from([vec![-1, 2], vec![-2, 1, 3]]);
        let partition = |sets: &[Vec<Lit>]| sets.iter().map(|set| vars(set)).sorted().collect_vec();

        let mut fresh = Oracle::from_cnf(BacktrackSolver::new(), &cnf);
        fresh.push(Lit::new(-3));
        let expected = AtomicSetAnalysis::new().analyze(&mut fresh, NullMonitor).unwrap();
        assert_eq!(expected[0], vec![Lit::new(-3)]);
        assert_eq!(partition(&expected), vec![vec![1, 2], vec![3]]);

        let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), &cnf);
        AtomicSetAnalysis::new().analyze(&mut oracle, NullMonitor).unwrap();
        assert!(!oracle.solution_history().is_empty());
        oracle.push(Lit::new(-3));
        let sets = AtomicSetAnalysis::new().analyze(&mut oracle, NullMonitor).unwrap();
        assert_eq!(partition(&sets), partition(&expected));
    }
}

use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::time::Instant;

use log::trace;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::lit::Lit;
use crate::strategy::{FixedPhase, PhaseStrategy};

use super::options::Options;
use super::types::*;
use super::Solver;

#[derive(Debug, Copy, Clone)]
struct Watcher {
    clause: usize,
    /// Some literal of the clause; if it is true, the clause need not be inspected.
    blocker: Lit,
}

/// Index of the watch list for `lit`.
fn watch_index(lit: Lit) -> usize {
    2 * lit.index() + lit.is_positive() as usize
}

fn value_of(values: &[Option<bool>], lit: Lit) -> Option<bool> {
    values[lit.index()].map(|v| v == lit.is_positive())
}

#[derive(Debug)]
struct Level {
    start: usize,
    decision: Lit,
    flipped: bool,
}

/// Default in-crate backend: chronological backtracking with two-watched-literal propagation.
///
/// Every `solve()` starts from an empty trail, assigns the assumptions at the root level and
/// then branches on the first unassigned variable of the decision order, with the polarity
/// chosen by the injected [`PhaseStrategy`].
pub struct BacktrackSolver {
    clauses: Vec<Vec<Lit>>,
    /// Clauses of length two or more, watched on their first two literals.
    watches: Vec<Vec<Watcher>>,
    units: Vec<Lit>,
    has_empty_clause: bool,
    values: Vec<Option<bool>>,
    model: Option<Vec<bool>>,
    trail: Vec<Lit>,
    qhead: usize,
    levels: Vec<Level>,
    order: Vec<u32>,
    strategy: Box<dyn PhaseStrategy>,
    options: Options,
    // Statistics
    decisions: usize,
    conflicts: usize,
    solves: usize,
}

impl BacktrackSolver {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            clauses: Vec::new(),
            watches: Vec::new(),
            units: Vec::new(),
            has_empty_clause: false,
            values: Vec::new(),
            model: None,
            trail: Vec::new(),
            qhead: 0,
            levels: Vec::new(),
            order: Vec::new(),
            strategy: Box::new(FixedPhase::negative()),
            options,
            decisions: 0,
            conflicts: 0,
            solves: 0,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn num_decisions(&self) -> usize {
        self.decisions
    }
    pub fn num_conflicts(&self) -> usize {
        self.conflicts
    }
    pub fn num_solves(&self) -> usize {
        self.solves
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        value_of(&self.values, lit)
    }

    /// Assigns `lit` unless already assigned; returns `false` on a conflicting assignment.
    fn enqueue(&mut self, lit: Lit) -> bool {
        match self.lit_value(lit) {
            Some(value) => value,
            None => {
                self.values[lit.index()] = Some(lit.is_positive());
                self.trail.push(lit);
                self.strategy.assign(lit);
                true
            }
        }
    }

    fn undo_until(&mut self, size: usize) {
        while self.trail.len() > size {
            if let Some(lit) = self.trail.pop() {
                self.values[lit.index()] = None;
                self.strategy.undo(lit.var());
            }
        }
        self.qhead = self.qhead.min(self.trail.len());
    }

    /// Propagates every literal enqueued since the last call.
    /// Returns `false` if some clause is falsified.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let false_lit = -self.trail[self.qhead];
            self.qhead += 1;

            let mut watchers = std::mem::take(&mut self.watches[watch_index(false_lit)]);
            let mut conflict = false;
            let mut i = 0;
            let mut j = 0;
            while i < watchers.len() {
                let w = watchers[i];
                i += 1;
                if value_of(&self.values, w.blocker) == Some(true) {
                    watchers[j] = w;
                    j += 1;
                    continue;
                }

                // Keep the false literal at position 1.
                let clause = &mut self.clauses[w.clause];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }
                let first = clause[0];
                let kept = Watcher {
                    clause: w.clause,
                    blocker: first,
                };
                if value_of(&self.values, first) == Some(true) {
                    watchers[j] = kept;
                    j += 1;
                    continue;
                }

                if let Some(k) = (2..clause.len()).find(|&k| value_of(&self.values, clause[k]) != Some(false)) {
                    clause.swap(1, k);
                    let lit = clause[1];
                    self.watches[watch_index(lit)].push(kept);
                    continue;
                }

                // Unit or conflicting under the current trail.
                watchers[j] = kept;
                j += 1;
                if value_of(&self.values, first) == Some(false) {
                    conflict = true;
                    while i < watchers.len() {
                        watchers[j] = watchers[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.enqueue(first);
                }
            }
            watchers.truncate(j);
            self.watches[watch_index(false_lit)] = watchers;
            if conflict {
                return false;
            }
        }
        true
    }

    /// Flips the deepest decision that was not flipped yet.
    /// Returns `false` once the search space under the root level is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(level) = self.levels.pop() {
            self.undo_until(level.start);
            if !level.flipped {
                let lit = -level.decision;
                self.levels.push(Level {
                    start: self.trail.len(),
                    decision: lit,
                    flipped: true,
                });
                self.enqueue(lit);
                return true;
            }
        }
        false
    }

    fn pick_branching_variable(&self) -> Option<u32> {
        self.order.iter().copied().find(|&var| self.values[var as usize - 1].is_none())
    }

    fn search(&mut self, assumptions: &[Lit]) -> SolveResponse {
        let time_start = Instant::now();
        let mut conflicts = 0;

        if self.has_empty_clause {
            return SolveResponse::Unsat;
        }
        for i in 0..self.units.len() {
            if !self.enqueue(self.units[i]) {
                return SolveResponse::Unsat;
            }
        }
        for &lit in assumptions {
            if !self.enqueue(lit) {
                return SolveResponse::Unsat;
            }
        }

        loop {
            if !self.propagate() {
                self.conflicts += 1;
                conflicts += 1;
                if matches!(self.options.conflict_limit, Some(limit) if conflicts > limit) {
                    return SolveResponse::Timeout;
                }
                if !self.backtrack() {
                    return SolveResponse::Unsat;
                }
            } else if let Some(var) = self.pick_branching_variable() {
                self.decisions += 1;
                let lit = Lit::new(var as i32);
                let lit = if self.strategy.select(var) { lit } else { -lit };
                self.levels.push(Level {
                    start: self.trail.len(),
                    decision: lit,
                    flipped: false,
                });
                self.enqueue(lit);
            } else {
                self.model = Some(self.values.iter().map(|v| v.unwrap_or(false)).collect());
                return SolveResponse::Sat;
            }

            if matches!(self.options.time_limit, Some(limit) if time_start.elapsed() > limit) {
                return SolveResponse::Timeout;
            }
        }
    }
}

impl Default for BacktrackSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for BacktrackSolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktrackSolver")
            .field("num_vars", &self.values.len())
            .field("num_clauses", &self.clauses.len())
            .field("num_units", &self.units.len())
            .field("strategy", &self.strategy)
            .field("options", &self.options)
            .finish()
    }
}

impl Display for BacktrackSolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(vars={}, clauses={})",
            tynm::type_name::<Self>(),
            self.num_vars(),
            self.num_clauses()
        )
    }
}

impl Solver for BacktrackSolver {
    fn signature(&self) -> Cow<str> {
        "backtrack".into()
    }

    fn num_vars(&self) -> usize {
        self.values.len()
    }
    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn new_var(&mut self) -> Lit {
        self.values.push(None);
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        let var = self.values.len() as u32;
        self.order.push(var);
        Lit::new(var as i32)
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        debug_assert!(lits.iter().all(|lit| !lit.is_zero()), "clause must not contain 0");
        let max_var = lits.iter().map(|lit| lit.var() as usize).max().unwrap_or(0);
        while self.num_vars() < max_var {
            self.new_var();
        }
        debug_assert!(self.trail.is_empty());

        let mut clause = lits.to_vec();
        clause.sort_by_key(|lit| (lit.var(), lit.get()));
        clause.dedup();
        match clause.len() {
            0 => self.has_empty_clause = true,
            1 => self.units.push(clause[0]),
            _ => {
                let index = self.clauses.len();
                for k in 0..2 {
                    let watcher = Watcher {
                        clause: index,
                        blocker: clause[1 - k],
                    };
                    self.watches[watch_index(clause[k])].push(watcher);
                }
            }
        }
        self.clauses.push(clause);
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<SolveResponse> {
        for &lit in assumptions {
            if lit.is_zero() {
                return ZeroLiteralSnafu.fail();
            }
            if lit.var() as usize > self.num_vars() {
                return UnknownVariableSnafu {
                    lit,
                    num_vars: self.num_vars(),
                }
                .fail();
            }
        }

        self.solves += 1;
        self.model = None;
        let response = self.search(assumptions);
        self.levels.clear();
        self.undo_until(0);
        trace!(
            "solve #{} under {} assumptions: {} (decisions={}, conflicts={})",
            self.solves,
            assumptions.len(),
            response,
            self.decisions,
            self.conflicts
        );
        Ok(response)
    }

    fn value(&self, lit: Lit) -> LitValue {
        match &self.model {
            Some(model) => match model.get(lit.index()) {
                Some(&value) if value == lit.is_positive() => LitValue::True,
                Some(_) => LitValue::False,
                None => LitValue::DontCare,
            },
            None => LitValue::DontCare,
        }
    }

    fn set_phase_strategy(&mut self, strategy: Box<dyn PhaseStrategy>) {
        debug_assert!(self.trail.is_empty());
        self.strategy = strategy;
    }

    fn phase_strategy_mut(&mut self) -> &mut dyn PhaseStrategy {
        self.strategy.as_mut()
    }

    fn shuffle_order(&mut self, rng: &mut dyn RngCore) {
        self.order.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn lits(xs: &[i32]) -> Vec<Lit> {
        xs.iter().map(|&x| Lit::new(x)).collect()
    }

    #[test]
    fn test_backtrack_solver() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        assert_eq!(solver.signature(), "backtrack");

        let a = solver.new_var();
        let b = solver.new_var();
        let c = solver.new_var();
        let d = solver.new_var();
        assert_eq!(solver.num_vars(), 4);

        // Adding [(a or b) and (c or d) and not(a and b) and not(c and d)]
        solver.add_clause(&[a, b]);
        solver.add_clause(&[c, d]);
        solver.add_clause(&[-a, -b]);
        solver.add_clause(&[-c, -d]);

        assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
        assert_ne!(solver.value(a), solver.value(b));
        assert_ne!(solver.value(c), solver.value(d));

        // Assuming both a and b to be true
        assert_eq!(solver.solve(&[a, b])?, SolveResponse::Unsat);

        // Assumptions are per call
        assert_eq!(solver.solve(&[a])?, SolveResponse::Sat);
        assert_eq!(solver.value(a), LitValue::True);
        assert_eq!(solver.value(b), LitValue::False);

        Ok(())
    }

    #[test]
    fn test_phase_strategy_is_honoured() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[1, 2, 3]));

        solver.set_phase_strategy(Box::new(FixedPhase::positive()));
        assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
        assert!((1..=3).all(|v| solver.value(Lit::new(v)) == LitValue::True));

        solver.set_phase_strategy(Box::new(FixedPhase::negative()));
        assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
        let positives = (1..=3).filter(|&v| solver.value(Lit::new(v)) == LitValue::True).count();
        assert_eq!(positives, 1);
        Ok(())
    }

    #[test]
    fn test_unsat_formula() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[1, 2]));
        solver.add_clause(&lits(&[1, -2]));
        solver.add_clause(&lits(&[-1, 2]));
        solver.add_clause(&lits(&[-1, -2]));
        assert_eq!(solver.solve(&[])?, SolveResponse::Unsat);
        assert_eq!(solver.value(Lit::new(1)), LitValue::DontCare);
        Ok(())
    }

    #[test]
    fn test_empty_clause_is_unsat() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        solver.new_var();
        solver.add_clause(&[]);
        assert_eq!(solver.solve(&[])?, SolveResponse::Unsat);
        Ok(())
    }

    #[test]
    fn test_unknown_assumption_is_an_error() {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[1, 2]));
        assert!(matches!(
            solver.solve(&lits(&[3])),
            Err(SolverError::UnknownVariable { num_vars: 2, .. })
        ));
    }

    #[test]
    fn test_conflict_limit_times_out() -> color_eyre::Result<()> {
        // Pigeonhole: 3 pigeons, 2 holes. Needs several conflicts to refute.
        let mut solver = BacktrackSolver::with_options(Options {
            conflict_limit: Some(0),
            ..Options::default()
        });
        let var = |p: i32, h: i32| Lit::new(p * 2 + h + 1);
        for p in 0..3 {
            solver.add_clause(&[var(p, 0), var(p, 1)]);
        }
        for h in 0..2 {
            for p in 0..3 {
                for q in (p + 1)..3 {
                    solver.add_clause(&[-var(p, h), -var(q, h)]);
                }
            }
        }
        assert_eq!(solver.solve(&[])?, SolveResponse::Timeout);
        Ok(())
    }

    #[test]
    fn test_zero_assumption_is_an_error() {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[1, 2]));
        assert!(matches!(solver.solve(&[Lit::ZERO]), Err(SolverError::ZeroLiteral)));
    }

    #[test]
    fn test_long_implication_chain_propagates() -> color_eyre::Result<()> {
        let n = 300;
        let mut solver = BacktrackSolver::new();
        for x in 1..n {
            solver.add_clause(&lits(&[-x, x + 1]));
        }
        // A wide clause that only becomes unit at the end of the chain.
        solver.add_clause(&(1..=n).map(|x| Lit::new(-x)).collect::<Vec<_>>());

        assert_eq!(solver.solve(&lits(&[1]))?, SolveResponse::Unsat);
        assert_eq!(solver.num_decisions(), 0);

        assert_eq!(solver.solve(&lits(&[-1]))?, SolveResponse::Sat);
        assert_eq!(solver.value(Lit::new(1)), LitValue::False);
        assert_eq!(solver.value(Lit::new(n)), LitValue::False);
        Ok(())
    }

    #[test]
    fn test_units_and_duplicates() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[3]));
        solver.add_clause(&lits(&[-3, 1, 1]));
        solver.add_clause(&lits(&[2, -2]));
        assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
        assert_eq!(solver.value(Lit::new(1)), LitValue::True);
        assert_eq!(solver.value(Lit::new(3)), LitValue::True);
        assert_eq!(solver.solve(&lits(&[-1]))?, SolveResponse::Unsat);
        assert_eq!(solver.num_clauses(), 3);
        Ok(())
    }

    #[test]
    fn test_shuffle_order_keeps_solutions_valid() -> color_eyre::Result<()> {
        let mut solver = BacktrackSolver::new();
        solver.add_clause(&lits(&[-1, 2]));
        solver.add_clause(&lits(&[-2, 3]));
        solver.add_clause(&lits(&[1, 4]));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5 {
            solver.shuffle_order(&mut rng);
            assert_eq!(solver.solve(&[])?, SolveResponse::Sat);
            let v = |x: i32| solver.value(Lit::new(x)) == LitValue::True;
            assert!(!v(1) || v(2));
            assert!(!v(2) || v(3));
            assert!(v(1) || v(4));
        }
        Ok(())
    }
}

//! Covering cascade: decides for one combined presence condition whether it is already
//! covered, invalid, or which configuration to extend (or create) for it.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::ops::ControlFlow;

use log::trace;

use crate::lit::Lit;
use crate::monitor::Monitor;
use crate::oracle::Oracle;
use crate::solver::{Result, SolveResponse, Solver};

use super::condition::PresenceCondition;
use super::configuration::Configuration;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CombinationStatus {
    Covered,
    Invalid,
    /// Not decided, the run was cancelled.
    Uncovered,
}

impl Display for CombinationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CombinationStatus::Covered => write!(f, "COVERED"),
            CombinationStatus::Invalid => write!(f, "INVALID"),
            CombinationStatus::Uncovered => write!(f, "UNCOVERED"),
        }
    }
}

/// One step of the cascade. Stages needing an oracle are skipped without one;
/// [`Stage::ExtendNoSat`] runs only without one.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    /// Some configuration already contains a term.
    IsCovered,
    /// A remembered model contains a term together with a candidate configuration.
    ReuseSolution,
    /// Drops terms that are unsatisfiable with the formula; INVALID if none remain.
    RemoveInvalid,
    /// Extends the first candidate whose union with the term is satisfiable.
    ExtendSat,
    /// Extends the first candidate without consulting the oracle.
    ExtendNoSat,
}

impl Stage {
    pub fn needs_oracle(self) -> bool {
        matches!(self, Stage::ReuseSolution | Stage::RemoveInvalid | Stage::ExtendSat)
    }
}

/// Ordered list of stages tried for every combination, before falling back to a new
/// configuration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CoverStrategy {
    stages: Vec<Stage>,
}

impl CoverStrategy {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn cover_all() -> Self {
        Self::new(vec![
            Stage::IsCovered,
            Stage::ReuseSolution,
            Stage::RemoveInvalid,
            Stage::ExtendSat,
            Stage::ExtendNoSat,
        ])
    }

    pub fn cover_sat() -> Self {
        Self::new(vec![Stage::IsCovered, Stage::RemoveInvalid, Stage::ExtendSat, Stage::ExtendNoSat])
    }

    pub fn cover_no_sat() -> Self {
        Self::new(vec![Stage::IsCovered, Stage::ExtendNoSat])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for CoverStrategy {
    fn default() -> Self {
        Self::cover_all()
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CoverStats {
    pub already_covered: usize,
    pub reused_solutions: usize,
    pub sat_extensions: usize,
    pub no_sat_extensions: usize,
    pub new_configurations: usize,
    pub invalid: usize,
    pub solver_calls: usize,
    pub timeouts: usize,
}

/// Terms of the combination under consideration and the (term, configuration) pairs
/// worth extending, most assigned configurations first.
#[derive(Debug)]
struct Pending {
    terms: Vec<Vec<Lit>>,
    candidates: Vec<(usize, usize)>,
    gathered: bool,
}

impl Pending {
    fn gather(&mut self, configurations: &[Configuration]) {
        if self.gathered {
            return;
        }
        self.gathered = true;
        for (t, term) in self.terms.iter().enumerate() {
            for (c, config) in configurations.iter().enumerate() {
                if config.accepts(term) {
                    self.candidates.push((t, c));
                }
            }
        }
        self.candidates
            .sort_by_key(|&(_, c)| Reverse(configurations[c].assignment().count_assigned()));
    }

    fn retain_terms(&mut self, keep: &[bool]) {
        let mut remap = vec![None; self.terms.len()];
        let mut kept = 0;
        for (i, &keep) in keep.iter().enumerate() {
            if keep {
                remap[i] = Some(kept);
                kept += 1;
            }
        }
        let mut i = 0;
        self.terms.retain(|_| {
            i += 1;
            keep[i - 1]
        });
        self.candidates = self
            .candidates
            .iter()
            .filter_map(|&(t, c)| remap[t].map(|t| (t, c)))
            .collect();
    }
}

pub struct CoveringEngine<'o, S> {
    oracle: Option<&'o mut Oracle<S>>,
    num_vars: usize,
    strategy: CoverStrategy,
    configurations: Vec<Configuration>,
    invalid_terms: HashSet<Vec<Lit>>,
    stats: CoverStats,
}

impl<'o, S> CoveringEngine<'o, S>
where
    S: Solver,
{
    pub fn new(oracle: Option<&'o mut Oracle<S>>, num_vars: usize, strategy: CoverStrategy) -> Self {
        Self {
            oracle,
            num_vars,
            strategy,
            configurations: Vec::new(),
            invalid_terms: HashSet::new(),
            stats: CoverStats::default(),
        }
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn stats(&self) -> &CoverStats {
        &self.stats
    }

    pub fn finish(self) -> (Vec<Configuration>, CoverStats) {
        (self.configurations, self.stats)
    }

    /// Runs the cascade for one combined presence condition.
    ///
    /// Never returns [`CombinationStatus::Uncovered`] unless `monitor` is cancelled.
    pub fn cover(&mut self, condition: &PresenceCondition, monitor: &mut dyn Monitor) -> Result<CombinationStatus> {
        if condition.is_empty() {
            self.stats.invalid += 1;
            return Ok(CombinationStatus::Invalid);
        }
        let mut pending = Pending {
            terms: condition.terms().to_vec(),
            candidates: Vec::new(),
            gathered: false,
        };

        for i in 0..self.strategy.stages.len() {
            let stage = self.strategy.stages[i];
            let flow = match stage {
                Stage::IsCovered => self.is_covered(&pending),
                Stage::ReuseSolution => self.reuse_solution(&mut pending),
                Stage::RemoveInvalid => self.remove_invalid(&mut pending, monitor)?,
                Stage::ExtendSat => self.extend_sat(&mut pending, monitor)?,
                Stage::ExtendNoSat => self.extend_no_sat(&mut pending),
            };
            if let ControlFlow::Break(status) = flow {
                trace!("{} resolved by {:?}: {}", condition, stage, status);
                return Ok(status);
            }
        }

        if monitor.is_cancelled() {
            return Ok(CombinationStatus::Uncovered);
        }
        self.configurations
            .push(Configuration::new(self.num_vars, &pending.terms[0]));
        self.stats.new_configurations += 1;
        trace!("{} covered by new configuration #{}", condition, self.configurations.len() - 1);
        Ok(CombinationStatus::Covered)
    }

    fn is_covered(&mut self, pending: &Pending) -> ControlFlow<CombinationStatus> {
        let found = self
            .configurations
            .iter_mut()
            .find(|config| pending.terms.iter().any(|term| config.covers(term)));
        match found {
            Some(config) => {
                config.mark_covered();
                self.stats.already_covered += 1;
                ControlFlow::Break(CombinationStatus::Covered)
            }
            None => ControlFlow::Continue(()),
        }
    }

    fn reuse_solution(&mut self, pending: &mut Pending) -> ControlFlow<CombinationStatus> {
        let Some(oracle) = self.oracle.as_deref() else {
            return ControlFlow::Continue(());
        };
        pending.gather(&self.configurations);
        let assumptions = oracle.assumptions().as_slice();
        let found = pending.candidates.iter().copied().find(|&(t, c)| {
            let term = &pending.terms[t];
            let config = &self.configurations[c];
            oracle
                .solution_history()
                .consistent_with(assumptions)
                .any(|solution| solution.contains_all(term) && config.is_contained_in(solution))
        });
        match found {
            Some((t, c)) => {
                self.configurations[c].extend(&pending.terms[t]);
                self.stats.reused_solutions += 1;
                ControlFlow::Break(CombinationStatus::Covered)
            }
            None => ControlFlow::Continue(()),
        }
    }

    fn remove_invalid(
        &mut self,
        pending: &mut Pending,
        monitor: &mut dyn Monitor,
    ) -> Result<ControlFlow<CombinationStatus>> {
        let Some(oracle) = self.oracle.as_deref_mut() else {
            return Ok(ControlFlow::Continue(()));
        };

        let mut keep = Vec::with_capacity(pending.terms.len());
        for term in pending.terms.iter() {
            let valid = if self.invalid_terms.contains(term) {
                false
            } else if oracle
                .solution_history()
                .consistent_with(oracle.assumptions().as_slice())
                .any(|solution| solution.contains_all(term))
            {
                true
            } else {
                if monitor.is_cancelled() {
                    return Ok(ControlFlow::Break(CombinationStatus::Uncovered));
                }
                let mut scope = oracle.scope();
                for &lit in term {
                    scope.push(lit);
                }
                self.stats.solver_calls += 1;
                match scope.has_solution()? {
                    SolveResponse::Sat => true,
                    SolveResponse::Unsat => {
                        self.invalid_terms.insert(term.clone());
                        false
                    }
                    SolveResponse::Timeout => {
                        // Undecided terms are kept; only proven-unsatisfiable ones are dropped.
                        self.stats.timeouts += 1;
                        monitor.report_timeout();
                        true
                    }
                }
            };
            keep.push(valid);
        }

        if keep.iter().all(|&valid| !valid) {
            self.stats.invalid += 1;
            return Ok(ControlFlow::Break(CombinationStatus::Invalid));
        }
        pending.retain_terms(&keep);
        Ok(ControlFlow::Continue(()))
    }

    fn extend_sat(
        &mut self,
        pending: &mut Pending,
        monitor: &mut dyn Monitor,
    ) -> Result<ControlFlow<CombinationStatus>> {
        pending.gather(&self.configurations);
        let Some(oracle) = self.oracle.as_deref_mut() else {
            return Ok(ControlFlow::Continue(()));
        };

        for &(t, c) in pending.candidates.iter() {
            if monitor.is_cancelled() {
                return Ok(ControlFlow::Break(CombinationStatus::Uncovered));
            }
            let term = &pending.terms[t];
            let response = {
                let mut scope = oracle.scope();
                for lit in self.configurations[c].assignment().literals() {
                    scope.push(lit);
                }
                for &lit in term {
                    scope.push(lit);
                }
                self.stats.solver_calls += 1;
                scope.has_solution()?
            };
            match response {
                SolveResponse::Sat => {
                    self.configurations[c].extend(term);
                    self.stats.sat_extensions += 1;
                    return Ok(ControlFlow::Break(CombinationStatus::Covered));
                }
                SolveResponse::Unsat => {}
                SolveResponse::Timeout => {
                    self.stats.timeouts += 1;
                    monitor.report_timeout();
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn extend_no_sat(&mut self, pending: &mut Pending) -> ControlFlow<CombinationStatus> {
        if self.oracle.is_some() {
            return ControlFlow::Continue(());
        }
        pending.gather(&self.configurations);
        match pending.candidates.first() {
            Some(&(t, c)) => {
                self.configurations[c].extend(&pending.terms[t]);
                self.stats.no_sat_extensions += 1;
                ControlFlow::Break(CombinationStatus::Covered)
            }
            None => ControlFlow::Continue(()),
        }
    }
}

use std::fmt::{Display, Formatter};

use crate::assignment::Assignment;
use crate::lit::Lit;

/// Partial assignment grown by the covering engine, plus the number of combinations it covers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Configuration {
    assignment: Assignment,
    covered: usize,
}

impl Configuration {
    pub fn new(num_vars: usize, term: &[Lit]) -> Self {
        Self {
            assignment: Assignment::from_lits(num_vars, term.iter().copied()),
            covered: 1,
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    /// Number of combinations this configuration was selected for.
    pub fn covered(&self) -> usize {
        self.covered
    }

    pub fn is_complete(&self) -> bool {
        self.assignment.is_complete()
    }

    pub fn covers(&self, term: &[Lit]) -> bool {
        self.assignment.contains_all(term)
    }

    /// A term can be added unless it contradicts an assigned literal.
    pub fn accepts(&self, term: &[Lit]) -> bool {
        !self.assignment.has_conflicts(term)
    }

    /// Returns `true` if every assigned literal is set in `model`.
    pub fn is_contained_in(&self, model: &Assignment) -> bool {
        self.assignment.literals().all(|lit| model.contains(lit))
    }

    pub(crate) fn mark_covered(&mut self) {
        self.covered += 1;
    }

    pub(crate) fn extend(&mut self, term: &[Lit]) {
        debug_assert!(self.accepts(term));
        for &lit in term {
            self.assignment.set(lit);
        }
        self.mark_covered();
    }

    /// Replaces the assignment by a model that contains it.
    pub(crate) fn complete(&mut self, model: Assignment) {
        debug_assert!(self.is_contained_in(&model));
        self.assignment = model;
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (covers {})", self.assignment, self.covered)
    }
}

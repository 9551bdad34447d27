use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use std::slice::Iter;

use clause::Clause;

use crate::assignment::Assignment;

pub mod clause;
mod parsing;

pub use parsing::CnfError;

/// Clause set over the variables `1..=max_var`.
#[derive(Debug, Clone)]
pub struct Cnf {
    pub max_var: usize,
    pub clauses: Vec<Clause>,
}

impl Cnf {
    pub fn iter(&self) -> Iter<'_, Clause> {
        self.clauses.iter()
    }
}

impl Cnf {
    pub fn new() -> Self {
        Self::with_vars(0)
    }

    /// Empty formula over `num_vars` (unconstrained) variables.
    pub fn with_vars(num_vars: usize) -> Self {
        Self {
            max_var: num_vars,
            clauses: Vec::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CnfError> {
        parsing::parse_cnf_file(path)
    }

    pub fn from_dimacs(text: &str) -> Result<Self, CnfError> {
        parsing::parse_cnf_str(text)
    }

    pub fn num_vars(&self) -> usize {
        self.max_var
    }

    /// Checks a total assignment against every clause.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.clauses.iter().all(|clause| clause.is_satisfied_by(assignment))
    }
}

impl Default for Cnf {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> From<I> for Cnf
where
    I: IntoIterator,
    I::Item: Into<Clause>,
{
    fn from(iter: I) -> Self {
        let mut cnf = Self::new();
        for clause in iter.into_iter() {
            cnf.add_clause(clause)
        }
        cnf
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for clause in self.clauses.iter() {
            list.entry(&format_args!("{}", clause));
        }
        list.finish()
    }
}

impl Cnf {
    pub fn add_clause(&mut self, clause: impl Into<Clause>) {
        let clause = clause.into();
        self.max_var = self.max_var.max(clause.max_var());
        self.clauses.push(clause);
    }
}

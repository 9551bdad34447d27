use std::fmt::{Display, Formatter};
use std::slice::Iter;

use itertools::Itertools;

use crate::assignment::Assignment;
use crate::lit::Lit;

#[derive(Debug, Clone)]
pub struct Clause {
    pub lits: Vec<Lit>,
}

impl Clause {
    pub fn iter(&self) -> Iter<'_, Lit> {
        self.lits.iter()
    }
}

impl Clause {
    /// Note: the empty clause is allowed and is never satisfied.
    pub fn new(lits: Vec<Lit>) -> Self {
        Clause { lits }
    }

    pub fn max_var(&self) -> usize {
        self.lits.iter().map(|lit| lit.var() as usize).max().unwrap_or(0)
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.lits.iter().any(|&lit| assignment.contains(lit))
    }
}

impl<I> From<I> for Clause
where
    I: IntoIterator,
    I::Item: Into<Lit>,
{
    fn from(iter: I) -> Self {
        Self::new(iter.into_iter().map_into::<Lit>().collect())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for lit in self.lits.iter() {
            list.entry(&format_args!("{}", lit));
        }
        list.finish()
    }
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        if self.lits.len() != other.lits.len() {
            return false;
        }
        let lhs = self.lits.iter().copied().sorted_unstable();
        let rhs = other.lits.iter().copied().sorted_unstable();
        itertools::equal(lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_eq_ignores_order() {
        assert_eq!(Clause::from([1, -2, 3]), Clause::from([3, 1, -2]));
        assert_ne!(Clause::from([1, 2]), Clause::from([1, -2]));
    }

    #[test]
    fn test_clause_satisfied() {
        let clause = Clause::from([1, -2]);
        assert!(clause.is_satisfied_by(&Assignment::from_lits(2, [-1, -2])));
        assert!(!clause.is_satisfied_by(&Assignment::from_lits(2, [-1, 2])));
        assert!(!Clause::new(vec![]).is_satisfied_by(&Assignment::from_lits(1, [1])));
    }
}

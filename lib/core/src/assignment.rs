use std::fmt::{Display, Formatter};
use std::ops::Index;

use itertools::Itertools;

use crate::lit::Lit;

/// Fixed-size partial assignment: position `i` holds either a literal of variable `i + 1`
/// or [`Lit::ZERO`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Assignment {
    lits: Vec<Lit>,
}

impl Assignment {
    pub fn new(num_vars: usize) -> Self {
        Self {
            lits: vec![Lit::ZERO; num_vars],
        }
    }

    /// Builds an assignment over `num_vars` variables from an arbitrary list of literals.
    ///
    /// Later literals override earlier ones on the same variable.
    pub fn from_lits<I>(num_vars: usize, lits: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Lit>,
    {
        let mut assignment = Self::new(num_vars);
        for lit in lits {
            assignment.set(lit.into());
        }
        assignment
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn as_slice(&self) -> &[Lit] {
        &self.lits
    }

    pub fn get(&self, index: usize) -> Lit {
        self.lits[index]
    }

    pub fn set(&mut self, lit: Lit) {
        debug_assert!(!lit.is_zero());
        self.lits[lit.index()] = lit;
    }

    pub fn unset(&mut self, var: u32) {
        self.lits[var as usize - 1] = Lit::ZERO;
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.lits.get(lit.index()) == Some(&lit)
    }

    pub fn contains_all(&self, lits: &[Lit]) -> bool {
        lits.iter().all(|&lit| self.contains(lit))
    }

    /// Returns `true` if the negation of some literal in `lits` is set.
    pub fn has_conflicts(&self, lits: &[Lit]) -> bool {
        lits.iter().any(|&lit| self.contains(-lit))
    }

    pub fn count_assigned(&self) -> usize {
        self.lits.iter().filter(|lit| !lit.is_zero()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.lits.iter().all(|lit| !lit.is_zero())
    }

    /// Assigned literals in variable order.
    pub fn literals(&self) -> impl Iterator<Item = Lit> + '_ {
        self.lits.iter().copied().filter(|lit| !lit.is_zero())
    }

    /// Zeroes every position on which `self` and `other` disagree.
    ///
    /// Positions beyond the length of `other` are left untouched.
    pub fn reset_conflicts(&mut self, other: &Assignment) {
        for (mine, theirs) in self.lits.iter_mut().zip(other.lits.iter()) {
            if *mine != *theirs {
                *mine = Lit::ZERO;
            }
        }
    }
}

impl Index<usize> for Assignment {
    type Output = Lit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.lits[index]
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.literals().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_contains() {
        let mut a = Assignment::new(3);
        a.set(Lit::new(2));
        a.set(Lit::new(-3));
        assert!(a.contains(Lit::new(2)));
        assert!(a.contains(Lit::new(-3)));
        assert!(!a.contains(Lit::new(-2)));
        assert!(a.contains_all(&[Lit::new(2), Lit::new(-3)]));
        assert!(a.has_conflicts(&[Lit::new(1), Lit::new(3)]));
        assert!(!a.has_conflicts(&[Lit::new(1), Lit::new(2)]));
        assert_eq!(a.count_assigned(), 2);
        assert!(!a.is_complete());
        a.unset(2);
        assert_eq!(a.get(1), Lit::ZERO);
    }

    #[test]
    fn test_reset_conflicts() {
        let mut a = Assignment::from_lits(4, [1, -2, 3, 4]);
        let b = Assignment::from_lits(4, [1, 2, 3, -4]);
        a.reset_conflicts(&b);
        assert_eq!(a.as_slice(), &[Lit::new(1), Lit::ZERO, Lit::new(3), Lit::ZERO]);
    }

    #[test]
    fn test_display() {
        let a = Assignment::from_lits(3, [-1, 3]);
        assert_eq!(a.to_string(), "[-1, 3]");
    }
}

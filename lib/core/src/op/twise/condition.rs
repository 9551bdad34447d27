use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::assignment::Assignment;
use crate::lit::Lit;

/// Disjunction of conjunctive terms.
///
/// A configuration satisfies the condition when it contains every literal of at least one term.
/// A condition without terms can never be satisfied.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PresenceCondition {
    terms: Vec<Vec<Lit>>,
}

impl PresenceCondition {
    pub fn new<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator,
        T::Item: Into<Lit>,
    {
        let terms = terms
            .into_iter()
            .filter_map(|term| normalize(term.into_iter().map_into::<Lit>()))
            .collect();
        Self { terms }
    }

    /// Condition requiring a single literal.
    pub fn from_lit(lit: Lit) -> Self {
        Self { terms: vec![vec![lit]] }
    }

    pub fn terms(&self) -> &[Vec<Lit>] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.terms.iter().any(|term| assignment.contains_all(term))
    }

    /// Conjunction of `conditions`, as the cartesian product of their terms.
    ///
    /// Contradictory products are dropped, so an empty result means the combination can
    /// never be satisfied.
    pub fn combine(conditions: &[&PresenceCondition]) -> Self {
        let mut terms: Vec<Vec<Lit>> = vec![Vec::new()];
        for condition in conditions {
            terms = terms
                .iter()
                .cartesian_product(condition.terms.iter())
                .filter_map(|(a, b)| normalize(a.iter().chain(b.iter()).copied()))
                .unique()
                .collect();
            if terms.is_empty() {
                break;
            }
        }
        Self { terms }
    }
}

/// Sorts and deduplicates a term; `None` if it contains both polarities of a variable.
fn normalize<I>(lits: I) -> Option<Vec<Lit>>
where
    I: Iterator<Item = Lit>,
{
    let mut term = lits.collect_vec();
    term.sort_by_key(|lit| (lit.var(), lit.get()));
    term.dedup();
    if term.windows(2).any(|w| w[0].var() == w[1].var()) {
        None
    } else {
        Some(term)
    }
}

impl Display for PresenceCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.terms
                .iter()
                .map(|term| format!("({})", term.iter().join(" & ")))
                .join(" | ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Lit> {
        values.iter().map(|&x| Lit::new(x)).collect()
    }

    #[test]
    fn test_new_normalizes_terms() {
        let pc = PresenceCondition::new([vec![3, 1, 3], vec![2, -2]]);
        assert_eq!(pc.terms(), &[lits(&[1, 3])]);
    }

    #[test]
    fn test_combine_is_product() {
        let a = PresenceCondition::new([vec![1], vec![2]]);
        let b = PresenceCondition::new([vec![3], vec![-1]]);
        let combined = PresenceCondition::combine(&[&a, &b]);
        assert_eq!(combined.terms(), &[lits(&[1, 3]), lits(&[2, 3]), lits(&[-1, 2])]);
    }

    #[test]
    fn test_combine_contradiction() {
        let a = PresenceCondition::from_lit(Lit::new(1));
        let b = PresenceCondition::from_lit(Lit::new(-1));
        assert!(PresenceCondition::combine(&[&a, &b]).is_empty());
        assert_eq!(PresenceCondition::combine(&[]).terms(), &[Vec::<Lit>::new()]);
    }

    #[test]
    fn test_is_satisfied_by() {
        let pc = PresenceCondition::new([vec![1, 2], vec![-3]]);
        assert!(pc.is_satisfied_by(&Assignment::from_lits(3, [1, 2, 3])));
        assert!(pc.is_satisfied_by(&Assignment::from_lits(3, [-3])));
        assert!(!pc.is_satisfied_by(&Assignment::from_lits(3, [1, 3])));
        assert_eq!(pc.to_string(), "(1 & 2) | (-3)");
    }
}

use std::collections::VecDeque;

use crate::assignment::Assignment;
use crate::lit::Lit;

/// Ring buffer of the most recent models, newest first.
#[derive(Debug, Default, Clone)]
pub struct SolutionHistory {
    capacity: usize,
    solutions: VecDeque<Assignment>,
}

impl SolutionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            solutions: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.solutions.truncate(capacity);
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn remember(&mut self, solution: &Assignment) {
        if self.capacity == 0 {
            return;
        }
        if self.solutions.len() == self.capacity {
            self.solutions.pop_back();
        }
        self.solutions.push_front(solution.clone());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> + '_ {
        self.solutions.iter()
    }

    /// Remembered models that satisfy every literal of `lits`.
    pub fn consistent_with<'a>(&'a self, lits: &'a [Lit]) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.solutions.iter().filter(move |solution| solution.contains_all(lits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer() {
        let mut history = SolutionHistory::new(2);
        for x in 1..=3 {
            history.remember(&Assignment::from_lits(3, [x]));
        }
        let kept: Vec<String> = history.iter().map(|s| s.to_string()).collect();
        assert_eq!(kept, vec!["[3]", "[2]"]);
        history.set_capacity(1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_consistent_with() {
        let mut history = SolutionHistory::new(4);
        history.remember(&Assignment::from_lits(2, [1, 2]));
        history.remember(&Assignment::from_lits(2, [-1, 2]));
        let lits = [Lit::new(-1)];
        let kept: Vec<String> = history.consistent_with(&lits).map(|s| s.to_string()).collect();
        assert_eq!(kept, vec!["[-1, 2]"]);
    }

    #[test]
    fn test_disabled_history() {
        let mut history = SolutionHistory::default();
        history.remember(&Assignment::from_lits(1, [1]));
        assert!(history.is_empty());
    }
}

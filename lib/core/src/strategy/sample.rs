use rand::Rng;

use crate::assignment::Assignment;
use crate::lit::Lit;

/// Phase occurrence counts over a set of samples, filtered by the literals currently set.
///
/// Samples live in `order`; the first `active` entries are those consistent with every
/// literal on the `levels` stack (a sample is consistent with a literal if it does not
/// contain its negation).
#[derive(Debug, Clone)]
pub struct SampleDistribution {
    num_vars: usize,
    samples: Vec<Assignment>,
    order: Vec<usize>,
    active: usize,
    levels: Vec<(u32, usize)>,
}

impl SampleDistribution {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            samples: Vec::new(),
            order: Vec::new(),
            active: 0,
            levels: Vec::new(),
        }
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn num_active(&self) -> usize {
        self.active
    }

    pub fn add_sample(&mut self, sample: Assignment) {
        debug_assert_eq!(sample.len(), self.num_vars);
        debug_assert!(self.levels.is_empty(), "samples must be added outside of a search");
        self.order.push(self.samples.len());
        self.samples.push(sample);
        self.active = self.order.len();
    }

    pub fn set(&mut self, lit: Lit) {
        let mut end = 0;
        for i in 0..self.active {
            let sample = &self.samples[self.order[i]];
            if !sample.contains(-lit) {
                self.order.swap(i, end);
                end += 1;
            }
        }
        self.levels.push((lit.var(), self.active));
        self.active = end;
    }

    pub fn unset(&mut self, var: u32) {
        while let Some((v, previous)) = self.levels.pop() {
            self.active = previous;
            if v == var {
                break;
            }
        }
    }

    /// Number of active samples with the positive and the negative phase of `var`.
    pub fn counts(&self, var: u32) -> (usize, usize) {
        let pos = Lit::new(var as i32);
        let mut positive = 0;
        let mut negative = 0;
        for &i in &self.order[..self.active] {
            let sample = &self.samples[i];
            if sample.contains(pos) {
                positive += 1;
            } else if sample.contains(-pos) {
                negative += 1;
            }
        }
        (positive, negative)
    }

    pub fn random_literal<R>(&self, var: u32, rng: &mut R) -> Lit
    where
        R: Rng + ?Sized,
    {
        let (positive, negative) = self.counts(var);
        let p = (negative + 1) as f64 / (positive + negative + 2) as f64;
        let lit = Lit::new(var as i32);
        if rng.gen_bool(p) {
            lit
        } else {
            -lit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distribution() -> SampleDistribution {
        let mut dist = SampleDistribution::new(3);
        dist.add_sample(Assignment::from_lits(3, [1, 2, 3]));
        dist.add_sample(Assignment::from_lits(3, [1, -2, -3]));
        dist.add_sample(Assignment::from_lits(3, [-1, -2, 3]));
        dist
    }

    #[test]
    fn test_counts() {
        let dist = distribution();
        assert_eq!(dist.counts(1), (2, 1));
        assert_eq!(dist.counts(2), (1, 2));
    }

    #[test]
    fn test_set_filters_and_unset_restores() {
        let mut dist = distribution();
        dist.set(Lit::new(1));
        assert_eq!(dist.num_active(), 2);
        assert_eq!(dist.counts(3), (1, 1));
        dist.set(Lit::new(-2));
        assert_eq!(dist.num_active(), 1);
        assert_eq!(dist.counts(3), (0, 1));
        dist.unset(2);
        assert_eq!(dist.num_active(), 2);
        dist.unset(1);
        assert_eq!(dist.num_active(), 3);
        assert_eq!(dist.counts(1), (2, 1));
    }

    #[test]
    fn test_partial_samples_are_consistent_with_everything() {
        let mut dist = SampleDistribution::new(2);
        dist.add_sample(Assignment::from_lits(2, [1]));
        dist.set(Lit::new(-2));
        assert_eq!(dist.num_active(), 1);
        assert_eq!(dist.counts(2), (0, 0));
    }
}

use std::ops::{Deref, DerefMut};

use super::Oracle;

/// Guard over an [`Oracle`] that restores the assumption stack to its size at creation
/// time when dropped, whatever path the holder leaves by.
pub struct AssumptionScope<'a, S> {
    oracle: &'a mut Oracle<S>,
    mark: usize,
}

impl<'a, S> AssumptionScope<'a, S> {
    pub(super) fn new(oracle: &'a mut Oracle<S>) -> Self {
        let mark = oracle.assumptions.size();
        Self { oracle, mark }
    }

    /// Stack size when the scope was entered.
    pub fn mark(&self) -> usize {
        self.mark
    }
}

impl<S> Deref for AssumptionScope<'_, S> {
    type Target = Oracle<S>;

    fn deref(&self) -> &Self::Target {
        self.oracle
    }
}

impl<S> DerefMut for AssumptionScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.oracle
    }
}

impl<S> Drop for AssumptionScope<'_, S> {
    fn drop(&mut self) {
        self.oracle.assumptions.clear(self.mark);
    }
}

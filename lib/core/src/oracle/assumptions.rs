use crate::lit::Lit;

/// Stack of literals every subsequent `solve()` must respect.
#[derive(Debug, Default, Clone)]
pub struct Assumptions {
    lits: Vec<Lit>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lit: Lit) {
        debug_assert!(!lit.is_zero());
        self.lits.push(lit);
    }

    pub fn pop(&mut self) -> Option<Lit> {
        self.lits.pop()
    }

    /// Swaps the top of the stack for `lit`.
    pub fn replace_last(&mut self, lit: Lit) {
        match self.lits.last_mut() {
            Some(last) => *last = lit,
            None => panic!("replace_last on an empty assumption stack"),
        }
    }

    /// Drops every entry from position `from` upwards.
    pub fn clear(&mut self, from: usize) {
        self.lits.truncate(from);
    }

    pub fn as_array(&self, from: usize, to: usize) -> &[Lit] {
        &self.lits[from..to]
    }

    pub fn as_slice(&self) -> &[Lit] {
        &self.lits
    }

    pub fn size(&self) -> usize {
        self.lits.len()
    }
}

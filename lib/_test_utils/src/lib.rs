//! Brute-force reference checks for tests, independent of any solver.

use itertools::Itertools;
use quickcheck::{Arbitrary, Gen};

use sat_anatomy_core::assignment::Assignment;
use sat_anatomy_core::cnf::clause::Clause;
use sat_anatomy_core::cnf::Cnf;
use sat_anatomy_core::lit::Lit;

/// Every total assignment satisfying `cnf`, in binary counting order.
pub fn all_models(cnf: &Cnf) -> Vec<Assignment> {
    let num_vars = cnf.num_vars();
    assert!(num_vars <= 20, "too many variables for brute force: {}", num_vars);
    (0u32..1 << num_vars)
        .map(|bits| {
            let lits = (0..num_vars).map(|i| Lit::from_index(i, bits & (1 << i) != 0));
            Assignment::from_lits(num_vars, lits)
        })
        .filter(|assignment| cnf.is_satisfied_by(assignment))
        .collect()
}

/// Returns `true` if some model contains all of `lits`.
pub fn is_satisfiable_with(cnf: &Cnf, lits: &[Lit]) -> bool {
    all_models(cnf).iter().any(|model| model.contains_all(lits))
}

/// Returns `true` if `lit` holds in every model.
pub fn is_entailed(cnf: &Cnf, lit: Lit) -> bool {
    all_models(cnf).iter().all(|model| model.contains(lit))
}

/// Returns `true` if `a` and `b` take the same value in every model.
pub fn are_equivalent(cnf: &Cnf, a: Lit, b: Lit) -> bool {
    all_models(cnf).iter().all(|model| model.contains(a) == model.contains(b))
}

/// Small random formula for property tests.
#[derive(Debug, Clone)]
pub struct SmallCnf(pub Cnf);

impl Arbitrary for SmallCnf {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_vars = 1 + usize::arbitrary(g) % 6;
        let num_clauses = usize::arbitrary(g) % 8;
        let mut cnf = Cnf::with_vars(num_vars);
        for _ in 0..num_clauses {
            let len = 1 + usize::arbitrary(g) % 3;
            let lits = (0..len)
                .map(|_| Lit::from_index(usize::arbitrary(g) % num_vars, bool::arbitrary(g)))
                .unique()
                .collect_vec();
            cnf.add_clause(Clause::new(lits));
        }
        SmallCnf(cnf)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let cnf = self.0.clone();
        Box::new((0..cnf.clauses.len()).map(move |i| {
            let mut smaller = Cnf::with_vars(cnf.num_vars());
            for (j, clause) in cnf.clauses.iter().enumerate() {
                if i != j {
                    smaller.add_clause(clause.clone());
                }
            }
            SmallCnf(smaller)
        }))
    }
}

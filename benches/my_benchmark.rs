use criterion::{criterion_group, criterion_main, Criterion};

use sat_anatomy::core::cnf::Cnf;
use sat_anatomy::core::lit::Lit;
use sat_anatomy::core::monitor::NullMonitor;
use sat_anatomy::core::op::atomic_sets::AtomicSetAnalysis;
use sat_anatomy::core::op::twise::{PresenceCondition, TWiseSampler};
use sat_anatomy::core::oracle::Oracle;
use sat_anatomy::core::solver::BacktrackSolver;

/// Chain of `n` equivalences `x_{2i-1} <-> x_{2i}` linked by implications.
fn ladder(n: i32) -> Cnf {
    let mut cnf = Cnf::new();
    for i in 1..=n {
        let (a, b) = (2 * i - 1, 2 * i);
        cnf.add_clause([-a, b]);
        cnf.add_clause([-b, a]);
        if i < n {
            cnf.add_clause([-b, b + 1]);
        }
    }
    cnf
}

fn atomic_sets(cnf: &Cnf) {
    let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), cnf);
    AtomicSetAnalysis::new().analyze(&mut oracle, NullMonitor).unwrap();
}

fn twise(cnf: &Cnf) {
    let conditions = (1..=cnf.num_vars() as i32)
        .flat_map(|v| [Lit::new(v), Lit::new(-v)])
        .map(PresenceCondition::from_lit)
        .collect();
    let mut oracle = Oracle::from_cnf(BacktrackSolver::new(), cnf);
    TWiseSampler::new(conditions, 2).sample(&mut oracle, NullMonitor).unwrap();
}

fn my_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("Analyses");

    let cnf = ladder(8);
    group.bench_with_input("Atomic sets (ladder 8)", &cnf, |b, cnf| b.iter(|| atomic_sets(cnf)));
    group.bench_with_input("Pairwise sample (ladder 8)", &cnf, |b, cnf| b.iter(|| twise(cnf)));

    group.finish();
}

criterion_group!(benches, my_benches);
criterion_main!(benches);

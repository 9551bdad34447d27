use log::info;

use crate::cnf::Cnf;
use crate::solver::Solver;

pub fn bootstrap_solver_from_cnf<S>(solver: &mut S, cnf: &Cnf)
where
    S: Solver + ?Sized,
{
    if cnf.max_var > solver.num_vars() {
        info!("Adding {} variables...", cnf.max_var - solver.num_vars());
        for _ in solver.num_vars()..cnf.max_var {
            solver.new_var();
        }
    }

    info!("Adding {} clauses...", cnf.clauses.len());
    for clause in cnf.clauses.iter() {
        solver.add_clause(&clause.lits)
    }
}

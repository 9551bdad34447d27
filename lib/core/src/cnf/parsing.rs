use std::fs;
use std::path::Path;

use dimacs::{parse_dimacs, Instance, Sign};
use snafu::{ResultExt, Snafu};

use crate::cnf::clause::Clause;
use crate::cnf::Cnf;
use crate::lit::Lit;

#[derive(Debug, Snafu)]
pub enum CnfError {
    #[snafu(display("Could not read CNF from '{}': {}", path, source))]
    Io { path: String, source: std::io::Error },

    #[snafu(display("Could not parse DIMACS: {:?}", error))]
    Parse { error: dimacs::ParseError },

    #[snafu(display("DIMACS instance is not a CNF"))]
    NotCnf,
}

pub fn parse_cnf_file<P: AsRef<Path>>(path: P) -> Result<Cnf, CnfError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).context(IoSnafu {
        path: path.display().to_string(),
    })?;
    parse_cnf_str(&text)
}

pub fn parse_cnf_str(text: &str) -> Result<Cnf, CnfError> {
    let instance = parse_dimacs(text).map_err(|error| CnfError::Parse { error })?;
    match instance {
        Instance::Cnf { num_vars, clauses } => {
            let mut cnf = Cnf::with_vars(num_vars as usize);
            for c in clauses.iter() {
                let lits = c
                    .lits()
                    .iter()
                    .map(|x| {
                        let v = x.var().to_u64() as i32;
                        match x.sign() {
                            Sign::Pos => Lit::new(v),
                            Sign::Neg => Lit::new(-v),
                        }
                    })
                    .collect();
                cnf.add_clause(Clause::new(lits));
            }
            Ok(cnf)
        }
        _ => NotCnfSnafu.fail(),
    }
}

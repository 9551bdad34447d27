use std::fmt::{Display, Formatter};

use snafu::Snafu;

use crate::lit::Lit;

pub type Result<T, E = SolverError> = std::result::Result<T, E>;

/// Backend failures. Unlike [`SolveResponse::Timeout`], these abort the analysis.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SolverError {
    #[snafu(display("Literal {} refers to an unknown variable (solver has {} variables)", lit, num_vars))]
    UnknownVariable { lit: Lit, num_vars: usize },

    #[snafu(display("Literal must be non-zero"))]
    ZeroLiteral,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SolveResponse {
    Sat,
    Unsat,
    Timeout,
}

impl Display for SolveResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use SolveResponse::*;
        match self {
            Sat => write!(f, "SAT"),
            Unsat => write!(f, "UNSAT"),
            Timeout => write!(f, "TIMEOUT"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LitValue {
    True,
    False,
    DontCare,
}

impl LitValue {
    /// Literal carrying this value for `var`, or [`Lit::ZERO`] for [`LitValue::DontCare`].
    pub fn to_lit(self, var: u32) -> Lit {
        use LitValue::*;
        match self {
            True => Lit::new(var as i32),
            False => Lit::new(-(var as i32)),
            DontCare => Lit::ZERO,
        }
    }
}

impl Display for LitValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use LitValue::*;
        match self {
            True => write!(f, "1"),
            False => write!(f, "0"),
            DontCare => write!(f, "X"),
        }
    }
}

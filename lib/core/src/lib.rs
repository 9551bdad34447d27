pub mod assignment;
pub mod cnf;
pub mod lit;
pub mod monitor;
pub mod op;
pub mod oracle;
pub mod solver;
pub mod strategy;
pub mod utils;

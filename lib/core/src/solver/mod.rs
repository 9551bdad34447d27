pub use api::*;
pub use backtrack::BacktrackSolver;
pub use options::*;
pub use types::*;

mod api;
mod backtrack;
pub mod mock;
mod options;
mod types;

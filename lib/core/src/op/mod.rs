pub mod atomic_sets;
pub mod twise;

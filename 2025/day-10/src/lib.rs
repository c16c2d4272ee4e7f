pub mod batch;
pub mod config;
pub mod error;
pub mod machine;
pub mod parser;
pub mod part1;
pub mod part2;
pub mod solver;

pub use config::SolverConfig;
pub use error::Error;
pub use machine::{Counters, Lights, Machine, Solution, StateVector};

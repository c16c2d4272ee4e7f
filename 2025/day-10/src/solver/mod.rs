pub mod lights;
pub mod linear;
pub mod search;

use crate::config::{AdditiveStrategy, SolverConfig};
use crate::error::Error;
use crate::machine::{Counters, Lights, Machine, Solution};

/// Fewest presses that light up the indicator diagram.
pub fn boot(machine: &Machine<Lights>) -> Result<Solution, Error> {
    lights::solve(machine)
}

/// Fewest presses that bring every joltage counter to its requirement.
pub fn configure(machine: &Machine<Counters>, config: &SolverConfig) -> Result<Solution, Error> {
    match config.strategy_for(machine) {
        AdditiveStrategy::Search => search::solve(machine, config),
        _ => linear::solve(machine, config),
    }
}

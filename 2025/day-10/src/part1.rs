use miette::*;

use crate::batch;
use crate::config::SolverConfig;
use crate::parser::{parse_manual, Schematic};
use crate::solver;

#[tracing::instrument]
pub fn process(input: &str) -> Result<String> {
    process_with(input, &SolverConfig::default())
}

#[tracing::instrument(skip(input))]
pub fn process_with(input: &str, config: &SolverConfig) -> Result<String> {
    let machines = parse_manual(input)?
        .iter()
        .map(Schematic::indicator_machine)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_presses =
        batch::solve_all(&machines, config.show_progress, solver::boot).into_result()?;

    Ok(total_presses.to_string())
}

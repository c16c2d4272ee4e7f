use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use itertools::{Either, Itertools};
use rayon::prelude::*;
use tracing::warn;

use crate::error::Error;
use crate::machine::{Machine, Solution, StateVector};

/// Outcome of solving every machine of a manual.
#[derive(Debug)]
pub struct BatchReport {
    /// Sum of the minimum presses of every solved machine.
    pub total: u64,
    pub solved: usize,
    /// Machine index and error for each machine that could not be solved.
    pub failures: Vec<(usize, Error)>,
}

impl BatchReport {
    pub fn machines(&self) -> usize {
        self.solved + self.failures.len()
    }

    /// The total if every machine was solved, otherwise an error listing the
    /// failures alongside the partial total.
    pub fn into_result(self) -> Result<u64, Error> {
        if self.failures.is_empty() {
            return Ok(self.total);
        }
        let machines = self.machines();
        Err(Error::Batch {
            total: self.total,
            failed: self.failures.len(),
            machines,
            failures: self
                .failures
                .into_iter()
                .map(|(index, source)| Error::Machine {
                    index,
                    source: Box::new(source),
                })
                .collect(),
        })
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} machines")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len as u64).with_style(style)
}

/// Solves every machine independently on the rayon pool. A failing machine
/// is recorded in the report and does not stop the others.
pub fn solve_all<S, F>(machines: &[Machine<S>], show_progress: bool, solve: F) -> BatchReport
where
    S: StateVector,
    F: Fn(&Machine<S>) -> Result<Solution, Error> + Send + Sync,
{
    let bar = progress_bar(machines.len(), show_progress);

    let results = machines
        .par_iter()
        .enumerate()
        .progress_with(bar.clone())
        .map(|(index, machine)| (index, solve(machine)))
        .collect::<Vec<_>>();

    bar.finish_and_clear();

    let (totals, failures): (Vec<u64>, Vec<(usize, Error)>) = results
        .into_iter()
        .partition_map(|(index, result)| match result {
            Ok(solution) => Either::Left(solution.total()),
            Err(err) => {
                warn!(machine = index, error = %err, "machine could not be solved");
                Either::Right((index, err))
            }
        });

    BatchReport {
        total: totals.iter().sum(),
        solved: totals.len(),
        failures,
    }
}

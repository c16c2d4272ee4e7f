use std::path::PathBuf;

use clap::Parser;
use miette::*;

use aoc2025_day_10::{part1, SolverConfig};

/// Fewest button presses that light up every machine's indicator diagram.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the puzzle input
    #[arg(default_value = "input1.txt")]
    input: PathBuf,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let input = std::fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", args.input.display()))?;
    let config = SolverConfig::default().with_progress(!args.quiet);
    let result = part1::process_with(&input, &config)?;
    println!("Result: {}", result);
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;
use miette::*;

use aoc2025_day_10::config::{AdditiveStrategy, CostOrdering, EnumerationBudget};
use aoc2025_day_10::{part2, SolverConfig};

/// Fewest button presses that bring every machine's joltage counters to
/// their requirements.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the puzzle input
    #[arg(default_value = "input2.txt")]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = AdditiveStrategy::Auto)]
    strategy: AdditiveStrategy,

    /// Expansion order for the search strategy
    #[arg(long, value_enum, default_value_t = CostOrdering::Bounded)]
    ordering: CostOrdering,

    /// Candidates the search may expand per machine
    #[arg(long)]
    max_expansions: Option<usize>,

    /// Enumerate free variables up to their proven bounds only, ignoring the
    /// default caps
    #[arg(long)]
    exhaustive: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn config(&self) -> SolverConfig {
        let mut config = SolverConfig::default()
            .with_strategy(self.strategy)
            .with_ordering(self.ordering)
            .with_progress(!self.quiet);
        if let Some(max_expansions) = self.max_expansions {
            config = config.with_max_expansions(max_expansions);
        }
        if self.exhaustive {
            config = config.with_enumeration(EnumerationBudget::exhaustive());
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let input = std::fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", args.input.display()))?;
    let result = part2::process_with(&input, &args.config())?;
    println!("Result: {}", result);
    Ok(())
}

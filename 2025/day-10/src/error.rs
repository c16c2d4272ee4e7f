use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("could not parse machine on line {line}: {reason}")]
    #[diagnostic(
        code(day10::parse),
        help("expected `[.#..] (0,2) (1) ... {{3,5,4}}`")
    )]
    Parse {
        line: usize,
        reason: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("malformed machine: {reason}")]
    #[diagnostic(code(day10::malformed_machine))]
    MalformedMachine { reason: String },

    #[error("machine has no joltage requirements")]
    #[diagnostic(
        code(day10::missing_joltage),
        help("configuring joltage needs a `{{...}}` block after the buttons")
    )]
    MissingJoltage,

    #[error("no combination of button presses reaches the target")]
    #[diagnostic(
        code(day10::no_solution),
        help("the target is outside the span of the button effects")
    )]
    NoSolution,

    #[error("search gave up after expanding {expansions} candidates")]
    #[diagnostic(
        code(day10::search_budget),
        help("raise `max_expansions` or switch to the algebraic strategy")
    )]
    SearchBudgetExhausted { expansions: usize },

    #[error("integer overflow while reducing the linear system")]
    #[diagnostic(code(day10::overflow))]
    Overflow,

    #[error("machine {index} failed")]
    #[diagnostic(code(day10::machine))]
    Machine {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("{failed} of {machines} machines could not be solved (partial total {total})")]
    #[diagnostic(code(day10::batch))]
    Batch {
        total: u64,
        failed: usize,
        machines: usize,
        #[related]
        failures: Vec<Error>,
    },
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMachine {
            reason: reason.into(),
        }
    }

    /// Unwraps a per-machine wrapper to the error a solver reported.
    pub fn root(&self) -> &Error {
        match self {
            Self::Machine { source, .. } => source.root(),
            other => other,
        }
    }
}

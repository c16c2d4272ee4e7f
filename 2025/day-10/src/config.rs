use clap::ValueEnum;

use crate::machine::{Counters, Machine};

/// Which solver handles joltage (additive) machines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AdditiveStrategy {
    /// Search for small state spaces, elimination for everything else.
    #[default]
    Auto,
    /// Always use the cost-guided search.
    Search,
    /// Always use elimination plus free-variable enumeration.
    Algebraic,
}

/// Expansion order of the cost-guided search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CostOrdering {
    /// Presses so far plus a lower bound derived from the remaining cost.
    /// The first exact match is a minimum.
    #[default]
    Bounded,
    /// Remaining cost only. Dives straight at the target; usually minimal
    /// but not guaranteed to be.
    Greedy,
}

/// Caps on the values tried for each free variable, indexed by how many free
/// variables the system has.
///
/// Every free variable already has a proven bound (no press may push any
/// counter past its target), so the caps only ever shrink the search. A cap
/// that cuts into a proven bound can hide the optimum; the solver logs when
/// that happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationBudget {
    /// `caps[k - 1]` applies when there are `k` free variables.
    pub caps: Vec<u64>,
    /// Applies when there are more free variables than `caps` covers.
    pub fallback: Option<u64>,
}

impl EnumerationBudget {
    /// Only the proven bounds apply.
    pub fn exhaustive() -> Self {
        Self {
            caps: Vec::new(),
            fallback: None,
        }
    }

    pub fn cap_for(&self, free_vars: usize) -> Option<u64> {
        match free_vars {
            0 => None,
            k => self.caps.get(k - 1).copied().or(self.fallback),
        }
    }
}

impl Default for EnumerationBudget {
    fn default() -> Self {
        Self {
            caps: vec![500, 250, 120, 60],
            fallback: Some(25),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub strategy: AdditiveStrategy,
    pub ordering: CostOrdering,
    /// Candidates the search may expand before giving up.
    pub max_expansions: usize,
    /// Largest `prod(target_i + 1)` that `Auto` still hands to the search.
    pub search_state_limit: u64,
    pub enumeration: EnumerationBudget,
    /// Draw a progress bar while solving a batch.
    pub show_progress: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: AdditiveStrategy::default(),
            ordering: CostOrdering::default(),
            max_expansions: 5_000_000,
            search_state_limit: 200_000,
            enumeration: EnumerationBudget::default(),
            show_progress: false,
        }
    }
}

impl SolverConfig {
    pub fn with_strategy(mut self, strategy: AdditiveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_ordering(mut self, ordering: CostOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_enumeration(mut self, enumeration: EnumerationBudget) -> Self {
        self.enumeration = enumeration;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Resolves `Auto` for a concrete machine.
    pub fn strategy_for(&self, machine: &Machine<Counters>) -> AdditiveStrategy {
        match self.strategy {
            AdditiveStrategy::Auto => {
                let states = machine
                    .target()
                    .iter()
                    .fold(1u64, |acc, &level| acc.saturating_mul(level.saturating_add(1)));
                if states <= self.search_state_limit {
                    AdditiveStrategy::Search
                } else {
                    AdditiveStrategy::Algebraic
                }
            }
            fixed => fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0, None)]
    #[case(1, Some(500))]
    #[case(4, Some(60))]
    #[case(9, Some(25))]
    fn default_budget_falls_back(#[case] free_vars: usize, #[case] expected: Option<u64>) {
        assert_eq!(EnumerationBudget::default().cap_for(free_vars), expected);
    }

    #[test]
    fn exhaustive_budget_has_no_caps() {
        assert_eq!(EnumerationBudget::exhaustive().cap_for(7), None);
    }

    #[test]
    fn auto_picks_by_state_space() -> miette::Result<()> {
        let small = Machine::from_wiring(&[vec![0]], Counters::new(vec![3]))?;
        let large = Machine::from_wiring(&[vec![0], vec![1]], Counters::new(vec![1000, 1000]))?;
        let config = SolverConfig::default();
        assert_eq!(config.strategy_for(&small), AdditiveStrategy::Search);
        assert_eq!(config.strategy_for(&large), AdditiveStrategy::Algebraic);

        let forced = config.with_strategy(AdditiveStrategy::Search);
        assert_eq!(forced.strategy_for(&large), AdditiveStrategy::Search);
        Ok(())
    }
}

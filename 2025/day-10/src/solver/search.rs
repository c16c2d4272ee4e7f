use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, trace};

use crate::config::{CostOrdering, SolverConfig};
use crate::error::Error;
use crate::machine::{Counters, Machine, Solution, StateVector};

/// A queued counter state, ordered by `(priority, cost)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    priority: u64,
    cost: u64,
    presses: usize,
    state: Counters,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.cost, self.presses, &self.state).cmp(&(
            other.priority,
            other.cost,
            other.presses,
            &other.state,
        ))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Search<'a> {
    machine: &'a Machine<Counters>,
    ordering: CostOrdering,
    /// Largest drop in cost a single press can achieve.
    max_gain: u64,
    queue: BinaryHeap<Reverse<Candidate>>,
    /// Fewest presses known to reach each state.
    presses: HashMap<Counters, usize>,
    /// State each state was last improved from, and the button pressed.
    came_from: HashMap<Counters, (Counters, usize)>,
}

impl<'a> Search<'a> {
    fn new(machine: &'a Machine<Counters>, ordering: CostOrdering) -> Self {
        let max_gain = machine
            .buttons()
            .iter()
            .map(|effect| effect.iter().sum::<u64>())
            .max()
            .unwrap_or(0);

        Self {
            machine,
            ordering,
            max_gain,
            queue: BinaryHeap::new(),
            presses: HashMap::new(),
            came_from: HashMap::new(),
        }
    }

    fn priority(&self, presses: usize, cost: u64) -> u64 {
        match self.ordering {
            CostOrdering::Greedy => cost,
            CostOrdering::Bounded => presses as u64 + cost.div_ceil(self.max_gain.max(1)),
        }
    }

    fn push(&mut self, state: Counters, presses: usize) {
        let cost = state.distance(self.machine.target());
        let priority = self.priority(presses, cost);
        self.presses.insert(state.clone(), presses);
        self.queue.push(Reverse(Candidate {
            priority,
            cost,
            presses,
            state,
        }));
    }

    /// Expands `candidate` by every button, dropping presses that overshoot.
    fn expand(&mut self, candidate: &Candidate) {
        let machine = self.machine;
        let presses = candidate.presses + 1;
        for (button, effect) in machine.buttons().iter().enumerate() {
            if effect.is_zero() {
                continue;
            }
            let Some(next) = candidate.state.stepped(effect, machine.target()) else {
                continue;
            };
            if self.presses.get(&next).is_some_and(|&known| known <= presses) {
                continue;
            }
            self.came_from
                .insert(next.clone(), (candidate.state.clone(), button));
            self.push(next, presses);
        }
    }

    /// Walks `came_from` back to the zero state.
    fn sequence_to(&self, mut state: Counters) -> Vec<usize> {
        let mut sequence = Vec::new();
        while let Some((previous, button)) = self.came_from.get(&state) {
            sequence.push(*button);
            state = previous.clone();
        }
        sequence.reverse();
        sequence
    }
}

/// Best-first search over counter states.
///
/// Cost is the Manhattan distance to the requirements. Presses only ever add,
/// so any state with a counter above its requirement is dropped on sight and
/// the reachable space is bounded by `prod(target_i + 1)`. States are cached
/// by value: a state is queued again only when reached with fewer presses.
#[tracing::instrument(
    skip_all,
    fields(buttons = machine.button_count(), width = machine.dimensionality())
)]
pub fn solve(machine: &Machine<Counters>, config: &SolverConfig) -> Result<Solution, Error> {
    let buttons = machine.button_count();
    if machine.target().is_zero() {
        return Ok(Solution::idle(buttons));
    }

    let mut search = Search::new(machine, config.ordering);
    search.push(Counters::zero(machine.dimensionality()), 0);

    let mut expansions = 0;
    while let Some(Reverse(candidate)) = search.queue.pop() {
        if search
            .presses
            .get(&candidate.state)
            .is_some_and(|&known| known < candidate.presses)
        {
            // Superseded by a shorter route
            continue;
        }

        if candidate.cost == 0 {
            debug!(presses = candidate.presses, expansions, "joltage configured");
            let sequence = search.sequence_to(candidate.state);
            return Ok(Solution::from_sequence(buttons, &sequence));
        }

        if expansions >= config.max_expansions {
            debug!(expansions, best_cost = candidate.cost, "search budget exhausted");
            return Err(Error::SearchBudgetExhausted { expansions });
        }
        expansions += 1;

        if expansions % 100_000 == 0 {
            trace!(
                expansions,
                queued = search.queue.len(),
                cost = candidate.cost,
                presses = candidate.presses
            );
        }

        search.expand(&candidate);
    }

    debug!(expansions, "every reachable state explored");
    Err(Error::NoSolution)
}

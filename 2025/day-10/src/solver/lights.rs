use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::Error;
use crate::machine::{Lights, Machine, Solution, StateVector};

/// A light pattern together with the presses that produced it.
#[derive(Debug, Clone)]
struct Path {
    state: Lights,
    sequence: Vec<usize>,
}

/// Breadth-first search over light patterns.
///
/// Each level extends every frontier path by one press of any button other
/// than the one it pressed last (two consecutive presses cancel out). A
/// pattern seen at any earlier level is never expanded again, so the search
/// visits at most `2^width` patterns and stops with [`Error::NoSolution`]
/// once the frontier runs dry.
#[tracing::instrument(
    skip_all,
    fields(buttons = machine.button_count(), width = machine.dimensionality())
)]
pub fn solve(machine: &Machine<Lights>) -> Result<Solution, Error> {
    let buttons = machine.button_count();
    if machine.target().is_zero() {
        return Ok(Solution::idle(buttons));
    }

    let start = Lights::zero(machine.dimensionality());
    let mut visited = HashSet::from([start.clone()]);
    let mut frontier = vec![Path {
        state: start,
        sequence: Vec::new(),
    }];
    let mut depth = 0;

    while !frontier.is_empty() {
        depth += 1;
        let mut next = Vec::with_capacity(frontier.len() * buttons);

        for path in &frontier {
            for (button, effect) in machine.buttons().iter().enumerate() {
                if path.sequence.last() == Some(&button) {
                    continue;
                }

                let mut state = path.state.clone();
                state ^= effect;
                if !visited.insert(state.clone()) {
                    continue;
                }

                let mut sequence = Vec::with_capacity(depth);
                sequence.extend_from_slice(&path.sequence);
                sequence.push(button);
                next.push(Path { state, sequence });
            }
        }

        trace!(depth, frontier = next.len(), visited = visited.len());

        if let Some(hit) = next.iter().find(|path| &path.state == machine.target()) {
            debug!(presses = depth, "lights configured");
            return Ok(Solution::from_sequence(buttons, &hit.sequence));
        }

        frontier = next;
    }

    debug!(visited = visited.len(), "target pattern is unreachable");
    Err(Error::NoSolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    use bitvec::prelude::*;
    use itertools::Itertools;
    use rstest::rstest;

    fn machine(width: usize, wiring: &[Vec<usize>], target: &[usize]) -> Machine<Lights> {
        Machine::from_wiring(wiring, Lights::from_indices(width, target))
            .expect("test machine is well formed")
    }

    /// Smallest subset of buttons whose masks XOR to the target.
    fn brute_force(machine: &Machine<Lights>) -> Option<usize> {
        (0..machine.button_count())
            .powerset()
            .filter(|subset| {
                let mut state = Lights::zero(machine.dimensionality());
                for &button in subset {
                    state ^= &machine.buttons()[button];
                }
                &state == machine.target()
            })
            .map(|subset| subset.len())
            .min()
    }

    #[rstest]
    #[case::single_toggle(1, vec![vec![0]], &[0], 1)]
    #[case::combined_button(2, vec![vec![0], vec![0, 1], vec![1]], &[0, 1], 1)]
    #[case::two_buttons(2, vec![vec![0], vec![1]], &[0, 1], 2)]
    #[case::first_example(
        4,
        vec![vec![3], vec![1, 3], vec![2], vec![2, 3], vec![0, 2], vec![0, 1]],
        &[1, 2],
        2
    )]
    #[case::second_example(
        5,
        vec![vec![0, 2, 3, 4], vec![2, 3], vec![0, 4], vec![0, 1, 2], vec![1, 2, 3, 4]],
        &[3],
        3
    )]
    #[case::third_example(
        6,
        vec![vec![0, 1, 2, 3, 4], vec![0, 3, 4], vec![0, 1, 2, 4, 5], vec![1, 2]],
        &[1, 2, 3, 5],
        2
    )]
    fn finds_the_fewest_presses(
        #[case] width: usize,
        #[case] wiring: Vec<Vec<usize>>,
        #[case] target: &[usize],
        #[case] expected: u64,
    ) -> miette::Result<()> {
        let machine = machine(width, &wiring, target);
        let solution = solve(&machine)?;
        assert_eq!(solution.total(), expected);
        assert!(machine.is_solved_by(&solution));
        Ok(())
    }

    #[test]
    fn dark_target_needs_no_presses() -> miette::Result<()> {
        let machine = machine(3, &[vec![0], vec![1, 2]], &[]);
        assert_eq!(solve(&machine)?, Solution::idle(2));
        Ok(())
    }

    #[rstest]
    #[case::unwired_light(2, vec![vec![0]], &[1])]
    #[case::parity(3, vec![vec![0, 1], vec![1, 2]], &[0])]
    #[case::no_buttons(1, vec![], &[0])]
    fn unreachable_targets_are_reported(
        #[case] width: usize,
        #[case] wiring: Vec<Vec<usize>>,
        #[case] target: &[usize],
    ) {
        let machine = machine(width, &wiring, target);
        assert!(matches!(solve(&machine), Err(Error::NoSolution)));
    }

    #[rstest]
    #[case(3, vec![vec![0], vec![0, 1], vec![1, 2]])]
    #[case(4, vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![0, 3]])]
    #[case(5, vec![vec![0, 2, 4], vec![1, 3], vec![0, 1], vec![4], vec![2, 3]])]
    #[case(6, vec![vec![0, 1, 2], vec![3, 4, 5], vec![0, 3], vec![1, 4], vec![2, 5], vec![0, 5]])]
    fn matches_brute_force_for_every_target(
        #[case] width: usize,
        #[case] wiring: Vec<Vec<usize>>,
    ) {
        for bits in 0usize..(1 << width) {
            let target = (0..width).filter(|&i| (bits >> i) & 1 == 1).collect::<Vec<_>>();
            let machine = machine(width, &wiring, &target);
            let expected = brute_force(&machine);
            let found = solve(&machine).ok().map(|s| s.total() as usize);
            assert_eq!(found, expected, "target {:?}", machine.target());
        }
    }

    #[test]
    fn never_presses_a_button_twice_in_a_row() -> miette::Result<()> {
        let machine = Machine::new(
            vec![bitvec![usize, Lsb0; 1, 1, 0], bitvec![usize, Lsb0; 0, 1, 1]],
            bitvec![usize, Lsb0; 1, 0, 1],
        )?;
        let solution = solve(&machine)?;
        assert_eq!(solution.presses(), &[1, 1]);
        Ok(())
    }
}

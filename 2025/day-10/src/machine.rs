use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

use bitvec::prelude::*;
use itertools::Itertools;

use crate::error::Error;

/// Indicator light state. Bit `i` is light `i`, least significant first.
pub type Lights = BitVec<usize, Lsb0>;

/// Joltage counters, one non-negative level per position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Counters(Vec<u64>);

impl Counters {
    pub fn new(levels: Vec<u64>) -> Self {
        Self(levels)
    }

    /// Sum of `|self_i - target_i|`.
    pub fn distance(&self, target: &Counters) -> u64 {
        self.0
            .iter()
            .zip(&target.0)
            .map(|(level, goal)| level.abs_diff(*goal))
            .sum()
    }

    /// Applies one press of `effect`, bailing out on the first counter that
    /// would exceed `target`.
    pub fn stepped(&self, effect: &Counters, target: &Counters) -> Option<Counters> {
        let mut next = Vec::with_capacity(self.0.len());
        for ((level, delta), goal) in self.0.iter().zip(&effect.0).zip(&target.0) {
            let level = level.checked_add(*delta)?;
            if level > *goal {
                return None;
            }
            next.push(level);
        }
        Some(Counters(next))
    }
}

impl Deref for Counters {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u64>> for Counters {
    fn from(levels: Vec<u64>) -> Self {
        Self(levels)
    }
}

/// A machine state that buttons act on. Effects and targets share the type.
pub trait StateVector: Clone + Debug + PartialEq + Eq + Hash + Send + Sync {
    /// The all-zero state of the given width.
    fn zero(width: usize) -> Self;

    /// An effect touching each of `indices` once. Indices must be distinct
    /// and `< width`.
    fn from_indices(width: usize, indices: &[usize]) -> Self;

    fn dimensionality(&self) -> usize;

    fn is_zero(&self) -> bool;

    /// Applies `effect` to the state `times` times.
    fn press(&mut self, effect: &Self, times: u64);
}

impl StateVector for Lights {
    fn zero(width: usize) -> Self {
        Lights::repeat(false, width)
    }

    fn from_indices(width: usize, indices: &[usize]) -> Self {
        let mut row = Lights::repeat(false, width);
        for &i in indices {
            row.set(i, true);
        }
        row
    }

    fn dimensionality(&self) -> usize {
        self.len()
    }

    fn is_zero(&self) -> bool {
        self.not_any()
    }

    fn press(&mut self, effect: &Self, times: u64) {
        // Presses cancel in pairs
        if times % 2 == 1 {
            *self ^= effect;
        }
    }
}

impl StateVector for Counters {
    fn zero(width: usize) -> Self {
        Counters(vec![0; width])
    }

    fn from_indices(width: usize, indices: &[usize]) -> Self {
        let mut levels = vec![0; width];
        for &i in indices {
            levels[i] += 1;
        }
        Counters(levels)
    }

    fn dimensionality(&self) -> usize {
        self.0.len()
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|&level| level == 0)
    }

    fn press(&mut self, effect: &Self, times: u64) {
        for (level, delta) in self.0.iter_mut().zip(&effect.0) {
            *level = level.saturating_add(delta.saturating_mul(times));
        }
    }
}

/// Press counts, one per button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    presses: Vec<u64>,
}

impl Solution {
    pub fn new(presses: Vec<u64>) -> Self {
        Self { presses }
    }

    /// No button pressed at all.
    pub fn idle(buttons: usize) -> Self {
        Self::new(vec![0; buttons])
    }

    /// Tallies an ordered press sequence into per-button counts.
    pub fn from_sequence(buttons: usize, sequence: &[usize]) -> Self {
        let mut presses = vec![0; buttons];
        for &button in sequence {
            presses[button] += 1;
        }
        Self { presses }
    }

    pub fn presses(&self) -> &[u64] {
        &self.presses
    }

    pub fn total(&self) -> u64 {
        self.presses.iter().sum()
    }
}

/// A set of buttons and the state they have to produce together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine<S> {
    buttons: Vec<S>,
    target: S,
}

impl<S: StateVector> Machine<S> {
    pub fn new(buttons: Vec<S>, target: S) -> Result<Self, Error> {
        let width = target.dimensionality();
        if let Some((button, effect)) = buttons
            .iter()
            .enumerate()
            .find(|(_, effect)| effect.dimensionality() != width)
        {
            return Err(Error::malformed(format!(
                "button {button} has {} components but the target has {width}",
                effect.dimensionality()
            )));
        }
        Ok(Self { buttons, target })
    }

    /// Builds a machine from per-button index lists, e.g. `(0,2) (1)`.
    pub fn from_wiring(wiring: &[Vec<usize>], target: S) -> Result<Self, Error> {
        let width = target.dimensionality();
        let buttons = wiring
            .iter()
            .enumerate()
            .map(|(button, indices)| {
                if let Some(i) = indices.iter().find(|&&i| i >= width) {
                    return Err(Error::malformed(format!(
                        "button {button} is wired to position {i} but the target has {width}"
                    )));
                }
                if let Some(i) = indices.iter().duplicates().next() {
                    return Err(Error::malformed(format!(
                        "button {button} is wired to position {i} more than once"
                    )));
                }
                Ok(S::from_indices(width, indices))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(buttons, target)
    }

    pub fn dimensionality(&self) -> usize {
        self.target.dimensionality()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn effect(&self, button: usize) -> Option<&S> {
        self.buttons.get(button)
    }

    pub fn buttons(&self) -> &[S] {
        &self.buttons
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    /// The state reached from zero after applying every press in `solution`.
    pub fn evaluate(&self, solution: &Solution) -> S {
        let mut state = S::zero(self.dimensionality());
        for (effect, &times) in self.buttons.iter().zip(solution.presses()) {
            state.press(effect, times);
        }
        state
    }

    pub fn is_solved_by(&self, solution: &Solution) -> bool {
        solution.presses().len() == self.buttons.len() && self.evaluate(solution) == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn rejects_mismatched_dimensions() {
        let result = Machine::new(
            vec![Counters::new(vec![1, 0]), Counters::new(vec![1])],
            Counters::new(vec![2, 3]),
        );
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn rejects_out_of_range_wiring() {
        let result =
            Machine::<Lights>::from_wiring(&[vec![0], vec![2]], bitvec![usize, Lsb0; 1, 1]);
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn rejects_repeated_wiring() {
        let lights = Machine::<Lights>::from_wiring(&[vec![0, 0]], bitvec![usize, Lsb0; 0]);
        assert!(matches!(lights, Err(Error::MalformedMachine { .. })));

        let counters =
            Machine::<Counters>::from_wiring(&[vec![1], vec![0, 1, 0]], Counters::new(vec![2, 2]));
        assert!(matches!(counters, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn exposes_buttons_and_target() -> miette::Result<()> {
        let machine = Machine::<Counters>::from_wiring(
            &[vec![0], vec![0, 1], vec![1]],
            Counters::new(vec![2, 3]),
        )?;
        assert_eq!(machine.dimensionality(), 2);
        assert_eq!(machine.button_count(), 3);
        assert_eq!(machine.effect(1), Some(&Counters::new(vec![1, 1])));
        assert_eq!(machine.effect(3), None);
        assert_eq!(machine.target(), &Counters::new(vec![2, 3]));
        Ok(())
    }

    #[rstest]
    #[case(vec![0, 2, 1], vec![2, 3])]
    #[case(vec![2, 0, 3], vec![2, 3])]
    #[case(vec![0, 0, 0], vec![0, 0])]
    fn evaluates_additive_presses(
        #[case] presses: Vec<u64>,
        #[case] expected: Vec<u64>,
    ) -> miette::Result<()> {
        let machine = Machine::<Counters>::from_wiring(
            &[vec![0], vec![0, 1], vec![1]],
            Counters::new(vec![2, 3]),
        )?;
        let solution = Solution::new(presses);
        assert_eq!(machine.evaluate(&solution), Counters::new(expected));
        Ok(())
    }

    #[test]
    fn light_presses_cancel_in_pairs() -> miette::Result<()> {
        let machine =
            Machine::<Lights>::from_wiring(&[vec![0], vec![0, 1]], bitvec![usize, Lsb0; 0, 1])?;
        assert!(machine.is_solved_by(&Solution::new(vec![1, 1])));
        assert!(machine.is_solved_by(&Solution::new(vec![3, 5])));
        assert!(!machine.is_solved_by(&Solution::new(vec![2, 1])));
        Ok(())
    }

    #[test]
    fn tallies_sequences() {
        let solution = Solution::from_sequence(3, &[1, 1, 2]);
        assert_eq!(solution.presses(), &[0, 2, 1]);
        assert_eq!(solution.total(), 3);
    }
}

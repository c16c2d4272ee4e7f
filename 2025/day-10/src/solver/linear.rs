use nalgebra::DMatrix;
use num_integer::Integer;
use tracing::{debug, trace, warn};

use crate::config::{EnumerationBudget, SolverConfig};
use crate::error::Error;
use crate::machine::{Counters, Machine, Solution, StateVector};

fn to_i64(value: u64) -> Result<i64, Error> {
    i64::try_from(value).map_err(|_| Error::Overflow)
}

/// `sum_j x_j * effect_j = target` as an integer matrix.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    /// Augmented matrix [A | b], in row echelon form once eliminated.
    matrix: DMatrix<i64>,
    num_vars: usize,
    num_eqs: usize,
    /// `(row, column)` of each pivot, in elimination order.
    pivots: Vec<(usize, usize)>,
    /// Maps column index (variable) to pivot row index
    col_to_pivot: Vec<Option<usize>>,
    /// Indices of free variables (columns without pivots)
    free_vars: Vec<usize>,
}

impl LinearSystem {
    pub fn new(machine: &Machine<Counters>) -> Result<Self, Error> {
        let num_eqs = machine.dimensionality();
        let num_vars = machine.button_count();

        // Matrix dimensions: num_eqs x (num_vars + 1)
        let mut matrix = DMatrix::zeros(num_eqs, num_vars + 1);
        for (c, effect) in machine.buttons().iter().enumerate() {
            for (r, &delta) in effect.iter().enumerate() {
                matrix[(r, c)] = to_i64(delta)?;
            }
        }
        for (r, &level) in machine.target().iter().enumerate() {
            matrix[(r, num_vars)] = to_i64(level)?;
        }

        Ok(Self {
            matrix,
            num_vars,
            num_eqs,
            pivots: Vec::new(),
            col_to_pivot: vec![None; num_vars],
            free_vars: Vec::new(),
        })
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }

    pub fn pivots(&self) -> &[(usize, usize)] {
        &self.pivots
    }

    pub fn pivot_row(&self, column: usize) -> Option<usize> {
        self.col_to_pivot.get(column).copied().flatten()
    }

    pub fn free_vars(&self) -> &[usize] {
        &self.free_vars
    }

    /// Fraction-free Gaussian elimination to row echelon form.
    ///
    /// Rows below a pivot are updated as `row * pivot - pivot_row * factor`
    /// and then divided by the gcd of their entries, so every entry stays an
    /// integer. Returns `false` when the system is inconsistent (`0 = b`).
    pub fn eliminate(&mut self) -> Result<bool, Error> {
        let mut pivot_row = 0;

        for c in 0..self.num_vars {
            if pivot_row >= self.num_eqs {
                self.free_vars.push(c);
                continue;
            }

            // First row at or below the current pivot row with a non-zero entry
            let Some(found) = (pivot_row..self.num_eqs).find(|&r| self.matrix[(r, c)] != 0) else {
                self.free_vars.push(c);
                continue;
            };

            self.matrix.swap_rows(pivot_row, found);
            self.col_to_pivot[c] = Some(pivot_row);
            self.pivots.push((pivot_row, c));

            let pivot = self.matrix[(pivot_row, c)];
            for r in (pivot_row + 1)..self.num_eqs {
                let factor = self.matrix[(r, c)];
                if factor == 0 {
                    continue;
                }
                for j in 0..=self.num_vars {
                    let scaled = self.matrix[(r, j)].checked_mul(pivot);
                    let removed = self.matrix[(pivot_row, j)].checked_mul(factor);
                    self.matrix[(r, j)] = scaled
                        .zip(removed)
                        .and_then(|(a, b)| a.checked_sub(b))
                        .ok_or(Error::Overflow)?;
                }
                self.reduce_row(r);
            }
            pivot_row += 1;
        }

        trace!(matrix = %self.matrix, "eliminated");

        // Check for consistency: 0 = b?
        Ok((pivot_row..self.num_eqs).all(|r| self.matrix[(r, self.num_vars)] == 0))
    }

    fn reduce_row(&mut self, r: usize) {
        let divisor = (0..=self.num_vars).fold(0i64, |acc, j| acc.gcd(&self.matrix[(r, j)]));
        if divisor > 1 {
            for j in 0..=self.num_vars {
                self.matrix[(r, j)] /= divisor;
            }
        }
    }

    /// Fills in the pivot variables of `x` from its free variables, last
    /// pivot first. Fails when a pivot would be fractional or negative.
    fn back_substitute(&self, x: &mut [i64]) -> bool {
        for &(row, col) in self.pivots.iter().rev() {
            let mut residual = self.matrix[(row, self.num_vars)];
            for j in (col + 1)..self.num_vars {
                let Some(next) = self.matrix[(row, j)]
                    .checked_mul(x[j])
                    .and_then(|contribution| residual.checked_sub(contribution))
                else {
                    return false;
                };
                residual = next;
            }

            let (value, remainder) = residual.div_rem(&self.matrix[(row, col)]);
            if remainder != 0 || value < 0 {
                return false;
            }
            x[col] = value;
        }
        true
    }
}

/// Largest useful press count for `button`: pressing it more often would push
/// some counter it touches past the requirement.
fn proven_bound(machine: &Machine<Counters>, button: usize) -> u64 {
    machine
        .effect(button)
        .and_then(|effect| {
            effect
                .iter()
                .zip(machine.target().iter())
                .filter(|(delta, _)| **delta > 0)
                .map(|(&delta, &level)| level / delta)
                .min()
        })
        .unwrap_or(0)
}

fn free_var_bounds(
    machine: &Machine<Counters>,
    system: &LinearSystem,
    budget: &EnumerationBudget,
) -> Result<Vec<i64>, Error> {
    let cap = budget.cap_for(system.free_vars().len());
    system
        .free_vars()
        .iter()
        .map(|&button| {
            let proven = proven_bound(machine, button);
            let bound = cap.map_or(proven, |cap| proven.min(cap));
            if bound < proven {
                warn!(
                    button,
                    proven,
                    bound,
                    "enumeration budget is tighter than the proven bound; the minimum may be missed"
                );
            }
            to_i64(bound)
        })
        .collect()
}

/// Cartesian product over the free variables, pruned by the best total so far.
struct Enumeration<'a> {
    system: &'a LinearSystem,
    machine: &'a Machine<Counters>,
    bounds: Vec<i64>,
    best: Option<Solution>,
    candidates: u64,
}

impl<'a> Enumeration<'a> {
    fn new(system: &'a LinearSystem, machine: &'a Machine<Counters>, bounds: Vec<i64>) -> Self {
        Self {
            system,
            machine,
            bounds,
            best: None,
            candidates: 0,
        }
    }

    fn prunes(&self, partial: u64) -> bool {
        self.best
            .as_ref()
            .is_some_and(|best| partial >= best.total())
    }

    fn assign(&mut self, depth: usize, partial: u64, x: &mut [i64]) {
        if self.prunes(partial) {
            return;
        }

        let Some(&var) = self.system.free_vars().get(depth) else {
            self.evaluate(x);
            return;
        };

        for value in 0..=self.bounds[depth] {
            // Presses are non-negative, so larger values only add to the total
            let partial = partial + value as u64;
            if self.prunes(partial) {
                break;
            }
            x[var] = value;
            self.assign(depth + 1, partial, x);
        }
        x[var] = 0;
    }

    fn evaluate(&mut self, free: &[i64]) {
        self.candidates += 1;

        let mut x = free.to_vec();
        if !self.system.back_substitute(&mut x) {
            return;
        }
        let Some(presses) = x
            .into_iter()
            .map(|value| u64::try_from(value).ok())
            .collect::<Option<Vec<_>>>()
        else {
            return;
        };

        // Row operations can admit candidates the original system rejects
        let solution = Solution::new(presses);
        if !self.machine.is_solved_by(&solution) {
            trace!(?solution, "discarding extraneous candidate");
            return;
        }

        if !self.prunes(solution.total()) {
            self.best = Some(solution);
        }
    }
}

/// Minimum total presses via elimination plus free-variable enumeration.
#[tracing::instrument(
    skip_all,
    fields(buttons = machine.button_count(), width = machine.dimensionality())
)]
pub fn solve(machine: &Machine<Counters>, config: &SolverConfig) -> Result<Solution, Error> {
    if machine.target().is_zero() {
        return Ok(Solution::idle(machine.button_count()));
    }

    let mut system = LinearSystem::new(machine)?;
    if !system.eliminate()? {
        debug!("system is inconsistent");
        return Err(Error::NoSolution);
    }

    let bounds = free_var_bounds(machine, &system, &config.enumeration)?;
    debug!(rank = system.rank(), free = ?system.free_vars(), ?bounds, "eliminated");

    let mut enumeration = Enumeration::new(&system, machine, bounds);
    let mut x = vec![0; machine.button_count()];
    enumeration.assign(0, 0, &mut x);

    debug!(
        candidates = enumeration.candidates,
        best = ?enumeration.best.as_ref().map(Solution::total),
        "enumeration finished"
    );
    enumeration.best.ok_or(Error::NoSolution)
}

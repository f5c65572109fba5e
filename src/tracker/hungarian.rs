//! Hungarian (Kuhn-Munkres) solver for the rectangular assignment problem.

use ndarray::Array2;

use crate::tracker::error::Error;

/// Outcome of one assignment solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// For every row of the cost matrix, the column assigned to it, or
    /// `None` when the row is left unassigned.
    pub row_to_col: Vec<Option<usize>>,
    /// Total cost of the assigned entries, read from the input matrix.
    pub cost: f64,
}

/// Minimum-cost assignment on a rectangular nonnegative cost matrix.
///
/// Every column is used at most once. With `rows <= cols` every feasible
/// row is assigned; with `rows > cols` exactly `cols` rows are assigned.
/// Rows whose entries are all `+inf` are infeasible and stay unassigned.
///
/// The scratch buffers persist between calls, so a solver reused across
/// frames does not reallocate.
#[derive(Debug, Default)]
pub struct HungarianSolver {
    dist: Vec<f64>,
    starred: Vec<bool>,
    primed: Vec<bool>,
    covered_rows: Vec<bool>,
    covered_cols: Vec<bool>,
}

impl HungarianSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve the assignment problem for `cost`.
    ///
    /// An empty matrix yields an empty assignment with cost 0. A matrix
    /// containing negative entries is a domain error.
    pub fn solve(&mut self, cost: &Array2<f64>) -> Result<Assignment, Error> {
        let (rows, cols) = cost.dim();
        let mut row_to_col = vec![None; rows];
        if rows == 0 || cols == 0 {
            return Ok(Assignment {
                row_to_col,
                cost: 0.0,
            });
        }
        if cost.iter().any(|&value| value < 0.0) {
            return Err(Error::NegativeCost);
        }

        self.reset(rows, cols);
        for (flat, &value) in self.dist.iter_mut().zip(cost.iter()) {
            *flat = value;
        }

        let min_dim = rows.min(cols);
        self.reduce_and_star(rows, cols);

        // Alternate between priming uncovered zeros and shifting the
        // matrix until min_dim columns are covered, or until only
        // infeasible entries remain uncovered.
        loop {
            let covered = self.covered_cols.iter().filter(|&&c| c).count();
            if covered == min_dim {
                break;
            }

            match self.find_augmenting_zero(rows, cols) {
                Some((row, col)) => {
                    self.augment(rows, cols, row, col);
                    self.cover_starred_columns(rows, cols);
                }
                None => {
                    if !self.shift(rows, cols) {
                        break;
                    }
                }
            }
        }

        for (row, assigned) in row_to_col.iter_mut().enumerate() {
            *assigned = (0..cols).find(|&col| self.starred[row * cols + col]);
        }
        let total = row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|col| cost[[row, col]]))
            .sum();

        Ok(Assignment {
            row_to_col,
            cost: total,
        })
    }

    fn reset(&mut self, rows: usize, cols: usize) {
        self.dist.clear();
        self.dist.resize(rows * cols, 0.0);
        self.starred.clear();
        self.starred.resize(rows * cols, false);
        self.primed.clear();
        self.primed.resize(rows * cols, false);
        self.covered_rows.clear();
        self.covered_rows.resize(rows, false);
        self.covered_cols.clear();
        self.covered_cols.resize(cols, false);
    }

    /// Reduce along the smaller dimension and greedily star one zero per
    /// row and column.
    fn reduce_and_star(&mut self, rows: usize, cols: usize) {
        if rows <= cols {
            for row in 0..rows {
                let min = self.dist[row * cols..(row + 1) * cols]
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min);
                if min.is_finite() {
                    for value in &mut self.dist[row * cols..(row + 1) * cols] {
                        *value -= min;
                    }
                }
            }

            for row in 0..rows {
                for col in 0..cols {
                    if self.dist[row * cols + col].abs() < f64::EPSILON
                        && !self.covered_cols[col]
                    {
                        self.starred[row * cols + col] = true;
                        self.covered_cols[col] = true;
                        break;
                    }
                }
            }
        } else {
            for col in 0..cols {
                let min = (0..rows)
                    .map(|row| self.dist[row * cols + col])
                    .fold(f64::INFINITY, f64::min);
                if min.is_finite() {
                    for row in 0..rows {
                        self.dist[row * cols + col] -= min;
                    }
                }
            }

            for col in 0..cols {
                for row in 0..rows {
                    if self.dist[row * cols + col].abs() < f64::EPSILON
                        && !self.covered_rows[row]
                    {
                        self.starred[row * cols + col] = true;
                        self.covered_cols[col] = true;
                        self.covered_rows[row] = true;
                        break;
                    }
                }
            }
            self.covered_rows.fill(false);
        }
    }

    /// Prime uncovered zeros until one without a starred zero in its row
    /// turns up (the start of an augmenting path), covering rows and
    /// uncovering star columns along the way. `None` means no uncovered
    /// zeros are left and the matrix must be shifted.
    fn find_augmenting_zero(&mut self, rows: usize, cols: usize) -> Option<(usize, usize)> {
        'scan: loop {
            let mut found = None;
            'search: for row in 0..rows {
                if self.covered_rows[row] {
                    continue;
                }
                for col in 0..cols {
                    if !self.covered_cols[col] && self.dist[row * cols + col].abs() < f64::EPSILON
                    {
                        found = Some((row, col));
                        break 'search;
                    }
                }
            }

            let (row, col) = found?;
            self.primed[row * cols + col] = true;

            match (0..cols).find(|&star_col| self.starred[row * cols + star_col]) {
                Some(star_col) => {
                    self.covered_rows[row] = true;
                    self.covered_cols[star_col] = false;
                    continue 'scan;
                }
                None => return Some((row, col)),
            }
        }
    }

    /// Flip stars and primes along the alternating path rooted at the
    /// primed zero `(row, col)`, growing the star set by one.
    fn augment(&mut self, rows: usize, cols: usize, row: usize, col: usize) {
        let mut row = row;
        let mut col = col;
        loop {
            let star_row = (0..rows).find(|&r| self.starred[r * cols + col]);
            self.starred[row * cols + col] = true;
            let Some(star_row) = star_row else {
                break;
            };

            self.starred[star_row * cols + col] = false;
            let Some(prime_col) = (0..cols).find(|&c| self.primed[star_row * cols + c]) else {
                break;
            };
            row = star_row;
            col = prime_col;
        }

        self.primed.fill(false);
        self.covered_rows.fill(false);
    }

    fn cover_starred_columns(&mut self, rows: usize, cols: usize) {
        for col in 0..cols {
            if (0..rows).any(|row| self.starred[row * cols + col]) {
                self.covered_cols[col] = true;
            }
        }
    }

    /// Add the minimum uncovered entry to covered rows and subtract it
    /// from uncovered columns, creating at least one new uncovered zero.
    /// Returns `false` when no finite uncovered entry exists.
    fn shift(&mut self, rows: usize, cols: usize) -> bool {
        let mut h = f64::INFINITY;
        for row in 0..rows {
            if self.covered_rows[row] {
                continue;
            }
            for col in 0..cols {
                if !self.covered_cols[col] {
                    h = h.min(self.dist[row * cols + col]);
                }
            }
        }
        if !h.is_finite() {
            return false;
        }

        for row in 0..rows {
            if self.covered_rows[row] {
                for col in 0..cols {
                    self.dist[row * cols + col] += h;
                }
            }
        }
        for col in 0..cols {
            if !self.covered_cols[col] {
                for row in 0..rows {
                    self.dist[row * cols + col] -= h;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_square_optimum() {
        let cost = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0]];

        let mut solver = HungarianSolver::new();
        let result = solver.solve(&cost).unwrap();

        assert_eq!(result.cost, 10.0);
        let mut used: Vec<usize> = result.row_to_col.iter().map(|c| c.unwrap()).collect();
        used.sort_unstable();
        assert_eq!(used, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_matrix() {
        let mut solver = HungarianSolver::new();

        let result = solver.solve(&Array2::zeros((0, 5))).unwrap();
        assert!(result.row_to_col.is_empty());
        assert_eq!(result.cost, 0.0);

        let result = solver.solve(&Array2::zeros((3, 0))).unwrap();
        assert_eq!(result.row_to_col, vec![None, None, None]);
        assert_eq!(result.cost, 0.0);
    }

    #[test]
    fn test_negative_entries_rejected() {
        let cost = array![[1.0, -2.0], [3.0, 4.0]];

        let mut solver = HungarianSolver::new();
        assert_eq!(solver.solve(&cost).unwrap_err(), Error::NegativeCost);
    }

    #[test]
    fn test_wide_matrix_assigns_every_row() {
        let cost = array![[10.0, 1.0, 8.0, 4.0], [7.0, 2.0, 1.0, 9.0]];

        let mut solver = HungarianSolver::new();
        let result = solver.solve(&cost).unwrap();

        assert_eq!(result.row_to_col, vec![Some(1), Some(2)]);
        assert_eq!(result.cost, 2.0);
    }

    #[test]
    fn test_tall_matrix_assigns_col_count_rows() {
        let cost = array![[4.0, 6.0], [2.0, 3.0], [5.0, 1.0]];

        let mut solver = HungarianSolver::new();
        let result = solver.solve(&cost).unwrap();

        let assigned = result.row_to_col.iter().filter(|c| c.is_some()).count();
        assert_eq!(assigned, 2);
        assert_eq!(result.cost, 3.0); // rows 1 -> col 0, 2 -> col 1
        assert_eq!(result.row_to_col[0], None);
    }

    #[test]
    fn test_infeasible_row_stays_unassigned() {
        let cost = array![[1.0, 2.0], [f64::INFINITY, f64::INFINITY]];

        let mut solver = HungarianSolver::new();
        let result = solver.solve(&cost).unwrap();

        assert_eq!(result.row_to_col[0], Some(0));
        assert_eq!(result.row_to_col[1], None);
        assert_eq!(result.cost, 1.0);
    }

    #[test]
    fn test_columns_used_at_most_once() {
        let cost = array![
            [1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0]
        ];

        let mut solver = HungarianSolver::new();
        let result = solver.solve(&cost).unwrap();

        let mut used: Vec<usize> = result.row_to_col.iter().filter_map(|&c| c).collect();
        let total = used.len();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used.len(), total);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_solver_is_reusable() {
        let mut solver = HungarianSolver::new();

        let first = array![[5.0, 1.0], [1.0, 5.0]];
        let result = solver.solve(&first).unwrap();
        assert_eq!(result.cost, 2.0);

        let second = array![[2.0, 9.0, 4.0], [3.0, 1.0, 2.0]];
        let result = solver.solve(&second).unwrap();
        assert_eq!(result.cost, 3.0);
        assert_eq!(result.row_to_col, vec![Some(0), Some(1)]);
    }
}

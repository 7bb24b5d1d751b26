//! Dense linear solve for the steady-state balance equations.
//!
//! Diagrams stay small (tens of states), so plain Gaussian elimination with
//! partial pivoting over `ndarray` storage is all that is needed.

use ndarray::{Array1, Array2};

use crate::error::SolverError;

/// Solves `A x = b` in place by Gaussian elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`SolverError::Singular`] when the best available pivot falls
/// below `pivot_tol` relative to the largest entry of `A`.
pub(crate) fn solve_dense(
    mut a: Array2<f64>,
    mut b: Array1<f64>,
    pivot_tol: f64,
) -> Result<Array1<f64>, SolverError> {
    let n = b.len();
    debug_assert_eq!(a.nrows(), n);
    debug_assert_eq!(a.ncols(), n);

    let scale = a.iter().fold(0.0f64, |m, &v| m.max(v.abs())).max(1.0);
    let floor = pivot_tol * scale;

    for col in 0..n {
        // Partial pivot: largest magnitude on or below the diagonal.
        let mut pivot_row = col;
        let mut pivot_val = a[[col, col]].abs();
        for row in (col + 1)..n {
            let v = a[[row, col]].abs();
            if v > pivot_val {
                pivot_row = row;
                pivot_val = v;
            }
        }
        if pivot_val <= floor {
            return Err(SolverError::Singular {
                reason: format!("pivot {pivot_val:e} below tolerance in column {col}"),
            });
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn solves_identity() {
        let a = Array2::eye(3);
        let b = array![1.0, 2.0, 3.0];
        let x = solve_dense(a, b, 1e-12).unwrap();
        assert_relative_eq!(x[0], 1.0);
        assert_relative_eq!(x[2], 3.0);
    }

    #[test]
    fn solves_with_pivoting() {
        // Zero on the diagonal forces a row swap.
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![5.0, 7.0];
        let x = solve_dense(a, b, 1e-12).unwrap();
        assert_relative_eq!(x[0], 7.0);
        assert_relative_eq!(x[1], 5.0);
    }

    #[test]
    fn solves_general_system() {
        let a = array![[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let b = array![8.0, -11.0, -3.0];
        let x = solve_dense(a, b, 1e-12).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-10);
        assert_relative_eq!(x[2], -1.0, epsilon = 1e-10);
    }

    #[test]
    fn detects_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_dense(a, b, 1e-12),
            Err(SolverError::Singular { .. })
        ));
    }
}

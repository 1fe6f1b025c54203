use faer::{prelude::*, solvers::PartialPivLu, Mat};

use crate::{PowerflowError, PowerflowResult};

/// Trait for solving dense linear systems (Ax = b).
pub trait LinearSystemBackend: Send + Sync {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> PowerflowResult<Vec<f64>>;
}

fn check_dimensions(matrix: &[Vec<f64>], rhs: &[f64]) -> PowerflowResult<()> {
    let n = matrix.len();
    if rhs.len() != n {
        return Err(PowerflowError::Solver(format!(
            "rhs length ({}) does not match matrix dimension {}",
            rhs.len(),
            n
        )));
    }
    if matrix.iter().any(|row| row.len() != n) {
        return Err(PowerflowError::Solver("matrix must be square".into()));
    }
    Ok(())
}

fn finite_solution(solution: Vec<f64>) -> PowerflowResult<Vec<f64>> {
    if solution.iter().any(|v| !v.is_finite()) {
        return Err(PowerflowError::Solver("singular Jacobian".into()));
    }
    Ok(solution)
}

/// Gauss-Jordan elimination with partial pivoting.
#[derive(Debug, Clone, Default)]
pub struct GaussSolver;

impl LinearSystemBackend for GaussSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> PowerflowResult<Vec<f64>> {
        let n = matrix.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        check_dimensions(matrix, rhs)?;

        let mut a = matrix.to_vec();
        let mut b = rhs.to_vec();

        for i in 0..n {
            let mut pivot = i;
            for row in i + 1..n {
                if a[row][i].abs() > a[pivot][i].abs() {
                    pivot = row;
                }
            }
            if pivot != i {
                a.swap(i, pivot);
                b.swap(i, pivot);
            }

            let diag = a[i][i];
            if diag.abs() < 1e-12 {
                return Err(PowerflowError::Solver("singular Jacobian".into()));
            }

            for value in a[i][i..].iter_mut() {
                *value /= diag;
            }
            b[i] /= diag;

            let pivot_segment = a[i][i..].to_vec();
            for row in 0..n {
                if row == i {
                    continue;
                }
                let factor = a[row][i];
                if factor == 0.0 {
                    continue;
                }
                for (target, &pivot) in a[row][i..].iter_mut().zip(pivot_segment.iter()) {
                    *target -= factor * pivot;
                }
                b[row] -= factor * b[i];
            }
        }

        finite_solution(b)
    }
}

/// LU with partial pivoting from `faer`.
///
/// A singular matrix does not fail the factorization; it shows up as non-finite
/// entries in the solution, which are reported as a solver error.
#[derive(Debug, Clone, Default)]
pub struct FaerSolver;

impl LinearSystemBackend for FaerSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> PowerflowResult<Vec<f64>> {
        let n = matrix.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        check_dimensions(matrix, rhs)?;

        let mat = Mat::from_fn(n, n, |i, j| matrix[i][j]);
        let rhs_mat = Mat::from_fn(n, 1, |i, _| rhs[i]);
        let lu = PartialPivLu::new(mat.as_ref());
        let sol = lu.solve(&rhs_mat);

        finite_solution((0..n).map(|i| sol.read(i, 0)).collect())
    }
}

//! Linear algebra utilities.
//!
//! Tridiagonal solves for spline slopes, and dense least squares for the
//! linear part of fitted-bond curves.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Solves a tridiagonal system of equations (Thomas algorithm).
///
/// The system has the form:
/// ```text
/// | b[0]  c[0]   0    ...    0     | | x[0]   |   | d[0]   |
/// | a[0]  b[1]  c[1]  ...    0     | | x[1]   |   | d[1]   |
/// |  0    a[1]  b[2]  ...    0     | | x[2]   | = | d[2]   |
/// | ...   ...   ...   ...   ...    | | ...    |   | ...    |
/// |  0     0     0  a[n-2] b[n-1]  | | x[n-1] |   | d[n-1] |
/// ```
///
/// # Arguments
///
/// * `a` - Lower diagonal (length n-1)
/// * `b` - Main diagonal (length n)
/// * `c` - Upper diagonal (length n-1)
/// * `d` - Right-hand side (length n)
pub fn solve_tridiagonal(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> MathResult<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    if a.len() != n - 1 || c.len() != n - 1 || d.len() != n {
        return Err(MathError::invalid_input(
            "Tridiagonal system has inconsistent dimensions",
        ));
    }
    if b[0].abs() < 1e-300 {
        return Err(MathError::SingularMatrix);
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];
    if n > 1 {
        c_prime[0] = c[0] / b[0];
    }
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let denom = b[i] - a[i - 1] * c_prime[i - 1];
        if denom.abs() < 1e-300 {
            return Err(MathError::SingularMatrix);
        }
        if i < n - 1 {
            c_prime[i] = c[i] / denom;
        }
        d_prime[i] = (d[i] - a[i - 1] * d_prime[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    Ok(x)
}

/// Solves a square linear system `Ax = b` by LU decomposition.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return Err(MathError::invalid_input(format!(
            "cannot solve a {}x{} system with {} right-hand values",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }
    a.clone().lu().solve(b).ok_or(MathError::SingularMatrix)
}

/// Minimises `|Ax - b|²` through a singular value decomposition.
///
/// Rank-deficient systems return the minimum-norm solution.
pub fn least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    if a.nrows() != b.len() {
        return Err(MathError::invalid_input(format!(
            "design matrix has {} rows but {} observations",
            a.nrows(),
            b.len()
        )));
    }
    if a.nrows() < a.ncols() {
        return Err(MathError::insufficient_data(a.ncols(), a.nrows()));
    }
    a.clone()
        .svd(true, true)
        .solve(b, 1e-14)
        .map_err(|e| MathError::invalid_input(e.to_string()))
}

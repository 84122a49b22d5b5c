//! Root-finding algorithms.
//!
//! - [`brent`]: bracketing method combining bisection, secant and inverse
//!   quadratic steps. Used by the bootstrap and by implied-volatility
//!   stripping.
//! - [`newton_raphson`]: quadratic convergence when a derivative is known
//! - [`bisection`]: slow but unconditional
//!
//! Objectives are plain `FnMut(f64) -> f64` closures. A non-finite value
//! aborts the search with [`MathError::InvalidInput`], which lets callers
//! map their own failures to `NaN`.
//!
//! # Example
//!
//! ```rust
//! use pillar_math::solvers::{brent, SolverConfig};
//!
//! let result = brent(|x| x * x * x - x - 2.0, 1.0, 2.0, &SolverConfig::default()).unwrap();
//! assert!((result.root - 1.521_379_706_8).abs() < 1e-9);
//! ```

mod bisection;
mod brent;
mod newton;

pub use bisection::bisection;
pub use brent::brent;
pub use newton::newton_raphson;

use crate::error::{MathError, MathResult};

/// Default tolerance for root-finding algorithms.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for root-finding algorithms.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Tolerance on the root (x accuracy).
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a root-finding run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Function value at the root.
    pub residual: f64,
}

/// Widens `[lo, hi]` geometrically until `f` changes sign.
///
/// Returns the bracket together with the function values at its ends.
///
/// # Errors
///
/// Returns `MathError::InvalidBracket` if no sign change is found within
/// `max_expansions` steps.
pub fn expand_bracket<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    max_expansions: u32,
) -> MathResult<(f64, f64, f64, f64)>
where
    F: FnMut(f64) -> f64,
{
    if hi <= lo {
        return Err(MathError::invalid_input(format!(
            "bracket [{lo}, {hi}] is empty"
        )));
    }
    let (mut a, mut b) = (lo, hi);
    let mut fa = evaluate(&mut f, a)?;
    let mut fb = evaluate(&mut f, b)?;
    for _ in 0..max_expansions {
        if fa * fb <= 0.0 {
            return Ok((a, b, fa, fb));
        }
        let width = b - a;
        if fa.abs() < fb.abs() {
            a -= 1.6 * width;
            fa = evaluate(&mut f, a)?;
        } else {
            b += 1.6 * width;
            fb = evaluate(&mut f, b)?;
        }
    }
    if fa * fb <= 0.0 {
        return Ok((a, b, fa, fb));
    }
    Err(MathError::InvalidBracket { a, b, fa, fb })
}

/// Evaluates the objective, rejecting non-finite values.
pub(crate) fn evaluate<F>(f: &mut F, x: f64) -> MathResult<f64>
where
    F: FnMut(f64) -> f64,
{
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(MathError::invalid_input(format!(
            "objective is not finite at x = {x}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_expand_bracket() {
        let (a, b, fa, fb) = expand_bracket(|x| x - 10.0, 0.0, 1.0, 20).unwrap();
        assert!(a <= 10.0 && b >= 10.0);
        assert!(fa * fb <= 0.0);
    }

    #[test]
    fn test_expand_bracket_fails() {
        assert!(matches!(
            expand_bracket(|x| x * x + 1.0, -1.0, 1.0, 5),
            Err(MathError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn test_solvers_agree() {
        let f = |x: f64| (x - 0.3).exp() - 1.5;
        let target = 0.3 + 1.5f64.ln();
        let config = SolverConfig::default();
        assert_relative_eq!(brent(f, 0.0, 2.0, &config).unwrap().root, target, epsilon = 1e-9);
        assert_relative_eq!(bisection(f, 0.0, 2.0, &config).unwrap().root, target, epsilon = 1e-9);
        assert_relative_eq!(
            newton_raphson(f, |x| (x - 0.3).exp(), 0.5, &config).unwrap().root,
            target,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_non_finite_objective() {
        let result = brent(|x| if x > 0.5 { f64::NAN } else { x - 1.0 }, 0.0, 1.0, &SolverConfig::default());
        assert!(matches!(result, Err(MathError::InvalidInput { .. })));
    }
}

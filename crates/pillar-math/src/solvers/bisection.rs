//! Bisection root-finding algorithm.

use crate::error::{MathError, MathResult};
use crate::solvers::{evaluate, SolverConfig, SolverResult};

/// Bisection on a sign-changing bracket.
///
/// # Example
///
/// ```rust
/// use pillar_math::solvers::{bisection, SolverConfig};
///
/// let result = bisection(|x| x * x - 2.0, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn bisection<F>(mut f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: FnMut(f64) -> f64,
{
    let mut lo = a.min(b);
    let mut hi = a.max(b);
    let mut f_lo = evaluate(&mut f, lo)?;
    let f_hi = evaluate(&mut f, hi)?;

    if f_lo * f_hi > 0.0 {
        return Err(MathError::InvalidBracket {
            a: lo,
            b: hi,
            fa: f_lo,
            fb: f_hi,
        });
    }
    if f_lo == 0.0 {
        return Ok(SolverResult {
            root: lo,
            iterations: 0,
            residual: 0.0,
        });
    }
    if f_hi == 0.0 {
        return Ok(SolverResult {
            root: hi,
            iterations: 0,
            residual: 0.0,
        });
    }

    for iteration in 1..=config.max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = evaluate(&mut f, mid)?;
        if f_mid == 0.0 || 0.5 * (hi - lo) < config.tolerance {
            return Ok(SolverResult {
                root: mid,
                iterations: iteration,
                residual: f_mid,
            });
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    Err(MathError::convergence_failed(
        config.max_iterations,
        0.5 * (hi - lo),
    ))
}

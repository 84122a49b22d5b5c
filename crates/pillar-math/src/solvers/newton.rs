//! Newton-Raphson root-finding algorithm.

use crate::error::{MathError, MathResult};
use crate::solvers::{evaluate, SolverConfig, SolverResult};

/// Newton-Raphson iteration `x_{n+1} = x_n - f(x_n) / f'(x_n)`.
///
/// # Example
///
/// ```rust
/// use pillar_math::solvers::{newton_raphson, SolverConfig};
///
/// let result = newton_raphson(|x| x * x - 2.0, |x| 2.0 * x, 1.5, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn newton_raphson<F, DF>(
    mut f: F,
    mut df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: FnMut(f64) -> f64,
    DF: FnMut(f64) -> f64,
{
    let mut x = initial_guess;
    let mut fx = evaluate(&mut f, x)?;

    for iteration in 0..config.max_iterations {
        if fx.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual: fx,
            });
        }

        let dfx = evaluate(&mut df, x)?;
        if dfx.abs() < 1e-15 {
            return Err(MathError::DivisionByZero { value: dfx });
        }

        let step = fx / dfx;
        x -= step;
        fx = evaluate(&mut f, x)?;

        if step.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual: fx,
            });
        }
    }

    Err(MathError::convergence_failed(config.max_iterations, fx))
}

//! Brent's root-finding algorithm.

use crate::error::{MathError, MathResult};
use crate::solvers::{evaluate, SolverConfig, SolverResult};

/// Brent's root-finding algorithm.
///
/// Combines the reliability of bisection with the speed of the secant method
/// and inverse quadratic interpolation. Requires `f(a)` and `f(b)` of
/// opposite sign (or one of them zero). Convergence is declared when the
/// bracket is narrower than `config.tolerance` or the function vanishes.
///
/// # Example
///
/// ```rust
/// use pillar_math::solvers::{brent, SolverConfig};
///
/// let f = |x: f64| x * x - 2.0;
/// let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn brent<F>(mut f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: FnMut(f64) -> f64,
{
    let mut a = a;
    let mut b = b;
    let mut fa = evaluate(&mut f, a)?;
    let mut fb = evaluate(&mut f, b)?;

    if fa == 0.0 {
        return Ok(SolverResult {
            root: a,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fb == 0.0 {
        return Ok(SolverResult {
            root: b,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fa * fb > 0.0 {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            // root lies between a and b; rename c to a
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let m = 0.5 * (c - b);
        if m.abs() <= tol || fb == 0.0 {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * m * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = d;
            }
        } else {
            d = m;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = evaluate(&mut f, b)?;
    }

    Err(MathError::convergence_failed(config.max_iterations, fb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_brent_cubic() {
        let f = |x: f64| x * x * x - x - 2.0;
        let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
        assert!(f(result.root).abs() < 1e-9);
    }

    #[test]
    fn test_brent_invalid_bracket() {
        let f = |x: f64| x * x + 1.0;
        assert!(matches!(
            brent(f, -1.0, 1.0, &SolverConfig::default()),
            Err(MathError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn test_brent_endpoint_root() {
        let result = brent(|x| x - 1.0, 1.0, 3.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, 1.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_brent_tight_tolerance() {
        let config = SolverConfig::new(1e-14, 200);
        let result = brent(|x: f64| x.cos() - x, 0.0, 1.0, &config).unwrap();
        assert_relative_eq!(result.root, 0.739_085_133_215_160_6, epsilon = 1e-13);
    }
}

//! Interpolation in log space.

use crate::error::{MathError, MathResult};
use crate::interpolation::{
    find_segment, validate_nodes, CubicInterpolator, Interpolator, LinearInterpolator,
    QuadraticInterpolator,
};

/// Gauss-Legendre nodes and weights on `[-1, 1]`.
const GAUSS_NODES: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683,
    0.0,
    0.538_469_310_105_683,
    0.906_179_845_938_664,
];
const GAUSS_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189,
    0.478_628_670_499_366,
    0.568_888_888_888_889,
    0.478_628_670_499_366,
    0.236_926_885_056_189,
];

/// Applies an inner interpolator to `ln y` and exponentiates the result.
///
/// Requires strictly positive values. Log-linear interpolation of discount
/// factors gives piecewise flat forwards.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, LogInterpolator};
///
/// let interp = LogInterpolator::log_linear(vec![0.0, 1.0], vec![1.0, (-0.05f64).exp()]).unwrap();
/// let df = interp.interpolate(0.5).unwrap();
/// assert!((df - (-0.025f64).exp()).abs() < 1e-14);
/// ```
#[derive(Debug)]
pub struct LogInterpolator {
    xs: Vec<f64>,
    inner: Box<dyn Interpolator>,
    allow_extrapolation: bool,
}

impl LogInterpolator {
    /// Builds the inner interpolator on `(xs, ln ys)` with `build`.
    ///
    /// The inner interpolator must extrapolate; the range check is done
    /// here.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is not strictly positive or the inner
    /// construction fails.
    pub fn new<F>(xs: Vec<f64>, ys: &[f64], build: F) -> MathResult<Self>
    where
        F: FnOnce(Vec<f64>, Vec<f64>) -> MathResult<Box<dyn Interpolator>>,
    {
        validate_nodes(&xs, ys, 2)?;
        if let Some(bad) = ys.iter().find(|y| **y <= 0.0) {
            return Err(MathError::invalid_input(format!(
                "log interpolation requires positive values, got {bad}"
            )));
        }
        let logs = ys.iter().map(|y| y.ln()).collect();
        let inner = build(xs.clone(), logs)?;
        Ok(Self {
            xs,
            inner,
            allow_extrapolation: false,
        })
    }

    /// Log-linear interpolation.
    pub fn log_linear(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(xs, &ys, |x, y| {
            Ok(Box::new(LinearInterpolator::new(x, y)?.with_extrapolation()))
        })
    }

    /// Log-quadratic interpolation.
    pub fn log_quadratic(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(xs, &ys, |x, y| {
            Ok(Box::new(QuadraticInterpolator::new(x, y)?.with_extrapolation()))
        })
    }

    /// Log natural cubic spline.
    pub fn log_cubic(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(xs, &ys, |x, y| {
            Ok(Box::new(CubicInterpolator::natural_spline(x, y)?.with_extrapolation()))
        })
    }

    /// Enables extrapolation beyond the data range.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.allow_extrapolation = true;
        self
    }

    fn check(&self, x: f64) -> MathResult<()> {
        if !self.allows_extrapolation() && !self.in_range(x) {
            return Err(MathError::extrapolation(x, self.min_x(), self.max_x()));
        }
        Ok(())
    }

    fn segment_integral(&self, a: f64, b: f64) -> MathResult<f64> {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (a + b);
        let mut sum = 0.0;
        for (node, weight) in GAUSS_NODES.iter().zip(GAUSS_WEIGHTS.iter()) {
            sum += weight * self.inner.interpolate(mid + half * node)?.exp();
        }
        Ok(sum * half)
    }
}

impl Interpolator for LogInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.check(x)?;
        Ok(self.inner.interpolate(x)?.exp())
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.check(x)?;
        Ok(self.inner.interpolate(x)?.exp() * self.inner.derivative(x)?)
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        self.check(x)?;
        let x0 = self.xs[0];
        if x <= x0 {
            return Ok(-self.segment_integral(x, x0)?);
        }
        let last = find_segment(&self.xs, x);
        let mut total = 0.0;
        for i in 0..last {
            total += self.segment_integral(self.xs[i], self.xs[i + 1])?;
        }
        total += self.segment_integral(self.xs[last], x)?;
        Ok(total)
    }

    fn allows_extrapolation(&self) -> bool {
        self.allow_extrapolation
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_linear_flat_forwards() {
        let xs = vec![0.0, 1.0, 2.0];
        let ys = vec![1.0, (-0.02f64).exp(), (-0.05f64).exp()];
        let interp = LogInterpolator::log_linear(xs, ys).unwrap();
        // d/dt ln P = -f, flat on each segment
        let f1 = -interp.derivative(0.5).unwrap() / interp.interpolate(0.5).unwrap();
        let f2 = -interp.derivative(1.5).unwrap() / interp.interpolate(1.5).unwrap();
        assert_relative_eq!(f1, 0.02, epsilon = 1e-12);
        assert_relative_eq!(f2, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_log_rejects_non_positive() {
        assert!(LogInterpolator::log_linear(vec![0.0, 1.0], vec![1.0, 0.0]).is_err());
        assert!(LogInterpolator::log_cubic(vec![0.0, 1.0, 2.0], vec![1.0, -0.5, 0.3]).is_err());
    }

    #[test]
    fn test_log_primitive() {
        let interp = LogInterpolator::log_linear(vec![0.0, 2.0], vec![1.0, (-0.1f64).exp()]).unwrap();
        // integral of exp(-0.05 t) on [0, 2]
        let exact = (1.0 - (-0.1f64).exp()) / 0.05;
        assert_relative_eq!(interp.primitive(2.0).unwrap(), exact, epsilon = 1e-12);
    }

    #[test]
    fn test_log_extrapolation_flag() {
        let interp = LogInterpolator::log_linear(vec![0.0, 1.0], vec![1.0, 0.99]).unwrap();
        assert!(interp.interpolate(1.5).is_err());
        let interp = interp.with_extrapolation();
        assert!(interp.interpolate(1.5).is_ok());
    }
}

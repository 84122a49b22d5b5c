//! C1 piecewise quadratic interpolation.

use crate::error::MathResult;
use crate::interpolation::piecewise::PiecewisePolynomial;
use crate::interpolation::{validate_nodes, Interpolator};

/// Quadratic spline with continuous first derivative.
///
/// The first segment is a straight line; each following segment is the
/// parabola that matches the incoming slope at its left node and the
/// value at its right node.
#[derive(Debug, Clone)]
pub struct QuadraticInterpolator {
    poly: PiecewisePolynomial,
}

impl QuadraticInterpolator {
    /// Creates a quadratic interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error on fewer than 2 points or unsorted abscissae.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;

        let n = xs.len();
        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        let mut slope = (ys[1] - ys[0]) / (xs[1] - xs[0]);
        for i in 0..n - 1 {
            let h = xs[i + 1] - xs[i];
            let secant = (ys[i + 1] - ys[i]) / h;
            b.push(slope);
            c.push((secant - slope) / h);
            slope = 2.0 * secant - slope;
        }
        let d = vec![0.0; n - 1];

        Ok(Self {
            poly: PiecewisePolynomial::new(xs, ys, b, c, d),
        })
    }

    /// Enables extrapolation beyond the data range.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.poly.allow_extrapolation = true;
        self
    }
}

impl Interpolator for QuadraticInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.poly.value(x)
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.poly.derivative(x)
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        self.poly.primitive(x)
    }

    fn allows_extrapolation(&self) -> bool {
        self.poly.allow_extrapolation
    }

    fn min_x(&self) -> f64 {
        self.poly.min_x()
    }

    fn max_x(&self) -> f64 {
        self.poly.max_x()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slope_continuity() {
        let xs = vec![0.0, 1.0, 3.0, 4.0];
        let ys = vec![1.0, 2.0, 2.5, 4.0];
        let q = QuadraticInterpolator::new(xs, ys).unwrap();
        for knot in [1.0, 3.0] {
            let left = q.derivative(knot - 1e-9).unwrap();
            let right = q.derivative(knot + 1e-9).unwrap();
            assert_relative_eq!(left, right, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_reproduces_line() {
        let q = QuadraticInterpolator::new(vec![0.0, 1.0, 2.0], vec![1.0, 3.0, 5.0]).unwrap();
        assert_relative_eq!(q.interpolate(1.5).unwrap(), 4.0, epsilon = 1e-14);
        assert_relative_eq!(q.primitive(2.0).unwrap(), 6.0, epsilon = 1e-14);
    }
}

//! Backward-flat (piecewise constant) interpolation.

use crate::error::MathResult;
use crate::interpolation::{check_range, validate_nodes, Interpolator};

/// Piecewise constant interpolation taking the value of the right node.
///
/// On `(x_i, x_{i+1}]` the value is `y_{i+1}`; at or before `x_0` it is
/// `y_0`. Used for step-like curves such as instantaneous forwards that
/// reproduce flat-forward discounting.
#[derive(Debug, Clone)]
pub struct BackwardFlatInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    areas: Vec<f64>,
    allow_extrapolation: bool,
}

impl BackwardFlatInterpolator {
    /// Creates a backward-flat interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error on fewer than 2 points or unsorted abscissae.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;
        let mut areas = Vec::with_capacity(xs.len());
        areas.push(0.0);
        for i in 1..xs.len() {
            areas.push(areas[i - 1] + ys[i] * (xs[i] - xs[i - 1]));
        }
        Ok(Self {
            xs,
            ys,
            areas,
            allow_extrapolation: false,
        })
    }

    /// Enables extrapolation beyond the data range.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.allow_extrapolation = true;
        self
    }

    /// Index of the node whose value applies at x.
    fn node_for(&self, x: f64) -> usize {
        if x <= self.xs[0] {
            return 0;
        }
        let idx = self.xs.partition_point(|&xi| xi < x);
        idx.min(self.xs.len() - 1)
    }
}

impl Interpolator for BackwardFlatInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        Ok(self.ys[self.node_for(x)])
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        Ok(0.0)
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        if x <= self.xs[0] {
            return Ok(self.ys[0] * (x - self.xs[0]));
        }
        let i = self.node_for(x);
        Ok(self.areas[i - 1] + self.ys[i] * (x - self.xs[i - 1]))
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
    fn test_backward_flat_values() {
        let interp =
            BackwardFlatInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.01, 0.02, 0.03]).unwrap();
        assert_relative_eq!(interp.interpolate(0.0).unwrap(), 0.01);
        assert_relative_eq!(interp.interpolate(0.5).unwrap(), 0.02);
        assert_relative_eq!(interp.interpolate(1.0).unwrap(), 0.02);
        assert_relative_eq!(interp.interpolate(1.0001).unwrap(), 0.03);
    }

    #[test]
    fn test_backward_flat_primitive() {
        let interp = BackwardFlatInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.01, 0.02, 0.03])
            .unwrap()
            .with_extrapolation();
        assert_relative_eq!(interp.primitive(1.5).unwrap(), 0.02 + 0.015, epsilon = 1e-15);
        assert_relative_eq!(interp.primitive(3.0).unwrap(), 0.02 + 0.06, epsilon = 1e-15);
    }
}

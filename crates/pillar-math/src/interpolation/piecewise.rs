//! Shared evaluation for piecewise polynomials of degree three or less.

use crate::error::MathResult;
use crate::interpolation::{check_range, find_segment};

/// `y(x) = y_i + b_i dx + c_i dx² + d_i dx³` on `[x_i, x_{i+1}]`, `dx = x - x_i`.
#[derive(Debug, Clone)]
pub(crate) struct PiecewisePolynomial {
    pub(crate) xs: Vec<f64>,
    pub(crate) ys: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    areas: Vec<f64>,
    pub(crate) allow_extrapolation: bool,
}

impl PiecewisePolynomial {
    /// Builds from per-segment coefficients; `b`, `c`, `d` have `n - 1` entries.
    pub(crate) fn new(xs: Vec<f64>, ys: Vec<f64>, b: Vec<f64>, c: Vec<f64>, d: Vec<f64>) -> Self {
        let mut areas = Vec::with_capacity(xs.len());
        areas.push(0.0);
        for i in 0..xs.len() - 1 {
            let h = xs[i + 1] - xs[i];
            let area = h * (ys[i] + h * (b[i] / 2.0 + h * (c[i] / 3.0 + h * d[i] / 4.0)));
            areas.push(areas[i] + area);
        }
        Self {
            xs,
            ys,
            b,
            c,
            d,
            areas,
            allow_extrapolation: false,
        }
    }

    /// Cubic Hermite form from node slopes.
    pub(crate) fn from_slopes(xs: Vec<f64>, ys: Vec<f64>, slopes: &[f64]) -> Self {
        let n = xs.len();
        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        let mut d = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            let h = xs[i + 1] - xs[i];
            let s = (ys[i + 1] - ys[i]) / h;
            b.push(slopes[i]);
            c.push((3.0 * s - slopes[i + 1] - 2.0 * slopes[i]) / h);
            d.push((slopes[i + 1] + slopes[i] - 2.0 * s) / (h * h));
        }
        Self::new(xs, ys, b, c, d)
    }

    pub(crate) fn value(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        let dx = x - self.xs[i];
        Ok(self.ys[i] + dx * (self.b[i] + dx * (self.c[i] + dx * self.d[i])))
    }

    pub(crate) fn derivative(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        let dx = x - self.xs[i];
        Ok(self.b[i] + dx * (2.0 * self.c[i] + 3.0 * dx * self.d[i]))
    }

    pub(crate) fn second_derivative(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        let dx = x - self.xs[i];
        Ok(2.0 * self.c[i] + 6.0 * dx * self.d[i])
    }

    pub(crate) fn primitive(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        let dx = x - self.xs[i];
        Ok(self.areas[i]
            + dx * (self.ys[i]
                + dx * (self.b[i] / 2.0 + dx * (self.c[i] / 3.0 + dx * self.d[i] / 4.0))))
    }

    pub(crate) fn min_x(&self) -> f64 {
        self.xs[0]
    }

    pub(crate) fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

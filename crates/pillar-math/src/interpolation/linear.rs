//! Linear interpolation.

use crate::error::MathResult;
use crate::interpolation::{check_range, find_segment, validate_nodes, Interpolator};

/// Linear interpolation between data points.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 4.0, 9.0];
///
/// let interp = LinearInterpolator::new(xs, ys).unwrap();
/// assert_eq!(interp.interpolate(1.5).unwrap(), 2.5);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Integral from `xs[0]` to each node.
    areas: Vec<f64>,
    allow_extrapolation: bool,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 points, lengths differ or
    /// the abscissae are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;

        let mut areas = Vec::with_capacity(xs.len());
        areas.push(0.0);
        for i in 1..xs.len() {
            let area = 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
            areas.push(areas[i - 1] + area);
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

    fn slope(&self, i: usize) -> f64 {
        (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        Ok(self.ys[i] + (x - self.xs[i]) * self.slope(i))
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        Ok(self.slope(find_segment(&self.xs, x)))
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        let i = find_segment(&self.xs, x);
        let dx = x - self.xs[i];
        Ok(self.areas[i] + dx * (self.ys[i] + 0.5 * self.slope(i) * dx))
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

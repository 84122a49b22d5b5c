//! Monotone convex interpolation (Hagan-West).
//!
//! Reference: Hagan, P. & West, G. (2006) "Interpolation Methods for Curve
//! Construction".

use crate::error::{MathError, MathResult};
use crate::interpolation::{find_segment, Interpolator};

/// Instantaneous forward curve from discrete forwards.
///
/// The input is a time grid `t_0 < t_1 < ... < t_n` and the discrete
/// (average) forward `fd_i` on each `(t_{i-1}, t_i]`. The interpolant is the
/// instantaneous forward `f(t)`; its integral over every interval equals
/// `fd_i (t_i - t_{i-1})` exactly, so discount factors at the nodes are
/// reproduced. `primitive(t)` is `∫_{t_0}^t f`.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, MonotoneConvex};
///
/// let times = vec![0.0, 1.0, 2.0, 5.0];
/// let forwards = vec![0.02, 0.03, 0.035];
/// let mc = MonotoneConvex::new(times, forwards).unwrap();
/// assert!((mc.primitive(2.0).unwrap() - 0.05).abs() < 1e-14);
/// ```
#[derive(Debug, Clone)]
pub struct MonotoneConvex {
    times: Vec<f64>,
    /// `fd[i]` is the average forward on `(times[i], times[i+1]]`.
    discrete: Vec<f64>,
    /// Instantaneous forwards at the nodes.
    nodes: Vec<f64>,
    areas: Vec<f64>,
    allow_extrapolation: bool,
}

impl MonotoneConvex {
    /// Creates the interpolant without a positivity constraint.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two times, the forward count
    /// is not one less than the time count, or times are not increasing.
    pub fn new(times: Vec<f64>, forwards: Vec<f64>) -> MathResult<Self> {
        Self::build(times, forwards, false)
    }

    /// Creates the interpolant with node forwards clamped to keep `f >= 0`
    /// when all discrete forwards are non-negative.
    pub fn positive(times: Vec<f64>, forwards: Vec<f64>) -> MathResult<Self> {
        Self::build(times, forwards, true)
    }

    fn build(times: Vec<f64>, discrete: Vec<f64>, positive: bool) -> MathResult<Self> {
        if times.len() < 2 {
            return Err(MathError::insufficient_data(2, times.len()));
        }
        if discrete.len() + 1 != times.len() {
            return Err(MathError::invalid_input(format!(
                "{} times need {} discrete forwards, got {}",
                times.len(),
                times.len() - 1,
                discrete.len()
            )));
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::invalid_input("times must be strictly increasing"));
        }
        if discrete.iter().any(|f| !f.is_finite()) {
            return Err(MathError::invalid_input("forwards must be finite"));
        }

        let n = discrete.len();
        let mut nodes = vec![0.0; n + 1];
        for i in 1..n {
            let left = times[i] - times[i - 1];
            let right = times[i + 1] - times[i];
            nodes[i] = (left * discrete[i] + right * discrete[i - 1]) / (left + right);
        }
        if n == 1 {
            nodes[0] = discrete[0];
            nodes[1] = discrete[0];
        } else {
            nodes[0] = discrete[0] - 0.5 * (nodes[1] - discrete[0]);
            nodes[n] = discrete[n - 1] - 0.5 * (nodes[n - 1] - discrete[n - 1]);
        }

        if positive && discrete.iter().all(|f| *f >= 0.0) {
            nodes[0] = nodes[0].clamp(0.0, 2.0 * discrete[0]);
            for i in 1..n {
                nodes[i] = nodes[i].clamp(0.0, 2.0 * discrete[i - 1].min(discrete[i]));
            }
            nodes[n] = nodes[n].clamp(0.0, 2.0 * discrete[n - 1]);
        }

        let mut areas = Vec::with_capacity(n + 1);
        areas.push(0.0);
        for i in 0..n {
            areas.push(areas[i] + discrete[i] * (times[i + 1] - times[i]));
        }

        Ok(Self {
            times,
            discrete,
            nodes,
            areas,
            allow_extrapolation: false,
        })
    }

    /// Enables flat extrapolation of the edge forwards.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.allow_extrapolation = true;
        self
    }

    fn check(&self, t: f64) -> MathResult<()> {
        if !self.allow_extrapolation && !self.in_range(t) {
            return Err(MathError::extrapolation(t, self.min_x(), self.max_x()));
        }
        Ok(())
    }

    /// `(g, g', G)` of the Hagan-West adjustment on interval `i` at local
    /// coordinate `x` in `[0, 1]`.
    fn shape(&self, i: usize, x: f64) -> (f64, f64, f64) {
        let fd = self.discrete[i];
        let g0 = self.nodes[i] - fd;
        let g1 = self.nodes[i + 1] - fd;

        if g0 == 0.0 && g1 == 0.0 {
            return (0.0, 0.0, 0.0);
        }

        let region_i = (g0 < 0.0 && -0.5 * g0 <= g1 && g1 <= -2.0 * g0)
            || (g0 > 0.0 && -0.5 * g0 >= g1 && g1 >= -2.0 * g0);
        let region_ii = (g0 < 0.0 && g1 > -2.0 * g0) || (g0 > 0.0 && g1 < -2.0 * g0);
        let region_iii =
            (g0 > 0.0 && 0.0 > g1 && g1 > -0.5 * g0) || (g0 < 0.0 && 0.0 < g1 && g1 < -0.5 * g0);

        if region_i {
            let g = g0 * (1.0 - 4.0 * x + 3.0 * x * x) + g1 * (-2.0 * x + 3.0 * x * x);
            let dg = g0 * (-4.0 + 6.0 * x) + g1 * (-2.0 + 6.0 * x);
            let big = g0 * (x - 2.0 * x * x + x * x * x) + g1 * (-x * x + x * x * x);
            (g, dg, big)
        } else if region_ii {
            let eta = (g1 + 2.0 * g0) / (g1 - g0);
            if x <= eta {
                (g0, 0.0, g0 * x)
            } else {
                let w = 1.0 - eta;
                let u = x - eta;
                (
                    g0 + (g1 - g0) * (u / w).powi(2),
                    2.0 * (g1 - g0) * u / (w * w),
                    g0 * x + (g1 - g0) * u.powi(3) / (3.0 * w * w),
                )
            }
        } else if region_iii {
            let eta = 3.0 * g1 / (g1 - g0);
            if x < eta {
                let u = eta - x;
                (
                    g1 + (g0 - g1) * (u / eta).powi(2),
                    -2.0 * (g0 - g1) * u / (eta * eta),
                    g1 * x + (g0 - g1) * (eta - u.powi(3) / (eta * eta)) / 3.0,
                )
            } else {
                (g1, 0.0, g1 * x + (g0 - g1) * eta / 3.0)
            }
        } else {
            let eta = g1 / (g1 + g0);
            let a = -g0 * g1 / (g0 + g1);
            if x <= eta && eta > 0.0 {
                let u = eta - x;
                (
                    a + (g0 - a) * (u / eta).powi(2),
                    -2.0 * (g0 - a) * u / (eta * eta),
                    a * x + (g0 - a) * (eta - u.powi(3) / (eta * eta)) / 3.0,
                )
            } else {
                let w = 1.0 - eta;
                let u = x - eta;
                (
                    a + (g1 - a) * (u / w).powi(2),
                    2.0 * (g1 - a) * u / (w * w),
                    a * x + (g0 - a) * eta / 3.0 + (g1 - a) * u.powi(3) / (3.0 * w * w),
                )
            }
        }
    }

    /// The discrete forwards the curve was built from.
    #[must_use]
    pub fn discrete_forwards(&self) -> &[f64] {
        &self.discrete
    }
}

impl Interpolator for MonotoneConvex {
    fn interpolate(&self, t: f64) -> MathResult<f64> {
        self.check(t)?;
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return Ok(self.nodes[0]);
        }
        if t >= self.times[last] {
            return Ok(self.nodes[last]);
        }
        let i = find_segment(&self.times, t);
        let h = self.times[i + 1] - self.times[i];
        let (g, _, _) = self.shape(i, (t - self.times[i]) / h);
        Ok(self.discrete[i] + g)
    }

    fn derivative(&self, t: f64) -> MathResult<f64> {
        self.check(t)?;
        let last = self.times.len() - 1;
        if t < self.times[0] || t > self.times[last] {
            return Ok(0.0);
        }
        let i = find_segment(&self.times, t);
        let h = self.times[i + 1] - self.times[i];
        let (_, dg, _) = self.shape(i, (t - self.times[i]) / h);
        Ok(dg / h)
    }

    fn primitive(&self, t: f64) -> MathResult<f64> {
        self.check(t)?;
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return Ok(self.nodes[0] * (t - self.times[0]));
        }
        if t >= self.times[last] {
            return Ok(self.areas[last] + self.nodes[last] * (t - self.times[last]));
        }
        let i = find_segment(&self.times, t);
        let h = self.times[i + 1] - self.times[i];
        let x = (t - self.times[i]) / h;
        let (_, _, big) = self.shape(i, x);
        Ok(self.areas[i] + self.discrete[i] * (t - self.times[i]) + h * big)
    }

    fn allows_extrapolation(&self) -> bool {
        self.allow_extrapolation
    }

    fn min_x(&self) -> f64 {
        self.times[0]
    }

    fn max_x(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> MonotoneConvex {
        let times = vec![0.0, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0];
        let forwards = vec![0.02, 0.024, 0.031, 0.029, 0.035, 0.036];
        MonotoneConvex::new(times, forwards).unwrap()
    }

    #[test]
    fn test_reproduces_node_integrals() {
        let mc = sample();
        let times = [0.0, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0];
        let forwards = [0.02, 0.024, 0.031, 0.029, 0.035, 0.036];
        let mut expected = 0.0;
        for i in 0..forwards.len() {
            expected += forwards[i] * (times[i + 1] - times[i]);
            assert_relative_eq!(mc.primitive(times[i + 1]).unwrap(), expected, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_forward_continuous_at_nodes() {
        let mc = sample();
        for t in [0.5, 1.0, 2.0, 3.0, 5.0] {
            let left = mc.interpolate(t - 1e-9).unwrap();
            let right = mc.interpolate(t + 1e-9).unwrap();
            assert_relative_eq!(left, right, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_primitive_matches_forward() {
        let mc = sample();
        let h = 1e-6;
        for t in [0.3, 0.8, 1.7, 2.4, 4.1, 7.5] {
            let numeric = (mc.primitive(t + h).unwrap() - mc.primitive(t - h).unwrap()) / (2.0 * h);
            assert_relative_eq!(numeric, mc.interpolate(t).unwrap(), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_flat_forwards_stay_flat() {
        let mc = MonotoneConvex::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.03, 0.03, 0.03]).unwrap();
        assert_relative_eq!(mc.interpolate(1.7).unwrap(), 0.03, epsilon = 1e-15);
    }

    #[test]
    fn test_positivity() {
        let mc = MonotoneConvex::positive(vec![0.0, 1.0, 2.0, 3.0], vec![0.001, 0.05, 0.001])
            .unwrap();
        for k in 0..=300 {
            assert!(mc.interpolate(f64::from(k) * 0.01).unwrap() >= -1e-15);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(MonotoneConvex::new(vec![0.0, 1.0], vec![0.01, 0.02]).is_err());
        assert!(MonotoneConvex::new(vec![1.0, 0.0], vec![0.01]).is_err());
    }
}

//! Piecewise cubic interpolation.
//!
//! A cubic is fixed on each segment by the node values and the node
//! slopes. The slopes come from one of three schemes:
//!
//! - `Spline`: C2 spline, a tridiagonal system closed by the boundary
//!   conditions
//! - `Kruger`: harmonic mean of adjacent secants, zero at local extrema
//! - `Parabolic`: slope of the parabola through three neighbours (Bessel)
//!
//! An optional Hyman filter clips the slopes so monotone data stay
//! monotone.

use serde::{Deserialize, Serialize};

use crate::error::MathResult;
use crate::interpolation::piecewise::PiecewisePolynomial;
use crate::interpolation::{validate_nodes, Interpolator};
use crate::linear_algebra::solve_tridiagonal;

/// Slope scheme for [`CubicInterpolator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeApprox {
    /// Global C2 spline.
    Spline,
    /// Kruger's local scheme.
    Kruger,
    /// Local parabolic (Bessel) slopes.
    Parabolic,
}

/// End condition at the left or right node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Prescribed second derivative (zero gives the natural spline).
    SecondDerivative(f64),
    /// Prescribed first derivative.
    FirstDerivative(f64),
    /// Third derivative continuous across the second node.
    NotAKnot,
}

/// Piecewise cubic interpolator.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{CubicInterpolator, Interpolator};
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 8.0, 27.0];
/// let spline = CubicInterpolator::not_a_knot(xs, ys).unwrap();
/// // not-a-knot reproduces a cubic exactly
/// assert!((spline.interpolate(1.5).unwrap() - 3.375).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CubicInterpolator {
    poly: PiecewisePolynomial,
    approx: DerivativeApprox,
    monotonic: bool,
}

impl CubicInterpolator {
    /// Creates a cubic interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid nodes or a singular spline system.
    pub fn new(
        xs: Vec<f64>,
        ys: Vec<f64>,
        approx: DerivativeApprox,
        monotonic: bool,
        left: BoundaryCondition,
        right: BoundaryCondition,
    ) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;

        let n = xs.len();
        let dx: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / dx[i]).collect();

        let mut slopes = if n == 2 {
            two_point_slopes(dx[0], s[0], left, right)
        } else {
            match approx {
                DerivativeApprox::Spline => spline_slopes(&dx, &s, left, right)?,
                DerivativeApprox::Kruger | DerivativeApprox::Parabolic => {
                    local_slopes(&dx, &s, approx, left, right)
                }
            }
        };

        if monotonic {
            hyman_filter(&dx, &s, &mut slopes);
        }

        Ok(Self {
            poly: PiecewisePolynomial::from_slopes(xs, ys, &slopes),
            approx,
            monotonic,
        })
    }

    /// Natural cubic spline (zero second derivative at both ends).
    pub fn natural_spline(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(
            xs,
            ys,
            DerivativeApprox::Spline,
            false,
            BoundaryCondition::SecondDerivative(0.0),
            BoundaryCondition::SecondDerivative(0.0),
        )
    }

    /// Not-a-knot cubic spline.
    pub fn not_a_knot(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(
            xs,
            ys,
            DerivativeApprox::Spline,
            false,
            BoundaryCondition::NotAKnot,
            BoundaryCondition::NotAKnot,
        )
    }

    /// Kruger slopes with natural ends.
    pub fn kruger(xs: Vec<f64>, ys: Vec<f64>, monotonic: bool) -> MathResult<Self> {
        Self::new(
            xs,
            ys,
            DerivativeApprox::Kruger,
            monotonic,
            BoundaryCondition::SecondDerivative(0.0),
            BoundaryCondition::SecondDerivative(0.0),
        )
    }

    /// Parabolic (Bessel) Hermite cubic with natural ends.
    pub fn hermite(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        Self::new(
            xs,
            ys,
            DerivativeApprox::Parabolic,
            false,
            BoundaryCondition::SecondDerivative(0.0),
            BoundaryCondition::SecondDerivative(0.0),
        )
    }

    /// Enables extrapolation beyond the data range.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.poly.allow_extrapolation = true;
        self
    }

    /// Second derivative at x.
    pub fn second_derivative(&self, x: f64) -> MathResult<f64> {
        self.poly.second_derivative(x)
    }

    /// The slope scheme.
    #[must_use]
    pub fn approx(&self) -> DerivativeApprox {
        self.approx
    }

    /// Whether the Hyman filter was applied.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }
}

impl Interpolator for CubicInterpolator {
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

// ============================================================================
// Slope schemes
// ============================================================================

fn left_slope(bc: BoundaryCondition, dx: f64, s: f64, next: f64, parabolic: f64) -> f64 {
    match bc {
        BoundaryCondition::SecondDerivative(v) => (3.0 * s - next - v * dx / 2.0) / 2.0,
        BoundaryCondition::FirstDerivative(v) => v,
        BoundaryCondition::NotAKnot => parabolic,
    }
}

fn right_slope(bc: BoundaryCondition, dx: f64, s: f64, prev: f64, parabolic: f64) -> f64 {
    match bc {
        BoundaryCondition::SecondDerivative(v) => (3.0 * s - prev + v * dx / 2.0) / 2.0,
        BoundaryCondition::FirstDerivative(v) => v,
        BoundaryCondition::NotAKnot => parabolic,
    }
}

fn two_point_slopes(
    dx: f64,
    s: f64,
    left: BoundaryCondition,
    right: BoundaryCondition,
) -> Vec<f64> {
    match (left, right) {
        (BoundaryCondition::FirstDerivative(a), BoundaryCondition::FirstDerivative(b)) => {
            vec![a, b]
        }
        (BoundaryCondition::FirstDerivative(a), _) => vec![a, right_slope(right, dx, s, a, s)],
        (_, BoundaryCondition::FirstDerivative(b)) => vec![left_slope(left, dx, s, b, s), b],
        _ => vec![s, s],
    }
}

fn local_slopes(
    dx: &[f64],
    s: &[f64],
    approx: DerivativeApprox,
    left: BoundaryCondition,
    right: BoundaryCondition,
) -> Vec<f64> {
    let n = dx.len() + 1;
    let mut slopes = vec![0.0; n];
    for i in 1..n - 1 {
        slopes[i] = match approx {
            DerivativeApprox::Kruger => {
                if s[i - 1] * s[i] <= 0.0 {
                    0.0
                } else {
                    2.0 / (1.0 / s[i - 1] + 1.0 / s[i])
                }
            }
            _ => (dx[i - 1] * s[i] + dx[i] * s[i - 1]) / (dx[i - 1] + dx[i]),
        };
    }
    let p0 = ((2.0 * dx[0] + dx[1]) * s[0] - dx[0] * s[1]) / (dx[0] + dx[1]);
    let pn = ((2.0 * dx[n - 2] + dx[n - 3]) * s[n - 2] - dx[n - 2] * s[n - 3])
        / (dx[n - 2] + dx[n - 3]);
    slopes[0] = left_slope(left, dx[0], s[0], slopes[1], p0);
    slopes[n - 1] = right_slope(right, dx[n - 2], s[n - 2], slopes[n - 2], pn);
    slopes
}

fn spline_slopes(
    dx: &[f64],
    s: &[f64],
    left: BoundaryCondition,
    right: BoundaryCondition,
) -> MathResult<Vec<f64>> {
    let n = dx.len() + 1;
    let mut lower = vec![0.0; n - 1];
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n - 1];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        lower[i - 1] = dx[i];
        diag[i] = 2.0 * (dx[i] + dx[i - 1]);
        upper[i] = dx[i - 1];
        rhs[i] = 3.0 * (dx[i] * s[i - 1] + dx[i - 1] * s[i]);
    }

    match left {
        BoundaryCondition::SecondDerivative(v) => {
            diag[0] = 2.0;
            upper[0] = 1.0;
            rhs[0] = 3.0 * s[0] - v * dx[0] / 2.0;
        }
        BoundaryCondition::FirstDerivative(v) => {
            diag[0] = 1.0;
            upper[0] = 0.0;
            rhs[0] = v;
        }
        BoundaryCondition::NotAKnot if n >= 4 => {
            diag[0] = dx[1] * (dx[1] + dx[0]);
            upper[0] = (dx[0] + dx[1]) * (dx[0] + dx[1]);
            rhs[0] = s[0] * dx[1] * (2.0 * dx[1] + 3.0 * dx[0]) + s[1] * dx[0] * dx[0];
        }
        BoundaryCondition::NotAKnot => {
            diag[0] = 1.0;
            upper[0] = 0.0;
            rhs[0] = ((2.0 * dx[0] + dx[1]) * s[0] - dx[0] * s[1]) / (dx[0] + dx[1]);
        }
    }

    match right {
        BoundaryCondition::SecondDerivative(v) => {
            lower[n - 2] = 1.0;
            diag[n - 1] = 2.0;
            rhs[n - 1] = 3.0 * s[n - 2] + v * dx[n - 2] / 2.0;
        }
        BoundaryCondition::FirstDerivative(v) => {
            lower[n - 2] = 0.0;
            diag[n - 1] = 1.0;
            rhs[n - 1] = v;
        }
        BoundaryCondition::NotAKnot if n >= 4 => {
            let (a, b) = (dx[n - 3], dx[n - 2]);
            lower[n - 2] = -(b + a) * (b + a);
            diag[n - 1] = -a * (a + b);
            rhs[n - 1] = -s[n - 3] * b * b - s[n - 2] * a * (3.0 * b + 2.0 * a);
        }
        BoundaryCondition::NotAKnot => {
            let (a, b) = (dx[n - 3], dx[n - 2]);
            lower[n - 2] = 0.0;
            diag[n - 1] = 1.0;
            rhs[n - 1] = ((2.0 * b + a) * s[n - 2] - b * s[n - 3]) / (a + b);
        }
    }

    solve_tridiagonal(&lower, &diag, &upper, &rhs)
}

/// Hyman's monotonicity filter on node slopes.
fn hyman_filter(dx: &[f64], s: &[f64], slopes: &mut [f64]) {
    let n = slopes.len();
    let clip = |slope: f64, bound: f64| slope.signum() * slope.abs().min(bound);

    slopes[0] = if slopes[0] * s[0] > 0.0 {
        clip(slopes[0], (3.0 * s[0]).abs())
    } else {
        0.0
    };
    slopes[n - 1] = if slopes[n - 1] * s[n - 2] > 0.0 {
        clip(slopes[n - 1], (3.0 * s[n - 2]).abs())
    } else {
        0.0
    };
    for i in 1..n - 1 {
        let pm = (s[i - 1] * dx[i] + s[i] * dx[i - 1]) / (dx[i - 1] + dx[i]);
        let bound = 3.0 * s[i - 1].abs().min(s[i].abs()).min(pm.abs());
        slopes[i] = if slopes[i] * pm > 0.0 && s[i - 1] * s[i] > 0.0 {
            clip(slopes[i], bound)
        } else {
            0.0
        };
    }
}

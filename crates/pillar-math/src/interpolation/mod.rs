//! One-dimensional interpolation.
//!
//! Every curve and surface in the workspace is a set of `(x, y)` nodes
//! plus one of the interpolators below. Nodes must have strictly
//! increasing abscissae.
//!
//! # Available Methods
//!
//! - [`LinearInterpolator`]: piecewise linear
//! - [`BackwardFlatInterpolator`]: piecewise constant, value of the right node
//! - [`QuadraticInterpolator`]: C1 piecewise quadratic
//! - [`CubicInterpolator`]: piecewise cubic with spline, Kruger or parabolic
//!   slopes, optional Hyman monotonicity filter and configurable boundaries
//! - [`MonotoneConvex`]: Hagan-West forward interpolation from discrete forwards
//! - [`LogInterpolator`]: any of the above applied to `ln y`
//! - [`MixedInterpolator`]: one method up to a switch node, another beyond
//!
//! # Extrapolation
//!
//! Interpolators reject points outside `[min_x, max_x]` unless built
//! `with_extrapolation()`, in which case the edge segment is continued.
//! Flat extrapolation is a curve-level policy and lives with the curves.

mod backward_flat;
mod cubic;
mod linear;
mod log;
mod mixed;
mod monotone_convex;
mod piecewise;
mod quadratic;

pub use backward_flat::BackwardFlatInterpolator;
pub use cubic::{BoundaryCondition, CubicInterpolator, DerivativeApprox};
pub use linear::LinearInterpolator;
pub use log::LogInterpolator;
pub use mixed::MixedInterpolator;
pub use monotone_convex::MonotoneConvex;
pub use quadratic::QuadraticInterpolator;

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::{MathError, MathResult};

/// Trait for interpolation methods.
///
/// All interpolation methods implement this trait, providing a unified
/// interface for curve construction.
pub trait Interpolator: Send + Sync + Debug {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Integral of the interpolant from `min_x()` to `x`.
    ///
    /// Forward-rate curves use this to recover discount factors.
    fn primitive(&self, x: f64) -> MathResult<f64>;

    /// Returns true if extrapolation is allowed.
    fn allows_extrapolation(&self) -> bool {
        false
    }

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the interpolation range, allowing for
    /// rounding at either end.
    fn in_range(&self, x: f64) -> bool {
        within_range(self.min_x(), self.max_x(), x)
    }
}

impl Interpolator for Box<dyn Interpolator> {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.as_ref().interpolate(x)
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.as_ref().derivative(x)
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        self.as_ref().primitive(x)
    }

    fn allows_extrapolation(&self) -> bool {
        self.as_ref().allows_extrapolation()
    }

    fn min_x(&self) -> f64 {
        self.as_ref().min_x()
    }

    fn max_x(&self) -> f64 {
        self.as_ref().max_x()
    }
}

/// Validates node vectors: equal lengths, at least `required` points,
/// finite values and strictly increasing abscissae.
pub(crate) fn validate_nodes(xs: &[f64], ys: &[f64], required: usize) -> MathResult<()> {
    if xs.len() < required {
        return Err(MathError::insufficient_data(required, xs.len()));
    }
    if xs.len() != ys.len() {
        return Err(MathError::invalid_input(format!(
            "xs and ys must have same length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("nodes must be finite"));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::invalid_input(
            "x values must be strictly increasing",
        ));
    }
    Ok(())
}

/// Index `i` of the segment `[xs[i], xs[i+1]]` used for `x`.
///
/// Points left of the grid map to the first segment and points right of it
/// to the last one.
pub(crate) fn find_segment(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    match xs.binary_search_by(|node| node.partial_cmp(&x).unwrap_or(Ordering::Equal)) {
        Ok(i) => i.min(last),
        Err(i) => i.saturating_sub(1).min(last),
    }
}

/// Relative tolerance of [`close`], in multiples of machine epsilon.
const CLOSE_ULPS: f64 = 42.0;

/// True when `a` and `b` agree up to a few ulps.
pub(crate) fn close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    let tolerance = CLOSE_ULPS * f64::EPSILON;
    diff <= tolerance * a.abs() && diff <= tolerance * b.abs()
}

/// True when `x` is in `[min, max]` or within rounding of either end.
pub(crate) fn within_range(min: f64, max: f64, x: f64) -> bool {
    (x >= min || close(x, min)) && (x <= max || close(x, max))
}

/// Errors unless `x` is inside the grid or extrapolation is allowed.
///
/// Points a few ulps outside the grid count as inside; the edge segments
/// evaluate them.
pub(crate) fn check_range(xs: &[f64], x: f64, allow_extrapolation: bool) -> MathResult<()> {
    let (min, max) = (xs[0], xs[xs.len() - 1]);
    if !allow_extrapolation && !within_range(min, max, x) {
        return Err(MathError::extrapolation(x, min, max));
    }
    Ok(())
}

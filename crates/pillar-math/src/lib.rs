//! # Pillar Math
//!
//! Numerical building blocks for the Pillar term-structure library.
//!
//! This crate provides:
//!
//! - **Interpolation**: Linear, log, cubic (spline, Kruger, Hermite),
//!   quadratic, backward-flat, mixed and Hagan-West monotone-convex schemes
//! - **Solvers**: Root-finding algorithms (Brent, Newton-Raphson, Bisection)
//! - **Optimization**: Nelder-Mead simplex minimization
//! - **Linear Algebra**: Tridiagonal systems and least squares
//! - **Distributions**: Standard normal helpers
//!
//! ## Example
//!
//! ```rust
//! use pillar_math::prelude::*;
//!
//! let interp = CubicInterpolator::natural_spline(
//!     vec![0.0, 1.0, 2.0, 5.0],
//!     vec![0.010, 0.015, 0.018, 0.022],
//! )
//! .unwrap();
//! let rate = interp.interpolate(1.5).unwrap();
//! assert!(rate > 0.015 && rate < 0.018);
//!
//! let root = brent(|x| x * x - 2.0, 0.0, 2.0, &SolverConfig::default()).unwrap();
//! assert!((root.root - 2f64.sqrt()).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::if_not_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::single_match_else)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::derivable_impls)]

pub mod distributions;
pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod optimization;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::distributions::{norm_cdf, norm_inv, norm_pdf};
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{
        BackwardFlatInterpolator, BoundaryCondition, CubicInterpolator, DerivativeApprox,
        Interpolator, LinearInterpolator, LogInterpolator, MixedInterpolator, MonotoneConvex,
        QuadraticInterpolator,
    };
    pub use crate::linear_algebra::{least_squares, solve_linear_system, solve_tridiagonal};
    pub use crate::optimization::{nelder_mead, NelderMeadOptions, OptimizationResult};
    pub use crate::solvers::{bisection, brent, newton_raphson, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};

//! Error types for curve construction and evaluation.

use pillar_core::{CoreError, Date};
use pillar_market::MarketError;
use pillar_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Date or convention arithmetic failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Interpolation, root finding or optimisation failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Quotes, conventions or configuration were unusable.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// The requested time lies beyond the curve and extrapolation is off.
    #[error("time {t:.6} is past max curve time ({max_time:.6})")]
    Extrapolation {
        /// Requested time in years.
        t: f64,
        /// Last time covered by the curve.
        max_time: f64,
    },

    /// Negative time requested.
    #[error("negative time ({t:.6}) given")]
    NegativeTime {
        /// Requested time in years.
        t: f64,
    },

    /// Input data is inconsistent.
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// Description of the problem.
        reason: String,
    },

    /// No helper survived quote loading and pillar resolution.
    #[error("Empty instrument list for date = {asof} and curve = {curve}")]
    EmptyInstruments {
        /// As-of date.
        asof: Date,
        /// Curve spec name.
        curve: String,
    },

    /// A direct curve found no usable quotes.
    #[error("No market data found for curve spec {curve} with as of date {asof}")]
    NoMarketData {
        /// Curve spec name.
        curve: String,
        /// As-of date.
        asof: Date,
    },

    /// A direct curve kind was configured together with other segments.
    #[error("A {description} curve must contain exactly one segment")]
    SingleSegment {
        /// Kind of the curve, e.g. "discount ratio".
        description: &'static str,
    },

    /// The iterative bootstrap could not solve a pillar.
    #[error(
        "{pillar_index}. instrument (maturity: {maturity}, pillar: {pillar}) could not be bootstrapped after {attempts} attempts: {reason}"
    )]
    BootstrapFailed {
        /// 1-based position of the helper.
        pillar_index: usize,
        /// Helper maturity.
        maturity: Date,
        /// Helper pillar.
        pillar: Date,
        /// Attempts made.
        attempts: u32,
        /// Innermost solver message.
        reason: String,
    },

    /// Global bootstrap passes did not settle.
    #[error("convergence not reached after {iterations} iterations; last improvement {change:.2e}, required accuracy {accuracy:.2e}")]
    GlobalConvergence {
        /// Outer passes done.
        iterations: u32,
        /// Largest node change of the last pass.
        change: f64,
        /// Target accuracy.
        accuracy: f64,
    },

    /// Fitted bond calibration did not reach the tolerance.
    #[error("Fitted Bond Curve cost value ({cost}) exceeds tolerance ({tolerance})")]
    FitTolerance {
        /// Best cost found.
        cost: f64,
        /// Required tolerance.
        tolerance: f64,
    },

    /// The curve dependency graph contains a cycle.
    #[error("cyclic dependency between yield curves: {curve_ids}")]
    CyclicDependency {
        /// Curves on the cycle, comma separated.
        curve_ids: String,
    },

    /// A curve was not built because one of its dependencies failed.
    #[error("curve {curve_id} not built because dependency {dependency} failed")]
    DependencyFailed {
        /// The blocked curve.
        curve_id: String,
        /// The failed dependency.
        dependency: String,
    },

    /// A build failed; wraps the innermost cause.
    #[error("yield curve building failed for curve {curve_id} on date {asof}: {source}")]
    Build {
        /// The curve being built.
        curve_id: String,
        /// As-of date.
        asof: Date,
        /// Innermost cause.
        source: Box<CurveError>,
    },

    /// Unexpected failure.
    #[error("unknown error building curve {curve_id}: {reason}")]
    Unknown {
        /// The curve being built.
        curve_id: String,
        /// What happened.
        reason: String,
    },
}

impl CurveError {
    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// Wraps an error with the curve id and as-of date of the failed build.
    ///
    /// An error that is already wrapped is returned unchanged.
    #[must_use]
    pub fn build(curve_id: impl Into<String>, asof: Date, source: CurveError) -> Self {
        if matches!(source, Self::Build { .. }) {
            return source;
        }
        Self::Build {
            curve_id: curve_id.into(),
            asof,
            source: Box::new(source),
        }
    }

    /// Creates an unknown error.
    #[must_use]
    pub fn unknown(curve_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unknown {
            curve_id: curve_id.into(),
            reason: reason.into(),
        }
    }

    /// The innermost cause of a wrapped build error.
    #[must_use]
    pub fn root_cause(&self) -> &CurveError {
        match self {
            Self::Build { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_wrapping() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let inner = CurveError::SingleSegment {
            description: "discount ratio",
        };
        let err = CurveError::build("EUR-6M", asof, inner.clone());
        assert_eq!(
            err.to_string(),
            "yield curve building failed for curve EUR-6M on date 2024-01-15: \
             A discount ratio curve must contain exactly one segment"
        );
        assert_eq!(err.root_cause(), &inner);

        let twice = CurveError::build("OTHER", asof, err.clone());
        assert_eq!(twice, err);
    }

    #[test]
    fn test_market_error_passes_through() {
        let err: CurveError = MarketError::missing_dependency("EUR-6M", "Yield/EUR/EUR-ESTR").into();
        assert_eq!(
            err.to_string(),
            "The curve 'Yield/EUR/EUR-ESTR' required in the building of the curve 'EUR-6M' was not found."
        );
    }
}

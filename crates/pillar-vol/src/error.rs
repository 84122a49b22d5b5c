//! Error types for volatility surface construction and evaluation.

use pillar_core::{CoreError, Date};
use pillar_curves::CurveError;
use pillar_market::MarketError;
use pillar_math::MathError;
use thiserror::Error;

/// A specialized Result type for volatility operations.
pub type VolResult<T> = Result<T, VolError>;

/// Error types for volatility operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolError {
    /// Date or convention arithmetic failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Interpolation or root finding failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Quotes, conventions or configuration were unusable.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// A price or yield curve failed.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// The requested time lies beyond the surface and extrapolation is off.
    #[error("time {t:.6} is past max surface time ({max_time:.6})")]
    Extrapolation {
        /// Requested time in years.
        t: f64,
        /// Last time covered by the surface.
        max_time: f64,
    },

    /// The requested strike lies outside the surface and extrapolation is off.
    #[error("strike {strike} is outside [{min_strike}, {max_strike}]")]
    StrikeExtrapolation {
        /// Requested strike.
        strike: f64,
        /// Lowest strike covered.
        min_strike: f64,
        /// Highest strike covered.
        max_strike: f64,
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

    /// No quote was usable for the variant being built.
    #[error("No market data found for {what} of curve {curve_id} with as of date {asof}")]
    NoMarketData {
        /// The surface being built.
        curve_id: String,
        /// What was looked for.
        what: String,
        /// As-of date.
        asof: Date,
    },

    /// A delta or ATM convention could not be turned into a strike.
    #[error("cannot invert {convention} to a strike at time {t:.6}: {reason}")]
    StrikeInversion {
        /// The delta or ATM convention.
        convention: String,
        /// Option time in years.
        t: f64,
        /// Why the inversion failed.
        reason: String,
    },

    /// An option premium could not be turned into a volatility.
    #[error("cannot imply a volatility from premium {premium} at strike {strike} and time {t:.6}: {reason}")]
    ImpliedVolatility {
        /// Premium as quoted.
        premium: f64,
        /// Option strike.
        strike: f64,
        /// Option time in years.
        t: f64,
        /// Why stripping failed.
        reason: String,
    },

    /// Every configured variant failed.
    #[error(
        "commodity volatility curve building failed for curve {curve_id}: all {} configured variants failed: {}",
        .attempts.len(),
        .attempts.join("; ")
    )]
    AllVariantsFailed {
        /// The surface being built.
        curve_id: String,
        /// One message per attempted variant, in attempt order.
        attempts: Vec<String>,
    },

    /// Unexpected failure.
    #[error("unknown error building volatility {curve_id}: {reason}")]
    Unknown {
        /// The surface being built.
        curve_id: String,
        /// What happened.
        reason: String,
    },
}

impl VolError {
    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// Creates a strike inversion error.
    #[must_use]
    pub fn strike_inversion(convention: impl Into<String>, t: f64, reason: impl Into<String>) -> Self {
        Self::StrikeInversion {
            convention: convention.into(),
            t,
            reason: reason.into(),
        }
    }

    /// Creates a no market data error.
    #[must_use]
    pub fn no_market_data(curve_id: impl Into<String>, what: impl Into<String>, asof: Date) -> Self {
        Self::NoMarketData {
            curve_id: curve_id.into(),
            what: what.into(),
            asof,
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variants_failed_lists_attempts() {
        let err = VolError::AllVariantsFailed {
            curve_id: "WTI".into(),
            attempts: vec![
                "1 (Curve): no quotes".into(),
                "2 (Constant): Quote 'X' not found for 2024-01-15".into(),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("commodity volatility curve building failed for curve WTI: all 2"));
        assert!(message.contains("1 (Curve): no quotes; 2 (Constant)"));
    }

    #[test]
    fn test_curve_error_passes_through() {
        let err: VolError = CurveError::invalid_data("bad pillar").into();
        assert_eq!(err.to_string(), "Invalid data: bad pillar");
    }
}

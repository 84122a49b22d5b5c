//! Curves spreaded in zero-rate space over a base curve.

use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// Base curve plus a continuously compounded zero spread.
///
/// Spreads are given at times and interpolated linearly, flat outside the
/// first and last spread times. A single spread is a parallel shift.
///
/// `DF(t) = DF_base(t) · exp(-s(t) · t)`
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::Date;
/// use pillar_curves::curves::ZeroSpreadedCurve;
/// use pillar_curves::{FlatForwardCurve, YieldTermStructure};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let base = Arc::new(FlatForwardCurve::new(asof, 0.03, DayCountConvention::Act365Fixed));
/// let shifted = ZeroSpreadedCurve::parallel(base, 0.01);
/// let df = shifted.discount_t(2.0, false).unwrap();
/// assert!((df - (-0.08f64).exp()).abs() < 1e-14);
/// ```
#[derive(Clone)]
pub struct ZeroSpreadedCurve {
    base: Arc<dyn YieldTermStructure>,
    times: Vec<f64>,
    spreads: Vec<f64>,
    extrapolation: bool,
}

impl std::fmt::Debug for ZeroSpreadedCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeroSpreadedCurve")
            .field("reference_date", &self.base.reference_date())
            .field("times", &self.times)
            .field("spreads", &self.spreads)
            .finish_non_exhaustive()
    }
}

impl ZeroSpreadedCurve {
    /// Creates a curve with spreads at the given times.
    ///
    /// # Errors
    ///
    /// Fails when no spread is given, the lengths differ, a value is not
    /// finite or the times are not strictly increasing.
    pub fn new(
        base: Arc<dyn YieldTermStructure>,
        times: Vec<f64>,
        spreads: Vec<f64>,
    ) -> CurveResult<Self> {
        if times.is_empty() || times.len() != spreads.len() {
            return Err(CurveError::invalid_data(format!(
                "zero spread curve needs matching, non-empty times and spreads ({} vs {})",
                times.len(),
                spreads.len()
            )));
        }
        if times.iter().chain(spreads.iter()).any(|v| !v.is_finite()) {
            return Err(CurveError::invalid_data("zero spreads must be finite"));
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CurveError::invalid_data(
                "zero spread times must be strictly increasing",
            ));
        }
        let extrapolation = base.allows_extrapolation();
        Ok(Self {
            base,
            times,
            spreads,
            extrapolation,
        })
    }

    /// Creates a curve with one spread for all times.
    #[must_use]
    pub fn parallel(base: Arc<dyn YieldTermStructure>, spread: f64) -> Self {
        let extrapolation = base.allows_extrapolation();
        Self {
            base,
            times: vec![0.0],
            spreads: vec![spread],
            extrapolation,
        }
    }

    /// Overrides the extrapolation flag.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Spread at time `t`.
    #[must_use]
    pub fn spread(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.spreads[0];
        }
        if t >= self.times[n - 1] {
            return self.spreads[n - 1];
        }
        let i = self.times.partition_point(|x| *x <= t) - 1;
        let w = (t - self.times[i]) / (self.times[i + 1] - self.times[i]);
        self.spreads[i] + w * (self.spreads[i + 1] - self.spreads[i])
    }
}

impl YieldTermStructure for ZeroSpreadedCurve {
    fn reference_date(&self) -> Date {
        self.base.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.base.day_counter()
    }

    fn max_date(&self) -> Date {
        self.base.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolation
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let base = self.base.discount_t(t, true)?;
        Ok(base * (-self.spread(t) * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;

    fn base() -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForwardCurve::new(
            Date::from_ymd(2024, 1, 15).unwrap(),
            0.02,
            DayCountConvention::Act365Fixed,
        ))
    }

    #[test]
    fn test_spread_interpolation_is_linear_and_flat_outside() {
        let curve = ZeroSpreadedCurve::new(base(), vec![1.0, 3.0], vec![0.001, 0.003]).unwrap();
        assert_relative_eq!(curve.spread(0.5), 0.001);
        assert_relative_eq!(curve.spread(2.0), 0.002, epsilon = 1e-15);
        assert_relative_eq!(curve.spread(10.0), 0.003);
        let df = curve.discount_t(2.0, false).unwrap();
        assert_relative_eq!(df, (-(0.02 + 0.002) * 2.0f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_invalid_spreads() {
        assert!(ZeroSpreadedCurve::new(base(), vec![], vec![]).is_err());
        assert!(ZeroSpreadedCurve::new(base(), vec![2.0, 1.0], vec![0.0, 0.0]).is_err());
    }
}

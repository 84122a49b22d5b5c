//! Survival curves and the yield-plus-default curve built on them.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_math::interpolation::{Interpolator, LogInterpolator};

use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// A default-probability term structure.
pub trait SurvivalTermStructure: Send + Sync {
    /// Date at which survival probabilities equal one.
    fn reference_date(&self) -> Date;

    /// Day count turning dates into curve times.
    fn day_counter(&self) -> DayCountConvention;

    /// Survival probability to time `t`.
    fn survival_probability_t(&self, t: f64) -> CurveResult<f64>;

    /// Survival probability to a date.
    fn survival_probability(&self, date: Date) -> CurveResult<f64> {
        let t = self.day_counter().year_fraction(self.reference_date(), date);
        self.survival_probability_t(t)
    }
}

impl<T: SurvivalTermStructure + ?Sized> SurvivalTermStructure for Arc<T> {
    fn reference_date(&self) -> Date {
        (**self).reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        (**self).day_counter()
    }

    fn survival_probability_t(&self, t: f64) -> CurveResult<f64> {
        (**self).survival_probability_t(t)
    }
}

/// Survival probabilities at dates, log-linear in between.
///
/// Piecewise flat hazard rates; the last hazard rate is held beyond the
/// last date.
#[derive(Debug)]
pub struct InterpolatedSurvivalCurve {
    reference_date: Date,
    day_counter: DayCountConvention,
    interpolator: LogInterpolator,
}

impl InterpolatedSurvivalCurve {
    /// Builds the curve. A node with probability one is added at the
    /// reference date when the first date is later.
    ///
    /// # Errors
    ///
    /// Fails on unsorted dates, dates before the reference date, or
    /// probabilities outside `(0, 1]`.
    pub fn new(
        reference_date: Date,
        dates: &[Date],
        probabilities: &[f64],
        day_counter: DayCountConvention,
    ) -> CurveResult<Self> {
        if dates.is_empty() || dates.len() != probabilities.len() {
            return Err(CurveError::invalid_data(
                "survival curve needs matching, non-empty dates and probabilities",
            ));
        }
        if probabilities.iter().any(|p| !(*p > 0.0 && *p <= 1.0)) {
            return Err(CurveError::invalid_data(
                "survival probabilities must lie in (0, 1]",
            ));
        }
        if dates[0] < reference_date {
            return Err(CurveError::invalid_data(format!(
                "survival date {} before reference date {reference_date}",
                dates[0]
            )));
        }
        let mut xs = Vec::with_capacity(dates.len() + 1);
        let mut ys = Vec::with_capacity(dates.len() + 1);
        if dates[0] > reference_date {
            xs.push(0.0);
            ys.push(1.0);
        }
        for (d, p) in dates.iter().zip(probabilities) {
            xs.push(day_counter.year_fraction(reference_date, *d));
            ys.push(*p);
        }
        if xs.len() < 2 {
            // A single node at the reference date: flat at one.
            xs.push(1.0);
            ys.push(1.0);
        }
        let interpolator = LogInterpolator::log_linear(xs, ys)?.with_extrapolation();
        Ok(Self {
            reference_date,
            day_counter,
            interpolator,
        })
    }
}

impl SurvivalTermStructure for InterpolatedSurvivalCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn survival_probability_t(&self, t: f64) -> CurveResult<f64> {
        if t <= 0.0 {
            return Ok(1.0);
        }
        Ok(self.interpolator.interpolate(t)?)
    }
}

/// A reference yield curve times weighted survival probabilities.
///
/// `DF(t) = DF_ref(t) · Π S_i(t)^{w_i}`
#[derive(Clone)]
pub struct YieldPlusDefaultCurve {
    reference: Arc<dyn YieldTermStructure>,
    default_curves: Vec<Arc<dyn SurvivalTermStructure>>,
    weights: Vec<f64>,
}

impl fmt::Debug for YieldPlusDefaultCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YieldPlusDefaultCurve")
            .field("reference_date", &self.reference.reference_date())
            .field("default_curves", &self.default_curves.len())
            .field("weights", &self.weights)
            .finish()
    }
}

impl YieldPlusDefaultCurve {
    /// Creates the curve.
    ///
    /// # Errors
    ///
    /// Fails when the number of weights differs from the number of curves.
    pub fn new(
        reference: Arc<dyn YieldTermStructure>,
        default_curves: Vec<Arc<dyn SurvivalTermStructure>>,
        weights: Vec<f64>,
    ) -> CurveResult<Self> {
        if default_curves.len() != weights.len() {
            return Err(CurveError::invalid_data(format!(
                "{} default curves but {} weights",
                default_curves.len(),
                weights.len()
            )));
        }
        Ok(Self {
            reference,
            default_curves,
            weights,
        })
    }
}

impl YieldTermStructure for YieldPlusDefaultCurve {
    fn reference_date(&self) -> Date {
        self.reference.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.reference.day_counter()
    }

    fn max_date(&self) -> Date {
        self.reference.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.reference.allows_extrapolation()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let mut df = self.reference.discount_t(t, true)?;
        for (curve, w) in self.default_curves.iter().zip(&self.weights) {
            df *= curve.survival_probability_t(t)?.powf(*w);
        }
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn hazard_curve(h: f64) -> InterpolatedSurvivalCurve {
        let dates = [asof().add_days(365), asof().add_days(3650)];
        let dc = DayCountConvention::Act365Fixed;
        let probs: Vec<f64> = dates
            .iter()
            .map(|d| (-h * dc.year_fraction(asof(), *d)).exp())
            .collect();
        InterpolatedSurvivalCurve::new(asof(), &dates, &probs, dc).unwrap()
    }

    #[test]
    fn test_survival_flat_hazard() {
        let curve = hazard_curve(0.02);
        assert_eq!(curve.survival_probability(asof()).unwrap(), 1.0);
        assert_relative_eq!(curve.survival_probability_t(0.5).unwrap(), (-0.01f64).exp(), epsilon = 1e-12);
        // extrapolated with the last hazard rate
        assert_relative_eq!(curve.survival_probability_t(20.0).unwrap(), (-0.4f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_yield_plus_default_adds_weighted_hazard() {
        let reference: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForwardCurve::new(asof(), 0.03, DayCountConvention::Act365Fixed));
        let curve = YieldPlusDefaultCurve::new(
            reference,
            vec![Arc::new(hazard_curve(0.02)), Arc::new(hazard_curve(0.01))],
            vec![0.5, 1.0],
        )
        .unwrap();
        let z = curve.zero_rate_t(4.0).unwrap();
        assert_relative_eq!(z, 0.03 + 0.5 * 0.02 + 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_weight_count_mismatch() {
        let reference: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForwardCurve::new(asof(), 0.03, DayCountConvention::Act365Fixed));
        assert!(YieldPlusDefaultCurve::new(reference, vec![], vec![1.0]).is_err());
    }
}

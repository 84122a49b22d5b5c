//! The yield term structure trait.
//!
//! [`YieldTermStructure`] is the interface every curve in this crate
//! implements and the one downstream pricing consumes. Implementors supply
//! the discount factor as a function of time; zero and forward rates in any
//! day count and compounding follow from it.

use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::types::{Compounding, Frequency, InterestRate};
use pillar_core::Date;

use crate::error::{CurveError, CurveResult};

/// Step used for rates at the reference date and for numerical forwards.
const TIME_STEP: f64 = 1.0e-4;

/// Times within this distance of a boundary are treated as on it.
const TIME_EPSILON: f64 = 1.0e-12;

/// A discounting term structure with a fixed reference date.
///
/// # Required Methods
///
/// - [`discount_impl`](YieldTermStructure::discount_impl): discount factor at
///   a time already checked against the curve range
/// - [`reference_date`](YieldTermStructure::reference_date),
///   [`day_counter`](YieldTermStructure::day_counter),
///   [`max_date`](YieldTermStructure::max_date) and
///   [`allows_extrapolation`](YieldTermStructure::allows_extrapolation)
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::types::{Compounding, Frequency};
/// use pillar_core::Date;
/// use pillar_curves::{CurveResult, YieldTermStructure};
///
/// struct Flat(Date);
///
/// impl YieldTermStructure for Flat {
///     fn reference_date(&self) -> Date { self.0 }
///     fn day_counter(&self) -> DayCountConvention { DayCountConvention::Act365Fixed }
///     fn max_date(&self) -> Date { self.0.add_days(36500) }
///     fn allows_extrapolation(&self) -> bool { false }
///     fn discount_impl(&self, t: f64) -> CurveResult<f64> { Ok((-0.03 * t).exp()) }
/// }
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let curve = Flat(asof);
/// assert_eq!(curve.discount(asof).unwrap(), 1.0);
/// let z = curve
///     .zero_rate(asof.add_days(365), DayCountConvention::Act365Fixed, Compounding::Continuous, Frequency::Annual)
///     .unwrap();
/// assert!((z.rate - 0.03).abs() < 1e-12);
/// ```
pub trait YieldTermStructure: Send + Sync {
    /// Date at which discount factors equal one.
    fn reference_date(&self) -> Date;

    /// Day count turning dates into curve times.
    fn day_counter(&self) -> DayCountConvention;

    /// Last date covered by market data.
    fn max_date(&self) -> Date;

    /// True when the curve may be evaluated beyond [`max_date`](Self::max_date).
    fn allows_extrapolation(&self) -> bool;

    /// Discount factor at time `t > 0`, range already checked.
    fn discount_impl(&self, t: f64) -> CurveResult<f64>;

    /// Curve time of a date.
    fn time_from_reference(&self, date: Date) -> f64 {
        self.day_counter().year_fraction(self.reference_date(), date)
    }

    /// Curve time of [`max_date`](Self::max_date).
    fn max_time(&self) -> f64 {
        self.time_from_reference(self.max_date())
    }

    /// Discount factor at time `t`.
    ///
    /// Returns exactly 1 at `t == 0`. `extrapolate` allows evaluation past
    /// the max time for this call even if the curve does not.
    ///
    /// # Errors
    ///
    /// Fails for negative times and for times past the curve when
    /// extrapolation is not allowed.
    fn discount_t(&self, t: f64, extrapolate: bool) -> CurveResult<f64> {
        if t < -TIME_EPSILON {
            return Err(CurveError::NegativeTime { t });
        }
        if t <= 0.0 {
            return Ok(1.0);
        }
        let max_time = self.max_time();
        if t > max_time + TIME_EPSILON && !(extrapolate || self.allows_extrapolation()) {
            return Err(CurveError::Extrapolation { t, max_time });
        }
        let df = self.discount_impl(t)?;
        if !df.is_finite() {
            return Err(CurveError::invalid_data(format!(
                "non-finite discount factor at t = {t}"
            )));
        }
        Ok(df)
    }

    /// Discount factor at a date.
    fn discount(&self, date: Date) -> CurveResult<f64> {
        self.discount_t(self.time_from_reference(date), false)
    }

    /// Zero rate to a date in the given day count and compounding.
    ///
    /// At the reference date the rate over a short step is returned.
    fn zero_rate(
        &self,
        date: Date,
        day_counter: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CurveResult<InterestRate> {
        if date == self.reference_date() {
            let compound = 1.0 / self.discount_t(TIME_STEP, false)?;
            return Ok(InterestRate::implied_rate(
                compound,
                TIME_STEP,
                compounding,
                frequency,
            ));
        }
        let compound = 1.0 / self.discount(date)?;
        let t = day_counter.year_fraction(self.reference_date(), date);
        Ok(InterestRate::implied_rate(compound, t, compounding, frequency))
    }

    /// Continuously compounded zero rate at curve time `t`.
    fn zero_rate_t(&self, t: f64) -> CurveResult<f64> {
        let t = if t <= 0.0 { TIME_STEP } else { t };
        Ok(-self.discount_t(t, false)?.ln() / t)
    }

    /// Forward rate between two dates in the given day count and compounding.
    ///
    /// For `d1 == d2` the rate over a short step after `d1` is returned.
    fn forward_rate(
        &self,
        d1: Date,
        d2: Date,
        day_counter: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CurveResult<InterestRate> {
        if d2 < d1 {
            return Err(CurveError::invalid_data(format!(
                "forward start date {d1} is after end date {d2}"
            )));
        }
        if d1 == d2 {
            let t1 = self.time_from_reference(d1).max(0.0);
            let t2 = t1 + TIME_STEP;
            let compound = self.discount_t(t1, false)? / self.discount_t(t2, false)?;
            return Ok(InterestRate::implied_rate(
                compound,
                TIME_STEP,
                compounding,
                frequency,
            ));
        }
        let compound = self.discount(d1)? / self.discount(d2)?;
        let t = day_counter.year_fraction(d1, d2);
        Ok(InterestRate::implied_rate(compound, t, compounding, frequency))
    }

    /// Instantaneous forward rate at curve time `t`, by finite difference.
    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        let t1 = (t - 0.5 * TIME_STEP).max(0.0);
        let t2 = t1 + TIME_STEP;
        let df1 = self.discount_t(t1, true)?;
        let df2 = self.discount_t(t2, true)?;
        Ok((df1 / df2).ln() / TIME_STEP)
    }
}

impl<T: YieldTermStructure + ?Sized> YieldTermStructure for Arc<T> {
    fn reference_date(&self) -> Date {
        (**self).reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        (**self).day_counter()
    }

    fn max_date(&self) -> Date {
        (**self).max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        (**self).allows_extrapolation()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        (**self).discount_impl(t)
    }

    fn max_time(&self) -> f64 {
        (**self).max_time()
    }
}

impl<T: YieldTermStructure + ?Sized> YieldTermStructure for Box<T> {
    fn reference_date(&self) -> Date {
        (**self).reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        (**self).day_counter()
    }

    fn max_date(&self) -> Date {
        (**self).max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        (**self).allows_extrapolation()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        (**self).discount_impl(t)
    }

    fn max_time(&self) -> f64 {
        (**self).max_time()
    }
}

/// Flat continuously compounded curve, mostly useful in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForwardCurve {
    reference_date: Date,
    rate: f64,
    day_counter: DayCountConvention,
}

impl FlatForwardCurve {
    /// Creates a flat curve with a continuously compounded rate.
    #[must_use]
    pub fn new(reference_date: Date, rate: f64, day_counter: DayCountConvention) -> Self {
        Self {
            reference_date,
            rate,
            day_counter,
        }
    }

    /// The continuously compounded rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl YieldTermStructure for FlatForwardCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_date(&self) -> Date {
        self.reference_date.add_days(365 * 200)
    }

    fn allows_extrapolation(&self) -> bool {
        true
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        Ok((-self.rate * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_discount_at_reference_is_one() {
        let curve = FlatForwardCurve::new(asof(), 0.04, DayCountConvention::Act365Fixed);
        assert_eq!(curve.discount(asof()).unwrap(), 1.0);
        assert!(curve.discount(asof().add_days(-1)).is_err());
    }

    #[test]
    fn test_zero_and_forward_rates() {
        let curve = FlatForwardCurve::new(asof(), 0.04, DayCountConvention::Act365Fixed);
        let d1 = asof().add_days(365);
        let d2 = asof().add_days(730);
        let z = curve
            .zero_rate(d1, DayCountConvention::Act365Fixed, Compounding::Continuous, Frequency::Annual)
            .unwrap();
        assert_relative_eq!(z.rate, 0.04, epsilon = 1e-12);

        let f = curve
            .forward_rate(d1, d2, DayCountConvention::Act365Fixed, Compounding::Simple, Frequency::Annual)
            .unwrap();
        assert_relative_eq!(f.rate, 0.04f64.exp() - 1.0, epsilon = 1e-12);

        let at_ref = curve
            .zero_rate(asof(), DayCountConvention::Act365Fixed, Compounding::Continuous, Frequency::Annual)
            .unwrap();
        assert_relative_eq!(at_ref.rate, 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_arc_forwards_to_inner() {
        let curve: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForwardCurve::new(asof(), 0.02, DayCountConvention::Act365Fixed));
        assert_relative_eq!(curve.discount_t(2.0, false).unwrap(), (-0.04f64).exp(), epsilon = 1e-15);
        assert_relative_eq!(curve.instantaneous_forward(1.0).unwrap(), 0.02, epsilon = 1e-10);
    }
}

//! Curves composed from other curves.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use crate::error::CurveResult;
use crate::term_structure::YieldTermStructure;

/// `DF(t) = DF_base(t) · DF_num(t) / DF_den(t)`.
///
/// Typically a foreign-currency discount curve implied from a domestic one
/// through two curves in the same foreign currency.
#[derive(Clone)]
pub struct DiscountRatioCurve {
    base: Arc<dyn YieldTermStructure>,
    numerator: Arc<dyn YieldTermStructure>,
    denominator: Arc<dyn YieldTermStructure>,
    extrapolation: bool,
}

impl fmt::Debug for DiscountRatioCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountRatioCurve")
            .field("reference_date", &self.base.reference_date())
            .field("extrapolation", &self.extrapolation)
            .finish_non_exhaustive()
    }
}

impl DiscountRatioCurve {
    /// Creates the ratio curve.
    #[must_use]
    pub fn new(
        base: Arc<dyn YieldTermStructure>,
        numerator: Arc<dyn YieldTermStructure>,
        denominator: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self {
            base,
            numerator,
            denominator,
            extrapolation: true,
        }
    }

    /// Sets the extrapolation flag.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self
    }
}

impl YieldTermStructure for DiscountRatioCurve {
    fn reference_date(&self) -> Date {
        self.base.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.base.day_counter()
    }

    fn max_date(&self) -> Date {
        self.base
            .max_date()
            .min(self.numerator.max_date())
            .min(self.denominator.max_date())
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolation
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let base = self.base.discount_t(t, true)?;
        let num = self.numerator.discount_t(t, true)?;
        let den = self.denominator.discount_t(t, true)?;
        Ok(base * num / den)
    }
}

/// Zero-rate weighted average of two curves.
///
/// `z(t) = w1·z1(t) + w2·z2(t)`, so `DF(t) = DF1(t)^w1 · DF2(t)^w2`.
#[derive(Clone)]
pub struct WeightedAverageCurve {
    first: Arc<dyn YieldTermStructure>,
    second: Arc<dyn YieldTermStructure>,
    weight1: f64,
    weight2: f64,
    extrapolation: bool,
}

impl fmt::Debug for WeightedAverageCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedAverageCurve")
            .field("weight1", &self.weight1)
            .field("weight2", &self.weight2)
            .finish_non_exhaustive()
    }
}

impl WeightedAverageCurve {
    /// Creates the weighted curve.
    #[must_use]
    pub fn new(
        first: Arc<dyn YieldTermStructure>,
        second: Arc<dyn YieldTermStructure>,
        weight1: f64,
        weight2: f64,
    ) -> Self {
        Self {
            first,
            second,
            weight1,
            weight2,
            extrapolation: true,
        }
    }

    /// Sets the extrapolation flag.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self
    }
}

impl YieldTermStructure for WeightedAverageCurve {
    fn reference_date(&self) -> Date {
        self.first.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.first.day_counter()
    }

    fn max_date(&self) -> Date {
        self.first.max_date().min(self.second.max_date())
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolation
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let df1 = self.first.discount_t(t, true)?;
        let df2 = self.second.discount_t(t, true)?;
        Ok(df1.powf(self.weight1) * df2.powf(self.weight2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;

    fn flat(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForwardCurve::new(
            Date::from_ymd(2024, 1, 15).unwrap(),
            rate,
            DayCountConvention::Act365Fixed,
        ))
    }

    #[test]
    fn test_discount_ratio() {
        let curve = DiscountRatioCurve::new(flat(0.03), flat(0.01), flat(0.02));
        let df = curve.discount_t(3.0, false).unwrap();
        assert_relative_eq!(df, (-(0.03 + 0.01 - 0.02) * 3.0f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_weighted_average_zero_rates() {
        let curve = WeightedAverageCurve::new(flat(0.02), flat(0.04), 0.25, 0.75);
        let t = 5.0;
        let z = -curve.discount_t(t, false).unwrap().ln() / t;
        assert_relative_eq!(z, 0.25 * 0.02 + 0.75 * 0.04, epsilon = 1e-14);
    }
}

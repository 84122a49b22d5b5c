//! Leg valuation used by the swap-like helpers.
//!
//! Floating coupons are projected from discount factor ratios of the
//! projection curve, so a compounded overnight period and a single Ibor
//! period both value as `P(s) / P(e) - 1`.

use pillar_core::calendars::{BusinessDayConvention, Calendar, MarketCalendar};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::schedule::{DateGenerationRule, Schedule, ScheduleConfig};
use pillar_core::{Date, Period};
use pillar_market::conventions::SubPeriodsType;

use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// Discount factor at a date, extrapolating past the curve if needed.
pub(crate) fn discount_at(curve: &dyn YieldTermStructure, date: Date) -> CurveResult<f64> {
    curve.discount_t(curve.time_from_reference(date), true)
}

/// Accrual periods and payment dates of a leg.
#[derive(Debug, Clone, PartialEq)]
pub struct LegDates {
    accruals: Vec<(Date, Date)>,
    payments: Vec<Date>,
}

impl LegDates {
    /// Generates the periods between `start` and `end`.
    ///
    /// Payment dates are the accrual ends moved `payment_lag` business days
    /// forward on `calendar`.
    ///
    /// # Errors
    ///
    /// Fails when the schedule cannot be generated.
    pub fn generate(
        start: Date,
        end: Date,
        tenor: Period,
        calendar: &MarketCalendar,
        convention: BusinessDayConvention,
        end_of_month: bool,
        payment_lag: u32,
    ) -> CurveResult<Self> {
        Self::generate_with_rule(
            start,
            end,
            tenor,
            calendar,
            convention,
            end_of_month,
            payment_lag,
            DateGenerationRule::Backward,
        )
    }

    /// As [`generate`](Self::generate), with an explicit generation rule.
    ///
    /// # Errors
    ///
    /// Fails when the schedule cannot be generated.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_with_rule(
        start: Date,
        end: Date,
        tenor: Period,
        calendar: &MarketCalendar,
        convention: BusinessDayConvention,
        end_of_month: bool,
        payment_lag: u32,
        rule: DateGenerationRule,
    ) -> CurveResult<Self> {
        let schedule = Schedule::generate(
            &ScheduleConfig::new(start, end, tenor)
                .with_calendar(calendar.clone())
                .with_convention(convention)
                .with_end_of_month(end_of_month)
                .with_rule(rule),
        )?;
        let accruals: Vec<(Date, Date)> = schedule.periods().collect();
        if accruals.is_empty() {
            return Err(CurveError::invalid_data(format!(
                "empty schedule from {start} to {end}"
            )));
        }
        let lag = i32::try_from(payment_lag).unwrap_or(i32::MAX);
        let payments = accruals
            .iter()
            .map(|(_, e)| calendar.add_business_days(*e, lag))
            .collect();
        Ok(Self { accruals, payments })
    }

    /// Accrual start and end of each period.
    #[must_use]
    pub fn accruals(&self) -> &[(Date, Date)] {
        &self.accruals
    }

    /// Payment date of each period.
    #[must_use]
    pub fn payments(&self) -> &[Date] {
        &self.payments
    }

    /// First accrual start.
    #[must_use]
    pub fn start(&self) -> Date {
        self.accruals[0].0
    }

    /// Last accrual end.
    #[must_use]
    pub fn end(&self) -> Date {
        self.accruals[self.accruals.len() - 1].1
    }

    /// Last payment date.
    #[must_use]
    pub fn last_payment(&self) -> Date {
        self.payments[self.payments.len() - 1]
    }

    fn periods(&self) -> impl Iterator<Item = (&(Date, Date), &Date)> {
        self.accruals.iter().zip(&self.payments)
    }
}

/// A fixed leg of unit notional.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLeg {
    dates: LegDates,
    day_count: DayCountConvention,
}

impl FixedLeg {
    /// Creates the leg.
    #[must_use]
    pub fn new(dates: LegDates, day_count: DayCountConvention) -> Self {
        Self { dates, day_count }
    }

    /// Leg dates.
    #[must_use]
    pub fn dates(&self) -> &LegDates {
        &self.dates
    }

    /// `Σ τ_i · DF(pay_i)`, the value of a unit coupon rate.
    pub fn annuity(&self, discount: &dyn YieldTermStructure) -> CurveResult<f64> {
        let mut annuity = 0.0;
        for ((s, e), pay) in self.dates.periods() {
            annuity += self.day_count.year_fraction(*s, *e) * discount_at(discount, *pay)?;
        }
        Ok(annuity)
    }
}

/// A floating leg of unit notional.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatLeg {
    dates: LegDates,
    day_count: DayCountConvention,
    fixing: Option<(Period, MarketCalendar, SubPeriodsType)>,
}

impl FloatLeg {
    /// Creates a leg paying one projected rate per period.
    #[must_use]
    pub fn new(dates: LegDates, day_count: DayCountConvention) -> Self {
        Self {
            dates,
            day_count,
            fixing: None,
        }
    }

    /// Splits each period into fixings of `tenor`, combined by `kind`.
    #[must_use]
    pub fn with_sub_periods(mut self, tenor: Period, calendar: MarketCalendar, kind: SubPeriodsType) -> Self {
        self.fixing = Some((tenor, calendar, kind));
        self
    }

    /// Leg dates.
    #[must_use]
    pub fn dates(&self) -> &LegDates {
        &self.dates
    }

    /// `Σ τ_i · DF(pay_i)`, the value of a unit spread.
    pub fn annuity(&self, discount: &dyn YieldTermStructure) -> CurveResult<f64> {
        FixedLeg::new(self.dates.clone(), self.day_count).annuity(discount)
    }

    /// Value of the projected coupons, without spread.
    pub fn pv(&self, projection: &dyn YieldTermStructure, discount: &dyn YieldTermStructure) -> CurveResult<f64> {
        let mut pv = 0.0;
        for ((s, e), pay) in self.dates.periods() {
            let coupon = match &self.fixing {
                Some((tenor, calendar, SubPeriodsType::Average)) => {
                    self.averaged_sub_periods(projection, *s, *e, *tenor, calendar)?
                }
                _ => discount_at(projection, *s)? / discount_at(projection, *e)? - 1.0,
            };
            pv += coupon * discount_at(discount, *pay)?;
        }
        Ok(pv)
    }

    /// Value of coupons paying the continuously averaged projected rate.
    ///
    /// `Σ ln(P(s_i) / P(e_i)) · DF(pay_i)`, the arithmetic average of daily
    /// overnight fixings to first order.
    pub fn averaged_pv(
        &self,
        projection: &dyn YieldTermStructure,
        discount: &dyn YieldTermStructure,
    ) -> CurveResult<f64> {
        let mut pv = 0.0;
        for ((s, e), pay) in self.dates.periods() {
            let ratio = discount_at(projection, *s)? / discount_at(projection, *e)?;
            let tau = self.day_count.year_fraction(*s, *e);
            let curve_tau = projection.day_counter().year_fraction(*s, *e);
            let average = if curve_tau > 0.0 { ratio.ln() / curve_tau } else { 0.0 };
            pv += average * tau * discount_at(discount, *pay)?;
        }
        Ok(pv)
    }

    /// Sum of simple forwards over fixing sub-periods of `[s, e]`, in units
    /// of accrual on the sub-periods.
    fn averaged_sub_periods(
        &self,
        projection: &dyn YieldTermStructure,
        s: Date,
        e: Date,
        tenor: Period,
        calendar: &MarketCalendar,
    ) -> CurveResult<f64> {
        let mut total = 0.0;
        let mut start = s;
        while start < e {
            let end = calendar
                .advance(start, tenor, BusinessDayConvention::ModifiedFollowing, false)?
                .min(e);
            if end <= start {
                break;
            }
            total += discount_at(projection, start)? / discount_at(projection, end)? - 1.0;
            start = end;
        }
        Ok(total)
    }

    /// Value of the notional exchanges `-DF(start) + DF(end)` on `discount`.
    pub fn notional_exchange(&self, discount: &dyn YieldTermStructure) -> CurveResult<f64> {
        Ok(discount_at(discount, self.dates.last_payment())? - discount_at(discount, self.dates.start())?)
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

    fn dates(tenor: Period) -> LegDates {
        LegDates::generate(
            asof(),
            Date::from_ymd(2026, 1, 15).unwrap(),
            tenor,
            &MarketCalendar::Null,
            BusinessDayConvention::Unadjusted,
            false,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_float_leg_telescopes_on_single_curve() {
        let curve = FlatForwardCurve::new(asof(), 0.03, DayCountConvention::Act365Fixed);
        let leg = FloatLeg::new(dates(Period::months(6)), DayCountConvention::Act360);
        let pv = leg.pv(&curve, &curve).unwrap();
        let end = Date::from_ymd(2026, 1, 15).unwrap();
        assert_relative_eq!(pv, 1.0 - curve.discount(end).unwrap(), epsilon = 1e-14);
        assert_relative_eq!(leg.notional_exchange(&curve).unwrap(), -pv, epsilon = 1e-14);
    }

    #[test]
    fn test_fixed_annuity() {
        let curve = FlatForwardCurve::new(asof(), 0.0, DayCountConvention::Act365Fixed);
        let leg = FixedLeg::new(dates(Period::years(1)), DayCountConvention::Thirty360);
        assert_relative_eq!(leg.annuity(&curve).unwrap(), 2.0, epsilon = 1e-14);
        assert_eq!(leg.dates().accruals().len(), 2);
    }

    #[test]
    fn test_average_sub_periods_below_compounded() {
        let curve = FlatForwardCurve::new(asof(), 0.05, DayCountConvention::Act365Fixed);
        let compounded = FloatLeg::new(dates(Period::years(1)), DayCountConvention::Act360)
            .with_sub_periods(Period::months(3), MarketCalendar::Null, SubPeriodsType::Compounding);
        let averaged = FloatLeg::new(dates(Period::years(1)), DayCountConvention::Act360)
            .with_sub_periods(Period::months(3), MarketCalendar::Null, SubPeriodsType::Average);
        let c = compounded.pv(&curve, &curve).unwrap();
        let a = averaged.pv(&curve, &curve).unwrap();
        assert!(a < c);
        assert!(a > 0.0);
    }

    #[test]
    fn test_averaged_pv_matches_flat_rate() {
        let curve = FlatForwardCurve::new(asof(), 0.04, DayCountConvention::Act365Fixed);
        let leg = FloatLeg::new(dates(Period::years(1)), DayCountConvention::Act365Fixed);
        let annuity = leg.annuity(&curve).unwrap();
        let pv = leg.averaged_pv(&curve, &curve).unwrap();
        assert_relative_eq!(pv / annuity, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_payment_lag() {
        let lagged = LegDates::generate(
            asof(),
            Date::from_ymd(2025, 1, 15).unwrap(),
            Period::years(1),
            &MarketCalendar::WeekendsOnly,
            BusinessDayConvention::Following,
            false,
            2,
        )
        .unwrap();
        // 2025-01-15 is a Wednesday
        assert_eq!(lagged.last_payment(), Date::from_ymd(2025, 1, 17).unwrap());
        assert_eq!(lagged.end(), Date::from_ymd(2025, 1, 15).unwrap());
    }
}

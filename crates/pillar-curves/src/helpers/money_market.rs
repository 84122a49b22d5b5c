//! Deposit, FRA and money-market future helpers.

use chrono::Weekday;
use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::PillarChoice;

use super::legs::discount_at;
use super::{CurveHandle, HelperDates, RateHelper};
use crate::error::CurveResult;
use crate::term_structure::YieldTermStructure;

/// IMM date of a month: its third Wednesday.
///
/// # Errors
///
/// Fails for an invalid month.
pub fn imm_date(year: i32, month: u32) -> CurveResult<Date> {
    Ok(Date::nth_weekday(3, Weekday::Wed, year, month)?)
}

/// Simple forward rate over `[start, end]` on `curve`.
fn simple_forward(
    curve: &dyn YieldTermStructure,
    start: Date,
    end: Date,
    day_count: DayCountConvention,
) -> CurveResult<f64> {
    let tau = day_count.year_fraction(start, end);
    let ratio = discount_at(curve, start)? / discount_at(curve, end)?;
    Ok((ratio - 1.0) / tau)
}

/// A deposit on the curve being built, quoted as a simple rate.
#[derive(Debug, Clone)]
pub struct DepositHelper {
    quote_name: String,
    quote: f64,
    day_count: DayCountConvention,
    dates: HelperDates,
}

impl DepositHelper {
    /// Creates the helper for a deposit from `start` to `end`.
    #[must_use]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
        choice: PillarChoice,
    ) -> Self {
        Self {
            quote_name: quote_name.into(),
            quote,
            day_count,
            dates: HelperDates::new(start, end, end, choice),
        }
    }
}

impl RateHelper for DepositHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.quote
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        simple_forward(curve, self.dates.earliest, self.dates.maturity, self.day_count)
    }
}

/// A forward rate agreement, quoted as the simple forward rate.
#[derive(Debug, Clone)]
pub struct FraHelper {
    quote_name: String,
    quote: f64,
    day_count: DayCountConvention,
    projection: CurveHandle,
    dates: HelperDates,
}

impl FraHelper {
    /// Creates the helper for a FRA accruing from `start` to `end`.
    #[must_use]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
        projection: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        Self {
            quote_name: quote_name.into(),
            quote,
            day_count,
            projection,
            dates: HelperDates::new(start, end, end, choice),
        }
    }
}

impl RateHelper for FraHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.quote
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let projection = self.projection.resolve(curve);
        simple_forward(projection, self.dates.earliest, self.dates.maturity, self.day_count)
    }
}

/// A money-market future, quoted as `100 · (1 - rate)`.
///
/// No convexity adjustment is applied.
#[derive(Debug, Clone)]
pub struct FutureHelper {
    quote_name: String,
    price: f64,
    day_count: DayCountConvention,
    projection: CurveHandle,
    dates: HelperDates,
}

impl FutureHelper {
    /// Creates the helper for a future on the rate from `start` to `end`.
    #[must_use]
    pub fn new(
        quote_name: impl Into<String>,
        price: f64,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
        projection: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        Self {
            quote_name: quote_name.into(),
            price,
            day_count,
            projection,
            dates: HelperDates::new(start, end, end, choice),
        }
    }
}

impl RateHelper for FutureHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.price
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let projection = self.projection.resolve(curve);
        let rate = simple_forward(projection, self.dates.earliest, self.dates.maturity, self.day_count)?;
        Ok(100.0 * (1.0 - rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_imm_date() {
        assert_eq!(imm_date(2024, 3).unwrap(), Date::from_ymd(2024, 3, 20).unwrap());
        assert_eq!(imm_date(2024, 6).unwrap(), Date::from_ymd(2024, 6, 19).unwrap());
        assert!(imm_date(2024, 13).is_err());
    }

    #[test]
    fn test_deposit_implied_rate() {
        let curve = FlatForwardCurve::new(asof(), 0.03, DayCountConvention::Act360);
        let end = asof().add_days(180);
        let helper = DepositHelper::new(
            "MM/RATE/EUR/0D/6M",
            0.03,
            asof(),
            end,
            DayCountConvention::Act360,
            PillarChoice::LastRelevantDate,
        );
        let implied = helper.implied_quote(&curve).unwrap();
        assert_relative_eq!(implied, ((0.03f64 * 0.5).exp() - 1.0) / 0.5, epsilon = 1e-14);
        assert_eq!(helper.pillar_date(), end);
    }

    #[test]
    fn test_future_uses_projection_curve() {
        let own = FlatForwardCurve::new(asof(), 0.0, DayCountConvention::Act360);
        let projection: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForwardCurve::new(asof(), 0.04, DayCountConvention::Act360));
        let start = imm_date(2024, 3).unwrap();
        let end = imm_date(2024, 6).unwrap();
        let helper = FutureHelper::new(
            "MM_FUTURE/PRICE/USD/2024-03/SR3/3M",
            96.0,
            start,
            end,
            DayCountConvention::Act360,
            CurveHandle::External(projection),
            PillarChoice::MaturityDate,
        );
        let tau = DayCountConvention::Act360.year_fraction(start, end);
        let expected = 100.0 * (1.0 - ((0.04 * tau).exp() - 1.0) / tau);
        assert_relative_eq!(helper.implied_quote(&own).unwrap(), expected, epsilon = 1e-12);
        assert!(helper.quote_error(&own).unwrap().abs() < 0.05);
    }
}

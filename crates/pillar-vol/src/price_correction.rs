//! Re-pillaring a future price curve at option expiries.
//!
//! An option on a future expires before the future does, but the option
//! is on that future's price. Reading the price curve at the option
//! expiry would interpolate towards the previous contract; the corrected
//! curve carries the underlying future's price at the option expiry.

use std::collections::BTreeMap;

use pillar_core::Date;
use pillar_curves::PriceCurve;
use tracing::{debug, warn};

use crate::error::VolResult;
use crate::expiry::FutureExpiryCalculator;

/// Returns a price curve whose value at each option expiry equals the
/// price of the future that option is written on.
///
/// For each option expiry the next future expiry on or after it is found.
/// When that date is already a pillar, the option expiry takes its price;
/// otherwise both dates are added at the price the curve gives for the
/// future expiry. The result keeps the interpolation and extrapolation of
/// `prices`.
///
/// # Errors
///
/// Fails when the expiry calculator or the rebuilt curve fails.
pub fn correct_future_price_curve(
    asof: Date,
    prices: &PriceCurve,
    calculator: &dyn FutureExpiryCalculator,
    option_expiries: &[Date],
) -> VolResult<PriceCurve> {
    let mut points: BTreeMap<Date, f64> = prices
        .pillar_dates()
        .iter()
        .copied()
        .zip(prices.prices().iter().copied())
        .collect();
    let pillars = points.clone();

    for &option_expiry in option_expiries {
        if option_expiry < asof || option_expiry < prices.reference_date() {
            warn!(%option_expiry, %asof, "skipping price correction for expired option");
            continue;
        }
        let future_expiry = calculator.next_expiry(false, option_expiry, 0, true)?;
        let price = match pillars.get(&future_expiry) {
            Some(price) => *price,
            None => {
                let price = prices.price(future_expiry)?;
                points.insert(future_expiry, price);
                price
            }
        };
        debug!(%option_expiry, %future_expiry, price, "price at option expiry set from its future");
        points.insert(option_expiry, price);
    }

    let (dates, values): (Vec<Date>, Vec<f64>) = points.into_iter().unzip();
    Ok(prices.rebuild_with_pillars(dates, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::ConventionsFutureExpiry;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};
    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::types::Frequency;
    use pillar_core::{Currency, Period};
    use pillar_curves::PriceInterpolation;
    use pillar_market::conventions::{AnchorRule, CommodityFutureConvention};

    fn day(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn calculator() -> ConventionsFutureExpiry {
        ConventionsFutureExpiry::new(CommodityFutureConvention {
            anchor: AnchorRule::DayOfMonth { day: 20 },
            contract_frequency: Frequency::Monthly,
            calendar: MarketCalendar::WeekendsOnly,
            expiry_convention: BusinessDayConvention::Preceding,
            expiry_month_lag: 0,
            option_expiry_offset: 3,
            averaging_period: Period::days(1),
        })
        .unwrap()
    }

    #[test]
    fn test_option_expiries_take_future_prices() {
        let asof = day(2024, 1, 15);
        let curve = PriceCurve::new(
            asof,
            Currency::USD,
            vec![asof, day(2024, 2, 20), day(2024, 3, 20)],
            vec![100.0, 105.0, 110.0],
            DayCountConvention::Act365Fixed,
            PriceInterpolation::Linear,
            true,
        )
        .unwrap();

        let corrected =
            correct_future_price_curve(asof, &curve, &calculator(), &[day(2024, 3, 14), day(2024, 4, 15)]).unwrap();

        assert_relative_eq!(corrected.price(day(2024, 3, 14)).unwrap(), 110.0);
        assert!(curve.price(day(2024, 3, 14)).unwrap() < 110.0);
        // 2024-04-20 is a Saturday; the April future expires on the 19th.
        assert!(corrected.pillar_dates().contains(&day(2024, 4, 19)));
        assert_relative_eq!(corrected.price(day(2024, 4, 15)).unwrap(), 110.0);
        assert_eq!(corrected.interpolation(), PriceInterpolation::Linear);
        assert!(corrected.allows_extrapolation());
    }
}

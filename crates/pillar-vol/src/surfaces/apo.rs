//! Average price option surfaces implied from a future option surface.

use std::sync::Arc;

use pillar_core::calendars::{Calendar, MarketCalendar};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Date, Period};
use pillar_curves::PriceCurve;
use pillar_market::config::SmileInterpolation;
use pillar_market::quotes::MoneynessType;
use tracing::debug;

use super::moneyness::BlackVolatilitySurfaceMoneyness;
use crate::error::{VolError, VolResult};
use crate::expiry::FutureExpiryCalculator;
use crate::term_structure::BlackVolTermStructure;

/// Averaging months scanned before giving up.
const MAX_APO_MONTHS: usize = 600;

/// The futures a calendar month of averaging refers to.
#[derive(Debug, Clone, PartialEq)]
struct AveragingMonth {
    expiry: Date,
    /// Time to each remaining pricing date.
    fixing_times: Vec<f64>,
    /// Time to the expiry of the future priced on each date.
    future_times: Vec<f64>,
    /// Price of the future priced on each date.
    forwards: Vec<f64>,
}

impl AveragingMonth {
    fn mean_forward(&self) -> f64 {
        self.forwards.iter().sum::<f64>() / self.forwards.len() as f64
    }
}

/// Inputs of an [`ApoFutureSurface`] taken from the base future market.
#[derive(Debug, Clone)]
pub struct ApoBaseMarket {
    /// Volatility surface of options on the base futures.
    pub vol: Arc<dyn BlackVolTermStructure>,
    /// Base future prices by expiry.
    pub prices: Arc<PriceCurve>,
    /// Expiry calculator of the base futures.
    pub expiries: Arc<dyn FutureExpiryCalculator>,
    /// Calendar of the pricing dates.
    pub calendar: MarketCalendar,
}

/// Volatilities of monthly average price options, by forward moneyness.
///
/// Each APO expires on the last pricing date of a calendar month and pays
/// on the average of the base future prices fixed on that month's pricing
/// dates. Its volatility at moneyness `m` comes from matching the first
/// two moments of the average with a lognormal (Turnbull and Wakeman):
///
/// `E[A²] = 1/n² Σᵢ Σⱼ Fᵢ Fⱼ exp(ρᵢⱼ σᵢ σⱼ min(tᵢ, tⱼ))`, `σ_A² T = ln(E[A²] / E[A]²)`
///
/// with future volatilities `σᵢ` read off the base surface at the strike
/// `m·E[A]` and correlation `ρᵢⱼ = exp(-β |Tᵢ − Tⱼ|)` between futures
/// expiring at `Tᵢ` and `Tⱼ`. The resulting grid is held as a forward
/// moneyness surface on the APO price curve.
#[derive(Debug)]
pub struct ApoFutureSurface {
    surface: BlackVolatilitySurfaceMoneyness,
    beta: f64,
}

impl ApoFutureSurface {
    /// Builds the APO grid.
    ///
    /// APO expiries run from the first month with a pricing date after
    /// `reference_date` up to the end of the base market, cut at
    /// `reference_date + max_tenor` when given.
    ///
    /// # Errors
    ///
    /// Fails when no APO expiry is left, when a base price or volatility is
    /// unavailable, or when `beta` is negative.
    pub fn new(
        reference_date: Date,
        levels: Vec<f64>,
        apo_prices: Arc<PriceCurve>,
        base: &ApoBaseMarket,
        beta: f64,
        max_tenor: Option<Period>,
        day_counter: DayCountConvention,
        extrapolate: bool,
    ) -> VolResult<Self> {
        if !(beta.is_finite() && beta >= 0.0) {
            return Err(VolError::invalid_data(format!("APO beta {beta} must be non-negative")));
        }
        if levels.is_empty() {
            return Err(VolError::invalid_data("APO surface needs moneyness levels"));
        }
        let months = averaging_months(reference_date, base, max_tenor, day_counter)?;
        if months.is_empty() {
            return Err(VolError::invalid_data(format!(
                "no APO expiry between {reference_date} and the end of the base market"
            )));
        }

        let mut dates = Vec::with_capacity(months.len());
        let mut vols = Vec::with_capacity(months.len());
        for month in &months {
            let row = levels
                .iter()
                .map(|m| moment_matched_vol(month, &*base.vol, m * month.mean_forward(), beta))
                .collect::<VolResult<Vec<f64>>>()?;
            debug!(expiry = %month.expiry, fixings = month.forwards.len(), "APO slice");
            dates.push(month.expiry);
            vols.push(row);
        }

        let surface = BlackVolatilitySurfaceMoneyness::new(
            reference_date,
            dates,
            levels,
            vols,
            day_counter,
            MoneynessType::Fwd,
            apo_prices,
            SmileInterpolation::Linear,
            extrapolate,
        )?;
        Ok(Self { surface, beta })
    }

    /// APO expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        self.surface.dates()
    }

    /// Forward moneyness levels.
    #[must_use]
    pub fn levels(&self) -> &[f64] {
        self.surface.levels()
    }

    /// Moment-matched volatilities, one row per expiry.
    #[must_use]
    pub fn vols(&self) -> &[Vec<f64>] {
        self.surface.vols()
    }

    /// Correlation decay between futures.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl BlackVolTermStructure for ApoFutureSurface {
    fn reference_date(&self) -> Date {
        self.surface.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.surface.day_counter()
    }

    fn max_date(&self) -> Date {
        self.surface.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.surface.allows_extrapolation()
    }

    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
        self.surface.black_vol_impl(t, strike)
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        self.surface.atm_vol(t)
    }
}

fn averaging_months(
    reference_date: Date,
    base: &ApoBaseMarket,
    max_tenor: Option<Period>,
    day_counter: DayCountConvention,
) -> VolResult<Vec<AveragingMonth>> {
    let mut limit = base.vol.max_date().min(base.prices.max_date());
    if let Some(tenor) = max_tenor {
        limit = limit.min(reference_date.add_period(tenor, false)?);
    }
    let time = |d: Date| day_counter.year_fraction(reference_date, d);

    let mut months = Vec::new();
    let mut month_start = reference_date.start_of_month();
    for _ in 0..MAX_APO_MONTHS {
        let pricing_dates: Vec<Date> = (0..i64::from(month_start.days_in_month()))
            .map(|offset| month_start.add_days(offset))
            .filter(|d| base.calendar.is_business_day(*d))
            .collect();
        month_start = month_start.add_months(1)?;
        let Some(&expiry) = pricing_dates.last() else {
            continue;
        };
        if expiry <= reference_date {
            continue;
        }
        if expiry > limit {
            break;
        }

        let mut fixings = Vec::with_capacity(pricing_dates.len());
        for date in pricing_dates.into_iter().filter(|d| *d > reference_date) {
            fixings.push((date, base.expiries.next_expiry(false, date, 0, true)?));
        }
        // the futures priced by a month may expire after the month itself
        if let Some(&(_, future_expiry)) = fixings.iter().find(|(_, f)| *f > base.prices.max_date()) {
            debug!(
                %expiry,
                %future_expiry,
                price_end = %base.prices.max_date(),
                "averaging month prices futures beyond the price curve, stopping"
            );
            break;
        }

        let mut month = AveragingMonth {
            expiry,
            fixing_times: Vec::with_capacity(fixings.len()),
            future_times: Vec::with_capacity(fixings.len()),
            forwards: Vec::with_capacity(fixings.len()),
        };
        for (date, future_expiry) in fixings {
            month.fixing_times.push(time(date));
            month.future_times.push(time(future_expiry));
            month.forwards.push(base.prices.price(future_expiry)?);
        }
        months.push(month);
    }
    Ok(months)
}

fn moment_matched_vol(
    month: &AveragingMonth,
    base_vol: &dyn BlackVolTermStructure,
    strike: f64,
    beta: f64,
) -> VolResult<f64> {
    let n = month.forwards.len();
    let sigmas = month
        .fixing_times
        .iter()
        .map(|t| base_vol.black_vol_t(*t, strike, true))
        .collect::<VolResult<Vec<f64>>>()?;

    let mut second_moment = 0.0;
    for i in 0..n {
        for j in 0..n {
            let rho = (-beta * (month.future_times[i] - month.future_times[j]).abs()).exp();
            let t = month.fixing_times[i].min(month.fixing_times[j]);
            second_moment += month.forwards[i] * month.forwards[j] * (rho * sigmas[i] * sigmas[j] * t).exp();
        }
    }
    second_moment /= (n * n) as f64;

    let first_moment = month.mean_forward();
    let expiry_time = month.fixing_times[n - 1];
    let variance = (second_moment / (first_moment * first_moment)).ln().max(0.0);
    Ok((variance / expiry_time).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::ConventionsFutureExpiry;
    use crate::surfaces::ConstantVol;
    use approx::assert_relative_eq;
    use pillar_core::calendars::BusinessDayConvention;
    use pillar_core::types::Frequency;
    use pillar_core::Currency;
    use pillar_curves::PriceInterpolation;
    use pillar_market::conventions::{AnchorRule, CommodityFutureConvention};

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn flat_prices(price: f64) -> Arc<PriceCurve> {
        Arc::new(
            PriceCurve::new(
                asof(),
                Currency::USD,
                vec![asof(), asof().add_days(800)],
                vec![price, price],
                DayCountConvention::Act365Fixed,
                PriceInterpolation::Linear,
                false,
            )
            .unwrap(),
        )
    }

    fn base(vol: f64) -> ApoBaseMarket {
        let convention = CommodityFutureConvention {
            anchor: AnchorRule::LastBusinessDay,
            contract_frequency: Frequency::Monthly,
            calendar: MarketCalendar::WeekendsOnly,
            expiry_convention: BusinessDayConvention::Preceding,
            expiry_month_lag: 0,
            option_expiry_offset: 0,
            averaging_period: Period::days(1),
        };
        ApoBaseMarket {
            vol: Arc::new(ConstantVol::new(asof(), vol, DayCountConvention::Act365Fixed)),
            prices: flat_prices(80.0),
            expiries: Arc::new(ConventionsFutureExpiry::new(convention).unwrap()),
            calendar: MarketCalendar::WeekendsOnly,
        }
    }

    #[test]
    fn test_expiries_are_month_ends_within_tenor() {
        let surface = ApoFutureSurface::new(
            asof(),
            vec![0.9, 1.0, 1.1],
            flat_prices(80.0),
            &base(0.3),
            0.0,
            Some(Period::months(3)),
            DayCountConvention::Act365Fixed,
            true,
        )
        .unwrap();
        let expected: Vec<Date> = [(2024, 1, 31), (2024, 2, 29), (2024, 3, 29)]
            .iter()
            .map(|(y, m, d)| Date::from_ymd(*y, *m, *d).unwrap())
            .collect();
        assert_eq!(surface.dates(), expected.as_slice());
    }

    #[test]
    fn test_averaging_lowers_volatility() {
        let surface = ApoFutureSurface::new(
            asof(),
            vec![1.0],
            flat_prices(80.0),
            &base(0.3),
            0.5,
            Some(Period::months(6)),
            DayCountConvention::Act365Fixed,
            true,
        )
        .unwrap();
        for row in surface.vols() {
            assert!(row[0] > 0.0 && row[0] < 0.3, "APO vol {} not below 0.3", row[0]);
        }
    }

    #[test]
    fn test_months_stop_where_future_prices_end() {
        // futures expire on the 20th, so late fixings of a month price the
        // next month's contract
        let mut market = base(0.3);
        market.expiries = Arc::new(
            ConventionsFutureExpiry::new(CommodityFutureConvention {
                anchor: AnchorRule::DayOfMonth { day: 20 },
                contract_frequency: Frequency::Monthly,
                calendar: MarketCalendar::WeekendsOnly,
                expiry_convention: BusinessDayConvention::Preceding,
                expiry_month_lag: 0,
                option_expiry_offset: 0,
                averaging_period: Period::days(1),
            })
            .unwrap(),
        );
        let prices = Arc::new(
            PriceCurve::new(
                asof(),
                Currency::USD,
                vec![asof(), Date::from_ymd(2024, 3, 10).unwrap()],
                vec![80.0, 82.0],
                DayCountConvention::Act365Fixed,
                PriceInterpolation::Linear,
                false,
            )
            .unwrap(),
        );
        market.prices = prices.clone();

        let months = averaging_months(asof(), &market, None, DayCountConvention::Act365Fixed).unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].expiry, Date::from_ymd(2024, 1, 31).unwrap());

        let surface = ApoFutureSurface::new(
            asof(),
            vec![1.0],
            prices,
            &market,
            0.0,
            None,
            DayCountConvention::Act365Fixed,
            true,
        )
        .unwrap();
        assert_eq!(surface.dates(), &[Date::from_ymd(2024, 1, 31).unwrap()]);
    }

    #[test]
    fn test_single_fixing_recovers_base_vol() {
        // One remaining pricing date in January: the average is that fixing.
        let asof = Date::from_ymd(2024, 1, 30).unwrap();
        let market = base(0.25);
        let month = averaging_months(asof, &market, Some(Period::days(5)), DayCountConvention::Act365Fixed).unwrap();
        assert_eq!(month.len(), 1);
        assert_eq!(month[0].forwards.len(), 1);
        let vol = moment_matched_vol(&month[0], &*market.vol, 80.0, 0.0).unwrap();
        assert_relative_eq!(vol, 0.25, epsilon = 1e-12);
    }
}

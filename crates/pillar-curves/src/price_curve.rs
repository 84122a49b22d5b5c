//! Commodity forward price curves.

use std::collections::BTreeMap;
use std::fmt;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Date};
use pillar_market::quotes::{DateOrPeriod, QuoteDetails, QuoteStore, Wildcard};
use pillar_math::interpolation::{
    BackwardFlatInterpolator, CubicInterpolator, Interpolator, LinearInterpolator, LogInterpolator,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CurveError, CurveResult};

/// Interpolation of forward prices between pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceInterpolation {
    /// Linear in price.
    #[default]
    Linear,
    /// Linear in log price.
    LogLinear,
    /// Natural cubic spline.
    Cubic,
    /// Natural cubic spline on log prices.
    LogCubic,
    /// Hermite cubic.
    Hermite,
    /// Piecewise constant, each pillar's price applying back to the
    /// previous pillar.
    BackwardFlat,
}

impl PriceInterpolation {
    fn interpolator(self, xs: Vec<f64>, ys: Vec<f64>) -> CurveResult<Box<dyn Interpolator>> {
        Ok(match self {
            Self::Linear => Box::new(LinearInterpolator::new(xs, ys)?),
            Self::LogLinear => Box::new(LogInterpolator::log_linear(xs, ys)?),
            Self::Cubic => Box::new(CubicInterpolator::natural_spline(xs, ys)?),
            Self::LogCubic => Box::new(LogInterpolator::log_cubic(xs, ys)?),
            Self::Hermite => Box::new(CubicInterpolator::hermite(xs, ys)?),
            Self::BackwardFlat => Box::new(BackwardFlatInterpolator::new(xs, ys)?),
        })
    }
}

/// Forward prices of a commodity by delivery date.
///
/// Prices are interpolated in time between pillars and held flat outside
/// them when extrapolation is allowed.
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::{Currency, Date};
/// use pillar_curves::{PriceCurve, PriceInterpolation};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let curve = PriceCurve::new(
///     asof,
///     Currency::USD,
///     vec![asof.add_days(30), asof.add_days(395)],
///     vec![80.0, 84.0],
///     DayCountConvention::Act365Fixed,
///     PriceInterpolation::Linear,
///     true,
/// )
/// .unwrap();
/// assert_eq!(curve.price(asof.add_days(30)).unwrap(), 80.0);
/// assert_eq!(curve.price(asof.add_days(800)).unwrap(), 84.0);
/// ```
pub struct PriceCurve {
    reference_date: Date,
    currency: Currency,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    prices: Vec<f64>,
    times: Vec<f64>,
    interpolation: PriceInterpolation,
    extrapolation: bool,
    interpolator: Option<Box<dyn Interpolator>>,
}

impl fmt::Debug for PriceCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceCurve")
            .field("reference_date", &self.reference_date)
            .field("currency", &self.currency)
            .field("interpolation", &self.interpolation)
            .field("dates", &self.dates)
            .field("prices", &self.prices)
            .finish_non_exhaustive()
    }
}

impl PriceCurve {
    /// Creates a curve through `(date, price)` pillars.
    ///
    /// # Errors
    ///
    /// Fails when the pillars are empty, unsorted, before the reference
    /// date or carry non-positive prices.
    pub fn new(
        reference_date: Date,
        currency: Currency,
        dates: Vec<Date>,
        prices: Vec<f64>,
        day_counter: DayCountConvention,
        interpolation: PriceInterpolation,
        extrapolation: bool,
    ) -> CurveResult<Self> {
        if dates.is_empty() || dates.len() != prices.len() {
            return Err(CurveError::invalid_data(format!(
                "price curve needs matching non-empty dates and prices, got {} and {}",
                dates.len(),
                prices.len()
            )));
        }
        if dates[0] < reference_date {
            return Err(CurveError::invalid_data(format!(
                "price curve pillar {} is before the reference date {reference_date}",
                dates[0]
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CurveError::invalid_data("price curve dates must be strictly increasing"));
        }
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(CurveError::invalid_data("price curve prices must be positive"));
        }

        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction(reference_date, *d))
            .collect();
        let interpolator = if dates.len() > 1 {
            Some(interpolation.interpolator(times.clone(), prices.clone())?)
        } else {
            None
        };
        Ok(Self {
            reference_date,
            currency,
            day_counter,
            dates,
            prices,
            times,
            interpolation,
            extrapolation,
            interpolator,
        })
    }

    /// Loads `COMMODITY_FWD/PRICE/{name}/{currency}/*` quotes into a curve.
    ///
    /// Tenor quotes are placed at the as-of date plus the tenor; quotes
    /// delivering on or before the as-of date are skipped.
    ///
    /// # Errors
    ///
    /// Fails when no live quote is found or two quotes deliver on the same
    /// date.
    pub fn from_quotes(
        asof: Date,
        name: &str,
        currency: Currency,
        quotes: &dyn QuoteStore,
        day_counter: DayCountConvention,
        interpolation: PriceInterpolation,
        extrapolation: bool,
    ) -> CurveResult<Self> {
        let pattern = format!("COMMODITY_FWD/PRICE/{name}/{}/*", currency.code());
        let wildcard = Wildcard::new(&pattern)
            .ok_or_else(|| CurveError::invalid_data(format!("invalid price quote pattern {pattern}")))?;
        let mut points = BTreeMap::new();
        for datum in quotes.get_pattern(&wildcard, asof) {
            let QuoteDetails::CommodityForward { term, .. } = datum.details() else {
                continue;
            };
            let date = match term {
                DateOrPeriod::Date(d) => *d,
                DateOrPeriod::Period(p) => asof.add_period(*p, false)?,
            };
            if date <= asof {
                debug!(quote = datum.name(), "skipping expired forward price");
                continue;
            }
            if points.insert(date, datum.value()).is_some() {
                return Err(CurveError::invalid_data(format!(
                    "more than one forward price for {name} on {date}"
                )));
            }
        }
        if points.is_empty() {
            return Err(CurveError::NoMarketData {
                curve: format!("Commodity/{}/{name}", currency.code()),
                asof,
            });
        }
        let (dates, prices) = points.into_iter().unzip();
        Self::new(asof, currency, dates, prices, day_counter, interpolation, extrapolation)
    }

    /// A curve with the same interpolation, extrapolation and day count
    /// through new pillars.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn rebuild_with_pillars(&self, dates: Vec<Date>, prices: Vec<f64>) -> CurveResult<Self> {
        Self::new(
            self.reference_date,
            self.currency,
            dates,
            prices,
            self.day_counter,
            self.interpolation,
            self.extrapolation,
        )
    }

    /// Reference date of the curve.
    #[must_use]
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// Currency of the prices.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Day count turning dates into times.
    #[must_use]
    pub fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    /// Pillar dates.
    #[must_use]
    pub fn pillar_dates(&self) -> &[Date] {
        &self.dates
    }

    /// Pillar prices.
    #[must_use]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Interpolation between pillars.
    #[must_use]
    pub fn interpolation(&self) -> PriceInterpolation {
        self.interpolation
    }

    /// True when the curve may be read past its last pillar.
    #[must_use]
    pub fn allows_extrapolation(&self) -> bool {
        self.extrapolation
    }

    /// Last pillar date.
    #[must_use]
    pub fn max_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Curve time of a date.
    #[must_use]
    pub fn time_from_reference(&self, date: Date) -> f64 {
        self.day_counter.year_fraction(self.reference_date, date)
    }

    /// Forward price for delivery on `date`.
    pub fn price(&self, date: Date) -> CurveResult<f64> {
        self.price_t(self.time_from_reference(date))
    }

    /// Forward price for delivery at time `t`.
    pub fn price_t(&self, t: f64) -> CurveResult<f64> {
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];
        if t > last + 1e-12 && !self.extrapolation {
            return Err(CurveError::Extrapolation { t, max_time: last });
        }
        match &self.interpolator {
            _ if t <= first => Ok(self.prices[0]),
            _ if t >= last => Ok(self.prices[self.prices.len() - 1]),
            Some(interpolator) => Ok(interpolator.interpolate(t)?),
            None => Ok(self.prices[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn curve(interpolation: PriceInterpolation, extrapolation: bool) -> PriceCurve {
        PriceCurve::new(
            asof(),
            Currency::USD,
            vec![asof().add_days(31), asof().add_days(120), asof().add_days(365)],
            vec![70.0, 72.0, 76.0],
            DayCountConvention::Act365Fixed,
            interpolation,
            extrapolation,
        )
        .unwrap()
    }

    #[test]
    fn test_pillars_are_reproduced() {
        for interpolation in [
            PriceInterpolation::Linear,
            PriceInterpolation::LogLinear,
            PriceInterpolation::Cubic,
            PriceInterpolation::LogCubic,
            PriceInterpolation::Hermite,
            PriceInterpolation::BackwardFlat,
        ] {
            let c = curve(interpolation, true);
            for (d, p) in c.pillar_dates().iter().zip(c.prices()) {
                assert_relative_eq!(c.price(*d).unwrap(), *p, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_flat_outside_pillars() {
        let c = curve(PriceInterpolation::Linear, true);
        assert_eq!(c.price(asof()).unwrap(), 70.0);
        assert_eq!(c.price(asof().add_days(2000)).unwrap(), 76.0);
        let strict = curve(PriceInterpolation::Linear, false);
        assert!(strict.price(asof().add_days(2000)).is_err());
    }

    #[test]
    fn test_rebuild_keeps_kind() {
        let c = curve(PriceInterpolation::LogLinear, false);
        let rebuilt = c
            .rebuild_with_pillars(vec![asof().add_days(40), asof().add_days(300)], vec![71.0, 75.0])
            .unwrap();
        assert_eq!(rebuilt.interpolation(), PriceInterpolation::LogLinear);
        assert!(!rebuilt.allows_extrapolation());
        assert_eq!(rebuilt.pillar_dates().len(), 2);
    }

    #[test]
    fn test_rejects_bad_pillars() {
        let dc = DayCountConvention::Act365Fixed;
        let d = asof().add_days(30);
        let lin = PriceInterpolation::Linear;
        assert!(PriceCurve::new(asof(), Currency::USD, vec![d, d], vec![1.0, 2.0], dc, lin, true).is_err());
        assert!(PriceCurve::new(asof(), Currency::USD, vec![d], vec![-1.0], dc, lin, true).is_err());
        assert!(PriceCurve::new(asof(), Currency::USD, vec![], vec![], dc, lin, true).is_err());
    }
}

//! Option quote selection and grid assembly.

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_curves::{PriceCurve, YieldTermStructure};
use pillar_market::config::{CommodityVolatilityConfig, Extrapolation, VolatilityQuoteType};
use pillar_market::conventions::Conventions;
use pillar_market::quotes::{
    axis_wildcard, Expiry, MarketDatum, OptionType, QuoteDetails, QuoteSelection, QuoteStore, QuoteType,
    Strike, Wildcard,
};
use pillar_market::MarketError;
use tracing::{debug, info, warn};

use crate::dependencies::VolDependencies;
use crate::error::{VolError, VolResult};
use crate::expiry::{get_expiry, FutureExpiryCalculator};
use crate::price_correction::correct_future_price_curve;

/// A commodity option quote of the curve being built.
#[derive(Debug, Clone)]
pub(super) struct OptionQuote {
    pub(super) name: String,
    pub(super) expiry: Expiry,
    pub(super) expiry_date: Date,
    pub(super) strike: Strike,
    pub(super) option_type: OptionType,
    pub(super) value: f64,
}

/// Configured expiries of a grid surface.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum ExpiryAxis {
    Wildcard,
    Explicit(Vec<Expiry>),
}

impl ExpiryAxis {
    pub(super) fn from_config(curve_id: &str, expiries: &[String]) -> VolResult<Self> {
        if axis_wildcard(curve_id, "expiries", expiries)? {
            return Ok(Self::Wildcard);
        }
        if expiries.is_empty() {
            return Err(MarketError::invalid_config(curve_id, "no expiries configured").into());
        }
        let parsed = expiries
            .iter()
            .map(|e| Expiry::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Explicit(parsed))
    }

    pub(super) fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    fn accepts(&self, expiry: &Expiry) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Explicit(expiries) => expiries.contains(expiry),
        }
    }
}

/// A full expiry by column grid.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Grid {
    pub(super) dates: Vec<Date>,
    pub(super) rows: Vec<Vec<f64>>,
}

/// Everything the variant builders read.
pub(super) struct VolContext<'a> {
    pub(super) asof: Date,
    pub(super) config: &'a CommodityVolatilityConfig,
    pub(super) conventions: &'a Conventions,
    pub(super) quotes: &'a dyn QuoteStore,
    pub(super) dependencies: VolDependencies<'a>,
    pub(super) expiry_calculator: Option<Arc<dyn FutureExpiryCalculator>>,
}

impl VolContext<'_> {
    pub(super) fn curve_id(&self) -> &str {
        &self.config.curve_id
    }

    pub(super) fn day_counter(&self) -> DayCountConvention {
        self.config.day_count
    }

    pub(super) fn expiry_date(&self, expiry: &Expiry) -> VolResult<Date> {
        get_expiry(
            self.asof,
            expiry,
            &self.config.calendar,
            self.expiry_calculator.as_deref(),
            self.config.option_expiry_roll_days,
        )
    }

    /// The configured price curve, required by `variant`.
    pub(super) fn price_curve(&self, variant: &str) -> VolResult<Arc<PriceCurve>> {
        let id = self.config.price_curve_id.as_deref().ok_or_else(|| {
            MarketError::invalid_config(self.curve_id(), format!("{variant} volatility needs a price curve"))
        })?;
        self.dependencies.price_curve(id, self.curve_id())
    }

    /// The configured discount curve, required by `variant`.
    pub(super) fn yield_curve(&self, variant: &str) -> VolResult<Arc<dyn YieldTermStructure>> {
        let id = self.config.yield_curve_id.as_deref().ok_or_else(|| {
            MarketError::invalid_config(self.curve_id(), format!("{variant} volatility needs a yield curve"))
        })?;
        self.dependencies.yield_curve(id, self.config.currency, self.curve_id())
    }

    /// Price curve re-pillared at the option expiries when correction is on
    /// and future conventions are configured.
    pub(super) fn corrected_prices(
        &self,
        prices: Arc<PriceCurve>,
        option_expiries: &[Date],
        enabled: bool,
    ) -> VolResult<Arc<PriceCurve>> {
        match (&self.expiry_calculator, enabled) {
            (Some(calculator), true) => {
                let corrected = correct_future_price_curve(self.asof, &prices, calculator.as_ref(), option_expiries)?;
                info!(pillars = corrected.pillar_dates().len(), "future price curve corrected at option expiries");
                Ok(Arc::new(corrected))
            }
            (None, true) => {
                debug!("no future conventions configured, price curve used as is");
                Ok(prices)
            }
            (_, false) => Ok(prices),
        }
    }

    /// The curve's option quote carried by `datum`, if it is one.
    fn option_quote(&self, datum: &MarketDatum) -> VolResult<Option<OptionQuote>> {
        let QuoteDetails::CommodityOption {
            name,
            currency,
            expiry,
            strike,
            option_type,
        } = datum.details()
        else {
            return Ok(None);
        };
        if name != self.curve_id() || currency != self.config.currency.code() {
            return Ok(None);
        }
        Ok(Some(OptionQuote {
            name: datum.name().to_string(),
            expiry: *expiry,
            expiry_date: self.expiry_date(expiry)?,
            strike: *strike,
            option_type: *option_type,
            value: datum.value(),
        }))
    }

    /// Live quotes of `quote_type` on the accepted expiries and strikes.
    pub(super) fn option_quotes<F>(
        &self,
        quote_type: VolatilityQuoteType,
        axis: &ExpiryAxis,
        accepts_strike: F,
    ) -> VolResult<Vec<OptionQuote>>
    where
        F: Fn(&Strike) -> bool,
    {
        let stem = self.config.quote_stem(quote_type);
        let pattern = format!("{stem}*");
        let wildcard = Wildcard::new(&pattern).ok_or_else(|| MarketError::InvalidWildcard {
            curve_id: self.curve_id().to_string(),
            reason: format!("invalid quote pattern {pattern}"),
        })?;

        let mut live = Vec::new();
        let mut expired = 0_usize;
        for datum in self.quotes.get_pattern(&wildcard, self.asof) {
            let Some(quote) = self.option_quote(&datum)? else {
                continue;
            };
            if !axis.accepts(&quote.expiry) || !accepts_strike(&quote.strike) {
                continue;
            }
            if quote.expiry_date <= self.asof {
                debug!(quote = %quote.name, expiry = %quote.expiry_date, "skipping expired quote");
                expired += 1;
                continue;
            }
            live.push(quote);
        }
        debug!(pattern, live = live.len(), expired, "option quotes loaded");
        Ok(live)
    }

    /// Expiry and volatility pairs of a volatility curve.
    ///
    /// Wildcard selections skip expired quotes and keep the first quote of
    /// each expiry. Explicit selections count expired quotes, reject
    /// repeated expiries and must find every configured quote.
    pub(super) fn curve_points(&self, configured: &[String]) -> VolResult<Vec<(Date, f64)>> {
        let curve_id = self.curve_id();
        let mut points: BTreeMap<Date, f64> = BTreeMap::new();
        match QuoteSelection::from_quotes(curve_id, configured)? {
            QuoteSelection::Wildcard(wildcard) => {
                for datum in self.quotes.get_pattern(&wildcard, self.asof) {
                    if datum.quote_type() != QuoteType::RateLnVol {
                        continue;
                    }
                    let Some(quote) = self.option_quote(&datum)? else {
                        continue;
                    };
                    if quote.expiry_date <= self.asof {
                        debug!(quote = %quote.name, expiry = %quote.expiry_date, "skipping expired quote");
                        continue;
                    }
                    if points.contains_key(&quote.expiry_date) {
                        debug!(quote = %quote.name, expiry = %quote.expiry_date, "skipping duplicate expiry");
                        continue;
                    }
                    points.insert(quote.expiry_date, quote.value);
                }
            }
            QuoteSelection::Explicit(names) => {
                let mut expired = 0_usize;
                for name in &names {
                    if !self.quotes.has(name, self.asof) {
                        warn!(quote = %name, "configured quote not found");
                        continue;
                    }
                    let datum = self.quotes.get(name, self.asof)?;
                    let quote = self
                        .option_quote(&datum)?
                        .filter(|_| datum.quote_type() == QuoteType::RateLnVol)
                        .ok_or_else(|| {
                            VolError::invalid_data(format!("{name} is not a volatility quote of curve {curve_id}"))
                        })?;
                    if quote.expiry_date <= self.asof {
                        warn!(quote = %name, expiry = %quote.expiry_date, "configured quote has expired");
                        expired += 1;
                        continue;
                    }
                    if points.insert(quote.expiry_date, quote.value).is_some() {
                        return Err(MarketError::duplicate(
                            curve_id,
                            format!("Duplicate quote for the expiry date {}", quote.expiry_date),
                        )
                        .into());
                    }
                }
                if points.len() + expired != names.len() {
                    return Err(MarketError::QuoteCountMismatch {
                        curve_id: curve_id.to_string(),
                        expected: names.len(),
                        found: points.len(),
                        expired,
                    }
                    .into());
                }
            }
        }
        if points.is_empty() {
            return Err(VolError::no_market_data(curve_id, "live volatility quotes", self.asof));
        }
        Ok(points.into_iter().collect())
    }

    /// Lays `(expiry, column, vol)` points on a full grid.
    ///
    /// With explicit expiries every live configured expiry must be quoted in
    /// every column. With a wildcard every quoted expiry must be.
    pub(super) fn assemble_grid(
        &self,
        points: &[(Date, usize, f64)],
        axis: &ExpiryAxis,
        columns: &[String],
    ) -> VolResult<Grid> {
        let curve_id = self.curve_id();
        let mut cells: BTreeMap<Date, Vec<Option<f64>>> = BTreeMap::new();
        for &(date, column, vol) in points {
            let row = cells.entry(date).or_insert_with(|| vec![None; columns.len()]);
            if row[column].replace(vol).is_some() {
                return Err(MarketError::duplicate(
                    curve_id,
                    format!("Duplicate quote for expiry date {date} and strike {}", columns[column]),
                )
                .into());
            }
        }

        if let ExpiryAxis::Explicit(expiries) = axis {
            let mut live_dates = Vec::with_capacity(expiries.len());
            let mut expired = 0_usize;
            for expiry in expiries {
                let date = self.expiry_date(expiry)?;
                if date <= self.asof {
                    warn!(%expiry, %date, "configured expiry has expired");
                    expired += 1;
                } else {
                    live_dates.push(date);
                }
            }
            live_dates.sort_unstable();
            live_dates.dedup();
            let found = live_dates
                .iter()
                .filter_map(|d| cells.get(d))
                .flatten()
                .filter(|c| c.is_some())
                .count();
            if found != live_dates.len() * columns.len() || live_dates.len() + expired != expiries.len() {
                return Err(MarketError::QuoteCountMismatch {
                    curve_id: curve_id.to_string(),
                    expected: expiries.len() * columns.len(),
                    found,
                    expired: expired * columns.len(),
                }
                .into());
            }
            cells.retain(|d, _| live_dates.contains(d));
        }

        if cells.is_empty() {
            return Err(VolError::no_market_data(curve_id, "live volatility quotes", self.asof));
        }
        let mut grid = Grid {
            dates: Vec::with_capacity(cells.len()),
            rows: Vec::with_capacity(cells.len()),
        };
        for (date, row) in cells {
            let row = row
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    v.ok_or_else(|| {
                        VolError::invalid_data(format!(
                            "Volatility for expiry date {date} and strike {} not found. \
                             Cannot proceed with a sparse matrix.",
                            columns[j]
                        ))
                    })
                })
                .collect::<VolResult<Vec<f64>>>()?;
            grid.dates.push(date);
            grid.rows.push(row);
        }
        Ok(grid)
    }
}

/// Whether strike extrapolation is flat, logging settings that cannot be
/// honoured.
pub(super) fn flat_strike_extrapolation(variant: &str, extrapolation: Extrapolation) -> bool {
    match extrapolation {
        Extrapolation::UseInterpolator => false,
        Extrapolation::Flat => true,
        Extrapolation::None => {
            warn!(variant, "strike extrapolation None is not supported, extrapolating flat");
            true
        }
    }
}

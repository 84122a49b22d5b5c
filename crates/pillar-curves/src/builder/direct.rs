//! Curves built from a single segment without a bootstrap.

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::calendars::{BusinessDayConvention, Calendar, MarketCalendar};
use pillar_core::types::InterestRate;
use pillar_core::{Currency, Date, Period};
use pillar_market::config::{BondDefinition, InterpolationVariable, SegmentKind, YieldCurveSegment};
use pillar_market::conventions::ZeroConvention;
use pillar_market::quotes::{DateOrPeriod, MarketDatum, QuoteDetails, QuoteType};
use pillar_market::specs::YieldCurveSpec;
use pillar_market::MarketError;
use tracing::{debug, info, warn};

use super::segments::SegmentContext;
use crate::bonds::BondCashflows;
use crate::curves::{
    BondQuote, DiscountRatioCurve, FitSettings, FittedBondCurve, FittingMethod, InterpolatedCurve,
    InterpolationSpec, WeightedAverageCurve, YieldPlusDefaultCurve, ZeroSpreadedCurve,
};
use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// A directly built curve and the dates it is anchored on.
pub(super) struct DirectCurve {
    pub(super) curve: Arc<dyn YieldTermStructure>,
    pub(super) pillars: Vec<Date>,
}

impl DirectCurve {
    fn new(curve: impl YieldTermStructure + 'static, pillars: Vec<Date>) -> Self {
        Self {
            curve: Arc::new(curve),
            pillars,
        }
    }
}

/// Builds the curve of a direct segment.
pub(super) fn build(ctx: &SegmentContext<'_>, segment: &YieldCurveSegment) -> CurveResult<DirectCurve> {
    let config = ctx.config;
    let curve_id = config.curve_id.as_str();
    let currency = config.currency;
    match &segment.kind {
        SegmentKind::Discount => discount(ctx, segment),
        SegmentKind::Zero => zero(ctx, segment),
        SegmentKind::ZeroSpread { reference_curve_id } => {
            let reference = ctx.dependencies.yield_curve(reference_curve_id, currency, curve_id)?;
            let points = quoted_rates(ctx, segment, QuoteType::YieldSpread)?;
            let times = points.iter().map(|(d, _)| reference.time_from_reference(*d)).collect();
            let spreads = points.iter().map(|(_, s)| *s).collect();
            let curve = ZeroSpreadedCurve::new(reference, times, spreads)?.with_extrapolation(config.extrapolation);
            Ok(DirectCurve::new(curve, points.into_iter().map(|(d, _)| d).collect()))
        }
        SegmentKind::DiscountRatio {
            base_curve_id,
            base_curve_currency,
            numerator_curve_id,
            numerator_curve_currency,
            denominator_curve_id,
            denominator_curve_currency,
        } => {
            let lookup = |id: &str, ccy: Currency| {
                ctx.dependencies
                    .yield_curve_exact(&YieldCurveSpec::new(ccy, id), curve_id)
            };
            let curve = DiscountRatioCurve::new(
                lookup(base_curve_id, *base_curve_currency)?,
                lookup(numerator_curve_id, *numerator_curve_currency)?,
                lookup(denominator_curve_id, *denominator_curve_currency)?,
            )
            .with_extrapolation(config.extrapolation);
            Ok(DirectCurve::new(curve, Vec::new()))
        }
        SegmentKind::WeightedAverage {
            reference_curve_id1,
            reference_curve_id2,
            weight1,
            weight2,
        } => {
            let first = ctx.dependencies.yield_curve(reference_curve_id1, currency, curve_id)?;
            let second = ctx.dependencies.yield_curve(reference_curve_id2, currency, curve_id)?;
            let curve = WeightedAverageCurve::new(first, second, *weight1, *weight2)
                .with_extrapolation(config.extrapolation);
            Ok(DirectCurve::new(curve, Vec::new()))
        }
        SegmentKind::YieldPlusDefault {
            reference_curve_id,
            default_curve_ids,
            weights,
        } => {
            let reference = ctx.dependencies.yield_curve(reference_curve_id, currency, curve_id)?;
            let defaults = default_curve_ids
                .iter()
                .map(|id| ctx.dependencies.default_curve(id, curve_id))
                .collect::<CurveResult<Vec<_>>>()?;
            let curve = YieldPlusDefaultCurve::new(reference, defaults, weights.clone())?;
            Ok(DirectCurve::new(curve, Vec::new()))
        }
        SegmentKind::IborFallback {
            ibor_index,
            rfr_curve_id,
            spread,
        } => {
            let rfr = ctx.dependencies.yield_curve(rfr_curve_id, currency, curve_id)?;
            let tenor = ibor_index.tenor().ok_or_else(|| {
                MarketError::invalid_config(
                    curve_id,
                    format!("ibor fallback needs a term index, got {}", ibor_index.name()),
                )
            })?;
            let end = ctx.asof.add_period(tenor, false)?;
            let tau = ibor_index.day_count().year_fraction(ctx.asof, end);
            let t = rfr.time_from_reference(end);
            let continuous = (1.0 + spread * tau).ln() / t;
            debug!(index = ibor_index.name(), spread, continuous, "ibor fallback spread");
            let curve = ZeroSpreadedCurve::parallel(rfr, continuous).with_extrapolation(config.extrapolation);
            Ok(DirectCurve::new(curve, vec![end]))
        }
        SegmentKind::BondYieldShifted {
            reference_curve_id,
            securities,
            extrapolate_flat,
        } => bond_yield_shifted(ctx, segment, reference_curve_id, securities, *extrapolate_flat),
        SegmentKind::FittedBond {
            securities,
            ibor_index_curves,
            extrapolate_flat,
            calibration_trials,
        } => {
            for (index, id) in ibor_index_curves {
                ctx.dependencies.yield_curve(id, currency, curve_id)?;
                debug!(index = %index, curve = %id, "projection curve for floating bonds");
            }
            fitted_bond(ctx, segment, securities, *extrapolate_flat, *calibration_trials)
        }
        kind => Err(CurveError::invalid_data(format!(
            "{} segments are bootstrapped, not built directly",
            kind.type_name()
        ))),
    }
}

fn no_market_data(ctx: &SegmentContext<'_>) -> CurveError {
    CurveError::NoMarketData {
        curve: YieldCurveSpec::new(ctx.config.currency, ctx.config.curve_id.as_str()).name(),
        asof: ctx.asof,
    }
}

fn check_type(datum: &MarketDatum, expected: QuoteType) -> CurveResult<()> {
    if datum.quote_type() == expected {
        Ok(())
    } else {
        Err(CurveError::invalid_data(format!(
            "quote {} has type {:?}, expected {expected:?}",
            datum.name(),
            datum.quote_type()
        )))
    }
}

/// Inserts `(date, value)` and rejects a second quote for the same date.
fn insert_point(ctx: &SegmentContext<'_>, points: &mut BTreeMap<Date, f64>, date: Date, value: f64) -> CurveResult<()> {
    if points.insert(date, value).is_some() {
        return Err(MarketError::duplicate(
            ctx.config.curve_id.as_str(),
            format!("More than one quote with date {date}"),
        )
        .into());
    }
    Ok(())
}

fn discount(ctx: &SegmentContext<'_>, segment: &YieldCurveSegment) -> CurveResult<DirectCurve> {
    let loaded = ctx.load_quotes(segment)?;
    let calendar = &ctx.config.calendar;
    let mut points = BTreeMap::new();
    let mut expired = 0;
    for datum in &loaded.quotes {
        let QuoteDetails::Discount { term, .. } = datum.details() else {
            return Err(CurveError::invalid_data(format!("quote {} is not a discount quote", datum.name())));
        };
        let date = match term {
            DateOrPeriod::Date(d) => *d,
            DateOrPeriod::Period(p) => calendar.advance(ctx.asof, *p, BusinessDayConvention::Following, false)?,
        };
        if date <= ctx.asof {
            expired += 1;
            continue;
        }
        if datum.value() <= 0.0 {
            return Err(CurveError::invalid_data(format!(
                "discount factor {} must be positive",
                datum.name()
            )));
        }
        insert_point(ctx, &mut points, date, datum.value())?;
    }
    ctx.check_count(loaded.expected, points.len(), expired)?;
    if points.is_empty() {
        return Err(no_market_data(ctx));
    }

    let pillars: Vec<Date> = points.keys().copied().collect();
    let mut dates = vec![ctx.asof];
    let mut values = vec![1.0];
    dates.extend(points.keys().copied());
    values.extend(points.values().copied());
    let spec = InterpolationSpec::new(
        ctx.config.interpolation_method,
        InterpolationVariable::Discount,
        ctx.config.zero_day_counter,
    )
    .with_extrapolation(ctx.config.extrapolation);
    Ok(DirectCurve::new(InterpolatedCurve::new(ctx.asof, dates, values, spec)?, pillars))
}

fn zero(ctx: &SegmentContext<'_>, segment: &YieldCurveSegment) -> CurveResult<DirectCurve> {
    let points = quoted_rates(ctx, segment, QuoteType::Rate)?;
    let pillars: Vec<Date> = points.iter().map(|(d, _)| *d).collect();
    let (mut dates, mut values): (Vec<Date>, Vec<f64>) = points.into_iter().unzip();
    if dates[0] > ctx.asof {
        dates.insert(0, ctx.asof);
        values.insert(0, values[0]);
    }
    let spec = InterpolationSpec::new(
        ctx.config.interpolation_method,
        InterpolationVariable::Zero,
        ctx.config.zero_day_counter,
    )
    .with_extrapolation(ctx.config.extrapolation);
    Ok(DirectCurve::new(InterpolatedCurve::new(ctx.asof, dates, values, spec)?, pillars))
}

/// Maturity of a zero quote under the zero conventions.
fn zero_date(ctx: &SegmentContext<'_>, convention: &ZeroConvention, term: &DateOrPeriod) -> CurveResult<Date> {
    match term {
        DateOrPeriod::Date(d) => Ok(*d),
        DateOrPeriod::Period(p) => {
            let tenor_calendar: &MarketCalendar = convention.tenor_calendar.as_ref().ok_or_else(|| {
                MarketError::invalid_config(
                    ctx.config.curve_id.as_str(),
                    "tenor based zero quotes need a tenor calendar in the zero conventions",
                )
            })?;
            let spot_calendar = convention.spot_calendar.as_ref().unwrap_or(tenor_calendar);
            let lag = Period::days(i32::try_from(convention.spot_lag).unwrap_or(i32::MAX));
            let spot = spot_calendar.advance(ctx.asof, lag, BusinessDayConvention::Following, false)?;
            Ok(tenor_calendar.advance(spot, *p, convention.roll_convention, convention.eom)?)
        }
    }
}

/// Sorted `(date, rate)` points of zero quotes.
///
/// Rates are converted to continuous compounding on the curve's day
/// counter; spreads are taken as quoted.
fn quoted_rates(
    ctx: &SegmentContext<'_>,
    segment: &YieldCurveSegment,
    quote_type: QuoteType,
) -> CurveResult<Vec<(Date, f64)>> {
    let convention = ctx.conventions.zero(&segment.conventions_id)?;
    let loaded = ctx.load_quotes(segment)?;
    let mut points = BTreeMap::new();
    let mut expired = 0;
    for datum in &loaded.quotes {
        check_type(datum, quote_type)?;
        let QuoteDetails::Zero { day_count, term, .. } = datum.details() else {
            return Err(CurveError::invalid_data(format!("quote {} is not a zero quote", datum.name())));
        };
        let date = zero_date(ctx, convention, term)?;
        if date <= ctx.asof {
            expired += 1;
            continue;
        }
        let value = if quote_type == QuoteType::Rate {
            let quoted_time = day_count.year_fraction(ctx.asof, date);
            let compound = InterestRate::new(
                datum.value(),
                convention.compounding,
                convention.compounding_frequency,
            )
            .compound_factor(quoted_time);
            compound.ln() / ctx.config.zero_day_counter.year_fraction(ctx.asof, date)
        } else {
            datum.value()
        };
        insert_point(ctx, &mut points, date, value)?;
    }
    ctx.check_count(loaded.expected, points.len(), expired)?;
    if points.is_empty() {
        return Err(no_market_data(ctx));
    }
    Ok(points.into_iter().collect())
}

/// Bond quotes of the segment paired with their definitions.
fn bond_quotes<'s>(
    ctx: &SegmentContext<'_>,
    segment: &YieldCurveSegment,
    securities: &'s [BondDefinition],
    quote_type: QuoteType,
) -> CurveResult<Vec<(&'s BondDefinition, f64)>> {
    let loaded = ctx.load_quotes(segment)?;
    let mut bonds = Vec::with_capacity(loaded.quotes.len());
    let mut expired = 0;
    for datum in &loaded.quotes {
        check_type(datum, quote_type)?;
        let QuoteDetails::Bond { security_id } = datum.details() else {
            return Err(CurveError::invalid_data(format!("quote {} is not a bond quote", datum.name())));
        };
        let bond = securities
            .iter()
            .find(|b| &b.security_id == security_id)
            .ok_or_else(|| {
                MarketError::invalid_config(
                    ctx.config.curve_id.as_str(),
                    format!("no bond definition for security {security_id}"),
                )
            })?;
        if bond.maturity <= ctx.asof {
            debug!(security = %security_id, "skipping matured bond");
            expired += 1;
            continue;
        }
        bonds.push((bond, datum.value()));
    }
    ctx.check_count(loaded.expected, bonds.len(), expired)?;
    if bonds.is_empty() {
        return Err(no_market_data(ctx));
    }
    Ok(bonds)
}

fn bond_yield_shifted(
    ctx: &SegmentContext<'_>,
    segment: &YieldCurveSegment,
    reference_curve_id: &str,
    securities: &[BondDefinition],
    extrapolate_flat: bool,
) -> CurveResult<DirectCurve> {
    let config = ctx.config;
    let reference = ctx
        .dependencies
        .yield_curve(reference_curve_id, config.currency, &config.curve_id)?;
    let bonds = bond_quotes(ctx, segment, securities, QuoteType::Yield)?;

    let mut spreads = Vec::with_capacity(bonds.len());
    let mut pillars = Vec::with_capacity(bonds.len());
    for (bond, quoted_yield) in bonds {
        let cashflows = BondCashflows::new(bond, ctx.asof)?;
        let duration = cashflows.macaulay_duration(quoted_yield, reference.day_counter());
        let reference_zero = reference.zero_rate_t(duration)?;
        let spread = cashflows.continuous_yield(quoted_yield) - reference_zero;
        debug!(
            security = %bond.security_id,
            duration,
            reference_zero,
            spread,
            "bond yield spread"
        );
        spreads.push(spread);
        pillars.push(cashflows.maturity());
    }
    #[allow(clippy::cast_precision_loss)]
    let shift = spreads.iter().sum::<f64>() / spreads.len() as f64;
    info!(bonds = spreads.len(), shift, "reference curve shifted by average bond spread");
    let curve = ZeroSpreadedCurve::parallel(reference, shift)
        .with_extrapolation(config.extrapolation || extrapolate_flat);
    pillars.sort_unstable();
    Ok(DirectCurve::new(curve, pillars))
}

fn fitted_bond(
    ctx: &SegmentContext<'_>,
    segment: &YieldCurveSegment,
    securities: &[BondDefinition],
    extrapolate_flat: bool,
    calibration_trials: u32,
) -> CurveResult<DirectCurve> {
    let config = ctx.config;
    let method = FittingMethod::from_method(config.interpolation_method)?;
    let bonds = bond_quotes(ctx, segment, securities, QuoteType::Price)?
        .into_iter()
        .map(|(bond, price)| {
            Ok(BondQuote {
                cashflows: BondCashflows::new(bond, ctx.asof)?,
                clean_price: price,
            })
        })
        .collect::<CurveResult<Vec<_>>>()?;
    let mut pillars: Vec<Date> = bonds.iter().map(|b| b.cashflows.maturity()).collect();
    pillars.sort_unstable();

    let settings = FitSettings {
        trials: calibration_trials.max(1),
        accuracy: config.bootstrap.accuracy,
        extrapolate_flat,
        extrapolation: config.extrapolation,
    };
    let curve = FittedBondCurve::fit(ctx.asof, config.zero_day_counter, method, &bonds, settings)?;
    let tolerance = config.bootstrap.effective_global_accuracy();
    if curve.cost() >= tolerance {
        if !config.bootstrap.dont_throw {
            return Err(CurveError::FitTolerance {
                cost: curve.cost(),
                tolerance,
            });
        }
        warn!(cost = curve.cost(), tolerance, "fitted bond cost exceeds tolerance, keeping best fit");
    }
    info!(
        bonds = bonds.len(),
        cost = curve.cost(),
        iterations = curve.iterations(),
        "fitted bond curve calibrated"
    );
    Ok(DirectCurve::new(curve, pillars))
}

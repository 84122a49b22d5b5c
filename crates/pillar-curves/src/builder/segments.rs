//! Quote loading and helper construction for bootstrap segments.

use std::sync::Arc;

use pillar_core::calendars::{BusinessDayConvention, Calendar};
use pillar_core::types::Frequency;
use pillar_core::{Currency, Date, Period};
use pillar_market::config::{PillarChoice, SegmentKind, YieldCurveConfig, YieldCurveSegment};
use pillar_market::conventions::{Conventions, RateIndex, SubPeriodsType};
use pillar_market::quotes::{MarketDatum, QuoteDetails, QuoteSelection, QuoteStore};
use pillar_market::MarketError;
use tracing::{debug, warn};

use crate::dependencies::CurveDependencies;
use crate::error::{CurveError, CurveResult};
use crate::helpers::{
    imm_date, AverageOisHelper, BmaRatioHelper, CrossCcyBasisHelper, CrossCcyFixFloatHelper,
    CurveHandle, DepositHelper, FixedLeg, FloatLeg, FraHelper, FutureHelper, FxForwardHelper,
    LegDates, OisHelper, RateHelper, SharedHelper, SwapHelper, TenorBasisHelper,
    TenorBasisTwoHelper,
};

/// Quotes selected by a segment.
pub(super) struct SegmentQuotes {
    pub(super) quotes: Vec<MarketDatum>,
    /// Number of configured names, `None` in wildcard mode.
    pub(super) expected: Option<usize>,
}

/// Everything helper construction reads.
pub(super) struct SegmentContext<'a> {
    pub(super) asof: Date,
    pub(super) config: &'a YieldCurveConfig,
    pub(super) conventions: &'a Conventions,
    pub(super) quotes: &'a dyn QuoteStore,
    pub(super) dependencies: CurveDependencies<'a>,
    pub(super) discount: CurveHandle,
}

type MaybeHelper = CurveResult<Option<SharedHelper>>;

fn live(helper: impl RateHelper + 'static) -> MaybeHelper {
    let helper: SharedHelper = Arc::new(helper);
    Ok(Some(helper))
}

fn unexpected(datum: &MarketDatum, expected: &str) -> CurveError {
    CurveError::invalid_data(format!("quote {} is not a {expected} quote", datum.name()))
}

fn business_days(n: u32) -> Period {
    Period::days(i32::try_from(n).unwrap_or(i32::MAX))
}

fn currency(code: &str) -> CurveResult<Currency> {
    Ok(code.parse::<Currency>()?)
}

/// Year and month of a `YYYY-MM` future expiry.
fn expiry_month(name: &str, expiry: &str) -> CurveResult<(i32, u32)> {
    let invalid = || MarketError::quote_parse(name, format!("invalid expiry month {expiry}"));
    let (year, month) = expiry.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid().into());
    }
    Ok((year, month))
}

/// Currency pair of an FX spot id: `FX/RATE/C1/C2`, `FX/C1/C2` or `C1C2`.
pub(crate) fn fx_pair(spot_id: &str) -> CurveResult<(Currency, Currency)> {
    let tokens: Vec<&str> = spot_id.split('/').collect();
    let (c1, c2) = match tokens.as_slice() {
        ["FX", "RATE", c1, c2] | ["FX", c1, c2] => (*c1, *c2),
        [pair] if pair.len() == 6 && pair.is_ascii() => pair.split_at(3),
        _ => {
            return Err(CurveError::invalid_data(format!(
                "cannot read a currency pair from FX spot id {spot_id}"
            )))
        }
    };
    Ok((currency(c1)?, currency(c2)?))
}

impl SegmentContext<'_> {
    fn curve_id(&self) -> &str {
        &self.config.curve_id
    }

    /// Quotes of the segment in wildcard or explicit mode.
    pub(super) fn load_quotes(&self, segment: &YieldCurveSegment) -> CurveResult<SegmentQuotes> {
        match segment.quote_selection(self.curve_id())? {
            QuoteSelection::Wildcard(wildcard) => {
                let quotes = self.quotes.get_pattern(&wildcard, self.asof);
                if quotes.is_empty() {
                    warn!(pattern = wildcard.pattern(), "no quotes match wildcard");
                } else {
                    debug!(pattern = wildcard.pattern(), found = quotes.len(), "wildcard quotes loaded");
                }
                Ok(SegmentQuotes {
                    quotes,
                    expected: None,
                })
            }
            QuoteSelection::Explicit(names) => {
                let mut quotes = Vec::with_capacity(names.len());
                for name in &names {
                    if self.quotes.has(name, self.asof) {
                        quotes.push(self.quotes.get(name, self.asof)?);
                    } else {
                        warn!(quote = %name, "configured quote not found");
                    }
                }
                Ok(SegmentQuotes {
                    quotes,
                    expected: Some(names.len()),
                })
            }
        }
    }

    /// Fails when explicitly configured quotes are neither live nor expired.
    pub(super) fn check_count(&self, expected: Option<usize>, found: usize, expired: usize) -> CurveResult<()> {
        match expected {
            Some(expected) if found + expired != expected => Err(MarketError::QuoteCountMismatch {
                curve_id: self.curve_id().to_string(),
                expected,
                found,
                expired,
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// An already-built curve of the curve's currency, or the curve itself.
    fn handle(&self, curve_id: Option<&str>) -> CurveResult<CurveHandle> {
        self.handle_in(curve_id, self.config.currency)
    }

    fn handle_in(&self, curve_id: Option<&str>, currency: Currency) -> CurveResult<CurveHandle> {
        match curve_id.filter(|id| !id.is_empty() && *id != self.curve_id()) {
            None => Ok(CurveHandle::Own),
            Some(id) => Ok(CurveHandle::External(self.dependencies.yield_curve(
                id,
                currency,
                self.curve_id(),
            )?)),
        }
    }

    /// FX spot for `unit` in units of `quoted`, inverting a quote of the
    /// opposite pair.
    fn fx_spot(&self, spot_id: &str, unit: Currency, quoted: Currency) -> CurveResult<f64> {
        let (c1, c2) = fx_pair(spot_id)?;
        let name = format!("FX/RATE/{}/{}", c1.code(), c2.code());
        let value = self.quotes.get(&name, self.asof)?.value();
        if value <= 0.0 {
            return Err(CurveError::invalid_data(format!("FX spot {name} must be positive")));
        }
        if (c1, c2) == (unit, quoted) {
            Ok(value)
        } else if (c1, c2) == (quoted, unit) {
            debug!(spot = %name, "inverting FX spot quote");
            Ok(1.0 / value)
        } else {
            Err(CurveError::invalid_data(format!(
                "FX spot {name} does not quote {unit}/{quoted}"
            )))
        }
    }

    /// Runs `make` over the segment's quotes and checks the quote count.
    fn collect(
        &self,
        segment: &YieldCurveSegment,
        mut make: impl FnMut(&MarketDatum) -> MaybeHelper,
    ) -> CurveResult<Vec<SharedHelper>> {
        let loaded = self.load_quotes(segment)?;
        let mut helpers = Vec::with_capacity(loaded.quotes.len());
        let mut expired = 0;
        for datum in &loaded.quotes {
            match make(datum)? {
                Some(helper) if helper.maturity_date() > self.asof => helpers.push(helper),
                _ => {
                    debug!(quote = datum.name(), "skipping expired quote");
                    expired += 1;
                }
            }
        }
        self.check_count(loaded.expected, helpers.len(), expired)?;
        Ok(helpers)
    }

    /// Helpers of one bootstrap segment, in quote order.
    pub(super) fn helpers(&self, segment: &YieldCurveSegment) -> CurveResult<Vec<SharedHelper>> {
        let id = segment.conventions_id.as_str();
        let choice = segment.pillar_choice;
        match &segment.kind {
            SegmentKind::Deposit => self.collect(segment, |q| self.deposit(q, id, choice)),
            SegmentKind::Fra { projection_curve_id } => {
                let projection = self.handle(projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.fra(q, id, &projection, choice))
            }
            SegmentKind::Future { projection_curve_id } => {
                let projection = self.handle(projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.future(q, id, &projection, choice))
            }
            SegmentKind::Ois { projection_curve_id } => {
                let projection = self.handle(projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.ois(q, id, &projection, choice))
            }
            SegmentKind::Swap { projection_curve_id } => {
                let projection = self.handle(projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.swap(q, id, &projection, choice))
            }
            SegmentKind::AverageOis { projection_curve_id } => {
                let projection = self.handle(projection_curve_id.as_deref())?;
                self.average_ois(segment, &projection)
            }
            SegmentKind::TenorBasis {
                short_projection_curve_id,
                long_projection_curve_id,
            } => {
                let long = self.handle(long_projection_curve_id.as_deref())?;
                let short = self.handle(short_projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.tenor_basis(q, id, &long, &short, choice))
            }
            SegmentKind::TenorBasisTwo {
                short_projection_curve_id,
                long_projection_curve_id,
            } => {
                let long = self.handle(long_projection_curve_id.as_deref())?;
                let short = self.handle(short_projection_curve_id.as_deref())?;
                self.collect(segment, |q| self.tenor_basis_two(q, id, &long, &short, choice))
            }
            SegmentKind::BmaBasis {
                libor_projection_curve_id,
            } => {
                let libor = self.handle(Some(libor_projection_curve_id.as_str()))?;
                self.collect(segment, |q| self.bma_basis(q, id, &libor, choice))
            }
            SegmentKind::FxForward {
                spot_rate_id,
                foreign_discount_curve_id,
            } => self.collect(segment, |q| {
                self.fx_forward(q, id, spot_rate_id, foreign_discount_curve_id, choice)
            }),
            SegmentKind::CrossCcyBasis {
                spot_rate_id,
                foreign_discount_curve_id,
                domestic_projection_curve_id,
                foreign_projection_curve_id,
            } => {
                let legs = CrossCurrencyCurves {
                    spot_rate_id,
                    foreign_discount: foreign_discount_curve_id,
                    domestic_projection: domestic_projection_curve_id.as_deref(),
                    foreign_projection: foreign_projection_curve_id.as_deref(),
                };
                self.collect(segment, |q| self.cross_ccy_basis(q, id, &legs, choice))
            }
            SegmentKind::CrossCcyFixFloat {
                spot_rate_id,
                foreign_discount_curve_id,
                foreign_projection_curve_id,
            } => {
                let legs = CrossCurrencyCurves {
                    spot_rate_id,
                    foreign_discount: foreign_discount_curve_id,
                    domestic_projection: None,
                    foreign_projection: foreign_projection_curve_id.as_deref(),
                };
                self.collect(segment, |q| self.cross_ccy_fix_float(q, id, &legs, choice))
            }
            kind => Err(CurveError::invalid_data(format!(
                "{} segments build the curve directly and cannot be bootstrapped",
                kind.type_name()
            ))),
        }
    }

    // =========================================================================
    // MONEY MARKET
    // =========================================================================

    fn deposit(&self, datum: &MarketDatum, id: &str, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::MoneyMarket { fwd_start, term, .. } = datum.details() else {
            return Err(unexpected(datum, "money market"));
        };
        let convention = self.conventions.deposit(id)?;
        let calendar = convention.calendar();
        let start = calendar.advance(self.asof, *fwd_start, BusinessDayConvention::Following, false)?;
        let end = calendar.advance(start, *term, convention.convention(), convention.eom)?;
        live(DepositHelper::new(
            datum.name(),
            datum.value(),
            start,
            end,
            convention.day_count(),
            choice,
        ))
    }

    fn fra(&self, datum: &MarketDatum, id: &str, projection: &CurveHandle, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::Fra { fwd_start, term, .. } = datum.details() else {
            return Err(unexpected(datum, "FRA"));
        };
        let index = &self.conventions.fra(id)?.index;
        let calendar = index.fixing_calendar();
        let spot = calendar.advance(
            self.asof,
            business_days(index.fixing_days()),
            BusinessDayConvention::Following,
            false,
        )?;
        let start = calendar.advance(spot, *fwd_start, BusinessDayConvention::ModifiedFollowing, false)?;
        let end = calendar.advance(spot, *term, BusinessDayConvention::ModifiedFollowing, false)?;
        if end <= start {
            return Err(CurveError::invalid_data(format!(
                "FRA {} ends on {end}, not after its start {start}",
                datum.name()
            )));
        }
        live(FraHelper::new(
            datum.name(),
            datum.value(),
            start,
            end,
            index.day_count(),
            projection.clone(),
            choice,
        ))
    }

    fn future(&self, datum: &MarketDatum, id: &str, projection: &CurveHandle, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::MoneyMarketFuture { expiry, term, .. } = datum.details() else {
            return Err(unexpected(datum, "money market future"));
        };
        let index = &self.conventions.future(id)?.index;
        let (year, month) = expiry_month(datum.name(), expiry)?;
        let start = imm_date(year, month)?;
        if start <= self.asof {
            return Ok(None);
        }
        let end = match term.total_months() {
            Some(months) => {
                let reference_end = start.add_months(months)?;
                imm_date(reference_end.year(), reference_end.month())?
            }
            None => index.fixing_calendar().advance(
                start,
                *term,
                BusinessDayConvention::ModifiedFollowing,
                false,
            )?,
        };
        live(FutureHelper::new(
            datum.name(),
            datum.value(),
            start,
            end,
            index.day_count(),
            projection.clone(),
            choice,
        ))
    }

    // =========================================================================
    // SWAPS
    // =========================================================================

    fn ois(&self, datum: &MarketDatum, id: &str, projection: &CurveHandle, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::Swap { term, .. } = datum.details() else {
            return Err(unexpected(datum, "swap"));
        };
        let convention = self.conventions.ois(id)?;
        let calendar = convention.index.fixing_calendar();
        let start = calendar.advance(
            self.asof,
            business_days(convention.spot_lag),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = calendar.advance(start, *term, convention.fixed_convention, convention.eom)?;
        let dates = LegDates::generate_with_rule(
            start,
            end,
            convention.fixed_frequency.period().unwrap_or(*term),
            calendar,
            convention.fixed_convention,
            convention.eom,
            convention.payment_lag,
            convention.rule,
        )?;
        live(OisHelper::new(
            datum.name(),
            datum.value(),
            FixedLeg::new(dates.clone(), convention.fixed_day_count),
            FloatLeg::new(dates, convention.index.day_count()),
            projection.clone(),
            self.discount.clone(),
            choice,
        ))
    }

    fn swap(&self, datum: &MarketDatum, id: &str, projection: &CurveHandle, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::Swap { tenor, term, .. } = datum.details() else {
            return Err(unexpected(datum, "swap"));
        };
        let convention = self.conventions.swap(id)?;
        let index = &convention.index;
        let start = index.fixing_calendar().advance(
            self.asof,
            business_days(index.fixing_days()),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = convention
            .fixed_calendar
            .advance(start, *term, convention.fixed_convention, false)?;
        let fixed = LegDates::generate(
            start,
            end,
            convention.fixed_frequency.period().unwrap_or(*term),
            &convention.fixed_calendar,
            convention.fixed_convention,
            false,
            0,
        )?;
        let float_dates = LegDates::generate(
            start,
            end,
            *tenor,
            index.fixing_calendar(),
            BusinessDayConvention::ModifiedFollowing,
            false,
            0,
        )?;
        let mut float = FloatLeg::new(float_dates, index.day_count());
        if index.accrual_tenor() != *tenor {
            float = float.with_sub_periods(
                index.accrual_tenor(),
                index.fixing_calendar().clone(),
                SubPeriodsType::Compounding,
            );
        }
        live(SwapHelper::new(
            datum.name(),
            datum.value(),
            FixedLeg::new(fixed, convention.fixed_day_count),
            float,
            projection.clone(),
            self.discount.clone(),
            choice,
        ))
    }

    /// Average OIS quotes come in explicit (rate, spread) pairs.
    fn average_ois(&self, segment: &YieldCurveSegment, projection: &CurveHandle) -> CurveResult<Vec<SharedHelper>> {
        let convention = self.conventions.average_ois(&segment.conventions_id)?;
        let calendar = &convention.fixed_calendar;
        let start = calendar.advance(
            self.asof,
            business_days(convention.spot_lag),
            BusinessDayConvention::Following,
            false,
        )?;

        let mut helpers: Vec<SharedHelper> = Vec::new();
        let mut expired = 0;
        for pair in segment.quotes.chunks(2) {
            let [rate_name, spread_name] = pair else {
                return Err(MarketError::invalid_config(
                    self.curve_id(),
                    "average OIS quotes must come in (rate, spread) pairs",
                )
                .into());
            };
            if !self.quotes.has(rate_name, self.asof) || !self.quotes.has(spread_name, self.asof) {
                warn!(rate = %rate_name, spread = %spread_name, "average OIS quote pair incomplete");
                continue;
            }
            let rate = self.quotes.get(rate_name, self.asof)?;
            let spread = self.quotes.get(spread_name, self.asof)?;
            let QuoteDetails::Swap { term, .. } = rate.details() else {
                return Err(unexpected(&rate, "swap"));
            };
            let QuoteDetails::BasisSwap { maturity, .. } = spread.details() else {
                return Err(unexpected(&spread, "basis swap"));
            };
            if term != maturity {
                return Err(CurveError::invalid_data(format!(
                    "average OIS rate {} and spread {} have different maturities ({term} vs {maturity})",
                    rate.name(),
                    spread.name()
                )));
            }

            let end = calendar.advance(start, *term, convention.fixed_convention, false)?;
            if end <= self.asof {
                expired += 1;
                continue;
            }
            let fixed = LegDates::generate(
                start,
                end,
                convention.fixed_tenor,
                calendar,
                convention.fixed_payment_convention,
                false,
                0,
            )?;
            let overnight = LegDates::generate(
                start,
                end,
                convention.on_tenor,
                convention.index.fixing_calendar(),
                convention.fixed_payment_convention,
                false,
                0,
            )?;
            let helper: SharedHelper = Arc::new(AverageOisHelper::new(
                rate.name(),
                rate.value(),
                spread.value(),
                FixedLeg::new(fixed, convention.fixed_day_count),
                FloatLeg::new(overnight, convention.index.day_count()),
                projection.clone(),
                self.discount.clone(),
                segment.pillar_choice,
            ));
            helpers.push(helper);
        }
        self.check_count(Some(segment.quotes.len() / 2), helpers.len(), expired)?;
        Ok(helpers)
    }

    fn tenor_basis(
        &self,
        datum: &MarketDatum,
        id: &str,
        long_projection: &CurveHandle,
        short_projection: &CurveHandle,
        choice: PillarChoice,
    ) -> MaybeHelper {
        let QuoteDetails::BasisSwap { maturity, .. } = datum.details() else {
            return Err(unexpected(datum, "basis swap"));
        };
        let convention = self.conventions.tenor_basis_swap(id)?;
        let long_index = &convention.long_index;
        let short_index = &convention.short_index;
        let calendar = long_index.fixing_calendar();
        let start = calendar.advance(
            self.asof,
            business_days(long_index.fixing_days()),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = calendar.advance(start, *maturity, BusinessDayConvention::ModifiedFollowing, false)?;

        let long = FloatLeg::new(
            LegDates::generate(
                start,
                end,
                long_index.accrual_tenor(),
                calendar,
                BusinessDayConvention::ModifiedFollowing,
                false,
                0,
            )?,
            long_index.day_count(),
        );
        let pay_tenor = convention.short_pay_tenor.unwrap_or_else(|| short_index.accrual_tenor());
        let mut short = FloatLeg::new(
            LegDates::generate(
                start,
                end,
                pay_tenor,
                short_index.fixing_calendar(),
                BusinessDayConvention::ModifiedFollowing,
                false,
                0,
            )?,
            short_index.day_count(),
        );
        if pay_tenor != short_index.accrual_tenor() {
            short = short.with_sub_periods(
                short_index.accrual_tenor(),
                short_index.fixing_calendar().clone(),
                convention.sub_periods_type,
            );
        }
        live(TenorBasisHelper::new(
            datum.name(),
            datum.value(),
            long,
            short,
            long_projection.clone(),
            short_projection.clone(),
            self.discount.clone(),
            convention.spread_on_short,
            choice,
        ))
    }

    fn tenor_basis_two(
        &self,
        datum: &MarketDatum,
        id: &str,
        long_projection: &CurveHandle,
        short_projection: &CurveHandle,
        choice: PillarChoice,
    ) -> MaybeHelper {
        let QuoteDetails::BasisSwap { maturity, .. } = datum.details() else {
            return Err(unexpected(datum, "basis swap"));
        };
        let convention = self.conventions.tenor_basis_two_swap(id)?;
        let calendar = &convention.calendar;
        let start = calendar.advance(
            self.asof,
            business_days(convention.long_index.fixing_days()),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = calendar.advance(start, *maturity, convention.convention, false)?;

        let swap = |frequency: Frequency,
                    day_count,
                    index: &RateIndex|
         -> CurveResult<(FixedLeg, FloatLeg)> {
            let fixed = LegDates::generate(
                start,
                end,
                frequency.period().unwrap_or(*maturity),
                calendar,
                convention.convention,
                false,
                0,
            )?;
            let float = LegDates::generate(
                start,
                end,
                index.accrual_tenor(),
                index.fixing_calendar(),
                convention.convention,
                false,
                0,
            )?;
            Ok((FixedLeg::new(fixed, day_count), FloatLeg::new(float, index.day_count())))
        };
        let long = swap(
            convention.long_fixed_frequency,
            convention.long_fixed_day_count,
            &convention.long_index,
        )?;
        let short = swap(
            convention.short_fixed_frequency,
            convention.short_fixed_day_count,
            &convention.short_index,
        )?;
        live(TenorBasisTwoHelper::new(
            datum.name(),
            datum.value(),
            long,
            short,
            long_projection.clone(),
            short_projection.clone(),
            self.discount.clone(),
            convention.long_minus_short,
            choice,
        ))
    }

    fn bma_basis(&self, datum: &MarketDatum, id: &str, libor_projection: &CurveHandle, choice: PillarChoice) -> MaybeHelper {
        let QuoteDetails::BmaSwap { term, maturity, .. } = datum.details() else {
            return Err(unexpected(datum, "BMA swap"));
        };
        let convention = self.conventions.bma_basis_swap(id)?;
        let libor_index = &convention.libor_index;
        let bma_index = &convention.bma_index;
        let calendar = libor_index.fixing_calendar();
        let start = calendar.advance(
            self.asof,
            business_days(libor_index.fixing_days()),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = calendar.advance(start, *maturity, BusinessDayConvention::ModifiedFollowing, false)?;
        let bma = LegDates::generate(
            start,
            end,
            Period::months(3),
            bma_index.fixing_calendar(),
            BusinessDayConvention::ModifiedFollowing,
            false,
            0,
        )?;
        let libor = LegDates::generate(
            start,
            end,
            *term,
            calendar,
            BusinessDayConvention::ModifiedFollowing,
            false,
            0,
        )?;
        live(BmaRatioHelper::new(
            datum.name(),
            datum.value(),
            FloatLeg::new(bma, bma_index.day_count()),
            FloatLeg::new(libor, libor_index.day_count()),
            CurveHandle::Own,
            libor_projection.clone(),
            self.discount.clone(),
            choice,
        ))
    }

    // =========================================================================
    // CROSS CURRENCY
    // =========================================================================

    fn fx_forward(
        &self,
        datum: &MarketDatum,
        id: &str,
        spot_rate_id: &str,
        foreign_discount_curve_id: &str,
        choice: PillarChoice,
    ) -> MaybeHelper {
        let QuoteDetails::FxForward {
            unit_currency,
            currency: quoted_currency,
            term,
        } = datum.details()
        else {
            return Err(unexpected(datum, "FX forward"));
        };
        let unit = currency(unit_currency)?;
        let quoted = currency(quoted_currency)?;
        let own = self.config.currency;
        let (unit_discount, quoted_discount) = if own == unit {
            (CurveHandle::Own, self.handle_in(Some(foreign_discount_curve_id), quoted)?)
        } else if own == quoted {
            (self.handle_in(Some(foreign_discount_curve_id), unit)?, CurveHandle::Own)
        } else {
            return Err(MarketError::invalid_config(
                self.curve_id(),
                format!("FX forward {} does not involve {own}", datum.name()),
            )
            .into());
        };

        let convention = self.conventions.fx(id)?;
        let spot = self.fx_spot(spot_rate_id, unit, quoted)?;
        let calendar = &convention.advance_calendar;
        let spot_date = calendar.advance(
            self.asof,
            business_days(convention.spot_days),
            BusinessDayConvention::Following,
            false,
        )?;
        let from = if convention.spot_relative { spot_date } else { self.asof };
        let maturity = calendar.advance(from, *term, BusinessDayConvention::Following, false)?;
        if maturity <= spot_date {
            return Ok(None);
        }
        live(FxForwardHelper::new(
            datum.name(),
            datum.value(),
            spot,
            convention.points_factor,
            spot_date,
            maturity,
            unit_discount,
            quoted_discount,
            choice,
        ))
    }

    fn cross_ccy_basis(
        &self,
        datum: &MarketDatum,
        id: &str,
        curves: &CrossCurrencyCurves<'_>,
        choice: PillarChoice,
    ) -> MaybeHelper {
        let QuoteDetails::CrossCcyBasis {
            flat_currency,
            flat_term,
            currency: spread_currency,
            term,
            maturity,
        } = datum.details()
        else {
            return Err(unexpected(datum, "cross currency basis swap"));
        };
        let flat_ccy = currency(flat_currency)?;
        let spread_ccy = currency(spread_currency)?;
        let own = self.config.currency;
        let foreign_ccy = if own == flat_ccy {
            spread_ccy
        } else if own == spread_ccy {
            flat_ccy
        } else {
            return Err(MarketError::invalid_config(
                self.curve_id(),
                format!("cross currency basis swap {} does not involve {own}", datum.name()),
            )
            .into());
        };
        let spot = self.fx_spot(curves.spot_rate_id, flat_ccy, spread_ccy)?;
        debug!(quote = datum.name(), spot, "cross currency basis notionals fixed at spot");

        let domestic = (CurveHandle::Own, self.handle(curves.domestic_projection)?);
        let foreign_discount = self.handle_in(Some(curves.foreign_discount), foreign_ccy)?;
        let foreign_projection = match curves.foreign_projection {
            Some(projection) => self.handle_in(Some(projection), foreign_ccy)?,
            None => foreign_discount.clone(),
        };
        let foreign = (foreign_discount, foreign_projection);
        let ((flat_discount, flat_projection), (spread_discount, spread_projection)) = if own == flat_ccy {
            (domestic, foreign)
        } else {
            (foreign, domestic)
        };

        let convention = self.conventions.cross_ccy_basis(id)?;
        let calendar = &convention.settlement_calendar;
        let start = calendar.advance(
            self.asof,
            business_days(convention.settlement_days),
            BusinessDayConvention::Following,
            false,
        )?;
        let end = calendar.advance(start, *maturity, convention.roll_convention, convention.eom)?;
        let leg = |tenor: Period, index: &RateIndex| -> CurveResult<FloatLeg> {
            let dates = LegDates::generate(
                start,
                end,
                tenor,
                calendar,
                convention.roll_convention,
                convention.eom,
                0,
            )?;
            Ok(FloatLeg::new(dates, index.day_count()))
        };
        live(CrossCcyBasisHelper::new(
            datum.name(),
            datum.value(),
            leg(*flat_term, &convention.flat_index)?,
            leg(*term, &convention.spread_index)?,
            flat_projection,
            flat_discount,
            spread_projection,
            spread_discount,
            choice,
        ))
    }

    fn cross_ccy_fix_float(
        &self,
        datum: &MarketDatum,
        id: &str,
        curves: &CrossCurrencyCurves<'_>,
        choice: PillarChoice,
    ) -> MaybeHelper {
        let QuoteDetails::CrossCcyFixFloat {
            float_currency,
            float_tenor,
            fixed_currency,
            maturity,
            ..
        } = datum.details()
        else {
            return Err(unexpected(datum, "cross currency fix float swap"));
        };
        let float_ccy = currency(float_currency)?;
        let fixed_ccy = currency(fixed_currency)?;
        if fixed_ccy != self.config.currency {
            return Err(MarketError::invalid_config(
                self.curve_id(),
                format!(
                    "cross currency fix float swap {} fixes {fixed_ccy}, the curve is in {}",
                    datum.name(),
                    self.config.currency
                ),
            )
            .into());
        }
        let spot = self.fx_spot(curves.spot_rate_id, float_ccy, fixed_ccy)?;
        let float_discount = self.handle_in(Some(curves.foreign_discount), float_ccy)?;
        let float_projection = match curves.foreign_projection {
            Some(projection) => self.handle_in(Some(projection), float_ccy)?,
            None => float_discount.clone(),
        };

        let convention = self.conventions.cross_ccy_fix_float(id)?;
        let calendar = &convention.settlement_calendar;
        let start = calendar.advance(
            self.asof,
            business_days(convention.settlement_days),
            convention.settlement_convention,
            false,
        )?;
        let end = calendar.advance(start, *maturity, convention.fixed_convention, convention.eom)?;
        let fixed = LegDates::generate(
            start,
            end,
            convention.fixed_frequency.period().unwrap_or(*maturity),
            calendar,
            convention.fixed_convention,
            convention.eom,
            0,
        )?;
        let float = LegDates::generate(
            start,
            end,
            *float_tenor,
            convention.index.fixing_calendar(),
            BusinessDayConvention::ModifiedFollowing,
            convention.eom,
            0,
        )?;
        live(CrossCcyFixFloatHelper::new(
            datum.name(),
            datum.value(),
            spot,
            FixedLeg::new(fixed, convention.fixed_day_count),
            FloatLeg::new(float, convention.index.day_count()),
            CurveHandle::Own,
            float_projection,
            float_discount,
            choice,
        ))
    }
}

/// Curve ids of a cross-currency segment.
struct CrossCurrencyCurves<'s> {
    spot_rate_id: &'s str,
    foreign_discount: &'s str,
    domestic_projection: Option<&'s str>,
    foreign_projection: Option<&'s str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_pair_forms() {
        assert_eq!(fx_pair("FX/RATE/EUR/USD").unwrap(), (Currency::EUR, Currency::USD));
        assert_eq!(fx_pair("FX/GBP/USD").unwrap(), (Currency::GBP, Currency::USD));
        assert_eq!(fx_pair("EURGBP").unwrap(), (Currency::EUR, Currency::GBP));
        assert!(fx_pair("FX/RATE/EUR").is_err());
        assert!(fx_pair("EURO").is_err());
    }

    #[test]
    fn test_expiry_month() {
        assert_eq!(expiry_month("Q", "2024-06").unwrap(), (2024, 6));
        assert!(expiry_month("Q", "2024-13").is_err());
        assert!(expiry_month("Q", "June").is_err());
    }
}

//! Future and option expiry dates.
//!
//! [`FutureExpiryCalculator`] answers "which contract expires next" for a
//! commodity. [`ConventionsFutureExpiry`] implements it from a
//! [`CommodityFutureConvention`], and [`get_expiry`] resolves the three
//! expiry forms of an option quote.

use std::fmt;

use pillar_core::calendars::{BusinessDayConvention, Calendar, MarketCalendar};
use pillar_core::types::Frequency;
use pillar_core::Date;
use pillar_market::conventions::{AnchorRule, CommodityFutureConvention};
use pillar_market::quotes::Expiry;

use crate::error::{VolError, VolResult};

/// Contract months scanned before giving up on a next expiry.
const MAX_CONTRACT_SCAN: u32 = 1200;

/// Expiry dates of a commodity's futures and their options.
pub trait FutureExpiryCalculator: Send + Sync + fmt::Debug {
    /// Expiry of the contract for the month containing `contract_month`.
    fn expiry_date(&self, contract_month: Date, is_option: bool) -> VolResult<Date>;

    /// The first expiry on or after `reference` (strictly after when
    /// `include_expiry` is false), then `offset` contracts further.
    fn next_expiry(&self, is_option: bool, reference: Date, offset: u32, include_expiry: bool) -> VolResult<Date>;
}

/// Expiries from commodity future conventions.
///
/// # Example
///
/// ```rust
/// use pillar_core::Date;
/// use pillar_market::conventions::Conventions;
/// use pillar_vol::{ConventionsFutureExpiry, FutureExpiryCalculator};
///
/// let conventions = Conventions::from_toml_str(
///     r#"
///     [NG]
///     type = "CommodityFuture"
///     calendar = "WeekendsOnly"
///     anchor = { type = "DayOfMonth", day = 20 }
///     "#,
/// )
/// .unwrap();
/// let calc = ConventionsFutureExpiry::new(conventions.commodity_future("NG").unwrap().clone()).unwrap();
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// // 2024-01-20 is a Saturday, so the expiry rolls back to Friday.
/// assert_eq!(calc.next_expiry(false, asof, 0, true).unwrap(), Date::from_ymd(2024, 1, 19).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConventionsFutureExpiry {
    convention: CommodityFutureConvention,
    step_months: i32,
}

impl ConventionsFutureExpiry {
    /// Creates a calculator.
    ///
    /// # Errors
    ///
    /// Fails for contract cycles that are not a whole number of months.
    pub fn new(convention: CommodityFutureConvention) -> VolResult<Self> {
        let step_months = match &convention.contract_frequency {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::SemiAnnual => 6,
            Frequency::Annual => 12,
            other => {
                return Err(VolError::invalid_data(format!(
                    "contract frequency {other:?} is not supported for commodity futures"
                )))
            }
        };
        Ok(Self {
            convention,
            step_months,
        })
    }

    /// The underlying convention.
    #[must_use]
    pub fn convention(&self) -> &CommodityFutureConvention {
        &self.convention
    }

    fn calendar(&self) -> &MarketCalendar {
        &self.convention.calendar
    }

    fn is_contract_month(&self, month: u32) -> bool {
        month % self.step_months.unsigned_abs() == 0
    }

    fn future_expiry(&self, contract_month: Date) -> VolResult<Date> {
        let first = contract_month
            .start_of_month()
            .add_months(-self.convention.expiry_month_lag)?;
        let (year, month) = (first.year(), first.month());
        let calendar = self.calendar();
        let bdc = self.convention.expiry_convention;
        let expiry = match self.convention.anchor {
            AnchorRule::DayOfMonth { day } => {
                let day = day.clamp(1, first.days_in_month());
                calendar.adjust(Date::from_ymd(year, month, day)?, bdc)
            }
            AnchorRule::NthWeekday { nth, weekday } => {
                calendar.adjust(Date::nth_weekday(nth, weekday, year, month)?, bdc)
            }
            AnchorRule::LastWeekday { weekday } => calendar.adjust(Date::last_weekday(weekday, year, month)?, bdc),
            AnchorRule::CalendarDaysBefore { days } => calendar.adjust(first.add_days(-i64::from(days)), bdc),
            AnchorRule::LastBusinessDay => calendar.end_of_month(first),
        };
        Ok(expiry)
    }
}

impl FutureExpiryCalculator for ConventionsFutureExpiry {
    fn expiry_date(&self, contract_month: Date, is_option: bool) -> VolResult<Date> {
        let expiry = self.future_expiry(contract_month)?;
        if !is_option || self.convention.option_expiry_offset == 0 {
            return Ok(expiry);
        }
        let offset = i32::try_from(self.convention.option_expiry_offset)
            .map_err(|_| VolError::invalid_data("option expiry offset is too large"))?;
        Ok(self.calendar().add_business_days(expiry, -offset))
    }

    fn next_expiry(&self, is_option: bool, reference: Date, offset: u32, include_expiry: bool) -> VolResult<Date> {
        let mut month = reference
            .start_of_month()
            .add_months(self.convention.expiry_month_lag - 2)?;
        let mut remaining = offset;
        let mut found = false;
        for _ in 0..MAX_CONTRACT_SCAN {
            if self.is_contract_month(month.month()) {
                let expiry = self.expiry_date(month, is_option)?;
                let live = if include_expiry {
                    expiry >= reference
                } else {
                    expiry > reference
                };
                if found || live {
                    if remaining == 0 {
                        return Ok(expiry);
                    }
                    found = true;
                    remaining -= 1;
                }
            }
            month = month.add_months(1)?;
        }
        Err(VolError::invalid_data(format!(
            "no contract expiry found after {reference} with offset {offset}"
        )))
    }
}

/// Resolves an option expiry to a date.
///
/// - a date is used as is
/// - a period is added to `asof` and adjusted to the following business day
/// - `cN` is the N-th next option expiry; when the first one is within
///   `roll_days` business days of `asof` the continuation rolls to the next
///   contract
///
/// # Errors
///
/// Fails for `cN` without an expiry calculator and on date arithmetic
/// errors.
pub fn get_expiry(
    asof: Date,
    expiry: &Expiry,
    calendar: &MarketCalendar,
    calculator: Option<&dyn FutureExpiryCalculator>,
    roll_days: u32,
) -> VolResult<Date> {
    match expiry {
        Expiry::Date(date) => Ok(*date),
        Expiry::Period(period) => Ok(calendar.adjust(asof.add_period(*period, false)?, BusinessDayConvention::Following)),
        Expiry::FutureContinuation(n) => {
            let calculator = calculator.ok_or_else(|| {
                VolError::invalid_data(format!(
                    "expiry c{n} needs future expiry conventions"
                ))
            })?;
            let mut first = calculator.next_expiry(true, asof, 0, true)?;
            if roll_days > 0 {
                let roll_days = i32::try_from(roll_days)
                    .map_err(|_| VolError::invalid_data("option expiry roll days is too large"))?;
                if calendar.add_business_days(first, -roll_days) < asof {
                    first = calculator.next_expiry(true, asof, 1, true)?;
                }
            }
            if *n <= 1 {
                Ok(first)
            } else {
                calculator.next_expiry(true, first.add_days(1), n - 2, true)
            }
        }
    }
}

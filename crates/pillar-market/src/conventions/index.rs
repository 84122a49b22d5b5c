//! Interest rate index names.

use std::fmt;
use std::str::FromStr;

use pillar_core::calendars::MarketCalendar;
use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Period};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

/// Overnight index families.
const OVERNIGHT: [&str; 12] = [
    "EONIA", "ESTER", "ESTR", "SOFR", "SONIA", "FEDFUNDS", "TONAR", "SARON", "CORRA", "AONIA",
    "SIFMA", "BMA",
];

/// A floating rate index such as `EUR-EURIBOR-6M` or `USD-SOFR`.
///
/// The fixing conventions are filled from the index family.
///
/// # Example
///
/// ```rust
/// use pillar_core::Period;
/// use pillar_market::conventions::RateIndex;
///
/// let index = RateIndex::parse("EUR-EURIBOR-6M").unwrap();
/// assert_eq!(index.tenor(), Some(Period::months(6)));
/// assert_eq!(index.fixing_days(), 2);
/// assert!(!index.is_overnight());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateIndex {
    name: String,
    currency: Currency,
    family: String,
    tenor: Option<Period>,
    day_count: DayCountConvention,
    fixing_calendar: MarketCalendar,
    fixing_days: u32,
}

impl RateIndex {
    /// Parses `CCY-FAMILY[-TENOR]`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown currency or a malformed tenor.
    pub fn parse(name: &str) -> MarketResult<Self> {
        let tokens: Vec<&str> = name.trim().split('-').collect();
        let (ccy, family, tenor) = match tokens.as_slice() {
            [ccy, family] => (*ccy, *family, None),
            [ccy, family, tenor] => (*ccy, *family, Some(Period::parse(tenor)?)),
            _ => {
                return Err(MarketError::quote_parse(
                    name,
                    "index name must be CCY-FAMILY or CCY-FAMILY-TENOR",
                ))
            }
        };
        let currency: Currency = ccy.parse()?;
        let family = family.to_ascii_uppercase();
        let overnight = OVERNIGHT.contains(&family.as_str());
        let tenor = if overnight { None } else { tenor };

        let (day_count, fixing_calendar, fixing_days) = match (currency, family.as_str()) {
            (_, "EURIBOR") => (DayCountConvention::Act360, MarketCalendar::Target, 2),
            (_, "EONIA" | "ESTER" | "ESTR") => (DayCountConvention::Act360, MarketCalendar::Target, 0),
            (Currency::GBP, _) => (DayCountConvention::Act365Fixed, MarketCalendar::UnitedKingdom, 0),
            (Currency::USD, "LIBOR") => (
                DayCountConvention::Act360,
                MarketCalendar::Joint(vec![MarketCalendar::UnitedKingdom, MarketCalendar::UnitedStates]),
                2,
            ),
            (Currency::USD, "SIFMA" | "BMA") => {
                (DayCountConvention::ActActIsda, MarketCalendar::UnitedStates, 0)
            }
            (Currency::USD, _) => (DayCountConvention::Act360, MarketCalendar::UnitedStates, if overnight { 0 } else { 2 }),
            (Currency::JPY | Currency::AUD | Currency::NZD, _) => {
                (DayCountConvention::Act365Fixed, MarketCalendar::WeekendsOnly, if overnight { 0 } else { 2 })
            }
            _ => (DayCountConvention::Act360, MarketCalendar::WeekendsOnly, if overnight { 0 } else { 2 }),
        };

        Ok(Self {
            name: name.trim().to_string(),
            currency,
            family,
            tenor,
            day_count,
            fixing_calendar,
            fixing_days,
        })
    }

    /// Full index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Family name, upper case (`EURIBOR`, `SOFR`).
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Tenor, `None` for overnight indices.
    #[must_use]
    pub fn tenor(&self) -> Option<Period> {
        self.tenor
    }

    /// Accrual tenor, one day for overnight indices.
    #[must_use]
    pub fn accrual_tenor(&self) -> Period {
        self.tenor.unwrap_or(Period::days(1))
    }

    /// Accrual day count.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Fixing calendar.
    #[must_use]
    pub fn fixing_calendar(&self) -> &MarketCalendar {
        &self.fixing_calendar
    }

    /// Business days between fixing and value date.
    #[must_use]
    pub fn fixing_days(&self) -> u32 {
        self.fixing_days
    }

    /// True for overnight indices.
    #[must_use]
    pub fn is_overnight(&self) -> bool {
        self.tenor.is_none()
    }
}

impl fmt::Display for RateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for RateIndex {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RateIndex {
    type Error = MarketError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RateIndex> for String {
    fn from(index: RateIndex) -> Self {
        index.name
    }
}

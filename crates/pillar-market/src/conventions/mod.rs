//! Market conventions.
//!
//! Curve segments refer to conventions by id. [`Conventions`] is the
//! registry; the typed accessors (`deposit`, `ois`, ...) return the
//! expected variant or a `ConventionTypeMismatch` error.

mod index;

pub use index::RateIndex;

use std::collections::HashMap;

use chrono::Weekday;
use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::schedule::DateGenerationRule;
use pillar_core::types::{Compounding, Frequency};
use pillar_core::Period;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

// =============================================================================
// DEFAULTS
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_spot_lag() -> u32 {
    2
}

fn default_points_factor() -> f64 {
    10_000.0
}

fn default_following() -> BusinessDayConvention {
    BusinessDayConvention::Following
}

fn default_modified_following() -> BusinessDayConvention {
    BusinessDayConvention::ModifiedFollowing
}

fn default_preceding() -> BusinessDayConvention {
    BusinessDayConvention::Preceding
}

fn default_annual() -> Frequency {
    Frequency::Annual
}

fn default_monthly() -> Frequency {
    Frequency::Monthly
}

fn default_one_year() -> Period {
    Period::years(1)
}

fn default_one_day() -> Period {
    Period::days(1)
}

// =============================================================================
// RATE CONVENTIONS
// =============================================================================

/// Deposit conventions, either from an index or given explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositConvention {
    /// Index providing calendar, day count and fixing days.
    #[serde(default)]
    pub index: Option<RateIndex>,
    /// Explicit calendar.
    #[serde(default)]
    pub calendar: Option<MarketCalendar>,
    /// Explicit business day convention.
    #[serde(default)]
    pub convention: Option<BusinessDayConvention>,
    /// End-of-month rolling.
    #[serde(default)]
    pub eom: bool,
    /// Explicit day count.
    #[serde(default)]
    pub day_count: Option<DayCountConvention>,
    /// Explicit settlement days.
    #[serde(default)]
    pub settlement_days: Option<u32>,
}

impl DepositConvention {
    /// Settlement calendar: explicit, else the index fixing calendar.
    #[must_use]
    pub fn calendar(&self) -> MarketCalendar {
        self.calendar
            .clone()
            .or_else(|| self.index.as_ref().map(|i| i.fixing_calendar().clone()))
            .unwrap_or_default()
    }

    /// Day count: explicit, else the index day count.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
            .or_else(|| self.index.as_ref().map(RateIndex::day_count))
            .unwrap_or(DayCountConvention::Act360)
    }

    /// Settlement days: explicit, else the index fixing days.
    #[must_use]
    pub fn settlement_days(&self) -> u32 {
        self.settlement_days
            .or_else(|| self.index.as_ref().map(RateIndex::fixing_days))
            .unwrap_or(2)
    }

    /// Business day convention, Modified Following by default.
    #[must_use]
    pub fn convention(&self) -> BusinessDayConvention {
        self.convention.unwrap_or(BusinessDayConvention::ModifiedFollowing)
    }
}

/// FRA conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraConvention {
    /// Underlying index.
    pub index: RateIndex,
}

/// Money-market future conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureConvention {
    /// Underlying index.
    pub index: RateIndex,
}

/// Overnight indexed swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OisConvention {
    /// Business days from trade to start.
    #[serde(default = "default_spot_lag")]
    pub spot_lag: u32,
    /// Overnight index.
    pub index: RateIndex,
    /// Fixed leg day count.
    pub fixed_day_count: DayCountConvention,
    /// Payment lag in business days.
    #[serde(default)]
    pub payment_lag: u32,
    /// End-of-month rolling.
    #[serde(default)]
    pub eom: bool,
    /// Fixed leg payment frequency.
    #[serde(default = "default_annual")]
    pub fixed_frequency: Frequency,
    /// Fixed leg accrual adjustment.
    #[serde(default = "default_following")]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg payment adjustment.
    #[serde(default = "default_following")]
    pub fixed_payment_convention: BusinessDayConvention,
    /// Schedule generation rule.
    #[serde(default)]
    pub rule: DateGenerationRule,
}

/// Vanilla swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapConvention {
    /// Fixed leg calendar.
    pub fixed_calendar: MarketCalendar,
    /// Fixed leg frequency.
    pub fixed_frequency: Frequency,
    /// Fixed leg adjustment.
    #[serde(default = "default_modified_following")]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg day count.
    pub fixed_day_count: DayCountConvention,
    /// Floating index.
    pub index: RateIndex,
}

/// Averaging OIS conventions (arithmetic average of overnight fixings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageOisConvention {
    /// Business days from trade to start.
    #[serde(default = "default_spot_lag")]
    pub spot_lag: u32,
    /// Fixed leg tenor.
    #[serde(default = "default_one_year")]
    pub fixed_tenor: Period,
    /// Fixed leg day count.
    pub fixed_day_count: DayCountConvention,
    /// Fixed leg calendar.
    pub fixed_calendar: MarketCalendar,
    /// Fixed leg adjustment.
    #[serde(default = "default_following")]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg payment adjustment.
    #[serde(default = "default_following")]
    pub fixed_payment_convention: BusinessDayConvention,
    /// Overnight index.
    pub index: RateIndex,
    /// Tenor of the averaged leg.
    #[serde(default = "default_one_year")]
    pub on_tenor: Period,
    /// Days before period end from which the rate is frozen.
    #[serde(default)]
    pub rate_cutoff: u32,
}

/// How sub-period fixings of the short leg combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubPeriodsType {
    /// Simple average of the fixings.
    Average,
    /// Compounded fixings.
    #[default]
    Compounding,
}

/// Tenor basis swap conventions (two floating legs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorBasisSwapConvention {
    /// Long tenor index.
    pub long_index: RateIndex,
    /// Short tenor index.
    pub short_index: RateIndex,
    /// Pay tenor of the short leg; defaults to its index tenor.
    #[serde(default)]
    pub short_pay_tenor: Option<Period>,
    /// Whether the spread is on the short leg.
    #[serde(default = "default_true")]
    pub spread_on_short: bool,
    /// Whether the spread is included in compounding.
    #[serde(default)]
    pub include_spread: bool,
    /// Sub-period treatment.
    #[serde(default)]
    pub sub_periods_type: SubPeriodsType,
}

/// Tenor basis quoted as the difference of two fixed-vs-float swaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorBasisTwoSwapConvention {
    /// Calendar.
    pub calendar: MarketCalendar,
    /// Swap tenor used for the quote.
    #[serde(default = "default_one_year")]
    pub swap_tenor: Period,
    /// Adjustment.
    #[serde(default = "default_modified_following")]
    pub convention: BusinessDayConvention,
    /// Long swap fixed frequency.
    pub long_fixed_frequency: Frequency,
    /// Long swap fixed day count.
    pub long_fixed_day_count: DayCountConvention,
    /// Long swap index.
    pub long_index: RateIndex,
    /// Short swap fixed frequency.
    pub short_fixed_frequency: Frequency,
    /// Short swap fixed day count.
    pub short_fixed_day_count: DayCountConvention,
    /// Short swap index.
    pub short_index: RateIndex,
    /// Quote is long minus short.
    #[serde(default = "default_true")]
    pub long_minus_short: bool,
}

/// BMA (SIFMA) versus Libor ratio swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmaBasisSwapConvention {
    /// Libor leg index.
    pub libor_index: RateIndex,
    /// BMA leg index.
    pub bma_index: RateIndex,
}

/// FX forward conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConvention {
    /// Spot lag in business days.
    #[serde(default = "default_spot_lag")]
    pub spot_days: u32,
    /// Source (unit) currency code.
    pub source_currency: String,
    /// Target currency code.
    pub target_currency: String,
    /// Divisor turning forward points into a rate difference.
    #[serde(default = "default_points_factor")]
    pub points_factor: f64,
    /// Calendar for advancing dates.
    #[serde(default)]
    pub advance_calendar: MarketCalendar,
    /// Whether forward tenors run from spot rather than from today.
    #[serde(default = "default_true")]
    pub spot_relative: bool,
}

/// Cross-currency basis swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCcyBasisConvention {
    /// Settlement days.
    #[serde(default = "default_spot_lag")]
    pub settlement_days: u32,
    /// Settlement calendar.
    pub settlement_calendar: MarketCalendar,
    /// Roll convention.
    #[serde(default = "default_modified_following")]
    pub roll_convention: BusinessDayConvention,
    /// Index of the flat leg.
    pub flat_index: RateIndex,
    /// Index of the spread leg.
    pub spread_index: RateIndex,
    /// End-of-month rolling.
    #[serde(default)]
    pub eom: bool,
}

/// Cross-currency fixed versus floating swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCcyFixFloatConvention {
    /// Settlement days.
    #[serde(default = "default_spot_lag")]
    pub settlement_days: u32,
    /// Settlement calendar.
    pub settlement_calendar: MarketCalendar,
    /// Settlement adjustment.
    #[serde(default = "default_following")]
    pub settlement_convention: BusinessDayConvention,
    /// Fixed leg currency code.
    pub fixed_currency: String,
    /// Fixed leg frequency.
    pub fixed_frequency: Frequency,
    /// Fixed leg adjustment.
    #[serde(default = "default_modified_following")]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg day count.
    pub fixed_day_count: DayCountConvention,
    /// Floating index.
    pub index: RateIndex,
    /// End-of-month rolling.
    #[serde(default)]
    pub eom: bool,
}

/// Zero rate conventions for direct zero curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroConvention {
    /// Day count of the quoted rates.
    pub day_count: DayCountConvention,
    /// Compounding of the quoted rates.
    #[serde(default)]
    pub compounding: Compounding,
    /// Compounding frequency for periodic compounding.
    #[serde(default = "default_annual")]
    pub compounding_frequency: Frequency,
    /// Calendar for tenor quotes; tenor quotes are rejected without one.
    #[serde(default)]
    pub tenor_calendar: Option<MarketCalendar>,
    /// Spot lag for tenor quotes.
    #[serde(default)]
    pub spot_lag: u32,
    /// Calendar for the spot lag; defaults to the tenor calendar.
    #[serde(default)]
    pub spot_calendar: Option<MarketCalendar>,
    /// Adjustment of tenor dates.
    #[serde(default = "default_following")]
    pub roll_convention: BusinessDayConvention,
    /// End-of-month rolling.
    #[serde(default)]
    pub eom: bool,
}

impl ZeroConvention {
    /// True when tenor-based quotes can be resolved.
    #[must_use]
    pub fn tenor_based(&self) -> bool {
        self.tenor_calendar.is_some()
    }
}

// =============================================================================
// COMMODITY FUTURE CONVENTIONS
// =============================================================================

/// Rule fixing a future's expiry day within its (lagged) contract month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnchorRule {
    /// Fixed day of the month, adjusted.
    DayOfMonth {
        /// Day of month, clamped to the month length.
        day: u32,
    },
    /// N-th given weekday of the month.
    NthWeekday {
        /// Occurrence, starting at 1.
        nth: u32,
        /// Weekday.
        weekday: Weekday,
    },
    /// Last given weekday of the month.
    LastWeekday {
        /// Weekday.
        weekday: Weekday,
    },
    /// Calendar days before the first day of the month.
    CalendarDaysBefore {
        /// Number of days.
        days: u32,
    },
    /// Last business day of the month.
    LastBusinessDay,
}

/// Commodity future and option expiry conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityFutureConvention {
    /// Expiry anchor.
    pub anchor: AnchorRule,
    /// Contract cycle.
    #[serde(default = "default_monthly")]
    pub contract_frequency: Frequency,
    /// Exchange calendar.
    #[serde(default)]
    pub calendar: MarketCalendar,
    /// Adjustment of the anchored expiry.
    #[serde(default = "default_preceding")]
    pub expiry_convention: BusinessDayConvention,
    /// Months between the contract month and the expiry month.
    #[serde(default)]
    pub expiry_month_lag: i32,
    /// Option expiry, in business days before the future expiry.
    #[serde(default)]
    pub option_expiry_offset: u32,
    /// Averaging period length for averaging contracts.
    #[serde(default = "default_one_day")]
    pub averaging_period: Period,
}

// =============================================================================
// CONVENTION ENUM AND REGISTRY
// =============================================================================

/// Tagged convention variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Convention {
    /// Deposit.
    Deposit(DepositConvention),
    /// FRA.
    Fra(FraConvention),
    /// Money-market future.
    Future(FutureConvention),
    /// OIS.
    Ois(OisConvention),
    /// Vanilla swap.
    Swap(SwapConvention),
    /// Averaging OIS.
    AverageOis(AverageOisConvention),
    /// Tenor basis swap.
    TenorBasisSwap(TenorBasisSwapConvention),
    /// Tenor basis from two swaps.
    TenorBasisTwoSwap(TenorBasisTwoSwapConvention),
    /// BMA basis swap.
    BmaBasisSwap(BmaBasisSwapConvention),
    /// FX.
    Fx(FxConvention),
    /// Cross-currency basis.
    CrossCcyBasis(CrossCcyBasisConvention),
    /// Cross-currency fixed/floating.
    CrossCcyFixFloat(CrossCcyFixFloatConvention),
    /// Zero rate.
    Zero(ZeroConvention),
    /// Commodity future.
    CommodityFuture(CommodityFutureConvention),
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty, $label:literal) => {
        $(#[$doc])*
        pub fn $fn_name(&self, id: &str) -> MarketResult<&$ty> {
            match self.get(id)? {
                Convention::$variant(c) => Ok(c),
                _ => Err(MarketError::convention_mismatch(id, $label)),
            }
        }
    };
}

/// Registry of conventions keyed by id.
///
/// # Example
///
/// ```rust
/// use pillar_market::conventions::Conventions;
///
/// let json = r#"{
///     "EUR-DEP": { "type": "Deposit", "index": "EUR-EURIBOR-6M" },
///     "EUR-OIS": { "type": "Ois", "index": "EUR-ESTER", "fixed_day_count": "A360" }
/// }"#;
/// let conventions = Conventions::from_json_str(json).unwrap();
/// assert_eq!(conventions.deposit("EUR-DEP").unwrap().settlement_days(), 2);
/// assert!(conventions.deposit("EUR-OIS").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conventions {
    conventions: HashMap<String, Convention>,
}

impl Conventions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a convention, replacing any with the same id.
    pub fn add(&mut self, id: impl Into<String>, convention: Convention) {
        self.conventions.insert(id.into(), convention);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, convention: Convention) -> Self {
        self.add(id, convention);
        self
    }

    /// Parses a JSON object mapping ids to conventions.
    pub fn from_json_str(s: &str) -> MarketResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parses a TOML table mapping ids to conventions.
    pub fn from_toml_str(s: &str) -> MarketResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// True when the id is registered.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.conventions.contains_key(id)
    }

    /// Looks up a convention by id.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::ConventionNotFound` for an unknown id.
    pub fn get(&self, id: &str) -> MarketResult<&Convention> {
        self.conventions
            .get(id)
            .ok_or_else(|| MarketError::ConventionNotFound { id: id.to_string() })
    }

    typed_accessor!(
        /// Deposit conventions.
        deposit, Deposit, DepositConvention, "deposit rate"
    );
    typed_accessor!(
        /// FRA conventions.
        fra, Fra, FraConvention, "FRA"
    );
    typed_accessor!(
        /// Future conventions.
        future, Future, FutureConvention, "future"
    );
    typed_accessor!(
        /// OIS conventions.
        ois, Ois, OisConvention, "OIS"
    );
    typed_accessor!(
        /// Swap conventions.
        swap, Swap, SwapConvention, "swap"
    );
    typed_accessor!(
        /// Average OIS conventions.
        average_ois, AverageOis, AverageOisConvention, "average OIS"
    );
    typed_accessor!(
        /// Tenor basis swap conventions.
        tenor_basis_swap, TenorBasisSwap, TenorBasisSwapConvention, "tenor basis swap"
    );
    typed_accessor!(
        /// Tenor basis two swap conventions.
        tenor_basis_two_swap, TenorBasisTwoSwap, TenorBasisTwoSwapConvention, "tenor basis two swap"
    );
    typed_accessor!(
        /// BMA basis swap conventions.
        bma_basis_swap, BmaBasisSwap, BmaBasisSwapConvention, "bma basis swap"
    );
    typed_accessor!(
        /// FX conventions.
        fx, Fx, FxConvention, "FX forward"
    );
    typed_accessor!(
        /// Cross-currency basis conventions.
        cross_ccy_basis, CrossCcyBasis, CrossCcyBasisConvention, "cross currency basis swap"
    );
    typed_accessor!(
        /// Cross-currency fix-float conventions.
        cross_ccy_fix_float, CrossCcyFixFloat, CrossCcyFixFloatConvention, "cross currency fix float swap"
    );
    typed_accessor!(
        /// Zero rate conventions.
        zero, Zero, ZeroConvention, "zero rate"
    );
    typed_accessor!(
        /// Commodity future conventions.
        commodity_future, CommodityFuture, CommodityFutureConvention, "commodity future"
    );
}

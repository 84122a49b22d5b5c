//! Market quotes.
//!
//! A quote is a named number for an as-of date. Names follow a
//! slash-delimited schema `INSTRUMENT/QUOTE_TYPE/...` whose trailing tokens
//! depend on the instrument; [`MarketDatum::parse`] turns a name into
//! typed details used by the curve and surface builders.

mod store;
mod strike;
mod wildcard;

pub use store::{InMemoryQuoteStore, QuoteStore};
pub use strike::{
    close_enough, AtmType, DeltaVolType, Expiry, MoneynessType, OptionType, Strike,
};
pub use wildcard::{axis_wildcard, QuoteSelection, Wildcard};

use std::fmt;
use std::str::FromStr;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Date, Period};

use crate::error::{MarketError, MarketResult};

// =============================================================================
// TAGS
// =============================================================================

/// Instrument family of a quote (first name token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentType {
    /// Zero rate or zero spread.
    Zero,
    /// Discount factor.
    Discount,
    /// Money-market deposit.
    MoneyMarket,
    /// Money-market future.
    MoneyMarketFuture,
    /// Forward rate agreement.
    Fra,
    /// Interest rate swap (including OIS).
    IrSwap,
    /// Single-currency tenor basis swap.
    BasisSwap,
    /// BMA/SIFMA basis swap.
    BmaSwap,
    /// FX spot.
    FxSpot,
    /// FX forward.
    FxForward,
    /// Cross-currency basis swap.
    CrossCcyBasisSwap,
    /// Cross-currency fixed/floating swap.
    CrossCcyFixFloatSwap,
    /// Bond price or yield.
    Bond,
    /// Commodity forward price.
    CommodityForward,
    /// Commodity option volatility or premium.
    CommodityOption,
    /// FX option volatility.
    FxOption,
    /// Correlation.
    Correlation,
}

impl FromStr for InstrumentType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ZERO" => InstrumentType::Zero,
            "DISCOUNT" => InstrumentType::Discount,
            "MM" => InstrumentType::MoneyMarket,
            "MM_FUTURE" => InstrumentType::MoneyMarketFuture,
            "FRA" => InstrumentType::Fra,
            "IR_SWAP" => InstrumentType::IrSwap,
            "BASIS_SWAP" => InstrumentType::BasisSwap,
            "BMA_SWAP" => InstrumentType::BmaSwap,
            "FX" => InstrumentType::FxSpot,
            "FXFWD" => InstrumentType::FxForward,
            "CC_BASIS_SWAP" => InstrumentType::CrossCcyBasisSwap,
            "CC_FIX_FLOAT_SWAP" => InstrumentType::CrossCcyFixFloatSwap,
            "BOND" => InstrumentType::Bond,
            "COMMODITY_FWD" => InstrumentType::CommodityForward,
            "COMMODITY_OPTION" => InstrumentType::CommodityOption,
            "FX_OPTION" => InstrumentType::FxOption,
            "CORRELATION" => InstrumentType::Correlation,
            _ => {
                return Err(MarketError::quote_parse(
                    s,
                    format!("Cannot convert \"{s}\" to InstrumentType"),
                ))
            }
        })
    }
}

/// Kind of number carried by a quote (second name token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteType {
    /// Interest rate.
    Rate,
    /// Spread over a reference curve or index.
    BasisSpread,
    /// Yield spread.
    YieldSpread,
    /// Ratio.
    Ratio,
    /// Price.
    Price,
    /// Lognormal (Black) volatility.
    RateLnVol,
    /// Bond yield.
    Yield,
}

impl FromStr for QuoteType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "RATE" => QuoteType::Rate,
            "BASIS_SPREAD" => QuoteType::BasisSpread,
            "YIELD_SPREAD" => QuoteType::YieldSpread,
            "RATIO" => QuoteType::Ratio,
            "PRICE" => QuoteType::Price,
            "RATE_LNVOL" => QuoteType::RateLnVol,
            "YIELD" => QuoteType::Yield,
            _ => {
                return Err(MarketError::quote_parse(
                    s,
                    format!("Cannot convert \"{s}\" to QuoteType"),
                ))
            }
        })
    }
}

/// A date or a tenor from the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOrPeriod {
    /// Explicit date.
    Date(Date),
    /// Tenor.
    Period(Period),
}

impl DateOrPeriod {
    /// Parses a token that is either `YYYY-MM-DD` or a tenor.
    pub fn parse(s: &str) -> MarketResult<Self> {
        if let Ok(date) = Date::parse(s) {
            return Ok(DateOrPeriod::Date(date));
        }
        Ok(DateOrPeriod::Period(Period::parse(s)?))
    }
}

impl fmt::Display for DateOrPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrPeriod::Date(d) => write!(f, "{d}"),
            DateOrPeriod::Period(p) => write!(f, "{p}"),
        }
    }
}

// =============================================================================
// QUOTE DETAILS
// =============================================================================

/// Instrument-specific fields parsed from a quote name.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteDetails {
    /// `ZERO/RATE|YIELD_SPREAD/CCY/ID/DC/TERM|DATE`
    Zero {
        /// Currency code.
        currency: String,
        /// Curve identifier token.
        id: String,
        /// Day count of the rate.
        day_count: DayCountConvention,
        /// Maturity.
        term: DateOrPeriod,
    },
    /// `DISCOUNT/RATE/CCY/ID/TERM|DATE`
    Discount {
        /// Currency code.
        currency: String,
        /// Curve identifier token.
        id: String,
        /// Maturity.
        term: DateOrPeriod,
    },
    /// `MM/RATE/CCY[/INDEX]/FWDSTART/TERM`
    MoneyMarket {
        /// Currency code.
        currency: String,
        /// Optional index name.
        index: Option<String>,
        /// Forward start.
        fwd_start: Period,
        /// Deposit term.
        term: Period,
    },
    /// `MM_FUTURE/PRICE/CCY/EXPIRY/CONTRACT/TERM`
    MoneyMarketFuture {
        /// Currency code.
        currency: String,
        /// Expiry month as `YYYY-MM`.
        expiry: String,
        /// Contract name.
        contract: String,
        /// Underlying rate tenor.
        term: Period,
    },
    /// `FRA/RATE/CCY/FWDSTART/TERM`
    Fra {
        /// Currency code.
        currency: String,
        /// Start from spot.
        fwd_start: Period,
        /// End from spot.
        term: Period,
    },
    /// `IR_SWAP/RATE/CCY[/INDEX]/FWDSTART/TENOR/TERM`
    Swap {
        /// Currency code.
        currency: String,
        /// Optional index name.
        index: Option<String>,
        /// Forward start.
        fwd_start: Period,
        /// Floating index tenor.
        tenor: Period,
        /// Swap maturity.
        term: Period,
    },
    /// `BASIS_SWAP/BASIS_SPREAD/FLATTERM/TERM/CCY[/INDEX]/MATURITY`
    BasisSwap {
        /// Tenor of the flat (unspread) leg.
        flat_term: Period,
        /// Tenor of the spread leg.
        term: Period,
        /// Currency code.
        currency: String,
        /// Maturity.
        maturity: Period,
    },
    /// `BMA_SWAP/RATIO/CCY/TERM/MATURITY`
    BmaSwap {
        /// Currency code.
        currency: String,
        /// Libor tenor.
        term: Period,
        /// Maturity.
        maturity: Period,
    },
    /// `FX/RATE/CCY1/CCY2`
    FxSpot {
        /// Unit (base) currency.
        unit_currency: String,
        /// Quote currency.
        currency: String,
    },
    /// `FXFWD/RATE/CCY1/CCY2/TERM`
    FxForward {
        /// Unit (base) currency.
        unit_currency: String,
        /// Quote currency.
        currency: String,
        /// Forward tenor.
        term: Period,
    },
    /// `CC_BASIS_SWAP/BASIS_SPREAD/FLATCCY/FLATTERM/CCY/TERM/MATURITY`
    CrossCcyBasis {
        /// Currency of the flat leg.
        flat_currency: String,
        /// Index tenor of the flat leg.
        flat_term: Period,
        /// Currency of the spread leg.
        currency: String,
        /// Index tenor of the spread leg.
        term: Period,
        /// Maturity.
        maturity: Period,
    },
    /// `CC_FIX_FLOAT_SWAP/RATE/FLOATCCY/FLOATTENOR/FIXEDCCY/FIXEDTENOR/MATURITY`
    CrossCcyFixFloat {
        /// Floating leg currency.
        float_currency: String,
        /// Floating index tenor.
        float_tenor: Period,
        /// Fixed leg currency.
        fixed_currency: String,
        /// Fixed leg tenor.
        fixed_tenor: Period,
        /// Maturity.
        maturity: Period,
    },
    /// `BOND/PRICE|YIELD/ID`
    Bond {
        /// Security identifier.
        security_id: String,
    },
    /// `COMMODITY_FWD/PRICE/NAME/CCY/DATE|TENOR`
    CommodityForward {
        /// Commodity name.
        name: String,
        /// Currency code.
        currency: String,
        /// Delivery date or tenor.
        term: DateOrPeriod,
    },
    /// `COMMODITY_OPTION/RATE_LNVOL|PRICE/NAME/CCY/EXPIRY/STRIKE[/C|P]`
    CommodityOption {
        /// Commodity name.
        name: String,
        /// Currency code.
        currency: String,
        /// Option expiry.
        expiry: Expiry,
        /// Option strike.
        strike: Strike,
        /// Call unless the name ends in `/P`.
        option_type: OptionType,
    },
    /// `FX_OPTION/RATE_LNVOL/CCY1/CCY2/EXPIRY/STRIKE`
    FxOption {
        /// Unit currency.
        unit_currency: String,
        /// Quote currency.
        currency: String,
        /// Option expiry.
        expiry: Expiry,
        /// Strike token as quoted.
        strike: String,
    },
    /// `CORRELATION/RATE/IDX1/IDX2/TENOR/STRIKE`
    Correlation {
        /// First index.
        index1: String,
        /// Second index.
        index2: String,
        /// Tenor token.
        tenor: String,
        /// Strike token.
        strike: String,
    },
}

// =============================================================================
// MARKET DATUM
// =============================================================================

/// One quote for one as-of date.
///
/// # Example
///
/// ```rust
/// use pillar_core::Date;
/// use pillar_market::quotes::{MarketDatum, QuoteDetails};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let q = MarketDatum::parse(asof, "MM/RATE/EUR/2D/6M", 0.035).unwrap();
/// assert!(matches!(q.details(), QuoteDetails::MoneyMarket { .. }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDatum {
    asof: Date,
    name: String,
    value: f64,
    instrument_type: InstrumentType,
    quote_type: QuoteType,
    details: QuoteDetails,
}

impl MarketDatum {
    /// Parses a quote name and attaches the value.
    ///
    /// # Errors
    ///
    /// Fails when the name does not follow the schema for its instrument
    /// type or a token cannot be parsed.
    pub fn parse(asof: Date, name: &str, value: f64) -> MarketResult<Self> {
        let tokens: Vec<&str> = name.split('/').collect();
        if tokens.len() < 3 {
            return Err(MarketError::quote_parse(name, "more than 2 tokens expected"));
        }
        let instrument_type: InstrumentType = tokens[0].parse()?;
        let quote_type: QuoteType = tokens[1].parse()?;
        let details = parse_details(name, instrument_type, quote_type, &tokens)?;
        Ok(Self {
            asof,
            name: name.to_string(),
            value,
            instrument_type,
            quote_type,
            details,
        })
    }

    /// As-of date.
    #[must_use]
    pub fn asof(&self) -> Date {
        self.asof
    }

    /// Full quote name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Instrument family.
    #[must_use]
    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument_type
    }

    /// Quote type.
    #[must_use]
    pub fn quote_type(&self) -> QuoteType {
        self.quote_type
    }

    /// Instrument-specific fields.
    #[must_use]
    pub fn details(&self) -> &QuoteDetails {
        &self.details
    }
}

fn expect_tokens(name: &str, tokens: &[&str], allowed: &[usize]) -> MarketResult<()> {
    if allowed.contains(&tokens.len()) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    Err(MarketError::quote_parse(name, format!("{expected} tokens expected")))
}

fn expect_quote_type(name: &str, actual: QuoteType, allowed: &[QuoteType]) -> MarketResult<()> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(MarketError::quote_parse(name, format!("invalid quote type {actual:?}")))
    }
}

fn period(token: &str) -> MarketResult<Period> {
    Ok(Period::parse(token)?)
}

fn parse_details(
    name: &str,
    instrument: InstrumentType,
    quote_type: QuoteType,
    t: &[&str],
) -> MarketResult<QuoteDetails> {
    use QuoteType as QT;
    match instrument {
        InstrumentType::Zero => {
            expect_quote_type(name, quote_type, &[QT::Rate, QT::YieldSpread])?;
            expect_tokens(name, t, &[6])?;
            Ok(QuoteDetails::Zero {
                currency: t[2].to_string(),
                id: t[3].to_string(),
                day_count: t[4].parse()?,
                term: DateOrPeriod::parse(t[5])?,
            })
        }
        InstrumentType::Discount => {
            expect_tokens(name, t, &[5])?;
            Ok(QuoteDetails::Discount {
                currency: t[2].to_string(),
                id: t[3].to_string(),
                term: DateOrPeriod::parse(t[4])?,
            })
        }
        InstrumentType::MoneyMarket => {
            expect_tokens(name, t, &[5, 6])?;
            let (index, offset) = if t.len() == 6 { (Some(t[3].to_string()), 1) } else { (None, 0) };
            Ok(QuoteDetails::MoneyMarket {
                currency: t[2].to_string(),
                index,
                fwd_start: period(t[3 + offset])?,
                term: period(t[4 + offset])?,
            })
        }
        InstrumentType::MoneyMarketFuture => {
            expect_tokens(name, t, &[6])?;
            Ok(QuoteDetails::MoneyMarketFuture {
                currency: t[2].to_string(),
                expiry: t[3].to_string(),
                contract: t[4].to_string(),
                term: period(t[5])?,
            })
        }
        InstrumentType::Fra => {
            expect_tokens(name, t, &[5])?;
            Ok(QuoteDetails::Fra {
                currency: t[2].to_string(),
                fwd_start: period(t[3])?,
                term: period(t[4])?,
            })
        }
        InstrumentType::IrSwap => {
            expect_tokens(name, t, &[6, 7])?;
            let (index, offset) = if t.len() == 7 { (Some(t[3].to_string()), 1) } else { (None, 0) };
            Ok(QuoteDetails::Swap {
                currency: t[2].to_string(),
                index,
                fwd_start: period(t[3 + offset])?,
                tenor: period(t[4 + offset])?,
                term: period(t[5 + offset])?,
            })
        }
        InstrumentType::BasisSwap => {
            expect_tokens(name, t, &[6, 7])?;
            Ok(QuoteDetails::BasisSwap {
                flat_term: period(t[2])?,
                term: period(t[3])?,
                currency: t[4].to_string(),
                maturity: period(t[t.len() - 1])?,
            })
        }
        InstrumentType::BmaSwap => {
            expect_tokens(name, t, &[5])?;
            Ok(QuoteDetails::BmaSwap {
                currency: t[2].to_string(),
                term: period(t[3])?,
                maturity: period(t[4])?,
            })
        }
        InstrumentType::FxSpot => {
            expect_tokens(name, t, &[4])?;
            Ok(QuoteDetails::FxSpot {
                unit_currency: t[2].to_string(),
                currency: t[3].to_string(),
            })
        }
        InstrumentType::FxForward => {
            expect_tokens(name, t, &[5])?;
            Ok(QuoteDetails::FxForward {
                unit_currency: t[2].to_string(),
                currency: t[3].to_string(),
                term: period(t[4])?,
            })
        }
        InstrumentType::CrossCcyBasisSwap => {
            expect_tokens(name, t, &[7])?;
            Ok(QuoteDetails::CrossCcyBasis {
                flat_currency: t[2].to_string(),
                flat_term: period(t[3])?,
                currency: t[4].to_string(),
                term: period(t[5])?,
                maturity: period(t[6])?,
            })
        }
        InstrumentType::CrossCcyFixFloatSwap => {
            expect_tokens(name, t, &[7])?;
            Ok(QuoteDetails::CrossCcyFixFloat {
                float_currency: t[2].to_string(),
                float_tenor: period(t[3])?,
                fixed_currency: t[4].to_string(),
                fixed_tenor: period(t[5])?,
                maturity: period(t[6])?,
            })
        }
        InstrumentType::Bond => {
            expect_quote_type(name, quote_type, &[QT::Price, QT::Yield, QT::YieldSpread])?;
            expect_tokens(name, t, &[3])?;
            Ok(QuoteDetails::Bond {
                security_id: t[2].to_string(),
            })
        }
        InstrumentType::CommodityForward => {
            expect_quote_type(name, quote_type, &[QT::Price])?;
            expect_tokens(name, t, &[5])?;
            Ok(QuoteDetails::CommodityForward {
                name: t[2].to_string(),
                currency: t[3].to_string(),
                term: DateOrPeriod::parse(t[4])?,
            })
        }
        InstrumentType::CommodityOption => {
            expect_quote_type(name, quote_type, &[QT::RateLnVol, QT::Price])?;
            if t.len() < 6 {
                return Err(MarketError::quote_parse(name, "at least 6 tokens expected"));
            }
            let expiry = Expiry::parse(t[4])?;
            let (strike_tokens, option_type) = match t[t.len() - 1] {
                "C" => (&t[5..t.len() - 1], OptionType::Call),
                "P" => (&t[5..t.len() - 1], OptionType::Put),
                _ => (&t[5..], OptionType::Call),
            };
            if strike_tokens.is_empty() {
                return Err(MarketError::quote_parse(name, "missing strike"));
            }
            Ok(QuoteDetails::CommodityOption {
                name: t[2].to_string(),
                currency: t[3].to_string(),
                expiry,
                strike: Strike::parse(&strike_tokens.join("/"))?,
                option_type,
            })
        }
        InstrumentType::FxOption => {
            expect_quote_type(name, quote_type, &[QT::RateLnVol])?;
            expect_tokens(name, t, &[6])?;
            Ok(QuoteDetails::FxOption {
                unit_currency: t[2].to_string(),
                currency: t[3].to_string(),
                expiry: Expiry::parse(t[4])?,
                strike: t[5].to_string(),
            })
        }
        InstrumentType::Correlation => {
            expect_quote_type(name, quote_type, &[QT::Rate, QT::Price])?;
            expect_tokens(name, t, &[6])?;
            Ok(QuoteDetails::Correlation {
                index1: t[2].to_string(),
                index2: t[3].to_string(),
                tenor: t[4].to_string(),
                strike: t[5].to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_zero_and_discount() {
        let q = MarketDatum::parse(asof(), "ZERO/RATE/EUR/EUR1D/A365/1Y", 0.02).unwrap();
        assert_eq!(q.instrument_type(), InstrumentType::Zero);
        match q.details() {
            QuoteDetails::Zero { day_count, term, .. } => {
                assert_eq!(*day_count, DayCountConvention::Act365Fixed);
                assert_eq!(*term, DateOrPeriod::Period(Period::years(1)));
            }
            other => panic!("unexpected {other:?}"),
        }

        let q = MarketDatum::parse(asof(), "DISCOUNT/RATE/EUR/EUR1D/2025-01-15", 0.98).unwrap();
        assert!(matches!(
            q.details(),
            QuoteDetails::Discount {
                term: DateOrPeriod::Date(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_optional_index_tokens() {
        let q = MarketDatum::parse(asof(), "IR_SWAP/RATE/EUR/EUR-EURIBOR-6M/2D/6M/10Y", 0.03).unwrap();
        match q.details() {
            QuoteDetails::Swap { index, term, .. } => {
                assert_eq!(index.as_deref(), Some("EUR-EURIBOR-6M"));
                assert_eq!(*term, Period::years(10));
            }
            other => panic!("unexpected {other:?}"),
        }
        let q = MarketDatum::parse(asof(), "BASIS_SWAP/BASIS_SPREAD/6M/3M/EUR/foo/5Y", 0.001).unwrap();
        assert!(matches!(q.details(), QuoteDetails::BasisSwap { maturity, .. } if *maturity == Period::years(5)));
    }

    #[test]
    fn test_parse_commodity_option() {
        let q = MarketDatum::parse(
            asof(),
            "COMMODITY_OPTION/PRICE/NYMEX:CL/USD/2024-06-01/DEL/Spot/Put/0.25/P",
            3.2,
        )
        .unwrap();
        match q.details() {
            QuoteDetails::CommodityOption {
                strike,
                option_type,
                ..
            } => {
                assert_eq!(*option_type, OptionType::Put);
                assert!(matches!(strike, Strike::Delta { delta, .. } if (*delta - 0.25).abs() < 1e-15));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_token_count_errors() {
        assert!(MarketDatum::parse(asof(), "FRA/RATE/EUR/3M", 0.01).is_err());
        assert!(MarketDatum::parse(asof(), "ZERO/PRICE/EUR/X/A365/1Y", 0.01).is_err());
        assert!(MarketDatum::parse(asof(), "NOPE/RATE/EUR/1Y", 0.01).is_err());
        assert!(MarketDatum::parse(asof(), "MM", 0.01).is_err());
    }
}

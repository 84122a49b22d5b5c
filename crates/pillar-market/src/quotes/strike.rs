//! Option expiry and strike specifications carried by option quotes.

use std::fmt;
use std::str::FromStr;

use pillar_core::{Date, Period};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionType {
    /// `+1` for calls and `-1` for puts.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl FromStr for OptionType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "Call" | "CALL" | "call" => Ok(OptionType::Call),
            "P" | "Put" | "PUT" | "put" => Ok(OptionType::Put),
            _ => Err(MarketError::quote_parse(s, "expected option type C or P")),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Delta convention for delta-quoted strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeltaVolType {
    /// Spot delta.
    #[default]
    Spot,
    /// Forward delta.
    Fwd,
    /// Premium-adjusted spot delta.
    PaSpot,
    /// Premium-adjusted forward delta.
    PaFwd,
}

impl FromStr for DeltaVolType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Spot" => Ok(DeltaVolType::Spot),
            "Fwd" => Ok(DeltaVolType::Fwd),
            "PaSpot" => Ok(DeltaVolType::PaSpot),
            "PaFwd" => Ok(DeltaVolType::PaFwd),
            _ => Err(MarketError::quote_parse(s, "expected delta type Spot, Fwd, PaSpot or PaFwd")),
        }
    }
}

impl fmt::Display for DeltaVolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeltaVolType::Spot => "Spot",
            DeltaVolType::Fwd => "Fwd",
            DeltaVolType::PaSpot => "PaSpot",
            DeltaVolType::PaFwd => "PaFwd",
        };
        f.write_str(s)
    }
}

/// At-the-money convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AtmType {
    /// Strike equals spot.
    AtmSpot,
    /// Strike equals the forward.
    AtmFwd,
    /// Strike where call and put deltas sum to zero.
    #[default]
    AtmDeltaNeutral,
    /// Strike at a given delta.
    AtmDelta,
    /// Strike where the call delta is 0.5.
    AtmPutCall50,
}

impl FromStr for AtmType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AtmSpot" => Ok(AtmType::AtmSpot),
            "AtmFwd" => Ok(AtmType::AtmFwd),
            "AtmDeltaNeutral" => Ok(AtmType::AtmDeltaNeutral),
            "AtmDelta" => Ok(AtmType::AtmDelta),
            "AtmPutCall50" => Ok(AtmType::AtmPutCall50),
            _ => Err(MarketError::quote_parse(s, "unknown ATM type")),
        }
    }
}

impl fmt::Display for AtmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AtmType::AtmSpot => "AtmSpot",
            AtmType::AtmFwd => "AtmFwd",
            AtmType::AtmDeltaNeutral => "AtmDeltaNeutral",
            AtmType::AtmDelta => "AtmDelta",
            AtmType::AtmPutCall50 => "AtmPutCall50",
        };
        f.write_str(s)
    }
}

/// Reference price for moneyness strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoneynessType {
    /// Strike over spot.
    Spot,
    /// Strike over forward.
    #[default]
    Fwd,
}

impl FromStr for MoneynessType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Spot" => Ok(MoneynessType::Spot),
            "Fwd" => Ok(MoneynessType::Fwd),
            _ => Err(MarketError::quote_parse(s, "expected moneyness type Spot or Fwd")),
        }
    }
}

impl fmt::Display for MoneynessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneynessType::Spot => write!(f, "Spot"),
            MoneynessType::Fwd => write!(f, "Fwd"),
        }
    }
}

/// Option expiry as quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Explicit date.
    Date(Date),
    /// Tenor from the as-of date.
    Period(Period),
    /// `cN`: the N-th next contract expiry.
    FutureContinuation(u32),
}

impl Expiry {
    /// Parses `2024-06-01`, `1Y` or `c1`.
    pub fn parse(s: &str) -> MarketResult<Self> {
        let s = s.trim();
        if let Some(index) = s.strip_prefix('c').or_else(|| s.strip_prefix('C')) {
            if let Ok(n) = index.parse::<u32>() {
                if n == 0 {
                    return Err(MarketError::quote_parse(s, "future continuation index starts at 1"));
                }
                return Ok(Expiry::FutureContinuation(n));
            }
        }
        if let Ok(date) = Date::parse(s) {
            return Ok(Expiry::Date(date));
        }
        Period::parse(s)
            .map(Expiry::Period)
            .map_err(|_| MarketError::quote_parse(s, "expiry must be a date, period or cN"))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Date(d) => write!(f, "{d}"),
            Expiry::Period(p) => write!(f, "{p}"),
            Expiry::FutureContinuation(n) => write!(f, "c{n}"),
        }
    }
}

/// Option strike as quoted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strike {
    /// Absolute strike level.
    Absolute(f64),
    /// At-the-money strike, optionally with the delta convention it refers to.
    Atm {
        /// ATM convention.
        atm_type: AtmType,
        /// Delta convention for delta-based ATM types.
        delta_type: Option<DeltaVolType>,
    },
    /// Delta strike.
    Delta {
        /// Delta convention.
        delta_type: DeltaVolType,
        /// Whether the delta is of a put or a call.
        option_type: OptionType,
        /// Delta as quoted (positive for both calls and puts).
        delta: f64,
    },
    /// Moneyness strike.
    Moneyness {
        /// Spot or forward moneyness.
        moneyness_type: MoneynessType,
        /// Strike divided by the reference price.
        moneyness: f64,
    },
}

impl Strike {
    /// Parses `100`, `ABS/100`, `ATM/AtmFwd`, `ATM/AtmDeltaNeutral/DEL/Spot`,
    /// `DEL/Spot/Put/0.25` or `MNY/Fwd/1.1`.
    pub fn parse(s: &str) -> MarketResult<Self> {
        let tokens: Vec<&str> = s.trim().split('/').collect();
        let number = |t: &str| {
            t.trim()
                .parse::<f64>()
                .map_err(|_| MarketError::quote_parse(s, format!("'{t}' is not a number")))
        };
        match tokens.as_slice() {
            [value] => Ok(Strike::Absolute(number(value)?)),
            ["ABS", value] => Ok(Strike::Absolute(number(value)?)),
            ["ATM", atm] => Ok(Strike::Atm {
                atm_type: atm.parse()?,
                delta_type: None,
            }),
            ["ATM", atm, "DEL", delta_type] => Ok(Strike::Atm {
                atm_type: atm.parse()?,
                delta_type: Some(delta_type.parse()?),
            }),
            ["DEL", delta_type, option_type, delta] => Ok(Strike::Delta {
                delta_type: delta_type.parse()?,
                option_type: option_type.parse()?,
                delta: number(delta)?,
            }),
            ["MNY", moneyness_type, moneyness] => Ok(Strike::Moneyness {
                moneyness_type: moneyness_type.parse()?,
                moneyness: number(moneyness)?,
            }),
            _ => Err(MarketError::quote_parse(s, "unrecognised strike")),
        }
    }

    /// Absolute strike level, if this is an absolute strike.
    #[must_use]
    pub fn absolute(&self) -> Option<f64> {
        match self {
            Strike::Absolute(k) => Some(*k),
            _ => None,
        }
    }

    /// Equality with a relative tolerance on the numeric part.
    #[must_use]
    pub fn close_to(&self, other: &Strike) -> bool {
        match (self, other) {
            (Strike::Absolute(a), Strike::Absolute(b)) => close_enough(*a, *b),
            (
                Strike::Delta {
                    delta_type: t1,
                    option_type: o1,
                    delta: d1,
                },
                Strike::Delta {
                    delta_type: t2,
                    option_type: o2,
                    delta: d2,
                },
            ) => t1 == t2 && o1 == o2 && close_enough(*d1, *d2),
            (
                Strike::Moneyness {
                    moneyness_type: t1,
                    moneyness: m1,
                },
                Strike::Moneyness {
                    moneyness_type: t2,
                    moneyness: m2,
                },
            ) => t1 == t2 && close_enough(*m1, *m2),
            _ => self == other,
        }
    }
}

impl fmt::Display for Strike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strike::Absolute(k) => write!(f, "{k}"),
            Strike::Atm {
                atm_type,
                delta_type: None,
            } => write!(f, "ATM/{atm_type}"),
            Strike::Atm {
                atm_type,
                delta_type: Some(dt),
            } => write!(f, "ATM/{atm_type}/DEL/{dt}"),
            Strike::Delta {
                delta_type,
                option_type,
                delta,
            } => write!(f, "DEL/{delta_type}/{option_type}/{delta}"),
            Strike::Moneyness {
                moneyness_type,
                moneyness,
            } => write!(f, "MNY/{moneyness_type}/{moneyness}"),
        }
    }
}

/// Relative closeness test used for strikes and levels.
///
/// Two values are close when they differ by at most 42 machine epsilons
/// relative to the larger magnitude, or both are within that of zero.
#[must_use]
pub fn close_enough(a: f64, b: f64) -> bool {
    const TOL: f64 = 42.0 * f64::EPSILON;
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    if a == 0.0 || b == 0.0 {
        return diff < TOL * TOL;
    }
    diff <= TOL * a.abs() || diff <= TOL * b.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry_forms() {
        assert_eq!(
            Expiry::parse("2024-06-01").unwrap(),
            Expiry::Date(Date::from_ymd(2024, 6, 1).unwrap())
        );
        assert_eq!(Expiry::parse("1Y").unwrap(), Expiry::Period(Period::years(1)));
        assert_eq!(Expiry::parse("c2").unwrap(), Expiry::FutureContinuation(2));
        assert!(Expiry::parse("c0").is_err());
        assert!(Expiry::parse("soon").is_err());
    }

    #[test]
    fn test_parse_strike_forms() {
        assert_eq!(Strike::parse("100").unwrap(), Strike::Absolute(100.0));
        assert_eq!(Strike::parse("ABS/95.5").unwrap(), Strike::Absolute(95.5));
        assert_eq!(
            Strike::parse("ATM/AtmDeltaNeutral/DEL/Spot").unwrap(),
            Strike::Atm {
                atm_type: AtmType::AtmDeltaNeutral,
                delta_type: Some(DeltaVolType::Spot)
            }
        );
        assert_eq!(
            Strike::parse("DEL/Fwd/Put/0.25").unwrap(),
            Strike::Delta {
                delta_type: DeltaVolType::Fwd,
                option_type: OptionType::Put,
                delta: 0.25
            }
        );
        assert_eq!(
            Strike::parse("MNY/Fwd/1.1").unwrap(),
            Strike::Moneyness {
                moneyness_type: MoneynessType::Fwd,
                moneyness: 1.1
            }
        );
        assert!(Strike::parse("ATM/Somewhere").is_err());
    }

    #[test]
    fn test_strike_display_parses_back() {
        for s in ["ATM/AtmFwd", "DEL/Spot/Call/0.1", "MNY/Spot/0.9"] {
            assert_eq!(Strike::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_close_enough() {
        assert!(close_enough(1.0, 1.0 + 1e-15));
        assert!(!close_enough(1.0, 1.0 + 1e-10));
        assert!(close_enough(0.0, 0.0));
    }
}

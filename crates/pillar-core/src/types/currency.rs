//! Currency type with ISO 4217 codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Currency {
    /// United States Dollar
    #[default]
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// New Zealand Dollar
    NZD,
    /// Swedish Krona
    SEK,
    /// Norwegian Krone
    NOK,
    /// Danish Krone
    DKK,
    /// Hong Kong Dollar
    HKD,
    /// Singapore Dollar
    SGD,
    /// Chinese Yuan Renminbi
    CNY,
    /// Indian Rupee
    INR,
    /// Brazilian Real
    BRL,
    /// Mexican Peso
    MXN,
    /// South African Rand
    ZAR,
}

const ALL: [Currency; 18] = [
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    Currency::JPY,
    Currency::CHF,
    Currency::CAD,
    Currency::AUD,
    Currency::NZD,
    Currency::SEK,
    Currency::NOK,
    Currency::DKK,
    Currency::HKD,
    Currency::SGD,
    Currency::CNY,
    Currency::INR,
    Currency::BRL,
    Currency::MXN,
    Currency::ZAR,
];

impl Currency {
    /// Returns the ISO 4217 3-letter code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::SEK => "SEK",
            Currency::NOK => "NOK",
            Currency::DKK => "DKK",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::CNY => "CNY",
            Currency::INR => "INR",
            Currency::BRL => "BRL",
            Currency::MXN => "MXN",
            Currency::ZAR => "ZAR",
        }
    }

    /// Looks up a currency by its ISO code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        ALL.iter().copied().find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| CoreError::UnknownCurrency { code: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert_eq!("GBP".parse::<Currency>().unwrap(), Currency::GBP);
        assert!("XXX".parse::<Currency>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Currency::JPY.to_string(), "JPY");
    }
}

//! Frequency and compounding types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::period::{Period, TimeUnit};
use crate::error::CoreError;

/// Payment or compounding frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Single payment at maturity.
    Once,
    /// Annual payments (1 per year)
    #[default]
    Annual,
    /// Semi-annual payments (2 per year)
    SemiAnnual,
    /// Quarterly payments (4 per year)
    Quarterly,
    /// Monthly payments (12 per year)
    Monthly,
    /// Weekly payments (52 per year)
    Weekly,
    /// Daily (365 per year)
    Daily,
}

impl Frequency {
    /// Returns the number of periods per year (zero for `Once`).
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Once => 0,
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Weekly => 52,
            Frequency::Daily => 365,
        }
    }

    /// The coupon period for this frequency, if periodic.
    #[must_use]
    pub fn period(&self) -> Option<Period> {
        match self {
            Frequency::Once => None,
            Frequency::Annual => Some(Period::years(1)),
            Frequency::SemiAnnual => Some(Period::months(6)),
            Frequency::Quarterly => Some(Period::months(3)),
            Frequency::Monthly => Some(Period::months(1)),
            Frequency::Weekly => Some(Period::new(1, TimeUnit::Weeks)),
            Frequency::Daily => Some(Period::days(1)),
        }
    }

    /// The frequency whose period equals `tenor`, if any.
    #[must_use]
    pub fn from_period(tenor: Period) -> Option<Self> {
        match (tenor.unit(), tenor.length()) {
            (TimeUnit::Years, 1) | (TimeUnit::Months, 12) => Some(Frequency::Annual),
            (TimeUnit::Months, 6) => Some(Frequency::SemiAnnual),
            (TimeUnit::Months, 3) => Some(Frequency::Quarterly),
            (TimeUnit::Months, 1) => Some(Frequency::Monthly),
            (TimeUnit::Weeks, 1) => Some(Frequency::Weekly),
            (TimeUnit::Days, 1) => Some(Frequency::Daily),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Once => "Once",
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semiannual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
            Frequency::Weekly => "Weekly",
            Frequency::Daily => "Daily",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Z" | "ONCE" => Ok(Frequency::Once),
            "A" | "Y" | "ANNUAL" => Ok(Frequency::Annual),
            "S" | "SEMIANNUAL" | "SEMI-ANNUAL" => Ok(Frequency::SemiAnnual),
            "Q" | "QUARTERLY" => Ok(Frequency::Quarterly),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            "W" | "WEEKLY" => Ok(Frequency::Weekly),
            "D" | "DAILY" => Ok(Frequency::Daily),
            _ => Err(CoreError::parse("frequency", s)),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.to_string()
    }
}

/// Interest compounding convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Compounding {
    /// Simple interest: `1 + r t`.
    Simple,
    /// Periodic compounding: `(1 + r/f)^(f t)`.
    Compounded,
    /// Continuous compounding: `exp(r t)`.
    #[default]
    Continuous,
    /// Simple up to one period, compounded afterwards.
    SimpleThenCompounded,
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compounding::Simple => "Simple",
            Compounding::Compounded => "Compounded",
            Compounding::Continuous => "Continuous",
            Compounding::SimpleThenCompounded => "SimpleThenCompounded",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Compounding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Simple" => Ok(Compounding::Simple),
            "Compounded" => Ok(Compounding::Compounded),
            "Continuous" => Ok(Compounding::Continuous),
            "SimpleThenCompounded" => Ok(Compounding::SimpleThenCompounded),
            _ => Err(CoreError::parse("compounding", s)),
        }
    }
}

impl TryFrom<String> for Compounding {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Compounding> for String {
    fn from(c: Compounding) -> Self {
        c.to_string()
    }
}

//! Tenor periods (`3M`, `10Y`, `ON`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Unit of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Calendar days.
    Days,
    /// Weeks of seven days.
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years.
    Years,
}

impl TimeUnit {
    fn suffix(self) -> char {
        match self {
            TimeUnit::Days => 'D',
            TimeUnit::Weeks => 'W',
            TimeUnit::Months => 'M',
            TimeUnit::Years => 'Y',
        }
    }
}

/// A tenor such as `6M` or `10Y`.
///
/// Compound tenors (`1Y6M`) collapse to a single unit where exact
/// (`18M`); the overnight family `ON`, `TN`, `SN` parse to one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    length: i32,
    unit: TimeUnit,
}

impl Period {
    /// Creates a new period.
    #[must_use]
    pub const fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// Shorthand for a number of days.
    #[must_use]
    pub const fn days(n: i32) -> Self {
        Self::new(n, TimeUnit::Days)
    }

    /// Shorthand for a number of months.
    #[must_use]
    pub const fn months(n: i32) -> Self {
        Self::new(n, TimeUnit::Months)
    }

    /// Shorthand for a number of years.
    #[must_use]
    pub const fn years(n: i32) -> Self {
        Self::new(n, TimeUnit::Years)
    }

    /// Signed length in units.
    #[must_use]
    pub fn length(&self) -> i32 {
        self.length
    }

    /// The period's unit.
    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Negated period.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::new(-self.length, self.unit)
    }

    /// Whole months for month/year periods.
    #[must_use]
    pub fn total_months(&self) -> Option<i32> {
        match self.unit {
            TimeUnit::Months => Some(self.length),
            TimeUnit::Years => Some(12 * self.length),
            _ => None,
        }
    }

    /// Approximate length in years, used for sorting and rough bounds only.
    #[must_use]
    pub fn approx_years(&self) -> f64 {
        let n = f64::from(self.length);
        match self.unit {
            TimeUnit::Days => n / 365.0,
            TimeUnit::Weeks => 7.0 * n / 365.0,
            TimeUnit::Months => n / 12.0,
            TimeUnit::Years => n,
        }
    }

    /// Parses a tenor string.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let input = s.trim().to_uppercase();
        match input.as_str() {
            "ON" | "TN" | "SN" => return Ok(Self::days(1)),
            "" => return Err(CoreError::invalid_period(s, "empty string")),
            _ => {}
        }

        let mut parts: Vec<(i32, TimeUnit)> = Vec::new();
        let mut digits = String::new();
        for ch in input.chars() {
            if ch.is_ascii_digit() || (ch == '-' && digits.is_empty()) {
                digits.push(ch);
                continue;
            }
            let unit = match ch {
                'D' => TimeUnit::Days,
                'W' => TimeUnit::Weeks,
                'M' => TimeUnit::Months,
                'Y' => TimeUnit::Years,
                _ => return Err(CoreError::invalid_period(s, format!("unknown unit '{ch}'"))),
            };
            let n: i32 = digits
                .parse()
                .map_err(|_| CoreError::invalid_period(s, "missing length"))?;
            parts.push((n, unit));
            digits.clear();
        }
        if !digits.is_empty() {
            return Err(CoreError::invalid_period(s, "missing unit"));
        }

        match parts.as_slice() {
            [] => Err(CoreError::invalid_period(s, "no components")),
            [(n, unit)] => Ok(Self::new(*n, *unit)),
            _ => {
                if parts
                    .iter()
                    .all(|(_, u)| matches!(u, TimeUnit::Months | TimeUnit::Years))
                {
                    let months = parts
                        .iter()
                        .map(|(n, u)| if *u == TimeUnit::Years { 12 * n } else { *n })
                        .sum();
                    Ok(Self::months(months))
                } else if parts
                    .iter()
                    .all(|(_, u)| matches!(u, TimeUnit::Days | TimeUnit::Weeks))
                {
                    let days = parts
                        .iter()
                        .map(|(n, u)| if *u == TimeUnit::Weeks { 7 * n } else { *n })
                        .sum();
                    Ok(Self::days(days))
                } else {
                    Err(CoreError::invalid_period(s, "cannot mix days and months"))
                }
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.unit.suffix())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

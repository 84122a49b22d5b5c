//! Day count conventions.
//!
//! Year fractions drive every time axis in the library: curve pillars are
//! stored as `year_fraction(asof, pillar)` under the curve's day counter,
//! and volatility surfaces measure expiry time the same way.
//!
//! # Supported Conventions
//!
//! - [`Act360`]: Actual/360 - money market
//! - [`Act365Fixed`]: Actual/365 Fixed - the default zero-rate day counter
//! - [`ActActIsda`]: Actual/Actual ISDA - year-based split
//! - [`Thirty360`]: 30/360 bond basis
//! - [`Thirty360E`]: 30E/360 Eurobond basis
//!
//! # Usage
//!
//! ```rust
//! use pillar_core::daycounts::DayCountConvention;
//! use pillar_core::types::Date;
//!
//! let dc: DayCountConvention = "A360".parse().unwrap();
//! let start = Date::from_ymd(2025, 1, 1).unwrap();
//! let end = Date::from_ymd(2025, 4, 1).unwrap();
//! assert_eq!(dc.year_fraction(start, end), 0.25);
//! ```

mod act;
mod thirty360;

pub use act::{Act360, Act365Fixed, ActActIsda};
pub use thirty360::{Thirty360, Thirty360E};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Date;

/// Trait for day count conventions.
pub trait DayCount: Send + Sync {
    /// Returns the canonical name of the convention.
    fn name(&self) -> &'static str;

    /// Year fraction between two dates. Negative if `end < start`.
    fn year_fraction(&self, start: Date, end: Date) -> f64;

    /// Day count between two dates according to the convention.
    fn day_count(&self, start: Date, end: Date) -> i64;
}

/// Runtime-selectable day count convention.
///
/// Parses from the names used in conventions and curve configurations
/// (`A360`, `Actual/360`, `A365`, `ACT/ACT`, `30/360`, `30E/360`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayCountConvention {
    /// Actual/360
    Act360,
    /// Actual/365 Fixed
    #[default]
    Act365Fixed,
    /// Actual/Actual ISDA
    ActActIsda,
    /// 30/360 bond basis
    Thirty360,
    /// 30E/360 Eurobond basis
    Thirty360E,
}

impl DayCountConvention {
    fn as_day_count(&self) -> &'static dyn DayCount {
        match self {
            DayCountConvention::Act360 => &Act360,
            DayCountConvention::Act365Fixed => &Act365Fixed,
            DayCountConvention::ActActIsda => &ActActIsda,
            DayCountConvention::Thirty360 => &Thirty360,
            DayCountConvention::Thirty360E => &Thirty360E,
        }
    }

    /// Canonical short name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "A360",
            DayCountConvention::Act365Fixed => "A365",
            DayCountConvention::ActActIsda => "ActActISDA",
            DayCountConvention::Thirty360 => "30/360",
            DayCountConvention::Thirty360E => "30E/360",
        }
    }

    /// Year fraction between two dates.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.as_day_count().year_fraction(start, end)
    }

    /// Day count between two dates.
    #[must_use]
    pub fn day_count(&self, start: Date, end: Date) -> i64 {
        self.as_day_count().day_count(start, end)
    }
}

impl DayCount for DayCountConvention {
    fn name(&self) -> &'static str {
        DayCountConvention::name(self)
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        DayCountConvention::year_fraction(self, start, end)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        DayCountConvention::day_count(self, start, end)
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase().replace([' ', '_'], "");
        match key.as_str() {
            "A360" | "ACT/360" | "ACTUAL/360" | "ACT360" => Ok(DayCountConvention::Act360),
            "A365" | "A365F" | "ACT/365" | "ACT/365F" | "ACT/365(FIXED)" | "ACTUAL/365"
            | "ACTUAL/365(FIXED)" | "ACT365" => Ok(DayCountConvention::Act365Fixed),
            "ACT/ACT" | "ACTACT" | "ACTACTISDA" | "ACT/ACT(ISDA)" | "ACTUAL/ACTUAL"
            | "ACTUAL/ACTUAL(ISDA)" => Ok(DayCountConvention::ActActIsda),
            "30/360" | "30/360US" | "30U/360" | "30/360(BONDBASIS)" | "THIRTY360" => {
                Ok(DayCountConvention::Thirty360)
            }
            "30E/360" | "30/360(EUROBONDBASIS)" | "30E/360(EUROBONDBASIS)" => {
                Ok(DayCountConvention::Thirty360E)
            }
            _ => Err(CoreError::UnknownDayCount {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DayCountConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayCountConvention> for String {
    fn from(dc: DayCountConvention) -> Self {
        dc.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_aliases() {
        for name in ["A360", "Actual/360", "ACT/360"] {
            assert_eq!(name.parse::<DayCountConvention>().unwrap(), DayCountConvention::Act360);
        }
        for name in ["A365", "A365F", "Actual/365 (Fixed)"] {
            assert_eq!(
                name.parse::<DayCountConvention>().unwrap(),
                DayCountConvention::Act365Fixed
            );
        }
        assert!("BUS/252".parse::<DayCountConvention>().is_err());
    }

    #[test]
    fn test_serde_as_name() {
        let json = serde_json::to_string(&DayCountConvention::Act360).unwrap();
        assert_eq!(json, "\"A360\"");
        let back: DayCountConvention = serde_json::from_str("\"30E/360\"").unwrap();
        assert_eq!(back, DayCountConvention::Thirty360E);
    }

    #[test]
    fn test_dispatch() {
        let start = Date::from_ymd(2025, 1, 1).unwrap();
        let end = Date::from_ymd(2026, 1, 1).unwrap();
        assert_relative_eq!(DayCountConvention::Act365Fixed.year_fraction(start, end), 1.0);
        assert_relative_eq!(
            DayCountConvention::Act360.year_fraction(start, end),
            365.0 / 360.0
        );
        assert_eq!(DayCountConvention::Thirty360.day_count(start, end), 360);
    }
}

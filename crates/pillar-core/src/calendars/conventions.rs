//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Calendar;
use crate::error::CoreError;
use crate::types::Date;

/// Business day adjustment conventions.
///
/// These conventions specify how to adjust a date that falls
/// on a non-business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum BusinessDayConvention {
    /// No adjustment.
    Unadjusted,

    /// Move to the following business day.
    #[default]
    Following,

    /// Following, unless that crosses a month boundary, then preceding.
    ModifiedFollowing,

    /// Move to the preceding business day.
    Preceding,

    /// Preceding, unless that crosses a month boundary, then following.
    ModifiedPreceding,

    /// Move to the nearest business day, following on ties.
    Nearest,
}

impl fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "ModifiedFollowing",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "ModifiedPreceding",
            BusinessDayConvention::Nearest => "Nearest",
        };
        write!(f, "{name}")
    }
}

impl FromStr for BusinessDayConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "U" | "UNADJUSTED" | "INDIFF" | "NONE" => Ok(BusinessDayConvention::Unadjusted),
            "F" | "FOLLOWING" | "FOL" => Ok(BusinessDayConvention::Following),
            "MF" | "MODIFIEDFOLLOWING" | "MODIFIED FOLLOWING" | "MODFOL" => {
                Ok(BusinessDayConvention::ModifiedFollowing)
            }
            "P" | "PRECEDING" | "PRE" => Ok(BusinessDayConvention::Preceding),
            "MP" | "MODIFIEDPRECEDING" | "MODIFIED PRECEDING" | "MODPRE" => {
                Ok(BusinessDayConvention::ModifiedPreceding)
            }
            "NEAREST" | "NR" => Ok(BusinessDayConvention::Nearest),
            _ => Err(CoreError::parse("business day convention", s)),
        }
    }
}

impl TryFrom<String> for BusinessDayConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BusinessDayConvention> for String {
    fn from(c: BusinessDayConvention) -> Self {
        c.to_string()
    }
}

/// Adjusts a date according to the given business day convention.
pub fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> Date {
    if calendar.is_business_day(date) {
        return date;
    }

    match convention {
        BusinessDayConvention::Unadjusted => date,

        BusinessDayConvention::Following => following(date, calendar),

        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = following(date, calendar);
            if adjusted.month() != date.month() {
                preceding(date, calendar)
            } else {
                adjusted
            }
        }

        BusinessDayConvention::Preceding => preceding(date, calendar),

        BusinessDayConvention::ModifiedPreceding => {
            let adjusted = preceding(date, calendar);
            if adjusted.month() != date.month() {
                following(date, calendar)
            } else {
                adjusted
            }
        }

        BusinessDayConvention::Nearest => {
            let fwd = following(date, calendar);
            let back = preceding(date, calendar);
            if date.days_between(&fwd) <= back.days_between(&date) {
                fwd
            } else {
                back
            }
        }
    }
}

fn following<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(1);
    }
    date
}

fn preceding<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(-1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::WeekendCalendar;

    #[test]
    fn test_following() {
        let saturday = Date::from_ymd(2025, 1, 4).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::Following, &WeekendCalendar);
        assert_eq!(adjusted, Date::from_ymd(2025, 1, 6).unwrap());
    }

    #[test]
    fn test_preceding() {
        let saturday = Date::from_ymd(2025, 1, 4).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::Preceding, &WeekendCalendar);
        assert_eq!(adjusted, Date::from_ymd(2025, 1, 3).unwrap());
    }

    #[test]
    fn test_modified_following_month_end() {
        // Saturday 31 May 2025 rolls back to Friday 30 May
        let saturday = Date::from_ymd(2025, 5, 31).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::ModifiedFollowing, &WeekendCalendar);
        assert_eq!(adjusted, Date::from_ymd(2025, 5, 30).unwrap());
    }

    #[test]
    fn test_unadjusted() {
        let saturday = Date::from_ymd(2025, 1, 4).unwrap();
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Unadjusted, &WeekendCalendar),
            saturday
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "MF".parse::<BusinessDayConvention>().unwrap(),
            BusinessDayConvention::ModifiedFollowing
        );
        assert_eq!(
            "Following".parse::<BusinessDayConvention>().unwrap(),
            BusinessDayConvention::Following
        );
        assert!("Sideways".parse::<BusinessDayConvention>().is_err());
    }
}

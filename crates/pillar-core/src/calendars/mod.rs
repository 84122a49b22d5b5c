//! Business day calendars and conventions.
//!
//! This module provides:
//! - The [`Calendar`] trait with adjustment and period advancing
//! - Rule-based holiday calendars (TARGET, UK, US)
//! - [`MarketCalendar`], a serializable calendar selected by name

mod conventions;
mod holidays;

pub use conventions::{adjust, BusinessDayConvention};
pub use holidays::{easter_sunday, TargetCalendar, UkCalendar, UsCalendar};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::types::{Date, Period, TimeUnit};

/// Trait for business day calendars.
pub trait Calendar: Send + Sync {
    /// Returns the name of the calendar.
    fn name(&self) -> &str;

    /// Returns true if the date is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Returns true if the date is a holiday.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Adjusts a date according to the given business day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Date {
        conventions::adjust(date, convention, self)
    }

    /// Advances a date by a number of business days.
    fn add_business_days(&self, date: Date, days: i32) -> Date {
        let mut result = date;
        let mut remaining = days.abs();
        let direction: i64 = if days >= 0 { 1 } else { -1 };

        while remaining > 0 {
            result = result.add_days(direction);
            if self.is_business_day(result) {
                remaining -= 1;
            }
        }

        result
    }

    /// Last business day of the date's month.
    fn end_of_month(&self, date: Date) -> Date {
        self.adjust(date.end_of_month(), BusinessDayConvention::Preceding)
    }

    /// True when `date` is the last business day of its month.
    fn is_end_of_month(&self, date: Date) -> bool {
        self.end_of_month(date) == date
    }

    /// Advances a date by a period.
    ///
    /// Day periods count business days. Week, month and year periods move
    /// calendar time and then adjust with `convention`; with `end_of_month`
    /// set, a start on the last business day of a month lands on the last
    /// business day of the target month.
    fn advance(
        &self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
        end_of_month: bool,
    ) -> CoreResult<Date> {
        match period.unit() {
            TimeUnit::Days => {
                if period.length() == 0 {
                    return Ok(self.adjust(date, convention));
                }
                Ok(self.add_business_days(date, period.length()))
            }
            TimeUnit::Weeks => Ok(self.adjust(
                date.add_days(7 * i64::from(period.length())),
                convention,
            )),
            TimeUnit::Months | TimeUnit::Years => {
                let shifted = date.add_period(period, false)?;
                if end_of_month && self.is_end_of_month(date) {
                    return Ok(self.end_of_month(shifted));
                }
                Ok(self.adjust(shifted, convention))
            }
        }
    }

    /// Counts business days in `(start, end]`.
    fn business_days_between(&self, start: Date, end: Date) -> i32 {
        let mut count = 0;
        let mut current = start.add_days(1);

        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.add_days(1);
        }

        count
    }
}

/// A weekend-only calendar (no holidays).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendCalendar;

impl Calendar for WeekendCalendar {
    fn name(&self) -> &str {
        "WeekendsOnly"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Calendar that combines multiple calendars (joint holidays).
pub struct JointCalendar {
    calendars: Vec<Box<dyn Calendar>>,
    name: String,
}

impl JointCalendar {
    /// Creates a new joint calendar from multiple calendars.
    pub fn new(calendars: Vec<Box<dyn Calendar>>) -> Self {
        let name = calendars
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(",");

        Self { calendars, name }
    }
}

impl Calendar for JointCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        self.calendars.iter().all(|cal| cal.is_business_day(date))
    }
}

/// A calendar chosen by name in conventions and configurations.
///
/// Accepts `TARGET`, `UK`, `US`, `WeekendsOnly`, `NullCalendar`, currency
/// codes (`EUR`, `GBP`, `USD`) and comma-separated joint calendars
/// (`TARGET,UK`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MarketCalendar {
    /// Every day is a business day.
    Null,
    /// Saturdays and Sundays only.
    #[default]
    WeekendsOnly,
    /// TARGET.
    Target,
    /// United Kingdom.
    UnitedKingdom,
    /// United States settlement.
    UnitedStates,
    /// Business day only when business day in all members.
    Joint(Vec<MarketCalendar>),
}

impl MarketCalendar {
    fn parse_single(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NULL" | "NULLCALENDAR" => Ok(MarketCalendar::Null),
            "WEEKENDSONLY" | "WEEKENDS" => Ok(MarketCalendar::WeekendsOnly),
            "TARGET" | "TARGET2" | "TGT" | "EUR" => Ok(MarketCalendar::Target),
            "UK" | "GB" | "GBP" | "LONDON" | "UNITEDKINGDOM" => Ok(MarketCalendar::UnitedKingdom),
            "US" | "USD" | "NYB" | "US-SET" | "UNITEDSTATES" => Ok(MarketCalendar::UnitedStates),
            _ => Err(CoreError::UnknownCalendar {
                name: name.to_string(),
            }),
        }
    }

    /// Parses a calendar name, including comma-separated joint calendars.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = name.split(',').filter(|p| !p.trim().is_empty()).collect();
        match parts.as_slice() {
            [] => Err(CoreError::UnknownCalendar {
                name: name.to_string(),
            }),
            [single] => Self::parse_single(single),
            many => Ok(MarketCalendar::Joint(
                many.iter()
                    .map(|p| Self::parse_single(p))
                    .collect::<CoreResult<Vec<_>>>()?,
            )),
        }
    }
}

impl Calendar for MarketCalendar {
    fn name(&self) -> &str {
        match self {
            MarketCalendar::Null => "NullCalendar",
            MarketCalendar::WeekendsOnly => "WeekendsOnly",
            MarketCalendar::Target => "TARGET",
            MarketCalendar::UnitedKingdom => "UK",
            MarketCalendar::UnitedStates => "US",
            MarketCalendar::Joint(_) => "Joint",
        }
    }

    fn is_business_day(&self, date: Date) -> bool {
        match self {
            MarketCalendar::Null => true,
            MarketCalendar::WeekendsOnly => WeekendCalendar.is_business_day(date),
            MarketCalendar::Target => TargetCalendar.is_business_day(date),
            MarketCalendar::UnitedKingdom => UkCalendar.is_business_day(date),
            MarketCalendar::UnitedStates => UsCalendar.is_business_day(date),
            MarketCalendar::Joint(members) => members.iter().all(|c| c.is_business_day(date)),
        }
    }
}

impl fmt::Display for MarketCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketCalendar::Joint(members) => {
                let names: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(","))
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

impl FromStr for MarketCalendar {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MarketCalendar {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MarketCalendar> for String {
    fn from(c: MarketCalendar) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_weekend_calendar() {
        let cal = WeekendCalendar;
        assert!(cal.is_business_day(d(2025, 1, 6)));
        assert!(!cal.is_business_day(d(2025, 1, 4)));
        assert!(!cal.is_business_day(d(2025, 1, 5)));
    }

    #[test]
    fn test_add_business_days() {
        let result = WeekendCalendar.add_business_days(d(2025, 1, 3), 1);
        assert_eq!(result, d(2025, 1, 6));
    }

    #[test]
    fn test_business_days_between() {
        assert_eq!(WeekendCalendar.business_days_between(d(2025, 1, 6), d(2025, 1, 10)), 4);
    }

    #[test]
    fn test_advance_months_modified_following() {
        let cal = MarketCalendar::Target;
        // 2024-01-31 + 1M = 2024-02-29 (Thursday)
        let out = cal
            .advance(d(2024, 1, 31), Period::months(1), BusinessDayConvention::ModifiedFollowing, false)
            .unwrap();
        assert_eq!(out, d(2024, 2, 29));
        // 2024-03-29 is Good Friday: spot + 2 business days skips Easter Monday
        let spot = cal
            .advance(d(2024, 3, 28), Period::days(2), BusinessDayConvention::Following, false)
            .unwrap();
        assert_eq!(spot, d(2024, 4, 3));
    }

    #[test]
    fn test_advance_end_of_month() {
        let cal = MarketCalendar::WeekendsOnly;
        // Friday 2024-05-31 is the last business day of May
        let out = cal
            .advance(d(2024, 5, 31), Period::months(1), BusinessDayConvention::ModifiedFollowing, true)
            .unwrap();
        // 2024-06-30 is a Sunday, last business day is Friday 28 June
        assert_eq!(out, d(2024, 6, 28));
    }

    #[test]
    fn test_joint_calendar_parse() {
        let cal: MarketCalendar = "TARGET,US".parse().unwrap();
        assert_eq!(
            cal,
            MarketCalendar::Joint(vec![MarketCalendar::Target, MarketCalendar::UnitedStates])
        );
        // Independence Day is a TARGET business day but not a joint one
        assert!(!cal.is_business_day(d(2024, 7, 4)));
        assert_eq!(cal.to_string(), "TARGET,US");
        assert!("Mars".parse::<MarketCalendar>().is_err());
    }

    #[test]
    fn test_boxed_joint_calendar() {
        let joint = JointCalendar::new(vec![Box::new(TargetCalendar), Box::new(UkCalendar)]);
        assert_eq!(joint.name(), "TARGET,UK");
        assert!(!joint.is_business_day(d(2024, 8, 26)));
    }
}

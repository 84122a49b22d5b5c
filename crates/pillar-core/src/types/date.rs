//! Date type for market-data calculations.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use super::period::{Period, TimeUnit};
use crate::error::{CoreError, CoreResult};

/// A calendar date.
///
/// Newtype wrapper around `chrono::NaiveDate` with the month and period
/// arithmetic used when rolling instrument schedules.
///
/// # Example
///
/// ```rust
/// use pillar_core::types::Date;
///
/// let date = Date::from_ymd(2025, 6, 15).unwrap();
/// let future = date.add_months(6).unwrap();
/// assert_eq!(future.year(), 2025);
/// assert_eq!(future.month(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from `YYYY-MM-DD` or `YYYYMMDD`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the string is not a valid date.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Checks if the year is a leap year.
    #[must_use]
    pub fn is_leap_year(&self) -> bool {
        self.0.leap_year()
    }

    /// Returns the number of days in the date's month.
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    /// Adds a number of days to the date.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Adds a number of months to the date.
    ///
    /// If the resulting day would be invalid (e.g., Jan 31 + 1 month),
    /// it rolls back to the last valid day of the month.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let total_months = self.year() * 12 + self.month() as i32 - 1 + months;
        let new_year = total_months.div_euclid(12);
        let new_month = (total_months.rem_euclid(12) + 1) as u32;

        let max_day = days_in_month(new_year, new_month);
        let new_day = self.day().min(max_day);

        Self::from_ymd(new_year, new_month, new_day)
    }

    /// Adds a number of years to the date.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is invalid.
    pub fn add_years(&self, years: i32) -> CoreResult<Self> {
        self.add_months(years * 12)
    }

    /// Adds a period without any business-day adjustment.
    ///
    /// With `end_of_month` set, a month-end start date maps to the month end
    /// of the target month for month and year periods.
    pub fn add_period(&self, period: Period, end_of_month: bool) -> CoreResult<Self> {
        let n = period.length();
        let shifted = match period.unit() {
            TimeUnit::Days => self.add_days(i64::from(n)),
            TimeUnit::Weeks => self.add_days(7 * i64::from(n)),
            TimeUnit::Months => self.add_months(n)?,
            TimeUnit::Years => self.add_years(n)?,
        };
        if end_of_month
            && self.is_end_of_month()
            && matches!(period.unit(), TimeUnit::Months | TimeUnit::Years)
        {
            return Ok(shifted.end_of_month());
        }
        Ok(shifted)
    }

    /// Calculates the number of calendar days from `self` to `other`.
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Returns the underlying `NaiveDate`.
    #[must_use]
    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the end of month for the current date.
    #[must_use]
    pub fn end_of_month(&self) -> Self {
        self.add_days(i64::from(self.days_in_month() - self.day()))
    }

    /// Returns the first day of the month.
    #[must_use]
    pub fn start_of_month(&self) -> Self {
        self.add_days(1 - i64::from(self.day()))
    }

    /// Checks if the date is the end of month.
    #[must_use]
    pub fn is_end_of_month(&self) -> bool {
        self.day() == self.days_in_month()
    }

    /// Returns the day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Checks if the date is a weekend (Saturday or Sunday).
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The `n`-th (1-based) given weekday of a month.
    pub fn nth_weekday(n: u32, weekday: Weekday, year: i32, month: u32) -> CoreResult<Self> {
        if n == 0 || n > 5 {
            return Err(CoreError::invalid_date(format!(
                "weekday occurrence {n} outside 1..=5"
            )));
        }
        let first = Self::from_ymd(year, month, 1)?;
        let offset = (7 + weekday.num_days_from_monday() as i64
            - first.weekday().num_days_from_monday() as i64)
            % 7;
        let date = first.add_days(offset + 7 * (i64::from(n) - 1));
        if date.month() != month {
            return Err(CoreError::invalid_date(format!(
                "no {n}th {weekday} in {year}-{month:02}"
            )));
        }
        Ok(date)
    }

    /// The last given weekday of a month.
    pub fn last_weekday(weekday: Weekday, year: i32, month: u32) -> CoreResult<Self> {
        let last = Self::from_ymd(year, month, days_in_month(year, month))?;
        let back = (7 + last.weekday().num_days_from_monday() as i64
            - weekday.num_days_from_monday() as i64)
            % 7;
        Ok(last.add_days(-back))
    }

    /// Serial day number relative to 1970-01-01, useful as an interpolation axis.
    #[must_use]
    pub fn serial(&self) -> i64 {
        i64::from(self.0.num_days_from_ce()) - 719_163
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl From<Date> for NaiveDate {
    fn from(date: Date) -> Self {
        date.0
    }
}

impl Add<i64> for Date {
    type Output = Self;

    fn add(self, days: i64) -> Self::Output {
        self.add_days(days)
    }
}

impl Sub<i64> for Date {
    type Output = Self;

    fn sub(self, days: i64) -> Self::Output {
        self.add_days(-days)
    }
}

impl Sub<Date> for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    fn sub(self, other: Date) -> Self::Output {
        other.days_between(&self)
    }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_creation() {
        let date = Date::from_ymd(2025, 6, 15).unwrap();
        assert_eq!(date.year(), 2025);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_invalid_date() {
        assert!(Date::from_ymd(2025, 2, 30).is_err());
        assert!(Date::from_ymd(2025, 13, 1).is_err());
    }

    #[test]
    fn test_add_months() {
        let date = Date::from_ymd(2025, 1, 31).unwrap();
        let result = date.add_months(1).unwrap();
        assert_eq!(result.month(), 2);
        assert_eq!(result.day(), 28);

        let back = Date::from_ymd(2025, 1, 15).unwrap().add_months(-2).unwrap();
        assert_eq!(back, Date::from_ymd(2024, 11, 15).unwrap());
    }

    #[test]
    fn test_add_period_end_of_month() {
        let date = Date::from_ymd(2024, 2, 29).unwrap();
        let p: Period = "1M".parse().unwrap();
        assert_eq!(
            date.add_period(p, true).unwrap(),
            Date::from_ymd(2024, 3, 31).unwrap()
        );
        assert_eq!(
            date.add_period(p, false).unwrap(),
            Date::from_ymd(2024, 3, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(
            Date::parse("2025-06-15").unwrap(),
            Date::parse("20250615").unwrap()
        );
        assert!(Date::parse("15/06/2025").is_err());
    }

    #[test]
    fn test_nth_and_last_weekday() {
        // third Wednesday of March 2024
        let imm = Date::nth_weekday(3, Weekday::Wed, 2024, 3).unwrap();
        assert_eq!(imm, Date::from_ymd(2024, 3, 20).unwrap());
        let last_fri = Date::last_weekday(Weekday::Fri, 2024, 5).unwrap();
        assert_eq!(last_fri, Date::from_ymd(2024, 5, 31).unwrap());
        assert!(Date::nth_weekday(5, Weekday::Mon, 2024, 2).is_err());
    }

    #[test]
    fn test_end_of_month() {
        let date = Date::from_ymd(2024, 2, 10).unwrap();
        assert_eq!(date.end_of_month(), Date::from_ymd(2024, 2, 29).unwrap());
        assert_eq!(date.start_of_month(), Date::from_ymd(2024, 2, 1).unwrap());
        assert!(date.end_of_month().is_end_of_month());
    }

    #[test]
    fn test_date_arithmetic_operators() {
        let d1 = Date::from_ymd(2025, 1, 1).unwrap();
        let d2 = d1 + 10;
        assert_eq!(d2.day(), 11);
        let d3 = d2 - 5;
        assert_eq!(d3.day(), 6);
        assert_eq!(d2 - d1, 10);
    }

    #[test]
    fn test_serial() {
        assert_eq!(Date::from_ymd(1970, 1, 1).unwrap().serial(), 0);
        assert_eq!(Date::from_ymd(1970, 1, 31).unwrap().serial(), 30);
    }

    #[test]
    fn test_serde() {
        let date = Date::from_ymd(2025, 6, 15).unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2025-06-15\"");
        let parsed: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(date, parsed);
    }
}

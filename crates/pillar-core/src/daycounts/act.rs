//! Actual day count conventions.

use super::DayCount;
use crate::types::Date;

/// Actual/360 day count convention.
///
/// $$\text{Year Fraction} = \frac{\text{Actual Days}}{360}$$
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "A360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        start.days_between(&end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/365 Fixed day count convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "A365"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        start.days_between(&end) as f64 / 365.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/Actual ISDA day count convention.
///
/// Splits the period into the portions falling in leap and non-leap years.
///
/// $$\text{Year Fraction} = \frac{\text{Days in non-leap year}}{365} + \frac{\text{Days in leap year}}{366}$$
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ActActISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        if start == end {
            return 0.0;
        }
        if start > end {
            return -self.year_fraction(end, start);
        }

        let basis = |d: &Date| if d.is_leap_year() { 366.0 } else { 365.0 };
        if start.year() == end.year() {
            return start.days_between(&end) as f64 / basis(&start);
        }

        let (Ok(next_year), Ok(end_year)) = (
            Date::from_ymd(start.year() + 1, 1, 1),
            Date::from_ymd(end.year(), 1, 1),
        ) else {
            return start.days_between(&end) as f64 / 365.0;
        };
        start.days_between(&next_year) as f64 / basis(&start)
            + f64::from(end.year() - start.year() - 1)
            + end_year.days_between(&end) as f64 / basis(&end)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_act360_basic() {
        let start = Date::from_ymd(2025, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 4, 1).unwrap();
        assert_eq!(Act360.day_count(start, end), 90);
        assert_relative_eq!(Act360.year_fraction(start, end), 0.25);
    }

    #[test]
    fn test_act365_negative() {
        let start = Date::from_ymd(2025, 3, 1).unwrap();
        let end = Date::from_ymd(2025, 1, 1).unwrap();
        assert_relative_eq!(Act365Fixed.year_fraction(start, end), -59.0 / 365.0);
    }

    #[test]
    fn test_actact_isda_across_leap_year() {
        let start = Date::from_ymd(2023, 11, 1).unwrap();
        let end = Date::from_ymd(2024, 3, 1).unwrap();
        // 61 days in 2023, 60 days in 2024
        assert_relative_eq!(
            ActActIsda.year_fraction(start, end),
            61.0 / 365.0 + 60.0 / 366.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            ActActIsda.year_fraction(end, start),
            -(61.0 / 365.0 + 60.0 / 366.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_actact_isda_whole_years() {
        let start = Date::from_ymd(2023, 1, 1).unwrap();
        let end = Date::from_ymd(2026, 1, 1).unwrap();
        assert_relative_eq!(ActActIsda.year_fraction(start, end), 3.0, epsilon = 1e-14);
    }
}

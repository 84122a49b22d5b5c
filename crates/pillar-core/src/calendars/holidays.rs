//! Rule-based holiday calendars: TARGET, UK and US.

use chrono::Weekday;

use super::Calendar;
use crate::types::Date;

/// Easter Sunday as (month, day) by the anonymous Gregorian algorithm.
pub fn easter_sunday(year: i32) -> (u32, u32) {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    (month as u32, day as u32)
}

/// Offset in days of `date` from Easter Sunday of its year.
fn easter_offset(date: Date) -> i64 {
    let (m, d) = easter_sunday(date.year());
    match Date::from_ymd(date.year(), m, d) {
        Ok(easter) => easter.days_between(&date),
        Err(_) => i64::MAX,
    }
}

fn is_nth_weekday(date: Date, weekday: Weekday, n: u32) -> bool {
    date.weekday() == weekday && (date.day() - 1) / 7 + 1 == n
}

fn is_last_weekday(date: Date, weekday: Weekday) -> bool {
    date.weekday() == weekday && date.day() + 7 > date.days_in_month()
}

/// TARGET calendar for Euro settlement.
///
/// Holidays: New Year's Day, Good Friday, Easter Monday, Labour Day,
/// Christmas Day and 26 December. Weekend holidays are not moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetCalendar;

impl Calendar for TargetCalendar {
    fn name(&self) -> &str {
        "TARGET"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        let fixed = matches!(
            (date.month(), date.day()),
            (1, 1) | (5, 1) | (12, 25) | (12, 26)
        );
        let easter = matches!(easter_offset(date), -2 | 1);
        !(fixed || easter)
    }
}

/// United Kingdom settlement calendar (England and Wales bank holidays).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UkCalendar;

impl Calendar for UkCalendar {
    fn name(&self) -> &str {
        "UK"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        let (y, m, d, w) = (date.year(), date.month(), date.day(), date.weekday());
        let holiday =
            // New Year's Day, moved to Monday
            (m == 1 && (d == 1 || ((d == 2 || d == 3) && w == Weekday::Mon)))
            // Good Friday, Easter Monday
            || matches!(easter_offset(date), -2 | 1)
            // Early May bank holiday (moved to 8 May in 2020)
            || (m == 5 && is_nth_weekday(date, Weekday::Mon, 1) && y != 2020)
            || (y == 2020 && m == 5 && d == 8)
            // Spring bank holiday, with jubilee years moved to June
            || (m == 5 && is_last_weekday(date, Weekday::Mon) && !matches!(y, 2002 | 2012 | 2022))
            || (y == 2002 && m == 6 && (d == 3 || d == 4))
            || (y == 2012 && m == 6 && (d == 4 || d == 5))
            || (y == 2022 && m == 6 && (d == 2 || d == 3))
            // Summer bank holiday
            || (m == 8 && is_last_weekday(date, Weekday::Mon))
            // Christmas and Boxing Day, moved to Monday/Tuesday
            || (m == 12 && (d == 25 || (d == 27 && matches!(w, Weekday::Mon | Weekday::Tue))))
            || (m == 12 && (d == 26 || (d == 28 && matches!(w, Weekday::Mon | Weekday::Tue))))
            // one-off holidays
            || (y == 2011 && m == 4 && d == 29)
            || (y == 2022 && m == 9 && d == 19)
            || (y == 2023 && m == 5 && d == 8);
        !holiday
    }
}

/// United States settlement calendar.
///
/// Federal holidays with Saturday holidays observed on Friday and Sunday
/// holidays observed on Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsCalendar;

impl UsCalendar {
    fn observed_fixed(date: Date, month: u32, day: u32) -> bool {
        let (m, d, w) = (date.month(), date.day(), date.weekday());
        if m == month && d == day {
            return true;
        }
        let Ok(actual) = Date::from_ymd(date.year(), month, day) else {
            return false;
        };
        match actual.weekday() {
            Weekday::Sat => date == actual.add_days(-1) && w == Weekday::Fri,
            Weekday::Sun => date == actual.add_days(1) && w == Weekday::Mon,
            _ => false,
        }
    }
}

impl Calendar for UsCalendar {
    fn name(&self) -> &str {
        "US"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        let (y, m) = (date.year(), date.month());
        // New Year's Day observed on a preceding Friday falls in December
        let new_year = Self::observed_fixed(date, 1, 1)
            || (m == 12 && date.day() == 31 && date.weekday() == Weekday::Fri);
        let holiday = new_year
            || (m == 1 && y >= 1983 && is_nth_weekday(date, Weekday::Mon, 3))
            || (m == 2 && is_nth_weekday(date, Weekday::Mon, 3))
            || (m == 5 && is_last_weekday(date, Weekday::Mon))
            || (y >= 2022 && Self::observed_fixed(date, 6, 19))
            || Self::observed_fixed(date, 7, 4)
            || (m == 9 && is_nth_weekday(date, Weekday::Mon, 1))
            || (m == 10 && is_nth_weekday(date, Weekday::Mon, 2))
            || Self::observed_fixed(date, 11, 11)
            || (m == 11 && is_nth_weekday(date, Weekday::Thu, 4))
            || Self::observed_fixed(date, 12, 25);
        !holiday
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_easter() {
        assert_eq!(easter_sunday(2024), (3, 31));
        assert_eq!(easter_sunday(2025), (4, 20));
        assert_eq!(easter_sunday(2000), (4, 23));
    }

    #[test]
    fn test_target_holidays() {
        let cal = TargetCalendar;
        assert!(!cal.is_business_day(d(2024, 3, 29))); // Good Friday
        assert!(!cal.is_business_day(d(2024, 4, 1))); // Easter Monday
        assert!(!cal.is_business_day(d(2024, 5, 1)));
        assert!(!cal.is_business_day(d(2024, 12, 26)));
        assert!(cal.is_business_day(d(2024, 4, 2)));
    }

    #[test]
    fn test_uk_holidays() {
        let cal = UkCalendar;
        assert!(!cal.is_business_day(d(2024, 5, 6))); // early May
        assert!(!cal.is_business_day(d(2024, 5, 27))); // spring
        assert!(!cal.is_business_day(d(2024, 8, 26))); // summer
        assert!(!cal.is_business_day(d(2021, 12, 27))); // Christmas moved
        assert!(!cal.is_business_day(d(2021, 12, 28))); // Boxing Day moved
        assert!(cal.is_business_day(d(2024, 5, 7)));
    }

    #[test]
    fn test_us_holidays() {
        let cal = UsCalendar;
        assert!(!cal.is_business_day(d(2024, 7, 4)));
        assert!(!cal.is_business_day(d(2024, 11, 28))); // Thanksgiving
        assert!(!cal.is_business_day(d(2021, 12, 31))); // New Year observed
        assert!(!cal.is_business_day(d(2023, 6, 19))); // Juneteenth
        assert!(!cal.is_business_day(d(2020, 7, 3))); // July 4th on Saturday
        assert!(cal.is_business_day(d(2024, 7, 5)));
    }
}

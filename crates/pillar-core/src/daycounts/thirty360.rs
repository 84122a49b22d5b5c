//! 30/360 day count conventions.

use super::DayCount;
use crate::types::Date;

fn thirty_days(y1: i32, m1: u32, d1: u32, y2: i32, m2: u32, d2: u32) -> i64 {
    360 * i64::from(y2 - y1) + 30 * (i64::from(m2) - i64::from(m1)) + i64::from(d2) - i64::from(d1)
}

/// 30/360 bond basis (US).
///
/// D1 = 31 becomes 30; D2 = 31 becomes 30 when D1 is 30 or 31.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360;

impl DayCount for Thirty360 {
    fn name(&self) -> &'static str {
        "30/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = start.day().min(30);
        let d2 = if d1 == 30 { end.day().min(30) } else { end.day() };
        thirty_days(start.year(), start.month(), d1, end.year(), end.month(), d2)
    }
}

/// 30E/360 Eurobond basis: both day-of-month values capped at 30.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        thirty_days(
            start.year(),
            start.month(),
            start.day().min(30),
            end.year(),
            end.month(),
            end.day().min(30),
        )
    }
}

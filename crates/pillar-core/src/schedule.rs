//! Schedule generation for swap and bond legs.
//!
//! Dates are rolled backward from the termination date by multiples of
//! the tenor (a short front stub absorbs any remainder), or forward from
//! the effective date when the rule asks for it.
//!
//! # Example
//!
//! ```rust
//! use pillar_core::schedule::{Schedule, ScheduleConfig};
//! use pillar_core::types::{Date, Period};
//!
//! let config = ScheduleConfig::new(
//!     Date::from_ymd(2024, 1, 15).unwrap(),
//!     Date::from_ymd(2026, 1, 15).unwrap(),
//!     Period::months(6),
//! );
//! let schedule = Schedule::generate(&config).unwrap();
//! assert_eq!(schedule.dates().len(), 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::calendars::{BusinessDayConvention, Calendar, MarketCalendar};
use crate::error::{CoreError, CoreResult};
use crate::types::{Date, Period, TimeUnit};

/// Direction in which schedule dates are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateGenerationRule {
    /// Roll back from the termination date; stub at the front.
    #[default]
    Backward,
    /// Roll forward from the effective date; stub at the back.
    Forward,
}

/// Configuration for schedule generation.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Effective (accrual start) date.
    pub start_date: Date,
    /// Termination date.
    pub end_date: Date,
    /// Length of a regular period.
    pub tenor: Period,
    /// Calendar used to adjust the rolled dates.
    pub calendar: MarketCalendar,
    /// Adjustment of intermediate dates.
    pub convention: BusinessDayConvention,
    /// Adjustment of the termination date.
    pub termination_convention: BusinessDayConvention,
    /// End-of-month rule.
    pub end_of_month: bool,
    /// Generation direction.
    pub rule: DateGenerationRule,
}

impl ScheduleConfig {
    /// Creates a configuration with weekend-only calendar and Modified Following.
    #[must_use]
    pub fn new(start_date: Date, end_date: Date, tenor: Period) -> Self {
        Self {
            start_date,
            end_date,
            tenor,
            calendar: MarketCalendar::WeekendsOnly,
            convention: BusinessDayConvention::ModifiedFollowing,
            termination_convention: BusinessDayConvention::ModifiedFollowing,
            end_of_month: false,
            rule: DateGenerationRule::Backward,
        }
    }

    /// Sets the calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: MarketCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the business day convention for all dates.
    #[must_use]
    pub fn with_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.convention = convention;
        self.termination_convention = convention;
        self
    }

    /// Sets the end-of-month rule.
    #[must_use]
    pub fn with_end_of_month(mut self, eom: bool) -> Self {
        self.end_of_month = eom;
        self
    }

    /// Sets the generation direction.
    #[must_use]
    pub fn with_rule(mut self, rule: DateGenerationRule) -> Self {
        self.rule = rule;
        self
    }
}

/// An adjusted date schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    unadjusted: Vec<Date>,
    adjusted: Vec<Date>,
}

impl Schedule {
    /// Generates a schedule.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the end date is not after the
    /// start date or the tenor is not positive.
    pub fn generate(config: &ScheduleConfig) -> CoreResult<Self> {
        if config.end_date <= config.start_date {
            return Err(CoreError::invalid_date(format!(
                "schedule end {} must be after start {}",
                config.end_date, config.start_date
            )));
        }
        if config.tenor.length() <= 0 {
            return Err(CoreError::invalid_period(
                config.tenor.to_string(),
                "schedule tenor must be positive",
            ));
        }

        let unadjusted = match config.rule {
            DateGenerationRule::Backward => Self::roll_backward(config)?,
            DateGenerationRule::Forward => Self::roll_forward(config)?,
        };

        let last = unadjusted.len() - 1;
        let mut adjusted: Vec<Date> = unadjusted
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let conv = if i == last {
                    config.termination_convention
                } else {
                    config.convention
                };
                config.calendar.adjust(*d, conv)
            })
            .collect();
        adjusted.dedup();

        Ok(Self {
            unadjusted,
            adjusted,
        })
    }

    fn shift(date: Date, tenor: Period, k: i32, eom: bool) -> CoreResult<Date> {
        let step = Period::new(tenor.length() * k, tenor.unit());
        let eom = eom && matches!(tenor.unit(), TimeUnit::Months | TimeUnit::Years);
        date.add_period(step, eom)
    }

    fn roll_backward(config: &ScheduleConfig) -> CoreResult<Vec<Date>> {
        let mut dates = vec![config.end_date];
        let mut k = 1;
        loop {
            let d = Self::shift(config.end_date, config.tenor, -k, config.end_of_month)?;
            if d <= config.start_date {
                break;
            }
            dates.push(d);
            k += 1;
        }
        dates.push(config.start_date);
        dates.reverse();
        Ok(dates)
    }

    fn roll_forward(config: &ScheduleConfig) -> CoreResult<Vec<Date>> {
        let mut dates = vec![config.start_date];
        let mut k = 1;
        loop {
            let d = Self::shift(config.start_date, config.tenor, k, config.end_of_month)?;
            if d >= config.end_date {
                break;
            }
            dates.push(d);
            k += 1;
        }
        dates.push(config.end_date);
        Ok(dates)
    }

    /// Adjusted schedule dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.adjusted
    }

    /// Unadjusted schedule dates.
    #[must_use]
    pub fn unadjusted_dates(&self) -> &[Date] {
        &self.unadjusted
    }

    /// Accrual periods over adjusted dates.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.adjusted.windows(2).map(|w| (w[0], w[1]))
    }

    /// Last adjusted date.
    #[must_use]
    pub fn end(&self) -> Date {
        self.adjusted[self.adjusted.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_regular_semiannual() {
        let config = ScheduleConfig::new(d(2024, 1, 15), d(2026, 1, 15), Period::months(6));
        let s = Schedule::generate(&config).unwrap();
        assert_eq!(
            s.unadjusted_dates(),
            &[d(2024, 1, 15), d(2024, 7, 15), d(2025, 1, 15), d(2025, 7, 15), d(2026, 1, 15)]
        );
        // 2025-01-15 is a Wednesday, nothing moves
        assert_eq!(s.dates()[2], d(2025, 1, 15));
    }

    #[test]
    fn test_front_stub() {
        let config = ScheduleConfig::new(d(2024, 3, 1), d(2025, 1, 15), Period::months(6));
        let s = Schedule::generate(&config).unwrap();
        assert_eq!(
            s.unadjusted_dates(),
            &[d(2024, 3, 1), d(2024, 7, 15), d(2025, 1, 15)]
        );
    }

    #[test]
    fn test_forward_rule_back_stub() {
        let config = ScheduleConfig::new(d(2024, 3, 1), d(2025, 1, 15), Period::months(6))
            .with_rule(DateGenerationRule::Forward);
        let s = Schedule::generate(&config).unwrap();
        assert_eq!(
            s.unadjusted_dates(),
            &[d(2024, 3, 1), d(2024, 9, 1), d(2025, 1, 15)]
        );
        // 2024-09-01 is a Sunday
        assert_eq!(s.dates()[1], d(2024, 9, 2));
    }

    #[test]
    fn test_weekend_adjustment() {
        // 2024-06-15 is a Saturday
        let config = ScheduleConfig::new(d(2024, 3, 15), d(2024, 6, 15), Period::months(3));
        let s = Schedule::generate(&config).unwrap();
        assert_eq!(s.end(), d(2024, 6, 17));
    }

    #[test]
    fn test_invalid_inputs() {
        let config = ScheduleConfig::new(d(2025, 1, 1), d(2024, 1, 1), Period::months(6));
        assert!(Schedule::generate(&config).is_err());
        let config = ScheduleConfig::new(d(2024, 1, 1), d(2025, 1, 1), Period::months(0));
        assert!(Schedule::generate(&config).is_err());
    }
}

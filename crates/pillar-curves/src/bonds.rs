//! Fixed-rate bond cashflows for fitted and yield-shifted curves.

use pillar_core::calendars::Calendar;
use pillar_core::daycounts::DayCountConvention;
use pillar_core::schedule::{Schedule, ScheduleConfig};
use pillar_core::types::Frequency;
use pillar_core::{Date, Period};
use pillar_market::config::BondDefinition;

use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// Remaining cashflows of a bond seen from its settlement date.
///
/// Amounts are per 100 notional. Coupons accrue on the adjusted schedule
/// with the bond's day count.
#[derive(Debug, Clone, PartialEq)]
pub struct BondCashflows {
    security_id: String,
    settlement: Date,
    frequency: Frequency,
    cashflows: Vec<(Date, f64)>,
    accrued: f64,
}

impl BondCashflows {
    /// Builds the cashflows of `bond` for trades on `asof`.
    ///
    /// # Errors
    ///
    /// Fails when the bond has matured by settlement or its schedule cannot
    /// be generated.
    pub fn new(bond: &BondDefinition, asof: Date) -> CurveResult<Self> {
        let settlement = bond.calendar.advance(
            asof,
            Period::days(bond.settlement_days as i32),
            bond.convention,
            false,
        )?;
        if bond.maturity <= settlement {
            return Err(CurveError::invalid_data(format!(
                "bond {} matures on {} before settlement {}",
                bond.security_id, bond.maturity, settlement
            )));
        }
        let tenor = bond.frequency.period().unwrap_or(Period::years(1));
        let start = match bond.issue_date {
            Some(issue) if issue < bond.maturity => issue,
            _ => {
                let mut start = bond.maturity;
                let mut k = 1;
                while start > settlement {
                    start = bond
                        .maturity
                        .add_period(Period::new(-tenor.length() * k, tenor.unit()), false)?;
                    k += 1;
                }
                start
            }
        };
        let schedule = Schedule::generate(
            &ScheduleConfig::new(start, bond.maturity, tenor)
                .with_calendar(bond.calendar.clone())
                .with_convention(bond.convention),
        )?;

        let mut cashflows = Vec::new();
        let mut accrued = 0.0;
        for (accrual_start, accrual_end) in schedule.periods() {
            let amount = bond.coupon * 100.0 * bond.day_count.year_fraction(accrual_start, accrual_end);
            if accrual_end > settlement {
                cashflows.push((accrual_end, amount));
            }
            if accrual_start <= settlement && settlement < accrual_end {
                accrued = bond.coupon * 100.0 * bond.day_count.year_fraction(accrual_start, settlement);
            }
        }
        let redemption_date = schedule.end();
        cashflows.push((redemption_date, bond.redemption));

        Ok(Self {
            security_id: bond.security_id.clone(),
            settlement,
            frequency: bond.frequency,
            cashflows,
            accrued,
        })
    }

    /// Security id.
    #[must_use]
    pub fn security_id(&self) -> &str {
        &self.security_id
    }

    /// Settlement date.
    #[must_use]
    pub fn settlement(&self) -> Date {
        self.settlement
    }

    /// Remaining (payment date, amount) pairs.
    #[must_use]
    pub fn cashflows(&self) -> &[(Date, f64)] {
        &self.cashflows
    }

    /// Accrued interest at settlement.
    #[must_use]
    pub fn accrued(&self) -> f64 {
        self.accrued
    }

    /// Last payment date.
    #[must_use]
    pub fn maturity(&self) -> Date {
        self.cashflows.last().map_or(self.settlement, |(d, _)| *d)
    }

    /// Dirty price discounted on a curve, forward to settlement.
    pub fn dirty_price(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let df_settle = curve.discount_t(curve.time_from_reference(self.settlement), true)?;
        let mut pv = 0.0;
        for (date, amount) in &self.cashflows {
            pv += amount * curve.discount_t(curve.time_from_reference(*date), true)?;
        }
        Ok(pv / df_settle)
    }

    /// Clean price on a curve.
    pub fn clean_price(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        Ok(self.dirty_price(curve)? - self.accrued)
    }

    /// Times from settlement, in the given curve's day count.
    fn times(&self, curve_dc: DayCountConvention) -> Vec<f64> {
        self.cashflows
            .iter()
            .map(|(d, _)| curve_dc.year_fraction(self.settlement, *d))
            .collect()
    }

    fn periods_per_year(&self) -> f64 {
        f64::from(self.frequency.periods_per_year().max(1))
    }

    /// Dirty price at a yield compounded at the coupon frequency.
    #[must_use]
    pub fn dirty_price_from_yield(&self, yield_rate: f64, dc: DayCountConvention) -> f64 {
        let f = self.periods_per_year();
        let base = 1.0 + yield_rate / f;
        self.times(dc)
            .iter()
            .zip(&self.cashflows)
            .map(|(t, (_, amount))| amount * base.powf(-f * t))
            .sum()
    }

    /// Macaulay duration at a yield compounded at the coupon frequency.
    #[must_use]
    pub fn macaulay_duration(&self, yield_rate: f64, dc: DayCountConvention) -> f64 {
        let f = self.periods_per_year();
        let base = 1.0 + yield_rate / f;
        let mut pv = 0.0;
        let mut weighted = 0.0;
        for (t, (_, amount)) in self.times(dc).iter().zip(&self.cashflows) {
            let v = amount * base.powf(-f * t);
            pv += v;
            weighted += t * v;
        }
        if pv > 0.0 {
            weighted / pv
        } else {
            0.0
        }
    }

    /// Continuously compounded equivalent of a yield compounded at the
    /// coupon frequency.
    #[must_use]
    pub fn continuous_yield(&self, yield_rate: f64) -> f64 {
        let f = self.periods_per_year();
        f * (1.0 + yield_rate / f).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};

    fn bond() -> BondDefinition {
        BondDefinition {
            security_id: "B5Y".into(),
            issue_date: None,
            maturity: Date::from_ymd(2029, 1, 15).unwrap(),
            coupon: 0.04,
            frequency: Frequency::Annual,
            day_count: DayCountConvention::Thirty360,
            calendar: MarketCalendar::Null,
            convention: BusinessDayConvention::Unadjusted,
            settlement_days: 0,
            redemption: 100.0,
        }
    }

    #[test]
    fn test_cashflows_on_coupon_date() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let cf = BondCashflows::new(&bond(), asof).unwrap();
        assert_eq!(cf.settlement(), asof);
        assert_eq!(cf.accrued(), 0.0);
        // five coupons and the redemption
        assert_eq!(cf.cashflows().len(), 6);
        assert_relative_eq!(cf.cashflows()[0].1, 4.0, epsilon = 1e-12);
        assert_eq!(cf.maturity(), Date::from_ymd(2029, 1, 15).unwrap());
    }

    #[test]
    fn test_accrued_between_coupons() {
        let asof = Date::from_ymd(2024, 7, 15).unwrap();
        let cf = BondCashflows::new(&bond(), asof).unwrap();
        assert_relative_eq!(cf.accrued(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_par_yield_prices_par() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let cf = BondCashflows::new(&bond(), asof).unwrap();
        let price = cf.dirty_price_from_yield(0.04, DayCountConvention::Thirty360);
        assert_relative_eq!(price, 100.0, epsilon = 1e-9);
        let duration = cf.macaulay_duration(0.04, DayCountConvention::Thirty360);
        assert!(duration > 4.0 && duration < 5.0);

        let curve = FlatForwardCurve::new(asof, cf.continuous_yield(0.04), DayCountConvention::Thirty360);
        assert_relative_eq!(cf.dirty_price(&curve).unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_matured_bond_rejected() {
        let asof = Date::from_ymd(2030, 1, 15).unwrap();
        assert!(BondCashflows::new(&bond(), asof).is_err());
    }
}

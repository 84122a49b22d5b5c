//! Constant volatility.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use crate::error::VolResult;
use crate::term_structure::BlackVolTermStructure;

/// Horizon of a constant surface, in days.
const CONSTANT_HORIZON_DAYS: i64 = 100 * 365;

/// The same volatility at every expiry and strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVol {
    reference_date: Date,
    vol: f64,
    day_counter: DayCountConvention,
}

impl ConstantVol {
    /// Creates a constant surface.
    #[must_use]
    pub fn new(reference_date: Date, vol: f64, day_counter: DayCountConvention) -> Self {
        Self {
            reference_date,
            vol,
            day_counter,
        }
    }

    /// The volatility.
    #[must_use]
    pub fn vol(&self) -> f64 {
        self.vol
    }
}

impl BlackVolTermStructure for ConstantVol {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_date(&self) -> Date {
        self.reference_date.add_days(CONSTANT_HORIZON_DAYS)
    }

    fn allows_extrapolation(&self) -> bool {
        true
    }

    fn black_vol_impl(&self, _t: f64, _strike: f64) -> VolResult<f64> {
        Ok(self.vol)
    }

    fn is_strike_dependent(&self) -> bool {
        false
    }

    fn atm_vol(&self, _t: f64) -> VolResult<f64> {
        Ok(self.vol)
    }
}

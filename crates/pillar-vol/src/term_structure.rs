//! The Black volatility term structure trait.
//!
//! [`BlackVolTermStructure`] is what every surface in this crate
//! implements. Implementors supply the volatility at a time and strike
//! already checked against the surface range; dates, variances and range
//! checks follow from it.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use crate::error::{VolError, VolResult};

/// Times within this distance of a boundary are treated as on it.
pub(crate) const TIME_EPSILON: f64 = 1.0e-12;

/// A Black volatility surface with a fixed reference date.
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::Date;
/// use pillar_vol::{BlackVolTermStructure, VolResult};
///
/// #[derive(Debug)]
/// struct Flat(Date);
///
/// impl BlackVolTermStructure for Flat {
///     fn reference_date(&self) -> Date { self.0 }
///     fn day_counter(&self) -> DayCountConvention { DayCountConvention::Act365Fixed }
///     fn max_date(&self) -> Date { self.0.add_days(3650) }
///     fn allows_extrapolation(&self) -> bool { false }
///     fn black_vol_impl(&self, _t: f64, _strike: f64) -> VolResult<f64> { Ok(0.2) }
/// }
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let surface = Flat(asof);
/// let variance = surface.black_variance(asof.add_days(365), 100.0).unwrap();
/// assert!((variance - 0.04).abs() < 1e-12);
/// assert!(surface.black_vol(asof.add_days(4000), 100.0).is_err());
/// ```
pub trait BlackVolTermStructure: Send + Sync + fmt::Debug {
    /// Date at which option time is zero.
    fn reference_date(&self) -> Date;

    /// Day count turning expiry dates into option times.
    fn day_counter(&self) -> DayCountConvention;

    /// Last date covered by market data.
    fn max_date(&self) -> Date;

    /// True when the surface may be evaluated beyond [`max_date`](Self::max_date).
    fn allows_extrapolation(&self) -> bool;

    /// Volatility at time `t >= 0`, range already checked.
    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64>;

    /// False when the volatility depends on expiry only.
    fn is_strike_dependent(&self) -> bool {
        true
    }

    /// Lowest strike covered by market data.
    fn min_strike(&self) -> f64 {
        0.0
    }

    /// Highest strike covered by market data.
    fn max_strike(&self) -> f64 {
        f64::MAX
    }

    /// At-the-money volatility for surfaces that define an ATM level.
    ///
    /// # Errors
    ///
    /// The default implementation fails: most strike surfaces need a forward
    /// to locate the money.
    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        Err(VolError::invalid_data(format!(
            "surface has no ATM level (requested at t = {t})"
        )))
    }

    /// Option time of a date.
    fn time_from_reference(&self, date: Date) -> f64 {
        self.day_counter().year_fraction(self.reference_date(), date)
    }

    /// Option time of [`max_date`](Self::max_date).
    fn max_time(&self) -> f64 {
        self.time_from_reference(self.max_date())
    }

    /// Checks `t` against the surface range.
    ///
    /// # Errors
    ///
    /// Fails for negative times and for times past the surface when
    /// extrapolation is not allowed.
    fn check_time(&self, t: f64, extrapolate: bool) -> VolResult<()> {
        if t < -TIME_EPSILON {
            return Err(VolError::NegativeTime { t });
        }
        let max_time = self.max_time();
        if t > max_time + TIME_EPSILON && !(extrapolate || self.allows_extrapolation()) {
            return Err(VolError::Extrapolation { t, max_time });
        }
        Ok(())
    }

    /// Volatility at time `t`.
    ///
    /// `extrapolate` allows evaluation past the max time for this call
    /// even if the surface does not.
    fn black_vol_t(&self, t: f64, strike: f64, extrapolate: bool) -> VolResult<f64> {
        self.check_time(t, extrapolate)?;
        let vol = self.black_vol_impl(t.max(0.0), strike)?;
        if !vol.is_finite() || vol < 0.0 {
            return Err(VolError::invalid_data(format!(
                "invalid volatility {vol} at t = {t}, strike = {strike}"
            )));
        }
        Ok(vol)
    }

    /// Volatility at an expiry date.
    fn black_vol(&self, date: Date, strike: f64) -> VolResult<f64> {
        self.black_vol_t(self.time_from_reference(date), strike, false)
    }

    /// Total variance `σ²t` at time `t`.
    fn black_variance_t(&self, t: f64, strike: f64, extrapolate: bool) -> VolResult<f64> {
        let vol = self.black_vol_t(t, strike, extrapolate)?;
        Ok(vol * vol * t.max(0.0))
    }

    /// Total variance at an expiry date.
    fn black_variance(&self, date: Date, strike: f64) -> VolResult<f64> {
        self.black_variance_t(self.time_from_reference(date), strike, false)
    }
}

macro_rules! forward_black_vol {
    ($ptr:ty) => {
        impl<T: BlackVolTermStructure + ?Sized> BlackVolTermStructure for $ptr {
            fn reference_date(&self) -> Date {
                (**self).reference_date()
            }

            fn day_counter(&self) -> DayCountConvention {
                (**self).day_counter()
            }

            fn max_date(&self) -> Date {
                (**self).max_date()
            }

            fn allows_extrapolation(&self) -> bool {
                (**self).allows_extrapolation()
            }

            fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
                (**self).black_vol_impl(t, strike)
            }

            fn min_strike(&self) -> f64 {
                (**self).min_strike()
            }

            fn max_strike(&self) -> f64 {
                (**self).max_strike()
            }

            fn atm_vol(&self, t: f64) -> VolResult<f64> {
                (**self).atm_vol(t)
            }

            fn max_time(&self) -> f64 {
                (**self).max_time()
            }
        }
    };
}

forward_black_vol!(Arc<T>);
forward_black_vol!(Box<T>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surfaces::ConstantVol;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_negative_time_rejected() {
        let surface = ConstantVol::new(asof(), 0.25, DayCountConvention::Act365Fixed);
        assert!(matches!(
            surface.black_vol_t(-0.5, 100.0, false),
            Err(VolError::NegativeTime { .. })
        ));
    }

    #[test]
    fn test_shared_surface_forwards_calls() {
        let surface: Arc<dyn BlackVolTermStructure> =
            Arc::new(ConstantVol::new(asof(), 0.25, DayCountConvention::Act365Fixed));
        assert_eq!(surface.black_vol_t(2.0, 50.0, false).unwrap(), 0.25);
        assert_eq!(surface.atm_vol(1.0).unwrap(), 0.25);
    }
}

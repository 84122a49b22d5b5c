//! Strike-independent volatility by expiry.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::CurveInterpolation;
use pillar_math::interpolation::{CubicInterpolator, Interpolator, LinearInterpolator, LogInterpolator};

use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// Volatilities at expiry dates, interpolated in total variance.
///
/// Before the first expiry the first volatility applies; past the last
/// expiry the last one does, when extrapolation is allowed.
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::Date;
/// use pillar_market::config::CurveInterpolation;
/// use pillar_vol::surfaces::BlackVarianceCurve;
/// use pillar_vol::BlackVolTermStructure;
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let dates = vec![asof.add_days(365), asof.add_days(730)];
/// let curve = BlackVarianceCurve::new(
///     asof,
///     dates,
///     vec![0.20, 0.30],
///     DayCountConvention::Act365Fixed,
///     CurveInterpolation::Linear,
///     true,
///     true,
/// )
/// .unwrap();
/// let variance = curve.black_variance_t(1.5, 100.0, false).unwrap();
/// assert!((variance - 0.5 * (0.04 + 0.18)).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct BlackVarianceCurve {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    times: Vec<f64>,
    vols: Vec<f64>,
    interpolator: Option<Box<dyn Interpolator>>,
    extrapolate: bool,
}

impl BlackVarianceCurve {
    /// Creates a curve from expiry dates and volatilities.
    ///
    /// # Errors
    ///
    /// Fails on empty or unsorted input, expiries on or before the
    /// reference date, negative volatilities, and decreasing total variance
    /// when `enforce_monotone_variance` is set.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        vols: Vec<f64>,
        day_counter: DayCountConvention,
        interpolation: CurveInterpolation,
        extrapolate: bool,
        enforce_monotone_variance: bool,
    ) -> VolResult<Self> {
        if dates.is_empty() || dates.len() != vols.len() {
            return Err(VolError::invalid_data(format!(
                "volatility curve needs matching non-empty dates and vols, got {} and {}",
                dates.len(),
                vols.len()
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(VolError::invalid_data("expiry dates must be strictly increasing"));
        }
        if dates[0] <= reference_date {
            return Err(VolError::invalid_data(format!(
                "first expiry {} is not after the reference date {reference_date}",
                dates[0]
            )));
        }
        if let Some(bad) = vols.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(VolError::invalid_data(format!("invalid volatility {bad}")));
        }

        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction(reference_date, *d))
            .collect();
        let variances: Vec<f64> = vols.iter().zip(&times).map(|(v, t)| v * v * t).collect();

        if enforce_monotone_variance {
            for i in 1..variances.len() {
                if variances[i] < variances[i - 1] {
                    return Err(VolError::invalid_data(format!(
                        "total variance decreases from {} at {} to {} at {}",
                        variances[i - 1],
                        dates[i - 1],
                        variances[i],
                        dates[i]
                    )));
                }
            }
        }

        let interpolator: Option<Box<dyn Interpolator>> = if times.len() == 1 {
            None
        } else {
            let xs = times.clone();
            Some(match interpolation {
                CurveInterpolation::Linear => Box::new(LinearInterpolator::new(xs, variances)?),
                CurveInterpolation::Cubic => Box::new(CubicInterpolator::natural_spline(xs, variances)?),
                CurveInterpolation::LogLinear => Box::new(LogInterpolator::log_linear(xs, variances)?),
            })
        };

        Ok(Self {
            reference_date,
            day_counter,
            dates,
            times,
            vols,
            interpolator,
            extrapolate,
        })
    }

    /// Expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Expiry times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Volatilities at the expiries.
    #[must_use]
    pub fn vols(&self) -> &[f64] {
        &self.vols
    }
}

impl BlackVolTermStructure for BlackVarianceCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn black_vol_impl(&self, t: f64, _strike: f64) -> VolResult<f64> {
        let n = self.times.len();
        let Some(interpolator) = &self.interpolator else {
            return Ok(self.vols[0]);
        };
        if t <= self.times[0] {
            return Ok(self.vols[0]);
        }
        if t >= self.times[n - 1] {
            return Ok(self.vols[n - 1]);
        }
        let variance = interpolator.interpolate(t)?;
        Ok((variance / t).max(0.0).sqrt())
    }

    fn is_strike_dependent(&self) -> bool {
        false
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        self.black_vol_impl(t.max(0.0), 0.0)
    }
}

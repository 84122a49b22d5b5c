//! Dense expiry by strike surface.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::SmileInterpolation;

use super::smile::{SliceValue, Smile, SmileSlices};
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// A full grid of volatilities on expiries and strikes.
///
/// Each expiry's total variances are interpolated across strikes with the
/// smile method, and across time linearly in total variance. Time
/// extrapolation is flat in volatility.
#[derive(Debug)]
pub struct BlackVarianceSurface {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    strikes: Vec<f64>,
    vols: Vec<Vec<f64>>,
    slices: SmileSlices,
    extrapolate: bool,
}

impl BlackVarianceSurface {
    /// Creates a surface from `vols[i][j]` at `dates[i]` and `strikes[j]`.
    ///
    /// `flat_strike_extrapolation` clamps strikes to the grid; otherwise the
    /// smile interpolant is continued. `extrapolate` allows times past the
    /// last expiry.
    ///
    /// # Errors
    ///
    /// Fails when the grid shape does not match the axes or the axes are
    /// not strictly increasing.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        strikes: Vec<f64>,
        vols: Vec<Vec<f64>>,
        day_counter: DayCountConvention,
        smile_interpolation: SmileInterpolation,
        flat_strike_extrapolation: bool,
        extrapolate: bool,
    ) -> VolResult<Self> {
        if vols.len() != dates.len() {
            return Err(VolError::invalid_data(format!(
                "{} volatility rows for {} expiries",
                vols.len(),
                dates.len()
            )));
        }
        if let Some((i, row)) = vols.iter().enumerate().find(|(_, row)| row.len() != strikes.len()) {
            return Err(VolError::invalid_data(format!(
                "volatility row {i} has {} values for {} strikes",
                row.len(),
                strikes.len()
            )));
        }

        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction(reference_date, *d))
            .collect();
        let smiles = vols
            .iter()
            .zip(&times)
            .map(|(row, t)| {
                let variances = row.iter().map(|v| v * v * t).collect();
                Smile::new(
                    smile_interpolation,
                    strikes.clone(),
                    variances,
                    flat_strike_extrapolation,
                )
            })
            .collect::<VolResult<Vec<_>>>()?;
        let slices = SmileSlices::new(times, smiles, SliceValue::Variance)?;

        Ok(Self {
            reference_date,
            day_counter,
            dates,
            strikes,
            vols,
            slices,
            extrapolate,
        })
    }

    /// Expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Strikes.
    #[must_use]
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    /// Input volatilities by expiry then strike.
    #[must_use]
    pub fn vols(&self) -> &[Vec<f64>] {
        &self.vols
    }
}

impl BlackVolTermStructure for BlackVarianceSurface {
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

    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
        self.slices.vol(t, strike)
    }

    fn min_strike(&self) -> f64 {
        self.strikes[0]
    }

    fn max_strike(&self) -> f64 {
        self.strikes[self.strikes.len() - 1]
    }
}

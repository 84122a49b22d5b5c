//! Expiry by strike surface from scattered quotes.

use std::collections::BTreeMap;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::SmileInterpolation;
use pillar_market::quotes::close_enough;

use super::smile::{SliceValue, Smile, SmileSlices};
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// Volatilities at (expiry, strike) points where each expiry may carry
/// its own strikes.
///
/// Each expiry gets a smile in volatility; across time the surface is
/// linear in total variance and flat in volatility outside the quoted
/// expiries.
#[derive(Debug)]
pub struct BlackVolSurfaceSparse {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    slices: SmileSlices,
    min_strike: f64,
    max_strike: f64,
    extrapolate: bool,
}

impl BlackVolSurfaceSparse {
    /// Creates a surface from `(expiry, strike, vol)` points in any order.
    ///
    /// # Errors
    ///
    /// Fails on an empty point set and on two points with the same expiry
    /// and strike.
    pub fn new(
        reference_date: Date,
        points: &[(Date, f64, f64)],
        day_counter: DayCountConvention,
        smile_interpolation: SmileInterpolation,
        flat_strike_extrapolation: bool,
        extrapolate: bool,
    ) -> VolResult<Self> {
        if points.is_empty() {
            return Err(VolError::invalid_data("sparse surface needs at least one point"));
        }
        let mut by_expiry: BTreeMap<Date, Vec<(f64, f64)>> = BTreeMap::new();
        for (date, strike, vol) in points {
            by_expiry.entry(*date).or_default().push((*strike, *vol));
        }

        let mut dates = Vec::with_capacity(by_expiry.len());
        let mut times = Vec::with_capacity(by_expiry.len());
        let mut smiles = Vec::with_capacity(by_expiry.len());
        let (mut min_strike, mut max_strike) = (f64::INFINITY, f64::NEG_INFINITY);
        for (date, mut row) in by_expiry {
            row.sort_by(|a, b| a.0.total_cmp(&b.0));
            if let Some(w) = row.windows(2).find(|w| close_enough(w[0].0, w[1].0)) {
                return Err(VolError::invalid_data(format!(
                    "duplicate strike {} at expiry {date}",
                    w[0].0
                )));
            }
            min_strike = min_strike.min(row[0].0);
            max_strike = max_strike.max(row[row.len() - 1].0);
            let (strikes, vols): (Vec<f64>, Vec<f64>) = row.into_iter().unzip();
            dates.push(date);
            times.push(day_counter.year_fraction(reference_date, date));
            smiles.push(Smile::new(smile_interpolation, strikes, vols, flat_strike_extrapolation)?);
        }

        Ok(Self {
            reference_date,
            day_counter,
            dates,
            slices: SmileSlices::new(times, smiles, SliceValue::Vol)?,
            min_strike,
            max_strike,
            extrapolate,
        })
    }

    /// Expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Quoted strikes at each expiry.
    pub fn strikes(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.slices.smiles().iter().map(|s| s.xs())
    }
}

impl BlackVolTermStructure for BlackVolSurfaceSparse {
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
        self.min_strike
    }

    fn max_strike(&self) -> f64 {
        self.max_strike
    }
}

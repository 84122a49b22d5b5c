//! Expiry by moneyness surfaces.

use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_curves::PriceCurve;
use pillar_market::config::SmileInterpolation;
use pillar_market::quotes::MoneynessType;

use super::smile::{SliceValue, Smile, SmileSlices};
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// Volatilities quoted by moneyness `K/F(t)` or `K/S`.
///
/// Total variance is interpolated across moneyness with the smile method
/// (bilinear for `Linear`) and linearly across time, flat outside the
/// quoted expiries and levels.
///
/// Forward moneyness reads the forward from the price curve at every
/// call, so the surface moves with the curve (sticky moneyness). Spot
/// moneyness uses the price at the reference date.
#[derive(Debug)]
pub struct BlackVolatilitySurfaceMoneyness {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    levels: Vec<f64>,
    vols: Vec<Vec<f64>>,
    slices: SmileSlices,
    moneyness_type: MoneynessType,
    price_curve: Arc<PriceCurve>,
    spot: f64,
    extrapolate: bool,
}

impl BlackVolatilitySurfaceMoneyness {
    /// Creates a surface from `vols[i][j]` at `dates[i]` and `levels[j]`.
    ///
    /// # Errors
    ///
    /// Fails when the grid shape does not match the axes or the price
    /// curve has no spot price.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        levels: Vec<f64>,
        vols: Vec<Vec<f64>>,
        day_counter: DayCountConvention,
        moneyness_type: MoneynessType,
        price_curve: Arc<PriceCurve>,
        smile_interpolation: SmileInterpolation,
        extrapolate: bool,
    ) -> VolResult<Self> {
        if vols.len() != dates.len() {
            return Err(VolError::invalid_data(format!(
                "{} volatility rows for {} expiries",
                vols.len(),
                dates.len()
            )));
        }
        if let Some((i, row)) = vols.iter().enumerate().find(|(_, row)| row.len() != levels.len()) {
            return Err(VolError::invalid_data(format!(
                "volatility row {i} has {} values for {} moneyness levels",
                row.len(),
                levels.len()
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
                Smile::new(smile_interpolation, levels.clone(), variances, true)
            })
            .collect::<VolResult<Vec<_>>>()?;
        let slices = SmileSlices::new(times, smiles, SliceValue::Variance)?;
        let spot = price_curve.price_t(0.0)?;

        Ok(Self {
            reference_date,
            day_counter,
            dates,
            levels,
            vols,
            slices,
            moneyness_type,
            price_curve,
            spot,
            extrapolate,
        })
    }

    /// Expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Moneyness levels.
    #[must_use]
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Input volatilities by expiry then level.
    #[must_use]
    pub fn vols(&self) -> &[Vec<f64>] {
        &self.vols
    }

    /// Spot or forward moneyness.
    #[must_use]
    pub fn moneyness_type(&self) -> MoneynessType {
        self.moneyness_type
    }

    /// The price curve supplying the reference price.
    #[must_use]
    pub fn price_curve(&self) -> &Arc<PriceCurve> {
        &self.price_curve
    }

    /// Moneyness of `strike` at time `t`.
    pub fn moneyness(&self, t: f64, strike: f64) -> VolResult<f64> {
        let reference = match self.moneyness_type {
            MoneynessType::Spot => self.spot,
            MoneynessType::Fwd => self.price_curve.price_t(t)?,
        };
        Ok(strike / reference)
    }

    /// Strike at moneyness `level` and time `t`.
    pub fn strike(&self, t: f64, level: f64) -> VolResult<f64> {
        let reference = match self.moneyness_type {
            MoneynessType::Spot => self.spot,
            MoneynessType::Fwd => self.price_curve.price_t(t)?,
        };
        Ok(level * reference)
    }
}

impl BlackVolTermStructure for BlackVolatilitySurfaceMoneyness {
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
        let m = self.moneyness(t, strike)?;
        self.slices.vol(t, m)
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        self.slices.vol(t.max(0.0), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pillar_core::Currency;
    use pillar_curves::PriceInterpolation;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn surface(moneyness_type: MoneynessType) -> BlackVolatilitySurfaceMoneyness {
        let dc = DayCountConvention::Act365Fixed;
        let prices = PriceCurve::new(
            asof(),
            Currency::USD,
            vec![asof(), asof().add_days(730)],
            vec![80.0, 100.0],
            dc,
            PriceInterpolation::Linear,
            true,
        )
        .unwrap();
        BlackVolatilitySurfaceMoneyness::new(
            asof(),
            vec![asof().add_days(365), asof().add_days(730)],
            vec![0.9, 1.0, 1.1],
            vec![vec![0.30, 0.25, 0.27], vec![0.28, 0.24, 0.26]],
            dc,
            moneyness_type,
            Arc::new(prices),
            SmileInterpolation::Linear,
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_forward_moneyness_uses_forward_at_expiry() {
        let s = surface(MoneynessType::Fwd);
        assert_relative_eq!(s.black_vol_t(1.0, 90.0, false).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(s.black_vol_t(2.0, 110.0, false).unwrap(), 0.26, epsilon = 1e-12);
        assert_relative_eq!(s.atm_vol(2.0).unwrap(), 0.24, epsilon = 1e-12);
    }

    #[test]
    fn test_spot_moneyness_uses_spot() {
        let s = surface(MoneynessType::Spot);
        assert_relative_eq!(s.black_vol_t(1.0, 88.0, false).unwrap(), 0.27, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_in_moneyness() {
        let s = surface(MoneynessType::Fwd);
        assert_relative_eq!(s.black_vol_t(1.0, 10.0, false).unwrap(), 0.30, epsilon = 1e-12);
    }
}

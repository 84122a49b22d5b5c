//! Expiry by delta surface with an ATM column.

use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_curves::{PriceCurve, YieldTermStructure};
use pillar_market::config::SmileInterpolation;
use pillar_market::quotes::{AtmType, DeltaVolType, OptionType};

use super::smile::{interval, Smile};
use crate::delta::BlackDeltaCalculator;
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// Delta and ATM conventions of a delta surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaConvention {
    /// Convention of the delta columns.
    pub delta_type: DeltaVolType,
    /// ATM convention.
    pub atm_type: AtmType,
    /// Delta convention of the ATM strike, when it differs.
    pub atm_delta_type: Option<DeltaVolType>,
}

/// Volatilities quoted by put delta, ATM and call delta.
///
/// Columns run put deltas by increasing magnitude, ATM, then call deltas
/// by decreasing magnitude, which is increasing strike. Each column is
/// linear in total variance across time. To evaluate a strike, every
/// column is turned into a strike at that time with the forward from the
/// price curve and the discount factor from the yield curve, and the
/// resulting smile is interpolated.
pub struct BlackVolatilitySurfaceDelta {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    times: Vec<f64>,
    put_deltas: Vec<f64>,
    call_deltas: Vec<f64>,
    vols: Vec<Vec<f64>>,
    convention: DeltaConvention,
    price_curve: Arc<PriceCurve>,
    yield_curve: Arc<dyn YieldTermStructure>,
    smile_interpolation: SmileInterpolation,
    flat_strike_extrapolation: bool,
    extrapolate: bool,
}

impl std::fmt::Debug for BlackVolatilitySurfaceDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlackVolatilitySurfaceDelta")
            .field("reference_date", &self.reference_date)
            .field("dates", &self.dates)
            .field("put_deltas", &self.put_deltas)
            .field("call_deltas", &self.call_deltas)
            .field("convention", &self.convention)
            .field("smile_interpolation", &self.smile_interpolation)
            .finish_non_exhaustive()
    }
}

impl BlackVolatilitySurfaceDelta {
    /// Creates a surface.
    ///
    /// `put_deltas` are positive magnitudes in increasing order and
    /// `call_deltas` are in decreasing order. Each row of `vols` holds the
    /// put columns, the ATM column and the call columns.
    ///
    /// # Errors
    ///
    /// Fails when the grid shape does not match the axes.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        put_deltas: &[f64],
        call_deltas: &[f64],
        vols: Vec<Vec<f64>>,
        day_counter: DayCountConvention,
        convention: DeltaConvention,
        price_curve: Arc<PriceCurve>,
        yield_curve: Arc<dyn YieldTermStructure>,
        smile_interpolation: SmileInterpolation,
        flat_strike_extrapolation: bool,
        extrapolate: bool,
    ) -> VolResult<Self> {
        let columns = put_deltas.len() + 1 + call_deltas.len();
        if dates.is_empty() || vols.len() != dates.len() {
            return Err(VolError::invalid_data(format!(
                "{} volatility rows for {} expiries",
                vols.len(),
                dates.len()
            )));
        }
        if let Some((i, row)) = vols.iter().enumerate().find(|(_, row)| row.len() != columns) {
            return Err(VolError::invalid_data(format!(
                "volatility row {i} has {} values for {columns} delta columns",
                row.len()
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) || dates[0] <= reference_date {
            return Err(VolError::invalid_data(
                "delta surface expiries must be increasing and after the reference date",
            ));
        }
        let times = dates
            .iter()
            .map(|d| day_counter.year_fraction(reference_date, *d))
            .collect();

        Ok(Self {
            reference_date,
            day_counter,
            dates,
            times,
            put_deltas: put_deltas.iter().map(|d| -d.abs()).collect(),
            call_deltas: call_deltas.to_vec(),
            vols,
            convention,
            price_curve,
            yield_curve,
            smile_interpolation,
            flat_strike_extrapolation,
            extrapolate,
        })
    }

    /// Signed put deltas of the put columns.
    #[must_use]
    pub fn put_deltas(&self) -> &[f64] {
        &self.put_deltas
    }

    /// Call deltas of the call columns.
    #[must_use]
    pub fn call_deltas(&self) -> &[f64] {
        &self.call_deltas
    }

    /// Expiry dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The delta and ATM conventions.
    #[must_use]
    pub fn convention(&self) -> DeltaConvention {
        self.convention
    }

    fn atm_column(&self) -> usize {
        self.put_deltas.len()
    }

    fn column_vol(&self, column: usize, t: f64) -> f64 {
        let n = self.times.len();
        let t = t.clamp(self.times[0], self.times[n - 1]);
        if n == 1 {
            return self.vols[0][column];
        }
        let i = interval(&self.times, t);
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let v0 = self.vols[i][column].powi(2) * t0;
        let v1 = self.vols[i + 1][column].powi(2) * t1;
        let variance = v0 + (v1 - v0) * (t - t0) / (t1 - t0);
        (variance / t).max(0.0).sqrt()
    }

    /// Column volatilities at time `t`, in column order.
    #[must_use]
    pub fn vols_at(&self, t: f64) -> Vec<f64> {
        (0..self.atm_column() + 1 + self.call_deltas.len())
            .map(|c| self.column_vol(c, t))
            .collect()
    }

    /// Column strikes at time `t`, in column order.
    ///
    /// # Errors
    ///
    /// Fails when a delta cannot be inverted, the curves cannot be read at
    /// `t`, or the strikes are not strictly increasing.
    pub fn strikes_at(&self, t: f64) -> VolResult<Vec<f64>> {
        let t = t.max(self.times[0]);
        let vols = self.vols_at(t);
        let forward = self.price_curve.price_t(t)?;
        let spot = self.price_curve.price_t(0.0)?;
        let discount = self.yield_curve.discount_t(t, true)?;
        let calculator = |vol: f64| {
            BlackDeltaCalculator::new(self.convention.delta_type, forward, spot, discount, vol, t)
        };

        let mut strikes = Vec::with_capacity(vols.len());
        for (delta, vol) in self.put_deltas.iter().zip(&vols) {
            strikes.push(calculator(*vol)?.strike_from_delta(OptionType::Put, *delta)?);
        }
        let atm = self.atm_column();
        strikes.push(calculator(vols[atm])?.atm_strike(self.convention.atm_type, self.convention.atm_delta_type)?);
        for (delta, vol) in self.call_deltas.iter().zip(&vols[atm + 1..]) {
            strikes.push(calculator(*vol)?.strike_from_delta(OptionType::Call, *delta)?);
        }

        if strikes.windows(2).any(|w| w[1] <= w[0]) {
            return Err(VolError::invalid_data(format!(
                "delta surface strikes at t = {t} are not increasing: {strikes:?}"
            )));
        }
        Ok(strikes)
    }
}

impl BlackVolTermStructure for BlackVolatilitySurfaceDelta {
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
        let vols = self.vols_at(t);
        if vols.len() == 1 {
            return Ok(vols[0]);
        }
        let strikes = self.strikes_at(t)?;
        Smile::new(self.smile_interpolation, strikes, vols, self.flat_strike_extrapolation)?.value(strike)
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        Ok(self.column_vol(self.atm_column(), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pillar_core::Currency;
    use pillar_curves::{FlatForwardCurve, PriceInterpolation};

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn surface() -> BlackVolatilitySurfaceDelta {
        let dc = DayCountConvention::Act365Fixed;
        let prices = Arc::new(
            PriceCurve::new(
                asof(),
                Currency::USD,
                vec![asof(), asof().add_days(730)],
                vec![100.0, 100.0],
                dc,
                PriceInterpolation::Linear,
                true,
            )
            .unwrap(),
        );
        let discount: Arc<dyn YieldTermStructure> = Arc::new(FlatForwardCurve::new(asof(), 0.03, dc));
        BlackVolatilitySurfaceDelta::new(
            asof(),
            vec![asof().add_days(365), asof().add_days(730)],
            &[0.1, 0.25],
            &[0.25, 0.1],
            vec![vec![0.34, 0.31, 0.30, 0.32, 0.35], vec![0.30, 0.28, 0.27, 0.29, 0.31]],
            dc,
            DeltaConvention {
                delta_type: DeltaVolType::Fwd,
                atm_type: AtmType::AtmDeltaNeutral,
                atm_delta_type: None,
            },
            prices,
            discount,
            SmileInterpolation::Linear,
            true,
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_put_deltas_are_negated() {
        let s = surface();
        assert_eq!(s.put_deltas(), &[-0.1, -0.25]);
        assert_eq!(s.call_deltas(), &[0.25, 0.1]);
    }

    #[test]
    fn test_column_strikes_reprice() {
        let s = surface();
        let strikes = s.strikes_at(1.0).unwrap();
        let vols = s.vols_at(1.0);
        for (k, v) in strikes.iter().zip(&vols) {
            assert_relative_eq!(s.black_vol_t(1.0, *k, false).unwrap(), *v, epsilon = 1e-10);
        }
        assert_relative_eq!(s.atm_vol(1.0).unwrap(), 0.30);
        assert_relative_eq!(strikes[2], 100.0 * (0.5 * 0.09_f64).exp(), epsilon = 1e-10);
    }

    #[test]
    fn test_before_first_expiry_uses_first_smile() {
        let s = surface();
        let k = s.strikes_at(1.0).unwrap()[0];
        assert_relative_eq!(s.black_vol_t(0.2, k, false).unwrap(), 0.34, epsilon = 1e-10);
    }
}

//! Surfaces derived from other surfaces.

use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_curves::PriceCurve;

use crate::correlation::CorrelationTermStructure;
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

/// FX adjustment applied when the proxied commodity trades in another
/// currency.
#[derive(Debug, Clone)]
pub struct FxAdjustment {
    /// Volatility of the source/target FX rate, the source currency being
    /// the unit currency.
    pub fx_vol: Arc<dyn BlackVolTermStructure>,
    /// Correlation between the commodity and the FX rate.
    pub correlation: Arc<dyn CorrelationTermStructure>,
}

/// A commodity surface read off another commodity's surface.
///
/// The volatility at strike `K` is the source volatility at the strike
/// with the same forward moneyness, `K·F_source(t)/F_target(t)`. With an
/// [`FxAdjustment`] the variance becomes `σc² + σfx² + 2ρσcσfx`, using
/// the ATM volatility of the FX surface.
#[derive(Debug)]
pub struct ProxyBlackVolSurface {
    reference_date: Date,
    day_counter: DayCountConvention,
    source: Arc<dyn BlackVolTermStructure>,
    source_prices: Arc<PriceCurve>,
    target_prices: Arc<PriceCurve>,
    fx: Option<FxAdjustment>,
}

impl ProxyBlackVolSurface {
    /// Creates a proxy surface.
    #[must_use]
    pub fn new(
        reference_date: Date,
        day_counter: DayCountConvention,
        source: Arc<dyn BlackVolTermStructure>,
        source_prices: Arc<PriceCurve>,
        target_prices: Arc<PriceCurve>,
        fx: Option<FxAdjustment>,
    ) -> Self {
        Self {
            reference_date,
            day_counter,
            source,
            source_prices,
            target_prices,
            fx,
        }
    }

    /// Strike on the source surface equivalent to `strike` at time `t`.
    pub fn source_strike(&self, t: f64, strike: f64) -> VolResult<f64> {
        let source_forward = self.source_prices.price_t(t)?;
        let target_forward = self.target_prices.price_t(t)?;
        Ok(strike * source_forward / target_forward)
    }

    fn adjust(&self, t: f64, commodity_vol: f64) -> VolResult<f64> {
        let Some(fx) = &self.fx else {
            return Ok(commodity_vol);
        };
        let fx_vol = fx.fx_vol.atm_vol(t)?;
        let rho = fx.correlation.correlation(t)?;
        let variance = commodity_vol * commodity_vol + fx_vol * fx_vol + 2.0 * rho * commodity_vol * fx_vol;
        Ok(variance.max(0.0).sqrt())
    }
}

impl BlackVolTermStructure for ProxyBlackVolSurface {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_date(&self) -> Date {
        self.source.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.source.allows_extrapolation()
    }

    fn is_strike_dependent(&self) -> bool {
        self.source.is_strike_dependent()
    }

    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
        let source_strike = self.source_strike(t, strike)?;
        let vol = self.source.black_vol_t(t, source_strike, true)?;
        self.adjust(t, vol)
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        let vol = match self.source.atm_vol(t) {
            Ok(vol) => vol,
            Err(_) => {
                let forward = self.source_prices.price_t(t)?;
                self.source.black_vol_t(t, forward, true)?
            }
        };
        self.adjust(t, vol)
    }
}

/// An FX surface seen from the other side of the pair.
///
/// The volatility of `1/X` at strike `K` equals that of `X` at `1/K`.
#[derive(Debug, Clone)]
pub struct InvertedBlackVolSurface {
    inner: Arc<dyn BlackVolTermStructure>,
}

impl InvertedBlackVolSurface {
    /// Wraps a surface.
    #[must_use]
    pub fn new(inner: Arc<dyn BlackVolTermStructure>) -> Self {
        Self { inner }
    }
}

impl BlackVolTermStructure for InvertedBlackVolSurface {
    fn reference_date(&self) -> Date {
        self.inner.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.inner.day_counter()
    }

    fn max_date(&self) -> Date {
        self.inner.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.inner.allows_extrapolation()
    }

    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
        if strike <= 0.0 {
            return Err(VolError::invalid_data(format!(
                "cannot invert non-positive strike {strike}"
            )));
        }
        self.inner.black_vol_t(t, 1.0 / strike, true)
    }

    fn is_strike_dependent(&self) -> bool {
        self.inner.is_strike_dependent()
    }

    fn min_strike(&self) -> f64 {
        let max = self.inner.max_strike();
        if max > 0.0 && max < f64::MAX {
            1.0 / max
        } else {
            0.0
        }
    }

    fn max_strike(&self) -> f64 {
        let min = self.inner.min_strike();
        if min > 0.0 {
            1.0 / min
        } else {
            f64::MAX
        }
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        self.inner.atm_vol(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::FlatCorrelation;
    use crate::surfaces::{BlackVarianceSurface, ConstantVol};
    use approx::assert_relative_eq;
    use pillar_core::Currency;
    use pillar_curves::PriceInterpolation;
    use pillar_market::config::SmileInterpolation;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn flat_prices(price: f64) -> Arc<PriceCurve> {
        Arc::new(
            PriceCurve::new(
                asof(),
                Currency::USD,
                vec![asof(), asof().add_days(3650)],
                vec![price, price],
                DayCountConvention::Act365Fixed,
                PriceInterpolation::Linear,
                true,
            )
            .unwrap(),
        )
    }

    fn source() -> Arc<dyn BlackVolTermStructure> {
        Arc::new(
            BlackVarianceSurface::new(
                asof(),
                vec![asof().add_days(365)],
                vec![90.0, 100.0, 110.0],
                vec![vec![0.30, 0.25, 0.28]],
                DayCountConvention::Act365Fixed,
                SmileInterpolation::Linear,
                true,
                true,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_moneyness_equivalent_strike() {
        let proxy = ProxyBlackVolSurface::new(
            asof(),
            DayCountConvention::Act365Fixed,
            source(),
            flat_prices(100.0),
            flat_prices(50.0),
            None,
        );
        assert_relative_eq!(proxy.black_vol_t(1.0, 45.0, false).unwrap(), 0.30, epsilon = 1e-12);
        assert_relative_eq!(proxy.black_vol_t(1.0, 55.0, false).unwrap(), 0.28, epsilon = 1e-12);
        assert_relative_eq!(proxy.atm_vol(1.0).unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_fx_adjustment() {
        let fx = FxAdjustment {
            fx_vol: Arc::new(ConstantVol::new(asof(), 0.1, DayCountConvention::Act365Fixed)),
            correlation: Arc::new(FlatCorrelation::new(0.5).unwrap()),
        };
        let proxy = ProxyBlackVolSurface::new(
            asof(),
            DayCountConvention::Act365Fixed,
            source(),
            flat_prices(100.0),
            flat_prices(100.0),
            Some(fx),
        );
        let expected = (0.25_f64 * 0.25 + 0.01 + 2.0 * 0.5 * 0.25 * 0.1).sqrt();
        assert_relative_eq!(proxy.black_vol_t(1.0, 100.0, false).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_surface() {
        let inner: Arc<dyn BlackVolTermStructure> = Arc::new(
            BlackVarianceSurface::new(
                asof(),
                vec![asof().add_days(365)],
                vec![0.5, 1.0, 2.0],
                vec![vec![0.12, 0.10, 0.14]],
                DayCountConvention::Act365Fixed,
                SmileInterpolation::Linear,
                true,
                true,
            )
            .unwrap(),
        );
        let inverted = InvertedBlackVolSurface::new(inner);
        assert_relative_eq!(inverted.black_vol_t(1.0, 2.0, false).unwrap(), 0.12, epsilon = 1e-12);
        assert_relative_eq!(inverted.black_vol_t(1.0, 0.5, false).unwrap(), 0.14, epsilon = 1e-12);
        assert_relative_eq!(inverted.min_strike(), 0.5);
        assert_relative_eq!(inverted.max_strike(), 2.0);
    }
}

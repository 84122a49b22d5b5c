//! Surfaces derived from surfaces already built.

use std::sync::Arc;

use pillar_market::config::{ApoFutureSurfaceConfig, ProxyVolatilityConfig, SmileInterpolation};
use pillar_market::MarketError;
use tracing::{debug, info, warn};

use super::quotes::VolContext;
use super::BuiltSurface;
use crate::error::VolResult;
use crate::expiry::{ConventionsFutureExpiry, FutureExpiryCalculator};
use crate::surfaces::{
    ApoBaseMarket, ApoFutureSurface, FxAdjustment, InvertedBlackVolSurface, ProxyBlackVolSurface,
};
use crate::term_structure::BlackVolTermStructure;

/// Monthly average price options from the base future surface.
pub(super) fn apo(ctx: &VolContext<'_>, config: &ApoFutureSurfaceConfig) -> VolResult<BuiltSurface> {
    const VARIANT: &str = "ApoFutureSurface";
    let curve_id = ctx.curve_id();
    let levels = config.sorted_levels(curve_id)?;
    if config.settings.strike_interpolation != SmileInterpolation::Linear {
        warn!(
            interpolation = ?config.settings.strike_interpolation,
            "APO surfaces interpolate linearly in moneyness"
        );
    }

    let convention = ctx.conventions.commodity_future(&config.base_conventions_id)?;
    let expiries: Arc<dyn FutureExpiryCalculator> = Arc::new(ConventionsFutureExpiry::new(convention.clone())?);
    let base = ApoBaseMarket {
        vol: ctx.dependencies.commodity_vol(&config.base_volatility_id, curve_id)?,
        prices: ctx.dependencies.price_curve(&config.base_price_curve_id, curve_id)?,
        expiries,
        calendar: convention.calendar.clone(),
    };
    let apo_prices = ctx.price_curve(VARIANT)?;

    let surface = ApoFutureSurface::new(
        ctx.asof,
        levels,
        apo_prices,
        &base,
        config.beta,
        config.max_tenor,
        ctx.day_counter(),
        config.settings.extrapolation,
    )?;
    let last = surface.dates().last().copied();
    info!(
        base = %config.base_volatility_id,
        expiries = surface.dates().len(),
        beta = config.beta,
        "APO surface built from base futures"
    );
    Ok(BuiltSurface::new(surface, last))
}

/// Another commodity's surface at equal forward moneyness, FX adjusted
/// when the currencies differ.
pub(super) fn proxy(ctx: &VolContext<'_>, config: &ProxyVolatilityConfig) -> VolResult<BuiltSurface> {
    const VARIANT: &str = "Proxy";
    let curve_id = ctx.curve_id();
    let source = ctx.dependencies.commodity_vol(&config.source_curve_id, curve_id)?;
    let source_prices = ctx.dependencies.price_curve(&config.source_price_curve_id, curve_id)?;
    let target_prices = ctx.price_curve(VARIANT)?;

    let fx = if config.source_currency == ctx.config.currency {
        None
    } else {
        let pair = config
            .fx_vol_curve_id
            .clone()
            .unwrap_or_else(|| format!("{}{}", config.source_currency.code(), ctx.config.currency.code()));
        let correlation_id = config.correlation_curve_id.as_deref().ok_or_else(|| {
            MarketError::invalid_config(
                curve_id,
                format!(
                    "proxy from {} needs a correlation curve for {} against {}",
                    config.source_curve_id, config.source_currency, ctx.config.currency
                ),
            )
        })?;
        Some(FxAdjustment {
            fx_vol: fx_surface(ctx, &pair)?,
            correlation: ctx.dependencies.correlation(correlation_id, curve_id)?,
        })
    };
    debug!(
        source = %config.source_curve_id,
        fx_adjusted = fx.is_some(),
        "proxy volatility surface"
    );
    let surface = ProxyBlackVolSurface::new(
        ctx.asof,
        ctx.day_counter(),
        source,
        source_prices,
        target_prices,
        fx,
    );
    Ok(BuiltSurface::new(surface, None))
}

/// FX surface of `pair`, or the inverse of the reversed pair's surface.
fn fx_surface(ctx: &VolContext<'_>, pair: &str) -> VolResult<Arc<dyn BlackVolTermStructure>> {
    if let Some(surface) = ctx.dependencies.fx_vol(pair) {
        return Ok(surface);
    }
    if pair.len() == 6 && pair.is_ascii() {
        let reversed = format!("{}{}", &pair[3..], &pair[..3]);
        if let Some(surface) = ctx.dependencies.fx_vol(&reversed) {
            debug!(pair, %reversed, "inverting FX surface of the reversed pair");
            return Ok(Arc::new(InvertedBlackVolSurface::new(surface)));
        }
    }
    Err(MarketError::missing_dependency(ctx.curve_id(), pair).into())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::correlation::FlatCorrelation;
    use crate::dependencies::{CorrelationMap, VolSurfaceMap};
    use crate::surfaces::ConstantVol;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};
    use pillar_core::types::Frequency;
    use pillar_core::{Currency, Period};
    use pillar_market::config::SurfaceSettings;
    use pillar_market::conventions::{AnchorRule, CommodityFutureConvention, Convention, Conventions};
    use pillar_market::quotes::InMemoryQuoteStore;

    fn constant(vol: f64) -> Arc<dyn BlackVolTermStructure> {
        Arc::new(ConstantVol::new(asof(), vol, DC))
    }

    fn proxy_config(source_currency: Currency, fx_vol_curve_id: Option<&str>) -> ProxyVolatilityConfig {
        ProxyVolatilityConfig {
            source_curve_id: "BRENT".into(),
            source_currency,
            source_price_curve_id: "BRENT".into(),
            fx_vol_curve_id: fx_vol_curve_id.map(str::to_string),
            correlation_curve_id: Some("BRENT-FX".into()),
        }
    }

    #[test]
    fn test_proxy_same_currency_reads_source_at_equal_moneyness() {
        let (mut prices, yields) = market(100.0, 0.02);
        prices.insert("BRENT".into(), flat_prices(80.0));
        let mut vols = VolSurfaceMap::new();
        vols.insert("BRENT".into(), constant(0.3));
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields).with_commodity_vols(&vols));
        let built = proxy(&ctx, &proxy_config(Currency::USD, None)).unwrap();
        assert_relative_eq!(built.surface.black_vol(day(2025, 1, 15), 110.0).unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(built.last_quoted_expiry, None);
    }

    #[test]
    fn test_proxy_inverts_reversed_fx_pair() {
        let (mut prices, yields) = market(100.0, 0.02);
        prices.insert("BRENT".into(), flat_prices(80.0));
        let mut vols = VolSurfaceMap::new();
        vols.insert("BRENT".into(), constant(0.3));
        let mut fx_vols = VolSurfaceMap::new();
        fx_vols.insert("USDEUR".into(), constant(0.1));
        let mut correlations = CorrelationMap::new();
        correlations.insert("BRENT-FX".into(), Arc::new(FlatCorrelation::new(0.5).unwrap()));
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let dependencies = deps(&prices, &yields)
            .with_commodity_vols(&vols)
            .with_fx_vols(&fx_vols)
            .with_correlations(&correlations);
        let ctx = context(&config, &store, dependencies);
        let built = proxy(&ctx, &proxy_config(Currency::EUR, None)).unwrap();
        let expected = (0.09_f64 + 0.01 + 2.0 * 0.5 * 0.3 * 0.1).sqrt();
        assert_relative_eq!(built.surface.black_vol(day(2025, 1, 15), 100.0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_proxy_without_fx_surface_fails() {
        let (mut prices, yields) = market(100.0, 0.02);
        prices.insert("BRENT".into(), flat_prices(80.0));
        let mut vols = VolSurfaceMap::new();
        vols.insert("BRENT".into(), constant(0.3));
        let correlations = CorrelationMap::new();
        let fx_vols = VolSurfaceMap::new();
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let dependencies = deps(&prices, &yields)
            .with_commodity_vols(&vols)
            .with_fx_vols(&fx_vols)
            .with_correlations(&correlations);
        let ctx = context(&config, &store, dependencies);
        let err = proxy(&ctx, &proxy_config(Currency::EUR, Some("EUR-USD-VOL"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The curve 'EUR-USD-VOL' required in the building of the curve 'WTI' was not found."
        );
    }

    fn apo_conventions() -> Conventions {
        Conventions::default().with(
            "WTI-FUT",
            Convention::CommodityFuture(CommodityFutureConvention {
                anchor: AnchorRule::LastBusinessDay,
                contract_frequency: Frequency::Monthly,
                calendar: MarketCalendar::WeekendsOnly,
                expiry_convention: BusinessDayConvention::Preceding,
                expiry_month_lag: 0,
                option_expiry_offset: 0,
                averaging_period: Period::days(1),
            }),
        )
    }

    fn apo_config(max_tenor: Option<Period>) -> ApoFutureSurfaceConfig {
        ApoFutureSurfaceConfig {
            moneyness_levels: vec![1.1, 0.9, 1.0],
            base_volatility_id: "WTI-FUT".into(),
            base_price_curve_id: "WTI".into(),
            base_conventions_id: "WTI-FUT".into(),
            beta: 0.0,
            max_tenor,
            settings: SurfaceSettings::default(),
        }
    }

    #[test]
    fn test_apo_surface_from_base_futures() {
        let (prices, yields) = market(80.0, 0.02);
        let mut vols = VolSurfaceMap::new();
        vols.insert("WTI-FUT".into(), constant(0.3));
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let conventions = apo_conventions();
        let ctx = VolContext {
            asof: asof(),
            config: &config,
            conventions: &conventions,
            quotes: &store,
            dependencies: deps(&prices, &yields).with_commodity_vols(&vols),
            expiry_calculator: None,
        };
        let built = apo(&ctx, &apo_config(Some(Period::months(3)))).unwrap();
        let last = built.last_quoted_expiry.unwrap();
        assert!(last > asof() && last <= asof().add_period(Period::months(3), false).unwrap());
        // Averaging lowers the volatility of the monthly average.
        let vol = built.surface.black_vol(last, 80.0).unwrap();
        assert!(vol > 0.0 && vol <= 0.3 + 1e-12, "{vol}");
    }

    #[test]
    fn test_apo_needs_base_conventions() {
        let (prices, yields) = market(80.0, 0.02);
        let mut vols = VolSurfaceMap::new();
        vols.insert("WTI-FUT".into(), constant(0.3));
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields).with_commodity_vols(&vols));
        let err = apo(&ctx, &apo_config(None)).unwrap_err();
        assert!(err.to_string().contains("WTI-FUT"), "{err}");
    }
}

//! Constant volatilities and volatility curves by expiry.

use pillar_market::config::{ConstantVolatilityConfig, Extrapolation, VolatilityCurveConfig};
use tracing::debug;

use super::quotes::VolContext;
use super::BuiltSurface;
use crate::error::{VolError, VolResult};
use crate::surfaces::{BlackVarianceCurve, ConstantVol};

/// A single quoted volatility.
pub(super) fn constant(ctx: &VolContext<'_>, config: &ConstantVolatilityConfig) -> VolResult<BuiltSurface> {
    let datum = ctx.quotes.get(&config.quote, ctx.asof)?;
    let vol = datum.value();
    if !(vol.is_finite() && vol >= 0.0) {
        return Err(VolError::invalid_data(format!("quote {} has volatility {vol}", config.quote)));
    }
    debug!(quote = %config.quote, vol, "constant volatility");
    Ok(BuiltSurface::new(ConstantVol::new(ctx.asof, vol, ctx.day_counter()), None))
}

/// Volatilities by expiry, strike independent.
pub(super) fn curve(ctx: &VolContext<'_>, config: &VolatilityCurveConfig) -> VolResult<BuiltSurface> {
    let points = ctx.curve_points(&config.quotes)?;
    let extrapolate = match config.extrapolation {
        Extrapolation::None => false,
        Extrapolation::Flat | Extrapolation::UseInterpolator => true,
    };
    let (dates, vols): (Vec<_>, Vec<_>) = points.into_iter().unzip();
    let last = dates.last().copied();
    debug!(expiries = dates.len(), interpolation = ?config.interpolation, extrapolate, "volatility curve quotes");
    let curve = BlackVarianceCurve::new(
        ctx.asof,
        dates,
        vols,
        ctx.day_counter(),
        config.interpolation,
        extrapolate,
        config.enforce_monotone_variance,
    )?;
    Ok(BuiltSurface::new(curve, last))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::term_structure::BlackVolTermStructure;
    use pillar_market::config::CurveInterpolation;
    use pillar_market::quotes::InMemoryQuoteStore;
    use pillar_market::MarketError;

    fn curve_config(quotes: &[&str]) -> VolatilityCurveConfig {
        VolatilityCurveConfig {
            quotes: quotes.iter().map(|q| (*q).to_string()).collect(),
            interpolation: CurveInterpolation::Linear,
            extrapolation: Extrapolation::Flat,
            enforce_monotone_variance: false,
        }
    }

    fn store() -> InMemoryQuoteStore {
        let mut store = InMemoryQuoteStore::new();
        for (expiry, vol) in [("2023-12-15", 0.5), ("2024-06-01", 0.3), ("2025-06-01", 0.25)] {
            store
                .add_quote(asof(), &format!("COMMODITY_OPTION/RATE_LNVOL/WTI/USD/{expiry}/ATM/AtmFwd"), vol)
                .unwrap();
        }
        store
            .add_quote(asof(), "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/100", 0.31)
            .unwrap();
        store
    }

    #[test]
    fn test_wildcard_skips_expired_and_duplicate_expiries() {
        let store = store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let built = curve(&ctx, &curve_config(&["COMMODITY_OPTION/RATE_LNVOL/WTI/USD/*"])).unwrap();
        assert_eq!(built.last_quoted_expiry, Some(day(2025, 6, 1)));
        let vol = built.surface.black_vol(day(2024, 6, 1), 80.0).unwrap();
        // The strike quote sorts before the ATM quote of the same expiry.
        assert!((vol - 0.31).abs() < 1e-12);
        assert!(format!("{built:?}").contains("last_quoted_expiry: Some("));
    }

    #[test]
    fn test_explicit_counts_missing_and_expired_quotes() {
        let store = store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let explicit = curve_config(&[
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2023-12-15/ATM/AtmFwd",
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/ATM/AtmFwd",
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2026-06-01/ATM/AtmFwd",
        ]);
        let err = curve(&ctx, &explicit).unwrap_err();
        assert_eq!(
            err,
            VolError::Market(MarketError::QuoteCountMismatch {
                curve_id: "WTI".into(),
                expected: 3,
                found: 1,
                expired: 1,
            })
        );
    }

    #[test]
    fn test_explicit_rejects_repeated_expiry() {
        let store = store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let explicit = curve_config(&[
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/ATM/AtmFwd",
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2024-06-01/100",
        ]);
        let err = curve(&ctx, &explicit).unwrap_err();
        assert!(err.to_string().contains("Duplicate quote for the expiry date 2024-06-01"), "{err}");
    }

    #[test]
    fn test_constant_reads_the_quote() {
        let store = store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let built = constant(
            &ctx,
            &ConstantVolatilityConfig {
                quote: "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/2025-06-01/ATM/AtmFwd".into(),
            },
        )
        .unwrap();
        assert_eq!(built.surface.black_vol(day(2030, 1, 1), 50.0).unwrap(), 0.25);
    }
}

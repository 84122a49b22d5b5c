//! Delta and moneyness quoted surfaces.

use pillar_core::Date;
use pillar_market::config::{DeltaSurfaceConfig, MoneynessSurfaceConfig, VolatilityQuoteType};
use pillar_market::quotes::{close_enough, MoneynessType, OptionType, Strike};
use tracing::debug;

use super::quotes::{flat_strike_extrapolation, ExpiryAxis, OptionQuote, VolContext};
use super::BuiltSurface;
use crate::error::VolResult;
use crate::surfaces::{BlackVolatilitySurfaceDelta, BlackVolatilitySurfaceMoneyness, DeltaConvention};

/// Put deltas, then ATM, then call deltas.
pub(super) fn delta(ctx: &VolContext<'_>, config: &DeltaSurfaceConfig) -> VolResult<BuiltSurface> {
    let (surface, last) = delta_surface(ctx, config)?;
    Ok(BuiltSurface::new(surface, last))
}

fn delta_surface(
    ctx: &VolContext<'_>,
    config: &DeltaSurfaceConfig,
) -> VolResult<(BlackVolatilitySurfaceDelta, Option<Date>)> {
    const VARIANT: &str = "DeltaSurface";
    let curve_id = ctx.curve_id();
    let (puts, calls) = config.sorted_deltas(curve_id)?;
    let axis = ExpiryAxis::from_config(curve_id, &config.expiries)?;
    let prices = ctx.price_curve(VARIANT)?;
    let discount = ctx.yield_curve(VARIANT)?;

    let mut columns: Vec<Strike> = puts
        .iter()
        .map(|d| config.delta_strike(OptionType::Put, *d))
        .collect();
    columns.push(config.atm_strike());
    columns.extend(calls.iter().map(|d| config.delta_strike(OptionType::Call, *d)));
    let atm_delta_type = config.atm_delta_type.unwrap_or(config.delta_type);

    let column_of = |strike: &Strike| -> Option<usize> {
        match strike {
            Strike::Atm { atm_type, delta_type } => (*atm_type == config.atm_type
                && delta_type.map_or(true, |dt| dt == atm_delta_type))
            .then_some(puts.len()),
            Strike::Delta { .. } => columns.iter().position(|c| c.close_to(strike)),
            _ => None,
        }
    };
    let quotes = ctx.option_quotes(VolatilityQuoteType::RateLnVol, &axis, |s| column_of(s).is_some())?;
    let cells = grid_cells(&quotes, column_of);
    let labels: Vec<String> = columns.iter().map(ToString::to_string).collect();
    let grid = ctx.assemble_grid(&cells, &axis, &labels)?;
    debug!(expiries = grid.dates.len(), columns = labels.len(), "delta surface grid");

    let prices = ctx.corrected_prices(prices, &grid.dates, config.future_price_correction)?;
    let settings = &config.settings;
    let last = grid.dates.last().copied();
    let surface = BlackVolatilitySurfaceDelta::new(
        ctx.asof,
        grid.dates,
        &puts,
        &calls,
        grid.rows,
        ctx.day_counter(),
        DeltaConvention {
            delta_type: config.delta_type,
            atm_type: config.atm_type,
            atm_delta_type: config.atm_delta_type,
        },
        prices,
        discount,
        settings.strike_interpolation,
        flat_strike_extrapolation(VARIANT, settings.strike_extrapolation),
        settings.extrapolation,
    )?;
    Ok((surface, last))
}

/// Volatilities by spot or forward moneyness.
pub(super) fn moneyness(ctx: &VolContext<'_>, config: &MoneynessSurfaceConfig) -> VolResult<BuiltSurface> {
    const VARIANT: &str = "MoneynessSurface";
    let curve_id = ctx.curve_id();
    let levels = config.sorted_levels(curve_id)?;
    let axis = ExpiryAxis::from_config(curve_id, &config.expiries)?;
    let prices = ctx.price_curve(VARIANT)?;
    if config.moneyness_type == MoneynessType::Fwd {
        ctx.yield_curve(VARIANT)?;
    }

    let column_of = |strike: &Strike| -> Option<usize> {
        match strike {
            Strike::Moneyness {
                moneyness_type,
                moneyness,
            } if *moneyness_type == config.moneyness_type => {
                levels.iter().position(|l| close_enough(*l, *moneyness))
            }
            _ => None,
        }
    };
    let quotes = ctx.option_quotes(VolatilityQuoteType::RateLnVol, &axis, |s| column_of(s).is_some())?;
    let cells = grid_cells(&quotes, column_of);
    let labels: Vec<String> = levels
        .iter()
        .map(|m| {
            Strike::Moneyness {
                moneyness_type: config.moneyness_type,
                moneyness: *m,
            }
            .to_string()
        })
        .collect();
    let grid = ctx.assemble_grid(&cells, &axis, &labels)?;
    debug!(expiries = grid.dates.len(), levels = levels.len(), "moneyness surface grid");

    let prices = ctx.corrected_prices(prices, &grid.dates, config.future_price_correction)?;
    let last = grid.dates.last().copied();
    let surface = BlackVolatilitySurfaceMoneyness::new(
        ctx.asof,
        grid.dates,
        levels,
        grid.rows,
        ctx.day_counter(),
        config.moneyness_type,
        prices,
        config.settings.strike_interpolation,
        config.settings.extrapolation,
    )?;
    Ok(BuiltSurface::new(surface, last))
}

fn grid_cells(quotes: &[OptionQuote], column_of: impl Fn(&Strike) -> Option<usize>) -> Vec<(Date, usize, f64)> {
    quotes
        .iter()
        .filter_map(|q| column_of(&q.strike).map(|j| (q.expiry_date, j, q.value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::term_structure::BlackVolTermStructure;
    use approx::assert_relative_eq;
    use pillar_market::config::SurfaceSettings;
    use pillar_market::quotes::{AtmType, DeltaVolType, InMemoryQuoteStore};

    const STEM: &str = "COMMODITY_OPTION/RATE_LNVOL/WTI/USD";

    fn delta_config(expiries: &[&str]) -> DeltaSurfaceConfig {
        DeltaSurfaceConfig {
            delta_type: DeltaVolType::Spot,
            atm_type: AtmType::AtmDeltaNeutral,
            atm_delta_type: None,
            put_deltas: vec![0.25],
            call_deltas: vec![0.25],
            expiries: expiries.iter().map(|e| (*e).to_string()).collect(),
            future_price_correction: false,
            settings: SurfaceSettings::default(),
        }
    }

    fn delta_store(with_last_call: bool) -> InMemoryQuoteStore {
        let mut store = InMemoryQuoteStore::new();
        for expiry in ["2024-07-15", "2025-01-15"] {
            store
                .add_quote(asof(), &format!("{STEM}/{expiry}/DEL/Spot/Put/0.25"), 0.32)
                .unwrap();
            store
                .add_quote(asof(), &format!("{STEM}/{expiry}/ATM/AtmDeltaNeutral"), 0.30)
                .unwrap();
            if with_last_call || expiry != "2025-01-15" {
                store
                    .add_quote(asof(), &format!("{STEM}/{expiry}/DEL/Spot/Call/0.25"), 0.29)
                    .unwrap();
            }
        }
        store
    }

    fn moneyness_config(levels: Vec<f64>) -> MoneynessSurfaceConfig {
        MoneynessSurfaceConfig {
            moneyness_type: MoneynessType::Fwd,
            moneyness_levels: levels,
            expiries: vec!["*".into()],
            future_price_correction: false,
            settings: SurfaceSettings::default(),
        }
    }

    #[test]
    fn test_put_deltas_are_negated() {
        let (prices, yields) = market(100.0, 0.03);
        let store = delta_store(true);
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields));
        let (surface, last) = delta_surface(&ctx, &delta_config(&["*"])).unwrap();
        assert_eq!(surface.put_deltas(), &[-0.25]);
        assert_eq!(surface.call_deltas(), &[0.25]);
        assert_eq!(surface.dates(), &[day(2024, 7, 15), day(2025, 1, 15)]);
        assert_eq!(last, Some(day(2025, 1, 15)));
    }

    #[test]
    fn test_wildcard_delta_grid_must_be_full() {
        let (prices, yields) = market(100.0, 0.03);
        let store = delta_store(false);
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields));
        let err = delta(&ctx, &delta_config(&["*"])).unwrap_err();
        assert!(
            err.to_string().ends_with(
                "Volatility for expiry date 2025-01-15 and strike DEL/Spot/Call/0.25 not found. \
                 Cannot proceed with a sparse matrix."
            ),
            "{err}"
        );
    }

    #[test]
    fn test_delta_surface_needs_discount_curve() {
        let (prices, yields) = market(100.0, 0.03);
        let store = delta_store(true);
        let mut config = vol_config(vec![]);
        config.yield_curve_id = None;
        let ctx = context(&config, &store, deps(&prices, &yields));
        assert!(delta(&ctx, &delta_config(&["*"])).is_err());
    }

    #[test]
    fn test_explicit_delta_expiries_ignore_other_dates() {
        let (prices, yields) = market(100.0, 0.03);
        let store = delta_store(false);
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields));
        let (surface, _) = delta_surface(&ctx, &delta_config(&["2024-07-15"])).unwrap();
        assert_eq!(surface.dates(), &[day(2024, 7, 15)]);
    }

    #[test]
    fn test_moneyness_duplicate_levels() {
        let (prices, yields) = market(100.0, 0.03);
        let store = InMemoryQuoteStore::new();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields));
        let err = moneyness(&ctx, &moneyness_config(vec![0.9, 1.0, 1.0, 1.1])).unwrap_err();
        assert!(
            err.to_string().contains("The configured moneyness levels contain duplicates"),
            "{err}"
        );
    }

    #[test]
    fn test_moneyness_surface_reads_forward_levels() {
        let (prices, yields) = market(100.0, 0.03);
        let mut store = InMemoryQuoteStore::new();
        for (level, vol) in [(0.9, 0.33), (1.0, 0.30), (1.1, 0.28)] {
            store
                .add_quote(asof(), &format!("{STEM}/2025-01-15/MNY/Fwd/{level}"), vol)
                .unwrap();
        }
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, deps(&prices, &yields));
        let built = moneyness(&ctx, &moneyness_config(vec![1.1, 0.9, 1.0])).unwrap();
        let expiry = day(2025, 1, 15);
        assert_relative_eq!(built.surface.black_vol(expiry, 100.0).unwrap(), 0.30, epsilon = 1e-12);
        assert_relative_eq!(built.surface.black_vol(expiry, 90.0).unwrap(), 0.33, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_moneyness_needs_discount_curve() {
        let (prices, yields) = market(100.0, 0.03);
        let store = InMemoryQuoteStore::new();
        let mut config = vol_config(vec![]);
        config.yield_curve_id = None;
        let ctx = context(&config, &store, deps(&prices, &yields));
        let err = moneyness(&ctx, &moneyness_config(vec![1.0])).unwrap_err();
        assert!(err.to_string().contains("needs a yield curve"), "{err}");
    }
}

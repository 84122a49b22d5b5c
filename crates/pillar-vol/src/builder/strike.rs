//! Absolute strike surfaces from volatility or premium quotes.

use pillar_core::Date;
use pillar_market::config::{sorted_strikes, StrikeSurfaceConfig, VolatilityQuoteType};
use pillar_market::quotes::{axis_wildcard, close_enough, OptionType, Strike};
use tracing::{debug, warn};

use super::quotes::{flat_strike_extrapolation, ExpiryAxis, OptionQuote, VolContext};
use super::BuiltSurface;
use crate::black::implied_volatility;
use crate::error::{VolError, VolResult};
use crate::surfaces::{BlackVarianceSurface, BlackVolSurfaceSparse};

const VARIANT: &str = "StrikeSurface";

/// Call and put premiums quoted at one expiry and strike.
#[derive(Debug, Clone, Copy)]
struct PremiumCell {
    expiry: Date,
    strike: f64,
    call: Option<f64>,
    put: Option<f64>,
}

/// Builds a dense surface when both axes are explicit and a sparse one
/// otherwise.
pub(super) fn build(ctx: &VolContext<'_>, config: &StrikeSurfaceConfig) -> VolResult<BuiltSurface> {
    let curve_id = ctx.curve_id();
    let strikes = if axis_wildcard(curve_id, "strikes", &config.strikes)? {
        None
    } else {
        Some(sorted_strikes(curve_id, &config.strikes)?)
    };
    let axis = ExpiryAxis::from_config(curve_id, &config.expiries)?;
    let settings = &config.settings;
    let flat_strike = flat_strike_extrapolation(VARIANT, settings.strike_extrapolation);

    let accepts = |strike: &Strike| match (strike.absolute(), &strikes) {
        (Some(k), Some(configured)) => configured.iter().any(|c| close_enough(*c, k)),
        (Some(_), None) => true,
        (None, _) => false,
    };
    let quotes = ctx.option_quotes(config.quote_type, &axis, accepts)?;
    let points = match config.quote_type {
        VolatilityQuoteType::RateLnVol => quotes
            .iter()
            .filter_map(|q| q.strike.absolute().map(|k| (q.expiry_date, k, q.value)))
            .collect(),
        VolatilityQuoteType::Price => strip_premiums(ctx, &quotes)?,
    };
    if points.is_empty() {
        return Err(VolError::no_market_data(curve_id, "strike surface quotes", ctx.asof));
    }

    match strikes {
        Some(strikes) if !axis.is_wildcard() => {
            let columns: Vec<String> = strikes.iter().map(ToString::to_string).collect();
            let mut cells = Vec::with_capacity(points.len());
            for (date, k, vol) in &points {
                if let Some(j) = strikes.iter().position(|c| close_enough(*c, *k)) {
                    cells.push((*date, j, *vol));
                }
            }
            let grid = ctx.assemble_grid(&cells, &axis, &columns)?;
            debug!(expiries = grid.dates.len(), strikes = strikes.len(), "dense strike surface");
            let last = grid.dates.last().copied();
            let surface = BlackVarianceSurface::new(
                ctx.asof,
                grid.dates,
                strikes,
                grid.rows,
                ctx.day_counter(),
                settings.strike_interpolation,
                flat_strike,
                settings.extrapolation,
            )?;
            Ok(BuiltSurface::new(surface, last))
        }
        _ => {
            debug!(points = points.len(), "sparse strike surface");
            let last = points.iter().map(|(d, _, _)| *d).max();
            let surface = BlackVolSurfaceSparse::new(
                ctx.asof,
                &points,
                ctx.day_counter(),
                settings.strike_interpolation,
                flat_strike,
                settings.extrapolation,
            )?;
            Ok(BuiltSurface::new(surface, last))
        }
    }
}

/// Implied volatilities of premium quotes, one per expiry and strike.
fn strip_premiums(ctx: &VolContext<'_>, quotes: &[OptionQuote]) -> VolResult<Vec<(Date, f64, f64)>> {
    let prices = ctx.price_curve(VARIANT)?;
    let discount = ctx.yield_curve(VARIANT)?;

    let mut cells: Vec<PremiumCell> = Vec::new();
    for quote in quotes {
        let Some(strike) = quote.strike.absolute() else {
            continue;
        };
        let index = match cells
            .iter()
            .position(|c| c.expiry == quote.expiry_date && close_enough(c.strike, strike))
        {
            Some(i) => i,
            None => {
                cells.push(PremiumCell {
                    expiry: quote.expiry_date,
                    strike,
                    call: None,
                    put: None,
                });
                cells.len() - 1
            }
        };
        let slot = match quote.option_type {
            OptionType::Call => &mut cells[index].call,
            OptionType::Put => &mut cells[index].put,
        };
        if slot.replace(quote.value).is_some() {
            return Err(VolError::invalid_data(format!(
                "duplicate {} premium for expiry {} and strike {strike}",
                quote.option_type, quote.expiry_date
            )));
        }
    }

    let mut points = Vec::with_capacity(cells.len());
    for cell in cells {
        let forward = prices.price(cell.expiry)?;
        let df = discount.discount(cell.expiry)?;
        let t = ctx.day_counter().year_fraction(ctx.asof, cell.expiry);
        let Some((option_type, premium)) = choose_premium(
            cell.call,
            cell.put,
            Some(forward),
            cell.strike,
            ctx.config.prefer_out_of_the_money,
        ) else {
            continue;
        };
        match implied_volatility(option_type, premium, forward, cell.strike, t, df) {
            Ok(vol) => points.push((cell.expiry, cell.strike, vol)),
            Err(e) => warn!(expiry = %cell.expiry, strike = cell.strike, error = %e, "premium not stripped"),
        }
    }
    debug!(stripped = points.len(), "premiums stripped to volatilities");
    Ok(points)
}

/// Premium used for a cell.
///
/// With both sides quoted the out-of-the-money side is used when
/// `prefer_otm` is set and the in-the-money side otherwise, relative to the
/// forward. Without a forward the call is used.
fn choose_premium(
    call: Option<f64>,
    put: Option<f64>,
    forward: Option<f64>,
    strike: f64,
    prefer_otm: bool,
) -> Option<(OptionType, f64)> {
    let prefer_call = forward.map_or(true, |f| (strike >= f) == prefer_otm);
    match (call, put) {
        (Some(c), Some(p)) => Some(if prefer_call {
            (OptionType::Call, c)
        } else {
            (OptionType::Put, p)
        }),
        (Some(c), None) => Some((OptionType::Call, c)),
        (None, Some(p)) => Some((OptionType::Put, p)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::black::black_price_vol;
    use crate::term_structure::BlackVolTermStructure;
    use approx::assert_relative_eq;
    use pillar_market::config::SurfaceSettings;
    use pillar_market::quotes::InMemoryQuoteStore;

    const GRID: [(&str, f64, f64); 6] = [
        ("2024-06-01", 90.0, 0.32),
        ("2024-06-01", 100.0, 0.30),
        ("2024-06-01", 110.0, 0.29),
        ("2025-06-01", 90.0, 0.28),
        ("2025-06-01", 100.0, 0.27),
        ("2025-06-01", 110.0, 0.26),
    ];

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn surface_config(strikes: &[&str], expiries: &[&str], quote_type: VolatilityQuoteType) -> StrikeSurfaceConfig {
        StrikeSurfaceConfig {
            strikes: strings(strikes),
            expiries: strings(expiries),
            settings: SurfaceSettings::default(),
            quote_type,
        }
    }

    fn vol_store() -> InMemoryQuoteStore {
        let mut store = InMemoryQuoteStore::new();
        for (expiry, strike, vol) in GRID {
            store
                .add_quote(asof(), &format!("COMMODITY_OPTION/RATE_LNVOL/WTI/USD/{expiry}/{strike}"), vol)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_explicit_grid_is_dense_and_reprices() {
        let store = vol_store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let built = build(
            &ctx,
            &surface_config(
                &["110", "90", "100"],
                &["2024-06-01", "2025-06-01"],
                VolatilityQuoteType::RateLnVol,
            ),
        )
        .unwrap();
        assert!(format!("{:?}", built.surface).starts_with("BlackVarianceSurface"));
        for (expiry, strike, vol) in GRID {
            let date = Date::parse(expiry).unwrap();
            assert_relative_eq!(built.surface.black_vol(date, strike).unwrap(), vol, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wildcard_gives_sparse_surface() {
        let store = vol_store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let built = build(&ctx, &surface_config(&["*"], &["*"], VolatilityQuoteType::RateLnVol)).unwrap();
        assert!(format!("{:?}", built.surface).starts_with("BlackVolSurfaceSparse"));
        assert_eq!(built.last_quoted_expiry, Some(day(2025, 6, 1)));
    }

    #[test]
    fn test_duplicate_strikes_rejected() {
        let store = vol_store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let err = build(&ctx, &surface_config(&["90", "90.0"], &["*"], VolatilityQuoteType::RateLnVol)).unwrap_err();
        assert!(err.to_string().contains("The configured strikes contain duplicates"), "{err}");
    }

    #[test]
    fn test_missing_cell_in_explicit_grid() {
        let store = vol_store();
        let config = vol_config(vec![]);
        let ctx = context(&config, &store, empty_deps());
        let err = build(
            &ctx,
            &surface_config(&["90", "100", "120"], &["2024-06-01"], VolatilityQuoteType::RateLnVol),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VolError::Market(pillar_market::MarketError::QuoteCountMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_premiums_are_stripped() {
        let (prices, yields) = market(100.0, 0.02);
        let expiry = day(2025, 1, 15);
        let t = DC.year_fraction(asof(), expiry);
        let df = (-0.02 * t).exp();
        let mut store = InMemoryQuoteStore::new();
        for (strike, vol) in [(90.0, 0.33), (100.0, 0.30), (110.0, 0.28)] {
            for option_type in [OptionType::Call, OptionType::Put] {
                let premium = black_price_vol(option_type, 100.0, strike, vol, t, df);
                let suffix = if option_type == OptionType::Call { "C" } else { "P" };
                store
                    .add_quote(
                        asof(),
                        &format!("COMMODITY_OPTION/PRICE/WTI/USD/2025-01-15/{strike}/{suffix}"),
                        premium,
                    )
                    .unwrap();
            }
        }
        let mut config = vol_config(vec![]);
        config.prefer_out_of_the_money = true;
        let ctx = context(&config, &store, deps(&prices, &yields));
        let built = build(
            &ctx,
            &surface_config(&["90", "100", "110"], &["2025-01-15"], VolatilityQuoteType::Price),
        )
        .unwrap();
        for (strike, vol) in [(90.0, 0.33), (100.0, 0.30), (110.0, 0.28)] {
            assert_relative_eq!(built.surface.black_vol(expiry, strike).unwrap(), vol, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_premium_side_choice() {
        assert_eq!(
            choose_premium(Some(1.0), Some(2.0), Some(100.0), 110.0, true),
            Some((OptionType::Call, 1.0))
        );
        assert_eq!(
            choose_premium(Some(1.0), Some(2.0), Some(100.0), 90.0, true),
            Some((OptionType::Put, 2.0))
        );
        assert_eq!(
            choose_premium(Some(1.0), Some(2.0), Some(100.0), 110.0, false),
            Some((OptionType::Put, 2.0))
        );
        assert_eq!(choose_premium(Some(1.0), Some(2.0), None, 90.0, true), Some((OptionType::Call, 1.0)));
        assert_eq!(choose_premium(None, Some(2.0), Some(100.0), 110.0, true), Some((OptionType::Put, 2.0)));
        assert_eq!(choose_premium(None, None, Some(100.0), 110.0, true), None);
    }
}

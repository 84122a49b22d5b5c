//! Building one commodity volatility surface from its configuration.
//!
//! The configured variants are tried in priority order and the first that
//! builds wins. Each failure is logged and kept; when every variant fails
//! the attempts are returned together.

mod curve;
mod derived;
mod grid;
mod quotes;
mod strike;

use std::sync::Arc;

use pillar_core::Date;
use pillar_market::config::{CommodityVolatilityConfig, Validate, VolatilityConfigKind};
use pillar_market::conventions::Conventions;
use pillar_market::quotes::QuoteStore;
use pillar_market::specs::CommodityVolSpec;
use tracing::{debug, info, info_span, warn};

use crate::dependencies::VolDependencies;
use crate::diagnostics::{CalibrationReportBuilder, VolCalibrationInfo};
use crate::error::{VolError, VolResult};
use crate::expiry::{ConventionsFutureExpiry, FutureExpiryCalculator};
use crate::term_structure::BlackVolTermStructure;
use crate::vol_curve::CommodityVolCurve;

use quotes::VolContext;

/// A surface built by one variant.
#[derive(Debug)]
struct BuiltSurface {
    surface: Arc<dyn BlackVolTermStructure>,
    last_quoted_expiry: Option<Date>,
}

impl BuiltSurface {
    fn new(surface: impl BlackVolTermStructure + 'static, last_quoted_expiry: Option<Date>) -> Self {
        Self {
            surface: Arc::new(surface),
            last_quoted_expiry,
        }
    }
}

/// Builds a [`CommodityVolCurve`] from a [`CommodityVolatilityConfig`].
///
/// # Example
///
/// ```rust
/// use pillar_core::{Currency, Date};
/// use pillar_market::config::{
///     CommodityVolatilityConfig, ConstantVolatilityConfig, VolatilityConfig, VolatilityConfigKind,
/// };
/// use pillar_market::conventions::Conventions;
/// use pillar_market::quotes::InMemoryQuoteStore;
/// use pillar_market::specs::CommodityVolSpec;
/// use pillar_vol::{BlackVolTermStructure, CommodityVolCurveBuilder, VolDependencies};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let quote = "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/1Y/ATM/AtmFwd";
/// let quotes = InMemoryQuoteStore::new().with_quote(asof, quote, 0.35).unwrap();
/// let config = CommodityVolatilityConfig::new(
///     "WTI",
///     Currency::USD,
///     vec![VolatilityConfig::new(VolatilityConfigKind::Constant(ConstantVolatilityConfig {
///         quote: quote.to_string(),
///     }))],
/// );
/// let spec = CommodityVolSpec::new(Currency::USD, "WTI");
/// let conventions = Conventions::default();
/// let curve = CommodityVolCurveBuilder::new(asof, &spec, &config, &conventions, &quotes, VolDependencies::empty())
///     .build()
///     .unwrap();
/// assert_eq!(curve.black_vol(asof.add_days(200), 80.0).unwrap(), 0.35);
/// ```
pub struct CommodityVolCurveBuilder<'a> {
    asof: Date,
    spec: &'a CommodityVolSpec,
    config: &'a CommodityVolatilityConfig,
    conventions: &'a Conventions,
    quotes: &'a dyn QuoteStore,
    dependencies: VolDependencies<'a>,
}

impl<'a> CommodityVolCurveBuilder<'a> {
    /// Creates a builder over borrowed inputs.
    #[must_use]
    pub fn new(
        asof: Date,
        spec: &'a CommodityVolSpec,
        config: &'a CommodityVolatilityConfig,
        conventions: &'a Conventions,
        quotes: &'a dyn QuoteStore,
        dependencies: VolDependencies<'a>,
    ) -> Self {
        Self {
            asof,
            spec,
            config,
            conventions,
            quotes,
            dependencies,
        }
    }

    /// Builds the surface.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned directly. When every configured
    /// variant fails, [`VolError::AllVariantsFailed`] lists each attempt.
    pub fn build(&self) -> VolResult<CommodityVolCurve> {
        let curve_id = self.config.curve_id.as_str();
        let span = info_span!("commodity_vol_curve", curve_id, asof = %self.asof);
        let _guard = span.enter();

        self.config.validate()?;
        let ctx = VolContext {
            asof: self.asof,
            config: self.config,
            conventions: self.conventions,
            quotes: self.quotes,
            dependencies: self.dependencies,
            expiry_calculator: self.expiry_calculator()?,
        };

        let mut attempts = Vec::new();
        for (i, variant) in self.config.ordered_configs().into_iter().enumerate() {
            let kind = &variant.kind;
            for ignored in kind.ignored_settings() {
                warn!(variant = kind.type_name(), %ignored, "configuration setting ignored");
            }
            match build_variant(&ctx, kind) {
                Ok(built) => {
                    info!(
                        variant = kind.type_name(),
                        attempt = i + 1,
                        max_date = %built.surface.max_date(),
                        "volatility surface built"
                    );
                    let calibration = self.calibration(&ctx, &built);
                    return Ok(CommodityVolCurve::new(
                        self.spec.clone(),
                        self.asof,
                        built.surface,
                        kind.type_name(),
                        calibration,
                    ));
                }
                Err(e) => {
                    warn!(variant = kind.type_name(), attempt = i + 1, error = %e, "volatility variant failed");
                    attempts.push(format!("{} ({}): {e}", i + 1, kind.type_name()));
                }
            }
        }
        Err(VolError::AllVariantsFailed {
            curve_id: curve_id.to_string(),
            attempts,
        })
    }

    fn expiry_calculator(&self) -> VolResult<Option<Arc<dyn FutureExpiryCalculator>>> {
        let Some(id) = self.config.future_conventions_id.as_deref() else {
            return Ok(None);
        };
        let convention = self.conventions.commodity_future(id)?;
        let calculator: Arc<dyn FutureExpiryCalculator> = Arc::new(ConventionsFutureExpiry::new(convention.clone())?);
        Ok(Some(calculator))
    }

    fn calibration(&self, ctx: &VolContext<'_>, built: &BuiltSurface) -> Option<VolCalibrationInfo> {
        let report = self.config.report.as_ref()?;
        let market = ctx.price_curve("calibration report").and_then(|p| Ok((p, ctx.yield_curve("calibration report")?)));
        let (prices, discount) = match market {
            Ok(market) => market,
            Err(e) => {
                debug!(error = %e, "calibration report skipped");
                return None;
            }
        };
        let info = CalibrationReportBuilder::new(self.asof, report)
            .with_max_quoted_expiry(built.last_quoted_expiry)
            .build(built.surface.as_ref(), &prices, discount.as_ref());
        match info {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "calibration report failed");
                None
            }
        }
    }
}

fn build_variant(ctx: &VolContext<'_>, kind: &VolatilityConfigKind) -> VolResult<BuiltSurface> {
    match kind {
        VolatilityConfigKind::Constant(c) => curve::constant(ctx, c),
        VolatilityConfigKind::Curve(c) => curve::curve(ctx, c),
        VolatilityConfigKind::StrikeSurface(c) => strike::build(ctx, c),
        VolatilityConfigKind::DeltaSurface(c) => grid::delta(ctx, c),
        VolatilityConfigKind::MoneynessSurface(c) => grid::moneyness(ctx, c),
        VolatilityConfigKind::ApoFutureSurface(c) => derived::apo(ctx, c),
        VolatilityConfigKind::Proxy(c) => derived::proxy(ctx, c),
    }
}

#[cfg(test)]
mod test_support {
    use std::sync::{Arc, OnceLock};

    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::{Currency, Date};
    use pillar_curves::calibration::YieldCurveCalibrationInfo;
    use pillar_curves::{FlatForwardCurve, PriceCurve, PriceInterpolation, YieldCurve, YieldCurveMap};
    use pillar_market::config::{CommodityVolatilityConfig, VolatilityConfig};
    use pillar_market::conventions::Conventions;
    use pillar_market::quotes::QuoteStore;
    use pillar_market::specs::YieldCurveSpec;

    use super::quotes::VolContext;
    use crate::dependencies::{PriceCurveMap, VolDependencies};

    pub(crate) const DC: DayCountConvention = DayCountConvention::Act365Fixed;

    pub(crate) fn day(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    pub(crate) fn asof() -> Date {
        day(2024, 1, 15)
    }

    pub(crate) fn vol_config(configs: Vec<VolatilityConfig>) -> CommodityVolatilityConfig {
        CommodityVolatilityConfig::new("WTI", Currency::USD, configs).with_curves("WTI", "USD-SOFR")
    }

    pub(crate) fn empty_deps() -> VolDependencies<'static> {
        VolDependencies::empty()
    }

    fn no_conventions() -> &'static Conventions {
        static CONVENTIONS: OnceLock<Conventions> = OnceLock::new();
        CONVENTIONS.get_or_init(Conventions::default)
    }

    pub(crate) fn context<'a>(
        config: &'a CommodityVolatilityConfig,
        quotes: &'a dyn QuoteStore,
        dependencies: VolDependencies<'a>,
    ) -> VolContext<'a> {
        VolContext {
            asof: asof(),
            config,
            conventions: no_conventions(),
            quotes,
            dependencies,
            expiry_calculator: None,
        }
    }

    pub(crate) fn flat_prices(price: f64) -> Arc<PriceCurve> {
        Arc::new(
            PriceCurve::new(
                asof(),
                Currency::USD,
                vec![asof(), day(2034, 1, 15)],
                vec![price, price],
                DC,
                PriceInterpolation::Linear,
                true,
            )
            .unwrap(),
        )
    }

    /// WTI prices flat at `price` and a flat USD-SOFR curve at `rate`.
    pub(crate) fn market(price: f64, rate: f64) -> (PriceCurveMap, YieldCurveMap) {
        let mut prices = PriceCurveMap::new();
        prices.insert("WTI".into(), flat_prices(price));
        let spec = YieldCurveSpec::new(Currency::USD, "USD-SOFR");
        let mut yields = YieldCurveMap::new();
        yields.insert(
            spec.name(),
            Arc::new(YieldCurve::new(
                spec,
                asof(),
                Arc::new(FlatForwardCurve::new(asof(), rate, DC)),
                YieldCurveCalibrationInfo::default(),
            )),
        );
        (prices, yields)
    }

    pub(crate) fn deps<'a>(prices: &'a PriceCurveMap, yields: &'a YieldCurveMap) -> VolDependencies<'a> {
        VolDependencies::empty()
            .with_price_curves(prices)
            .with_yield_curves(yields)
    }
}

//! Building one yield curve from its configuration.
//!
//! Bootstrap segments are turned into helpers, cleared of duplicate and
//! crowded pillars and solved together. A single direct segment (discount
//! factors, zero rates, spreads over other curves, fitted bonds) is built
//! without a bootstrap.

mod direct;
mod priority;
mod segments;

use std::sync::Arc;

use pillar_core::Date;
use pillar_market::config::{YieldCurveConfig, YieldCurveSegment};
use pillar_market::conventions::Conventions;
use pillar_market::quotes::QuoteStore;
use pillar_market::specs::YieldCurveSpec;
use tracing::{debug, info, info_span};

use crate::bootstrap::PiecewiseYieldCurve;
use crate::calibration::YieldCurveCalibrationInfo;
use crate::curves::InterpolationSpec;
use crate::dependencies::CurveDependencies;
use crate::error::{CurveError, CurveResult};
use crate::helpers::{CurveHandle, SharedHelper};
use crate::term_structure::YieldTermStructure;
use crate::yield_curve::YieldCurve;

use priority::{dedup_pillars, resolve_priorities, SegmentRank};
use segments::SegmentContext;

/// Time at which every built curve is evaluated once before it is returned.
const SMOKE_TEST_TIME: f64 = 1e-4;

/// Builds a [`YieldCurve`] from a [`YieldCurveConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use pillar_core::Date;
/// use pillar_curves::{CurveDependencies, YieldCurveBuilder, YieldCurveMap, YieldTermStructure};
/// use pillar_market::config::YieldCurveConfig;
/// use pillar_market::conventions::Conventions;
/// use pillar_market::quotes::InMemoryQuoteStore;
///
/// # fn run(config: &YieldCurveConfig, conventions: &Conventions, quotes: &InMemoryQuoteStore) -> pillar_curves::CurveResult<()> {
/// let asof = Date::from_ymd(2024, 1, 15)?;
/// let built = YieldCurveMap::new();
/// let curve = YieldCurveBuilder::new(asof, config, conventions, quotes, CurveDependencies::new(&built)).build()?;
/// println!("{:?}", curve.discount(Date::from_ymd(2025, 1, 15)?)?);
/// # Ok(())
/// # }
/// ```
pub struct YieldCurveBuilder<'a> {
    asof: Date,
    config: &'a YieldCurveConfig,
    conventions: &'a Conventions,
    quotes: &'a dyn QuoteStore,
    dependencies: CurveDependencies<'a>,
}

impl<'a> YieldCurveBuilder<'a> {
    /// Creates a builder over borrowed inputs.
    #[must_use]
    pub fn new(
        asof: Date,
        config: &'a YieldCurveConfig,
        conventions: &'a Conventions,
        quotes: &'a dyn QuoteStore,
        dependencies: CurveDependencies<'a>,
    ) -> Self {
        Self {
            asof,
            config,
            conventions,
            quotes,
            dependencies,
        }
    }

    /// Builds the curve.
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`CurveError::Build`] carrying the curve
    /// id and as-of date around the innermost cause.
    pub fn build(&self) -> CurveResult<YieldCurve> {
        let curve_id = self.config.curve_id.as_str();
        let span = info_span!("yield_curve", curve_id, asof = %self.asof);
        let _guard = span.enter();
        self.build_inner()
            .map_err(|e| CurveError::build(curve_id, self.asof, e))
    }

    fn spec(&self) -> YieldCurveSpec {
        YieldCurveSpec::new(self.config.currency, self.config.curve_id.as_str())
    }

    fn build_inner(&self) -> CurveResult<YieldCurve> {
        let config = self.config;
        if config.segments.len() > 1 {
            if let Some(description) = config.segments.iter().find_map(|s| s.kind.direct_description()) {
                return Err(CurveError::SingleSegment { description });
            }
        }
        config.validate_config()?;

        let discount = match config.exogenous_discount_curve() {
            Some(id) => CurveHandle::External(self.dependencies.yield_curve(id, config.currency, &config.curve_id)?),
            None => CurveHandle::Own,
        };
        let ctx = SegmentContext {
            asof: self.asof,
            config,
            conventions: self.conventions,
            quotes: self.quotes,
            dependencies: self.dependencies,
            discount,
        };

        let curve = match config.direct_segment() {
            Some(segment) => self.build_direct(&ctx, segment)?,
            None => self.build_bootstrapped(&ctx)?,
        };

        let t = SMOKE_TEST_TIME;
        let df = curve.discount_t(t, true)?;
        debug!(t, df, "curve evaluated");
        Ok(curve)
    }

    fn build_direct(&self, ctx: &SegmentContext<'_>, segment: &YieldCurveSegment) -> CurveResult<YieldCurve> {
        let built = direct::build(ctx, segment)?;
        let calibration = YieldCurveCalibrationInfo::from_curve(built.curve.as_ref(), &built.pillars)?;
        info!(
            kind = segment.kind.type_name(),
            pillars = built.pillars.len(),
            "direct curve built"
        );
        Ok(YieldCurve::new(self.spec(), self.asof, built.curve, calibration))
    }

    fn build_bootstrapped(&self, ctx: &SegmentContext<'_>) -> CurveResult<YieldCurve> {
        let config = self.config;
        let mut per_segment: Vec<Vec<SharedHelper>> = Vec::with_capacity(config.segments.len());
        for segment in &config.segments {
            let helpers = dedup_pillars(ctx.helpers(segment)?);
            info!(
                kind = segment.kind.type_name(),
                conventions = %segment.conventions_id,
                helpers = helpers.len(),
                "segment loaded"
            );
            per_segment.push(helpers);
        }
        let ranks: Vec<SegmentRank> = config.segments.iter().map(SegmentRank::from).collect();
        resolve_priorities(&mut per_segment, &ranks);

        let mixed_size: usize = per_segment
            .iter()
            .take(config.mixed_interpolation_cutoff)
            .map(Vec::len)
            .sum();
        let helpers: Vec<SharedHelper> = per_segment.into_iter().flatten().collect();
        if helpers.is_empty() {
            return Err(CurveError::EmptyInstruments {
                asof: self.asof,
                curve: self.spec().name(),
            });
        }

        let spec = InterpolationSpec::new(
            config.interpolation_method,
            config.interpolation_variable,
            config.zero_day_counter,
        )
        .with_mixed_size(mixed_size)
        .with_extrapolation(config.extrapolation);
        let piecewise = PiecewiseYieldCurve::bootstrap(self.asof, &helpers, spec, config.bootstrap)?;
        info!(
            helpers = piecewise.helpers().len(),
            passes = piecewise.passes(),
            "curve bootstrapped"
        );

        let pillars = piecewise.nodes().dates().to_vec();
        let piecewise = Arc::new(piecewise);
        let calibration = YieldCurveCalibrationInfo::from_curve(piecewise.as_ref(), &pillars)?
            .with_helpers(piecewise.as_ref(), piecewise.helpers())?;

        if config.preserve_quote_linkage {
            return Ok(YieldCurve::quote_linked(self.spec(), self.asof, piecewise, calibration));
        }
        let baked: Arc<dyn YieldTermStructure> = Arc::new(piecewise.rebake()?);
        debug!(nodes = pillars.len(), "curve re-baked without quote linkage");
        Ok(YieldCurve::new(self.spec(), self.asof, baked, calibration))
    }
}

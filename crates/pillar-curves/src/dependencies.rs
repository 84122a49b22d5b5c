//! Already-built curves a build may refer to.

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::Currency;
use pillar_market::specs::YieldCurveSpec;
use pillar_market::MarketError;

use crate::curves::SurvivalTermStructure;
use crate::error::CurveResult;
use crate::term_structure::YieldTermStructure;
use crate::yield_curve::YieldCurve;

/// Built yield curves keyed by [`YieldCurveSpec::name`].
pub type YieldCurveMap = BTreeMap<String, Arc<YieldCurve>>;

/// Default curves keyed by curve id.
pub type DefaultCurveMap = BTreeMap<String, Arc<dyn SurvivalTermStructure>>;

/// Borrowed view of the curves of a market snapshot.
///
/// # Example
///
/// ```rust
/// use pillar_core::Currency;
/// use pillar_curves::{CurveDependencies, YieldCurveMap};
///
/// let built = YieldCurveMap::new();
/// let deps = CurveDependencies::new(&built);
/// let Err(err) = deps.yield_curve("EUR-ESTR", Currency::EUR, "EUR-6M") else {
///     panic!("no curves were built");
/// };
/// assert!(err.to_string().contains("EUR-ESTR"));
/// ```
#[derive(Clone, Copy, Default)]
pub struct CurveDependencies<'a> {
    yield_curves: Option<&'a YieldCurveMap>,
    default_curves: Option<&'a DefaultCurveMap>,
}

impl std::fmt::Debug for CurveDependencies<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurveDependencies")
            .field("yield_curves", &self.yield_curves.map(|m| m.keys().collect::<Vec<_>>()))
            .field("default_curves", &self.default_curves.map(|m| m.keys().collect::<Vec<_>>()))
            .finish()
    }
}

impl<'a> CurveDependencies<'a> {
    /// No curves available.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Yield curves of the snapshot.
    #[must_use]
    pub fn new(yield_curves: &'a YieldCurveMap) -> Self {
        Self {
            yield_curves: Some(yield_curves),
            default_curves: None,
        }
    }

    /// Adds the default curves of the snapshot.
    #[must_use]
    pub fn with_default_curves(mut self, default_curves: &'a DefaultCurveMap) -> Self {
        self.default_curves = Some(default_curves);
        self
    }

    /// Looks up a yield curve by currency and id.
    ///
    /// The curve of `currency` is preferred; otherwise any currency's curve
    /// with that id is used.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn yield_curve(
        &self,
        curve_id: &str,
        currency: Currency,
        requester: &str,
    ) -> CurveResult<Arc<dyn YieldTermStructure>> {
        let missing = || MarketError::missing_dependency(requester, curve_id);
        let curves = self.yield_curves.ok_or_else(missing)?;
        if let Some(curve) = curves.get(&YieldCurveSpec::new(currency, curve_id).name()) {
            return Ok(curve.clone() as Arc<dyn YieldTermStructure>);
        }
        curves
            .values()
            .find(|c| c.spec().curve_id == curve_id)
            .map(|c| c.clone() as Arc<dyn YieldTermStructure>)
            .ok_or_else(|| missing().into())
    }

    /// Looks up a yield curve by its exact spec.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn yield_curve_exact(
        &self,
        spec: &YieldCurveSpec,
        requester: &str,
    ) -> CurveResult<Arc<dyn YieldTermStructure>> {
        self.yield_curves
            .and_then(|m| m.get(&spec.name()))
            .map(|c| c.clone() as Arc<dyn YieldTermStructure>)
            .ok_or_else(|| MarketError::missing_dependency(requester, spec.name()).into())
    }

    /// Looks up a default curve by id.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn default_curve(
        &self,
        curve_id: &str,
        requester: &str,
    ) -> CurveResult<Arc<dyn SurvivalTermStructure>> {
        self.default_curves
            .and_then(|m| m.get(curve_id))
            .cloned()
            .ok_or_else(|| MarketError::missing_dependency(requester, curve_id).into())
    }
}

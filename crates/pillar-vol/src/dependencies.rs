//! Already-built curves and surfaces a volatility build may refer to.

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::Currency;
use pillar_curves::{CurveDependencies, PriceCurve, YieldCurveMap, YieldTermStructure};
use pillar_market::MarketError;

use crate::correlation::CorrelationTermStructure;
use crate::error::VolResult;
use crate::term_structure::BlackVolTermStructure;

/// Built commodity price curves keyed by curve id.
pub type PriceCurveMap = BTreeMap<String, Arc<PriceCurve>>;

/// Built volatility surfaces keyed by curve id, or by currency pair
/// (`EURUSD`) for FX surfaces.
pub type VolSurfaceMap = BTreeMap<String, Arc<dyn BlackVolTermStructure>>;

/// Correlation curves keyed by curve id.
pub type CorrelationMap = BTreeMap<String, Arc<dyn CorrelationTermStructure>>;

/// Borrowed view of the curves and surfaces of a market snapshot.
///
/// # Example
///
/// ```rust
/// use pillar_vol::{PriceCurveMap, VolDependencies};
///
/// let prices = PriceCurveMap::new();
/// let deps = VolDependencies::empty().with_price_curves(&prices);
/// let err = deps.price_curve("WTI", "WTI-VOL").unwrap_err();
/// assert!(err.to_string().contains("'WTI'"));
/// ```
#[derive(Clone, Copy, Default)]
pub struct VolDependencies<'a> {
    yield_curves: Option<&'a YieldCurveMap>,
    price_curves: Option<&'a PriceCurveMap>,
    commodity_vols: Option<&'a VolSurfaceMap>,
    fx_vols: Option<&'a VolSurfaceMap>,
    correlations: Option<&'a CorrelationMap>,
}

fn keys<V>(map: Option<&BTreeMap<String, V>>) -> Option<Vec<&String>> {
    map.map(|m| m.keys().collect())
}

impl std::fmt::Debug for VolDependencies<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolDependencies")
            .field("yield_curves", &keys(self.yield_curves))
            .field("price_curves", &keys(self.price_curves))
            .field("commodity_vols", &keys(self.commodity_vols))
            .field("fx_vols", &keys(self.fx_vols))
            .field("correlations", &keys(self.correlations))
            .finish()
    }
}

impl<'a> VolDependencies<'a> {
    /// Nothing available.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds the yield curves of the snapshot.
    #[must_use]
    pub fn with_yield_curves(mut self, curves: &'a YieldCurveMap) -> Self {
        self.yield_curves = Some(curves);
        self
    }

    /// Adds the commodity price curves of the snapshot.
    #[must_use]
    pub fn with_price_curves(mut self, curves: &'a PriceCurveMap) -> Self {
        self.price_curves = Some(curves);
        self
    }

    /// Adds the commodity volatility surfaces already built.
    #[must_use]
    pub fn with_commodity_vols(mut self, surfaces: &'a VolSurfaceMap) -> Self {
        self.commodity_vols = Some(surfaces);
        self
    }

    /// Adds the FX volatility surfaces, keyed by pair.
    #[must_use]
    pub fn with_fx_vols(mut self, surfaces: &'a VolSurfaceMap) -> Self {
        self.fx_vols = Some(surfaces);
        self
    }

    /// Adds the correlation curves.
    #[must_use]
    pub fn with_correlations(mut self, curves: &'a CorrelationMap) -> Self {
        self.correlations = Some(curves);
        self
    }

    /// Looks up a yield curve, preferring the curve of `currency`.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn yield_curve(
        &self,
        curve_id: &str,
        currency: Currency,
        requester: &str,
    ) -> VolResult<Arc<dyn YieldTermStructure>> {
        let curves = self
            .yield_curves
            .ok_or_else(|| MarketError::missing_dependency(requester, curve_id))?;
        Ok(CurveDependencies::new(curves).yield_curve(curve_id, currency, requester)?)
    }

    /// Looks up a price curve by id.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn price_curve(&self, curve_id: &str, requester: &str) -> VolResult<Arc<PriceCurve>> {
        lookup(self.price_curves, curve_id, requester)
    }

    /// Looks up a commodity volatility surface by id.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn commodity_vol(&self, curve_id: &str, requester: &str) -> VolResult<Arc<dyn BlackVolTermStructure>> {
        lookup(self.commodity_vols, curve_id, requester)
    }

    /// FX volatility surface of a pair, if present under exactly that key.
    #[must_use]
    pub fn fx_vol(&self, pair: &str) -> Option<Arc<dyn BlackVolTermStructure>> {
        self.fx_vols.and_then(|m| m.get(pair)).cloned()
    }

    /// Looks up a correlation curve by id.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::MissingDependency` naming `requester`.
    pub fn correlation(&self, curve_id: &str, requester: &str) -> VolResult<Arc<dyn CorrelationTermStructure>> {
        lookup(self.correlations, curve_id, requester)
    }
}

fn lookup<V: Clone>(map: Option<&BTreeMap<String, V>>, key: &str, requester: &str) -> VolResult<V> {
    map.and_then(|m| m.get(key))
        .cloned()
        .ok_or_else(|| MarketError::missing_dependency(requester, key).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::FlatCorrelation;
    use crate::surfaces::ConstantVol;
    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::Date;

    #[test]
    fn test_lookups_and_missing_messages() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let mut vols = VolSurfaceMap::new();
        vols.insert(
            "EURUSD".into(),
            Arc::new(ConstantVol::new(asof, 0.08, DayCountConvention::Act365Fixed)),
        );
        let mut correlations = CorrelationMap::new();
        correlations.insert("BRENT-EURUSD".into(), Arc::new(FlatCorrelation::new(0.3).unwrap()));

        let deps = VolDependencies::empty()
            .with_fx_vols(&vols)
            .with_correlations(&correlations);
        assert!(deps.fx_vol("EURUSD").is_some());
        assert!(deps.fx_vol("USDEUR").is_none());
        assert!(deps.correlation("BRENT-EURUSD", "BRENT").is_ok());

        let Err(err) = deps.yield_curve("USD-SOFR", Currency::USD, "WTI") else {
            panic!("no yield curves were given");
        };
        assert_eq!(
            err.to_string(),
            "The curve 'USD-SOFR' required in the building of the curve 'WTI' was not found."
        );
        assert!(format!("{deps:?}").contains("EURUSD"));
    }
}

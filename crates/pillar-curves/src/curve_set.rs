//! Building every configured yield curve of a snapshot in dependency order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pillar_core::Date;
use pillar_market::config::{CurveConfigurations, YieldCurveConfig};
use pillar_market::conventions::Conventions;
use pillar_market::quotes::QuoteStore;
use pillar_market::specs::YieldCurveSpec;
use tracing::{info, info_span, warn};

use crate::builder::YieldCurveBuilder;
use crate::dependencies::{CurveDependencies, DefaultCurveMap, YieldCurveMap};
use crate::error::{CurveError, CurveResult};
use crate::yield_curve::YieldCurve;

/// Configured curve ids grouped so that each layer only depends on
/// earlier layers.
///
/// Dependencies on ids without a configuration are not edges; building
/// such a curve fails on the missing dependency instead.
///
/// # Errors
///
/// Returns [`CurveError::CyclicDependency`] naming the curves that could
/// not be ordered.
pub fn dependency_layers<'c>(
    configs: impl IntoIterator<Item = &'c YieldCurveConfig>,
) -> CurveResult<Vec<Vec<String>>> {
    let mut pending: BTreeMap<String, BTreeSet<String>> = configs
        .into_iter()
        .map(|c| (c.curve_id.clone(), c.required_curve_ids()))
        .collect();
    let configured: BTreeSet<String> = pending.keys().cloned().collect();
    for requires in pending.values_mut() {
        requires.retain(|id| configured.contains(id));
    }

    let mut layers = Vec::new();
    while !pending.is_empty() {
        let ready: Vec<String> = pending
            .iter()
            .filter(|(_, requires)| requires.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        if ready.is_empty() {
            let curve_ids = pending.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(CurveError::CyclicDependency { curve_ids });
        }
        for id in &ready {
            pending.remove(id);
        }
        for requires in pending.values_mut() {
            for id in &ready {
                requires.remove(id);
            }
        }
        layers.push(ready);
    }
    Ok(layers)
}

/// Yield curves of one snapshot, with the failures of curves that could
/// not be built.
#[derive(Debug, Default)]
pub struct YieldCurveSet {
    asof: Option<Date>,
    curves: YieldCurveMap,
    failures: BTreeMap<String, CurveError>,
}

impl YieldCurveSet {
    /// Builds every yield curve in `configs`.
    ///
    /// # Errors
    ///
    /// Fails only when the configurations cannot be ordered; individual
    /// curve failures are recorded and reported by [`failures`](Self::failures).
    pub fn build(
        asof: Date,
        configs: &CurveConfigurations,
        conventions: &Conventions,
        quotes: &dyn QuoteStore,
    ) -> CurveResult<Self> {
        Self::build_with_defaults(asof, configs, conventions, quotes, &DefaultCurveMap::new())
    }

    /// Builds every yield curve in `configs` with default curves for
    /// yield-plus-default segments.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_defaults(
        asof: Date,
        configs: &CurveConfigurations,
        conventions: &Conventions,
        quotes: &dyn QuoteStore,
        default_curves: &DefaultCurveMap,
    ) -> CurveResult<Self> {
        let span = info_span!("yield_curve_set", asof = %asof);
        let _guard = span.enter();

        let layers = dependency_layers(configs.yield_curves())?;
        let mut set = Self {
            asof: Some(asof),
            ..Self::default()
        };
        for layer in &layers {
            let batch: Vec<&YieldCurveConfig> = layer
                .iter()
                .map(|id| configs.yield_curve(id))
                .collect::<Result<_, _>>()?;
            let results = {
                let dependencies = CurveDependencies::new(&set.curves).with_default_curves(default_curves);
                build_layer(&set, &batch, |config| {
                    YieldCurveBuilder::new(asof, config, conventions, quotes, dependencies).build()
                })
            };
            for (config, result) in batch.into_iter().zip(results) {
                set.record(config, result);
            }
        }
        info!(
            built = set.curves.len(),
            failed = set.failures.len(),
            "yield curve set built"
        );
        Ok(set)
    }

    /// The failed dependency of `config`, if any.
    fn blocked_by(&self, config: &YieldCurveConfig) -> Option<String> {
        config
            .required_curve_ids()
            .into_iter()
            .find(|id| self.failures.contains_key(id))
    }

    fn record(&mut self, config: &YieldCurveConfig, result: CurveResult<YieldCurve>) {
        match result {
            Ok(curve) => {
                self.curves.insert(curve.spec().name(), Arc::new(curve));
            }
            Err(e) => {
                warn!(curve_id = %config.curve_id, error = %e, "yield curve not built");
                self.failures.insert(config.curve_id.clone(), e);
            }
        }
    }

    /// As-of date of the snapshot.
    #[must_use]
    pub fn asof(&self) -> Option<Date> {
        self.asof
    }

    /// Built curves keyed by spec name, ready to serve as dependencies.
    #[must_use]
    pub fn curves(&self) -> &YieldCurveMap {
        &self.curves
    }

    /// A built curve by id.
    #[must_use]
    pub fn get(&self, curve_id: &str) -> Option<&Arc<YieldCurve>> {
        self.curves.values().find(|c| c.spec().curve_id == curve_id)
    }

    /// A built curve by exact spec.
    #[must_use]
    pub fn get_spec(&self, spec: &YieldCurveSpec) -> Option<&Arc<YieldCurve>> {
        self.curves.get(&spec.name())
    }

    /// Errors of the curves that were not built, by curve id.
    #[must_use]
    pub fn failures(&self) -> &BTreeMap<String, CurveError> {
        &self.failures
    }

    /// True when every configured curve was built.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the curves of one layer, skipping those with a failed dependency.
#[cfg(not(feature = "parallel"))]
fn build_layer<F>(set: &YieldCurveSet, batch: &[&YieldCurveConfig], build: F) -> Vec<CurveResult<YieldCurve>>
where
    F: Fn(&YieldCurveConfig) -> CurveResult<YieldCurve>,
{
    batch
        .iter()
        .map(|config| build_one(set, config, &build))
        .collect()
}

/// Builds the curves of one layer concurrently, skipping those with a
/// failed dependency.
#[cfg(feature = "parallel")]
fn build_layer<F>(set: &YieldCurveSet, batch: &[&YieldCurveConfig], build: F) -> Vec<CurveResult<YieldCurve>>
where
    F: Fn(&YieldCurveConfig) -> CurveResult<YieldCurve> + Sync,
{
    use rayon::prelude::*;

    batch
        .par_iter()
        .map(|config| build_one(set, config, &build))
        .collect()
}

fn build_one<F>(set: &YieldCurveSet, config: &YieldCurveConfig, build: &F) -> CurveResult<YieldCurve>
where
    F: Fn(&YieldCurveConfig) -> CurveResult<YieldCurve>,
{
    match set.blocked_by(config) {
        Some(dependency) => Err(CurveError::DependencyFailed {
            curve_id: config.curve_id.clone(),
            dependency,
        }),
        None => build(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> YieldCurveConfig {
        serde_json::from_str(json).unwrap()
    }

    fn ois(id: &str, discount: Option<&str>) -> YieldCurveConfig {
        let discount = discount.map_or(String::new(), |d| format!(r#""discount_curve_id": "{d}","#));
        config(&format!(
            r#"{{
                "curve_id": "{id}",
                "currency": "EUR",
                {discount}
                "segments": [
                    {{ "type": "Deposit", "conventions_id": "EUR-DEP", "quotes": ["MM/RATE/EUR/0D/*"] }}
                ]
            }}"#
        ))
    }

    #[test]
    fn test_layers_follow_dependencies() {
        let configs = [
            ois("EUR-6M", Some("EUR-ESTR")),
            ois("EUR-ESTR", None),
            ois("EUR-3M", Some("EUR-ESTR")),
        ];
        let layers = dependency_layers(configs.iter()).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0], vec!["EUR-ESTR".to_string()]);
        assert_eq!(layers[1], vec!["EUR-3M".to_string(), "EUR-6M".to_string()]);
    }

    #[test]
    fn test_unconfigured_dependency_is_not_an_edge() {
        let configs = [ois("EUR-6M", Some("EUR-ESTR"))];
        let layers = dependency_layers(configs.iter()).unwrap();
        assert_eq!(layers, vec![vec!["EUR-6M".to_string()]]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let configs = [
            ois("A", Some("B")),
            ois("B", Some("C")),
            ois("C", Some("A")),
            ois("D", None),
        ];
        let err = dependency_layers(configs.iter()).unwrap_err();
        match err {
            CurveError::CyclicDependency { curve_ids } => assert_eq!(curve_ids, "A, B, C"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

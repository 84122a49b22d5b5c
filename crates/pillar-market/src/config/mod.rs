//! Curve configuration model.
//!
//! Configurations load from JSON or TOML through [`CurveConfigurations`]
//! and are validated before a build.

mod volatility;
mod yield_curve;

pub use volatility::{
    sorted_strikes, sorted_unique, ApoFutureSurfaceConfig, CalibrationReportConfig,
    CommodityVolatilityConfig, ConstantVolatilityConfig, CurveInterpolation, DeltaSurfaceConfig,
    Extrapolation, MoneynessSurfaceConfig, ProxyVolatilityConfig, SmileInterpolation,
    StrikeSurfaceConfig, SurfaceSettings, VolatilityConfig, VolatilityConfigKind,
    VolatilityCurveConfig, VolatilityQuoteType,
};
pub use yield_curve::{
    BondDefinition, BootstrapConfig, InterpolationMethod, InterpolationVariable, PillarChoice,
    SegmentKind, YieldCurveConfig, YieldCurveSegment,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MarketError, MarketResult};

/// Trait for configuration validation.
pub trait Validate {
    /// Checks the configuration, returning the first problem found.
    fn validate(&self) -> MarketResult<()>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// On-disk layout: lists of configurations.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigurationFile {
    #[serde(default)]
    yield_curves: Vec<YieldCurveConfig>,
    #[serde(default)]
    commodity_volatilities: Vec<CommodityVolatilityConfig>,
}

/// Registry of curve configurations keyed by curve id.
///
/// # Example
///
/// ```rust
/// use pillar_market::config::CurveConfigurations;
///
/// let toml = r#"
/// [[yield_curves]]
/// curve_id = "USD-SOFR"
/// currency = "USD"
///
/// [[yield_curves.segments]]
/// type = "Ois"
/// conventions_id = "USD-SOFR-OIS"
/// quotes = ["IR_SWAP/RATE/USD/2D/1D/*"]
/// "#;
/// let configs = CurveConfigurations::from_toml_str(toml).unwrap();
/// assert!(configs.yield_curve("USD-SOFR").is_ok());
/// assert!(configs.yield_curve("EUR-ESTR").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CurveConfigurations {
    yield_curves: BTreeMap<String, YieldCurveConfig>,
    commodity_volatilities: BTreeMap<String, CommodityVolatilityConfig>,
}

impl CurveConfigurations {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document with `yield_curves` and `commodity_volatilities` lists.
    pub fn from_json_str(s: &str) -> MarketResult<Self> {
        let file: ConfigurationFile = serde_json::from_str(s)?;
        Self::from_file(file)
    }

    /// Parses a TOML document with `yield_curves` and `commodity_volatilities` arrays.
    pub fn from_toml_str(s: &str) -> MarketResult<Self> {
        let file: ConfigurationFile = toml::from_str(s)?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigurationFile) -> MarketResult<Self> {
        let mut configs = Self::new();
        for config in file.yield_curves {
            configs.add_yield_curve(config)?;
        }
        for config in file.commodity_volatilities {
            configs.add_commodity_volatility(config)?;
        }
        debug!(
            yield_curves = configs.yield_curves.len(),
            commodity_volatilities = configs.commodity_volatilities.len(),
            "loaded curve configurations"
        );
        Ok(configs)
    }

    /// Registers a yield curve configuration.
    ///
    /// # Errors
    ///
    /// Fails when the curve id is already registered.
    pub fn add_yield_curve(&mut self, config: YieldCurveConfig) -> MarketResult<()> {
        if self.yield_curves.contains_key(&config.curve_id) {
            return Err(MarketError::duplicate(
                &config.curve_id,
                "Duplicate yield curve configuration",
            ));
        }
        self.yield_curves.insert(config.curve_id.clone(), config);
        Ok(())
    }

    /// Registers a commodity volatility configuration.
    ///
    /// # Errors
    ///
    /// Fails when the curve id is already registered.
    pub fn add_commodity_volatility(&mut self, config: CommodityVolatilityConfig) -> MarketResult<()> {
        if self.commodity_volatilities.contains_key(&config.curve_id) {
            return Err(MarketError::duplicate(
                &config.curve_id,
                "Duplicate commodity volatility configuration",
            ));
        }
        self.commodity_volatilities.insert(config.curve_id.clone(), config);
        Ok(())
    }

    /// Looks up a yield curve configuration.
    pub fn yield_curve(&self, curve_id: &str) -> MarketResult<&YieldCurveConfig> {
        self.yield_curves
            .get(curve_id)
            .ok_or_else(|| MarketError::ConfigNotFound {
                curve_id: curve_id.to_string(),
            })
    }

    /// Looks up a commodity volatility configuration.
    pub fn commodity_volatility(&self, curve_id: &str) -> MarketResult<&CommodityVolatilityConfig> {
        self.commodity_volatilities
            .get(curve_id)
            .ok_or_else(|| MarketError::ConfigNotFound {
                curve_id: curve_id.to_string(),
            })
    }

    /// True when a yield curve configuration is registered.
    #[must_use]
    pub fn has_yield_curve(&self, curve_id: &str) -> bool {
        self.yield_curves.contains_key(curve_id)
    }

    /// All yield curve configurations, by curve id.
    pub fn yield_curves(&self) -> impl Iterator<Item = &YieldCurveConfig> {
        self.yield_curves.values()
    }

    /// All commodity volatility configurations, by curve id.
    pub fn commodity_volatilities(&self) -> impl Iterator<Item = &CommodityVolatilityConfig> {
        self.commodity_volatilities.values()
    }
}

impl Validate for CurveConfigurations {
    fn validate(&self) -> MarketResult<()> {
        for config in self.yield_curves.values() {
            config.validate()?;
        }
        for config in self.commodity_volatilities.values() {
            config.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "yield_curves": [
            {
                "curve_id": "EUR-ESTR",
                "currency": "EUR",
                "segments": [
                    { "type": "Deposit", "conventions_id": "EUR-ON", "quotes": ["MM/RATE/EUR/0D/1D"] },
                    { "type": "Ois", "conventions_id": "EUR-OIS", "quotes": ["IR_SWAP/RATE/EUR/2D/1D/*"] }
                ]
            }
        ],
        "commodity_volatilities": [
            {
                "curve_id": "WTI",
                "currency": "USD",
                "configs": [ { "type": "Constant", "quote": "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/1Y/ATM/AtmFwd" } ]
            }
        ]
    }"#;

    #[test]
    fn test_json_loading() {
        let configs = CurveConfigurations::from_json_str(JSON).unwrap();
        assert_eq!(configs.yield_curve("EUR-ESTR").unwrap().segments.len(), 2);
        assert!(configs.commodity_volatility("WTI").is_ok());
        assert!(configs.is_valid());
    }

    #[test]
    fn test_missing_config() {
        let configs = CurveConfigurations::from_json_str(JSON).unwrap();
        let err = configs.yield_curve("USD-SOFR").unwrap_err();
        assert!(matches!(err, MarketError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_duplicate_curve_id() {
        let mut configs = CurveConfigurations::from_json_str(JSON).unwrap();
        let again = configs.yield_curve("EUR-ESTR").unwrap().clone();
        assert!(configs.add_yield_curve(again).is_err());
    }
}

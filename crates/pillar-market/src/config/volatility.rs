//! Commodity volatility configuration.
//!
//! A [`CommodityVolatilityConfig`] holds an ordered list of
//! [`VolatilityConfig`]s. The builder tries them in priority order and
//! keeps the first surface that builds.

use std::fmt;
use std::str::FromStr;

use pillar_core::calendars::MarketCalendar;
use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Period};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::error::{MarketError, MarketResult};
use crate::quotes::{close_enough, AtmType, DeltaVolType, MoneynessType, OptionType, Strike};

fn default_true() -> bool {
    true
}

fn default_linear() -> String {
    "Linear".to_string()
}

// =============================================================================
// SETTINGS ENUMS
// =============================================================================

/// What the configured quotes are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VolatilityQuoteType {
    /// Lognormal (Black) volatilities.
    #[default]
    RateLnVol,
    /// Option premiums, stripped to volatilities.
    Price,
}

impl VolatilityQuoteType {
    /// Quote-name token (`RATE_LNVOL` or `PRICE`).
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Self::RateLnVol => "RATE_LNVOL",
            Self::Price => "PRICE",
        }
    }
}

/// Interpolation of a 1-D volatility curve in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurveInterpolation {
    /// Linear in variance.
    #[default]
    Linear,
    /// Cubic in variance.
    Cubic,
    /// Log-linear in variance.
    LogLinear,
}

/// Extrapolation policy along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Extrapolation {
    /// Hold the boundary value.
    #[default]
    Flat,
    /// No extrapolation.
    None,
    /// Extend the interpolant.
    UseInterpolator,
}

/// Smile interpolation across strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SmileInterpolation {
    /// Linear.
    #[default]
    Linear,
    /// Natural cubic.
    NaturalCubic,
    /// Financial cubic.
    FinancialCubic,
    /// C2 cubic spline.
    CubicSpline,
}

macro_rules! string_enum {
    ($ty:ident, $what:literal, { $($variant:ident => [$($name:literal),+]),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = MarketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($($name)|+ => Ok(Self::$variant),)+
                    other => Err(MarketError::Deserialization(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)+
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = MarketError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(v: $ty) -> Self {
                v.to_string()
            }
        }
    };
}

string_enum!(CurveInterpolation, "curve interpolation", {
    Linear => ["Linear"],
    Cubic => ["Cubic"],
    LogLinear => ["LogLinear"],
});

string_enum!(Extrapolation, "extrapolation", {
    Flat => ["Flat"],
    None => ["None"],
    UseInterpolator => ["UseInterpolator", "Linear"],
});

string_enum!(SmileInterpolation, "smile interpolation", {
    Linear => ["Linear"],
    NaturalCubic => ["NaturalCubic", "Cubic"],
    FinancialCubic => ["FinancialCubic"],
    CubicSpline => ["CubicSpline"],
});

// =============================================================================
// SHARED SURFACE SETTINGS
// =============================================================================

/// Interpolation and extrapolation settings shared by 2-D surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    /// Time interpolation; only `Linear` (in variance) is supported.
    #[serde(default = "default_linear")]
    pub time_interpolation: String,
    /// Smile interpolation.
    #[serde(default)]
    pub strike_interpolation: SmileInterpolation,
    /// Master extrapolation switch.
    #[serde(default = "default_true")]
    pub extrapolation: bool,
    /// Extrapolation in time.
    #[serde(default)]
    pub time_extrapolation: Extrapolation,
    /// Extrapolation in strike.
    #[serde(default)]
    pub strike_extrapolation: Extrapolation,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            time_interpolation: default_linear(),
            strike_interpolation: SmileInterpolation::default(),
            extrapolation: true,
            time_extrapolation: Extrapolation::default(),
            strike_extrapolation: Extrapolation::default(),
        }
    }
}

impl SurfaceSettings {
    /// True when the configured time interpolation is the supported one.
    #[must_use]
    pub fn time_interpolation_is_linear(&self) -> bool {
        self.time_interpolation.trim() == "Linear"
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

/// A single volatility quote applied everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantVolatilityConfig {
    /// Quote name.
    pub quote: String,
}

/// Volatilities by expiry only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityCurveConfig {
    /// Quote names, or one wildcard pattern.
    pub quotes: Vec<String>,
    /// Interpolation in time.
    #[serde(default)]
    pub interpolation: CurveInterpolation,
    /// Extrapolation in time.
    #[serde(default)]
    pub extrapolation: Extrapolation,
    /// Fail when total variance decreases between expiries.
    #[serde(default = "default_true")]
    pub enforce_monotone_variance: bool,
}

/// Expiry by absolute strike grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeSurfaceConfig {
    /// Strikes, or `["*"]`.
    pub strikes: Vec<String>,
    /// Expiries, or `["*"]`.
    pub expiries: Vec<String>,
    /// Interpolation and extrapolation.
    #[serde(flatten)]
    pub settings: SurfaceSettings,
    /// Volatility or premium quotes.
    #[serde(default)]
    pub quote_type: VolatilityQuoteType,
}

/// Expiry by delta grid with an ATM column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaSurfaceConfig {
    /// Delta convention of the quoted deltas.
    #[serde(default)]
    pub delta_type: DeltaVolType,
    /// ATM convention.
    #[serde(default)]
    pub atm_type: AtmType,
    /// Delta convention of the ATM strike, for delta-based ATM types.
    #[serde(default)]
    pub atm_delta_type: Option<DeltaVolType>,
    /// Put deltas, positive.
    pub put_deltas: Vec<f64>,
    /// Call deltas.
    pub call_deltas: Vec<f64>,
    /// Expiries, or `["*"]`.
    pub expiries: Vec<String>,
    /// Re-pillar the price curve at the option expiries.
    #[serde(default = "default_true")]
    pub future_price_correction: bool,
    /// Interpolation and extrapolation.
    #[serde(flatten)]
    pub settings: SurfaceSettings,
}

impl DeltaSurfaceConfig {
    /// Put deltas ascending and call deltas descending, duplicates rejected.
    pub fn sorted_deltas(&self, curve_id: &str) -> MarketResult<(Vec<f64>, Vec<f64>)> {
        let puts = sorted_unique(curve_id, &self.put_deltas, "The configured put deltas contain duplicates")?;
        let mut calls =
            sorted_unique(curve_id, &self.call_deltas, "The configured call deltas contain duplicates")?;
        calls.reverse();
        Ok((puts, calls))
    }

    /// Quoted strike of a delta column.
    #[must_use]
    pub fn delta_strike(&self, option_type: OptionType, delta: f64) -> Strike {
        Strike::Delta {
            delta_type: self.delta_type,
            option_type,
            delta,
        }
    }

    /// Quoted strike of the ATM column.
    #[must_use]
    pub fn atm_strike(&self) -> Strike {
        Strike::Atm {
            atm_type: self.atm_type,
            delta_type: self.atm_delta_type,
        }
    }
}

/// Expiry by moneyness grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneynessSurfaceConfig {
    /// Spot or forward moneyness.
    #[serde(default)]
    pub moneyness_type: MoneynessType,
    /// Moneyness levels.
    pub moneyness_levels: Vec<f64>,
    /// Expiries, or `["*"]`.
    pub expiries: Vec<String>,
    /// Re-pillar the price curve at the option expiries.
    #[serde(default = "default_true")]
    pub future_price_correction: bool,
    /// Interpolation and extrapolation.
    #[serde(flatten)]
    pub settings: SurfaceSettings,
}

impl MoneynessSurfaceConfig {
    /// Levels sorted ascending.
    ///
    /// # Errors
    ///
    /// Fails with "The configured moneyness levels contain duplicates".
    pub fn sorted_levels(&self, curve_id: &str) -> MarketResult<Vec<f64>> {
        sorted_unique(
            curve_id,
            &self.moneyness_levels,
            "The configured moneyness levels contain duplicates",
        )
    }
}

/// Average price option surface proxied from a base future surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApoFutureSurfaceConfig {
    /// Moneyness levels of the APO surface.
    pub moneyness_levels: Vec<f64>,
    /// Base volatility surface id.
    pub base_volatility_id: String,
    /// Base price curve id.
    pub base_price_curve_id: String,
    /// Base future conventions id.
    pub base_conventions_id: String,
    /// Decay of the correlation between futures.
    #[serde(default)]
    pub beta: f64,
    /// APO expiries beyond this tenor are dropped.
    #[serde(default)]
    pub max_tenor: Option<Period>,
    /// Interpolation and extrapolation.
    #[serde(flatten)]
    pub settings: SurfaceSettings,
}

impl ApoFutureSurfaceConfig {
    /// Levels sorted ascending.
    pub fn sorted_levels(&self, curve_id: &str) -> MarketResult<Vec<f64>> {
        sorted_unique(
            curve_id,
            &self.moneyness_levels,
            "The configured moneyness levels contain duplicates",
        )
    }
}

/// Surface proxied from another commodity's surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyVolatilityConfig {
    /// Source volatility surface id.
    pub source_curve_id: String,
    /// Currency of the source surface.
    pub source_currency: Currency,
    /// Price curve of the source commodity.
    pub source_price_curve_id: String,
    /// FX volatility surface id, needed when the currencies differ.
    #[serde(default)]
    pub fx_vol_curve_id: Option<String>,
    /// Commodity/FX correlation curve id, needed when the currencies differ.
    #[serde(default)]
    pub correlation_curve_id: Option<String>,
}

/// Shape of one configured attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VolatilityConfigKind {
    /// Constant volatility.
    Constant(ConstantVolatilityConfig),
    /// Volatility curve by expiry.
    Curve(VolatilityCurveConfig),
    /// Absolute strike surface.
    StrikeSurface(StrikeSurfaceConfig),
    /// Delta surface.
    DeltaSurface(DeltaSurfaceConfig),
    /// Moneyness surface.
    MoneynessSurface(MoneynessSurfaceConfig),
    /// APO surface.
    ApoFutureSurface(ApoFutureSurfaceConfig),
    /// Proxy surface.
    Proxy(ProxyVolatilityConfig),
}

impl VolatilityConfigKind {
    /// Short name used in logs.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Constant(_) => "Constant",
            Self::Curve(_) => "Curve",
            Self::StrikeSurface(_) => "StrikeSurface",
            Self::DeltaSurface(_) => "DeltaSurface",
            Self::MoneynessSurface(_) => "MoneynessSurface",
            Self::ApoFutureSurface(_) => "ApoFutureSurface",
            Self::Proxy(_) => "Proxy",
        }
    }

    /// Settings the surface representation cannot honour and will ignore.
    #[must_use]
    pub fn ignored_settings(&self) -> Vec<String> {
        let mut ignored = Vec::new();
        match self {
            Self::Curve(c) if c.extrapolation == Extrapolation::UseInterpolator => {
                ignored.push("UseInterpolator extrapolation of a volatility curve is flat".to_string());
            }
            Self::StrikeSurface(c) => {
                if !c.settings.time_interpolation_is_linear() {
                    ignored.push(format!(
                        "time interpolation '{}' of a strike surface is linear in variance",
                        c.settings.time_interpolation
                    ));
                }
                if c.settings.strike_extrapolation == Extrapolation::None {
                    ignored.push("strike extrapolation None of a strike surface is flat".to_string());
                }
            }
            Self::DeltaSurface(c) if !c.settings.time_interpolation_is_linear() => {
                ignored.push(format!(
                    "time interpolation '{}' of a delta surface is linear in variance",
                    c.settings.time_interpolation
                ));
            }
            Self::MoneynessSurface(c) if !c.settings.time_interpolation_is_linear() => {
                ignored.push(format!(
                    "time interpolation '{}' of a moneyness surface is linear in variance",
                    c.settings.time_interpolation
                ));
            }
            _ => {}
        }
        ignored
    }
}

/// One configured attempt with its priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityConfig {
    /// The shape.
    #[serde(flatten)]
    pub kind: VolatilityConfigKind,
    /// Attempts run in ascending priority; ties keep configured order.
    #[serde(default)]
    pub priority: u32,
}

impl VolatilityConfig {
    /// Wraps a shape with priority 0.
    #[must_use]
    pub fn new(kind: VolatilityConfigKind) -> Self {
        Self { kind, priority: 0 }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl From<VolatilityConfigKind> for VolatilityConfig {
    fn from(kind: VolatilityConfigKind) -> Self {
        Self::new(kind)
    }
}

// =============================================================================
// REPORT CONFIG
// =============================================================================

/// Grid of the calibration report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReportConfig {
    /// Report expiries as tenors from the as-of date.
    #[serde(default)]
    pub expiries: Vec<Period>,
    /// Deltas such as `10P`, `25P`, `ATM`, `25C`, `10C`.
    #[serde(default)]
    pub deltas: Vec<String>,
    /// Forward moneyness levels.
    #[serde(default)]
    pub moneyness: Vec<f64>,
    /// Delta convention of the report deltas.
    #[serde(default)]
    pub delta_type: DeltaVolType,
    /// ATM convention of the report.
    #[serde(default)]
    pub atm_type: AtmType,
}

impl Default for CalibrationReportConfig {
    fn default() -> Self {
        Self {
            expiries: ["1M", "3M", "6M", "1Y", "2Y", "5Y"]
                .iter()
                .filter_map(|p| Period::parse(p).ok())
                .collect(),
            deltas: ["10P", "25P", "ATM", "25C", "10C"]
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            moneyness: vec![0.5, 0.75, 0.9, 1.0, 1.1, 1.25, 1.5],
            delta_type: DeltaVolType::default(),
            atm_type: AtmType::default(),
        }
    }
}

// =============================================================================
// COMMODITY VOLATILITY CONFIG
// =============================================================================

/// Configuration of one commodity volatility surface.
///
/// # Example
///
/// ```rust
/// use pillar_market::config::{CommodityVolatilityConfig, VolatilityConfigKind};
///
/// let toml = r#"
/// curve_id = "WTI"
/// currency = "USD"
/// price_curve_id = "WTI"
/// yield_curve_id = "USD-SOFR"
///
/// [[configs]]
/// type = "Curve"
/// quotes = ["COMMODITY_OPTION/RATE_LNVOL/WTI/USD/*"]
///
/// [[configs]]
/// type = "Constant"
/// quote = "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/1Y/ATM/AtmFwd"
/// "#;
/// let config: CommodityVolatilityConfig = toml::from_str(toml).unwrap();
/// let order: Vec<&str> = config.ordered_configs().iter().map(|c| c.kind.type_name()).collect();
/// assert_eq!(order, vec!["Curve", "Constant"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityVolatilityConfig {
    /// Curve id, also the commodity name in quote names.
    pub curve_id: String,
    /// Currency.
    pub currency: Currency,
    /// Calendar for expiry adjustment.
    #[serde(default)]
    pub calendar: MarketCalendar,
    /// Day count for surface times.
    #[serde(default)]
    pub day_count: DayCountConvention,
    /// Future expiry conventions, needed for `cN` expiries and price correction.
    #[serde(default)]
    pub future_conventions_id: Option<String>,
    /// Business days before option expiry at which a continuation rolls.
    #[serde(default)]
    pub option_expiry_roll_days: u32,
    /// Price curve id.
    #[serde(default)]
    pub price_curve_id: Option<String>,
    /// Discount curve id.
    #[serde(default)]
    pub yield_curve_id: Option<String>,
    /// Use the out-of-the-money side when both call and put premiums exist.
    #[serde(default)]
    pub prefer_out_of_the_money: bool,
    /// Reject settings the representations would ignore.
    #[serde(default)]
    pub strict: bool,
    /// Attempts.
    pub configs: Vec<VolatilityConfig>,
    /// Calibration report grid; no report when absent.
    #[serde(default)]
    pub report: Option<CalibrationReportConfig>,
}

impl CommodityVolatilityConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(curve_id: impl Into<String>, currency: Currency, configs: Vec<VolatilityConfig>) -> Self {
        Self {
            curve_id: curve_id.into(),
            currency,
            calendar: MarketCalendar::default(),
            day_count: DayCountConvention::default(),
            future_conventions_id: None,
            option_expiry_roll_days: 0,
            price_curve_id: None,
            yield_curve_id: None,
            prefer_out_of_the_money: false,
            strict: false,
            configs,
            report: None,
        }
    }

    /// Sets the price and yield curve ids.
    #[must_use]
    pub fn with_curves(mut self, price_curve_id: impl Into<String>, yield_curve_id: impl Into<String>) -> Self {
        self.price_curve_id = Some(price_curve_id.into());
        self.yield_curve_id = Some(yield_curve_id.into());
        self
    }

    /// Sets the future conventions id.
    #[must_use]
    pub fn with_future_conventions(mut self, id: impl Into<String>) -> Self {
        self.future_conventions_id = Some(id.into());
        self
    }

    /// Sets the calibration report grid.
    #[must_use]
    pub fn with_report(mut self, report: CalibrationReportConfig) -> Self {
        self.report = Some(report);
        self
    }

    /// Attempts sorted by ascending priority, stable in configured order.
    #[must_use]
    pub fn ordered_configs(&self) -> Vec<&VolatilityConfig> {
        let mut ordered: Vec<&VolatilityConfig> = self.configs.iter().collect();
        ordered.sort_by_key(|c| c.priority);
        ordered
    }

    /// Quote name prefix `COMMODITY_OPTION/<type>/<curve id>/<ccy>/`.
    #[must_use]
    pub fn quote_stem(&self, quote_type: VolatilityQuoteType) -> String {
        format!(
            "COMMODITY_OPTION/{}/{}/{}/",
            quote_type.token(),
            self.curve_id,
            self.currency.code()
        )
    }
}

impl Validate for CommodityVolatilityConfig {
    fn validate(&self) -> MarketResult<()> {
        if self.configs.is_empty() {
            return Err(MarketError::invalid_config(
                &self.curve_id,
                "no volatility configurations",
            ));
        }
        if self.strict {
            for config in &self.configs {
                if let Some(ignored) = config.kind.ignored_settings().into_iter().next() {
                    return Err(MarketError::invalid_config(
                        &self.curve_id,
                        format!("{} (strict mode)", ignored),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Sorts and checks for duplicates with the relative closeness test.
pub fn sorted_unique(curve_id: &str, values: &[f64], duplicate_message: &str) -> MarketResult<Vec<f64>> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(MarketError::invalid_config(
            curve_id,
            format!("non-finite level {bad}"),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted.windows(2).any(|w| close_enough(w[0], w[1])) {
        return Err(MarketError::duplicate(curve_id, duplicate_message));
    }
    Ok(sorted)
}

/// Parses, sorts and de-duplicates absolute strikes.
///
/// # Errors
///
/// Fails with "The configured strikes contain duplicates".
pub fn sorted_strikes(curve_id: &str, strikes: &[String]) -> MarketResult<Vec<f64>> {
    let levels = strikes
        .iter()
        .map(|s| {
            Strike::parse(s)?.absolute().ok_or_else(|| {
                MarketError::invalid_config(curve_id, format!("strike '{s}' is not an absolute strike"))
            })
        })
        .collect::<MarketResult<Vec<f64>>>()?;
    sorted_unique(curve_id, &levels, "The configured strikes contain duplicates")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moneyness(levels: Vec<f64>) -> MoneynessSurfaceConfig {
        MoneynessSurfaceConfig {
            moneyness_type: MoneynessType::Fwd,
            moneyness_levels: levels,
            expiries: vec!["*".into()],
            future_price_correction: true,
            settings: SurfaceSettings::default(),
        }
    }

    #[test]
    fn test_duplicate_moneyness_levels() {
        let err = moneyness(vec![0.9, 1.0, 1.0, 1.1]).sorted_levels("WTI").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The configured moneyness levels contain duplicates for curve WTI"
        );
        let sorted = moneyness(vec![1.1, 0.9, 1.0]).sorted_levels("WTI").unwrap();
        assert_eq!(sorted, vec![0.9, 1.0, 1.1]);
    }

    #[test]
    fn test_sorted_strikes() {
        let strikes: Vec<String> = ["110", "90", "ABS/100"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(sorted_strikes("WTI", &strikes).unwrap(), vec![90.0, 100.0, 110.0]);

        let dup: Vec<String> = ["100", "100.0"].iter().map(|s| (*s).to_string()).collect();
        let err = sorted_strikes("WTI", &dup).unwrap_err();
        assert!(err.to_string().contains("The configured strikes contain duplicates"));
    }

    #[test]
    fn test_delta_ordering() {
        let config = DeltaSurfaceConfig {
            delta_type: DeltaVolType::Fwd,
            atm_type: AtmType::AtmDeltaNeutral,
            atm_delta_type: None,
            put_deltas: vec![0.25, 0.10],
            call_deltas: vec![0.10, 0.25],
            expiries: vec!["*".into()],
            future_price_correction: false,
            settings: SurfaceSettings::default(),
        };
        let (puts, calls) = config.sorted_deltas("WTI").unwrap();
        assert_eq!(puts, vec![0.10, 0.25]);
        assert_eq!(calls, vec![0.25, 0.10]);
        assert_eq!(config.atm_strike().to_string(), "ATM/AtmDeltaNeutral");
    }

    #[test]
    fn test_priority_order_is_stable() {
        let constant = |q: &str, p: u32| {
            VolatilityConfig::new(VolatilityConfigKind::Constant(ConstantVolatilityConfig {
                quote: q.to_string(),
            }))
            .with_priority(p)
        };
        let config = CommodityVolatilityConfig::new(
            "WTI",
            Currency::USD,
            vec![constant("A", 1), constant("B", 0), constant("C", 1), constant("D", 0)],
        );
        let order: Vec<String> = config
            .ordered_configs()
            .iter()
            .map(|c| match &c.kind {
                VolatilityConfigKind::Constant(k) => k.quote.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_strict_rejects_ignored_settings() {
        let mut settings = SurfaceSettings::default();
        settings.time_interpolation = "Cubic".into();
        let delta = DeltaSurfaceConfig {
            delta_type: DeltaVolType::Spot,
            atm_type: AtmType::AtmDeltaNeutral,
            atm_delta_type: None,
            put_deltas: vec![0.25],
            call_deltas: vec![0.25],
            expiries: vec!["*".into()],
            future_price_correction: true,
            settings,
        };
        let mut config = CommodityVolatilityConfig::new(
            "WTI",
            Currency::USD,
            vec![VolatilityConfigKind::DeltaSurface(delta).into()],
        );
        assert!(config.validate().is_ok());
        config.strict = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_surface_json_shape() {
        let json = r#"{
            "type": "StrikeSurface",
            "priority": 2,
            "strikes": ["*"],
            "expiries": ["2024-06-01", "2025-06-01"],
            "strike_interpolation": "Linear",
            "strike_extrapolation": "UseInterpolator",
            "quote_type": "Price"
        }"#;
        let config: VolatilityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.priority, 2);
        match config.kind {
            VolatilityConfigKind::StrikeSurface(s) => {
                assert_eq!(s.quote_type, VolatilityQuoteType::Price);
                assert_eq!(s.settings.strike_extrapolation, Extrapolation::UseInterpolator);
                assert_eq!(s.settings.time_extrapolation, Extrapolation::Flat);
                assert!(s.settings.extrapolation);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_quote_stem() {
        let config = CommodityVolatilityConfig::new("WTI", Currency::USD, vec![]);
        assert_eq!(
            config.quote_stem(VolatilityQuoteType::RateLnVol),
            "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/"
        );
        assert!(config.validate().is_err());
    }
}

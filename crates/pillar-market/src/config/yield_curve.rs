//! Yield curve configuration.
//!
//! A [`YieldCurveConfig`] lists the segments a curve is built from. Most
//! segment kinds contribute rate helpers to a single bootstrap; the direct
//! kinds ([`SegmentKind::is_direct`]) build the whole curve on their own
//! and must be the only segment.

use std::collections::{BTreeMap, BTreeSet};

use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::types::Frequency;
use pillar_core::{Currency, Date};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::conventions::RateIndex;
use crate::error::{MarketError, MarketResult};
use crate::quotes::QuoteSelection;

// =============================================================================
// DEFAULTS
// =============================================================================

fn default_accuracy() -> f64 {
    1.0e-12
}

fn default_max_attempts() -> u32 {
    5
}

fn default_factor() -> f64 {
    2.0
}

fn default_dont_throw_steps() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_cutoff() -> usize {
    1
}

fn default_zero_day_counter() -> DayCountConvention {
    DayCountConvention::Act365Fixed
}

fn default_trials() -> u32 {
    1
}

fn default_settlement_days() -> u32 {
    2
}

fn default_redemption() -> f64 {
    100.0
}

// =============================================================================
// INTERPOLATION
// =============================================================================

/// Quantity interpolated between pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationVariable {
    /// Continuously compounded zero rates.
    Zero,
    /// Discount factors.
    #[default]
    Discount,
    /// Instantaneous forward rates.
    Forward,
}

/// Interpolation method, or fitting method for fitted bond curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Linear.
    Linear,
    /// Linear in the logarithm.
    #[default]
    LogLinear,
    /// Monotonic cubic with natural end conditions.
    NaturalCubic,
    /// Monotonic cubic, zero curvature at the start and zero slope at the end.
    FinancialCubic,
    /// Hagan-West monotone convex on forwards.
    ConvexMonotone,
    /// Quadratic.
    Quadratic,
    /// Quadratic in the logarithm.
    LogQuadratic,
    /// Hermite with parabolic slopes.
    Hermite,
    /// Natural C2 cubic spline, not monotonic.
    CubicSpline,
    /// Log-linear on the short end, log-cubic (Kruger, natural) afterwards.
    DefaultLogMixedLinearCubic,
    /// Log-linear then monotonic log-cubic.
    MonotonicLogMixedLinearCubic,
    /// Log-linear then Kruger log-cubic.
    KrugerLogMixedLinearCubic,
    /// Log-linear then natural log-spline.
    LogMixedLinearCubicNaturalSpline,
    /// Piecewise flat, value of the right node.
    BackwardFlat,
    /// Exponential splines (fitted bond curves).
    ExponentialSplines,
    /// Nelson-Siegel (fitted bond curves).
    NelsonSiegel,
    /// Svensson (fitted bond curves).
    Svensson,
}

impl InterpolationMethod {
    /// True for the parametric fitting methods used by fitted bond curves.
    #[must_use]
    pub fn is_fitting_method(&self) -> bool {
        matches!(
            self,
            Self::ExponentialSplines | Self::NelsonSiegel | Self::Svensson
        )
    }

    /// True when one node change moves the interpolant everywhere, so the
    /// bootstrap needs outer passes until the nodes settle.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Self::NaturalCubic
                | Self::FinancialCubic
                | Self::ConvexMonotone
                | Self::Hermite
                | Self::CubicSpline
                | Self::DefaultLogMixedLinearCubic
                | Self::MonotonicLogMixedLinearCubic
                | Self::KrugerLogMixedLinearCubic
                | Self::LogMixedLinearCubicNaturalSpline
        )
    }

    /// True when the scheme interpolates the logarithm of the node values,
    /// so every node must stay positive.
    #[must_use]
    pub fn is_log(&self) -> bool {
        matches!(self, Self::LogLinear | Self::LogQuadratic) || self.is_mixed()
    }

    /// True for the log-linear then log-cubic family.
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        matches!(
            self,
            Self::DefaultLogMixedLinearCubic
                | Self::MonotonicLogMixedLinearCubic
                | Self::KrugerLogMixedLinearCubic
                | Self::LogMixedLinearCubicNaturalSpline
        )
    }
}

/// Which date of an instrument becomes its pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PillarChoice {
    /// The instrument maturity.
    MaturityDate,
    /// The latest date the instrument depends on.
    #[default]
    LastRelevantDate,
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// Numerical settings of the iterative bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Target repricing accuracy per pillar.
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Accuracy of the outer passes for global interpolation; defaults to `accuracy`.
    #[serde(default)]
    pub global_accuracy: Option<f64>,
    /// Accept the best available value instead of failing.
    #[serde(default)]
    pub dont_throw: bool,
    /// Attempts per pillar, widening the bracket on each retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Factor applied to the upper bracket on retries.
    #[serde(default = "default_factor")]
    pub max_factor: f64,
    /// Factor applied to the lower bracket on retries.
    #[serde(default = "default_factor")]
    pub min_factor: f64,
    /// Grid points searched for the best value in `dont_throw` mode.
    #[serde(default = "default_dont_throw_steps")]
    pub dont_throw_steps: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            global_accuracy: None,
            dont_throw: false,
            max_attempts: default_max_attempts(),
            max_factor: default_factor(),
            min_factor: default_factor(),
            dont_throw_steps: default_dont_throw_steps(),
        }
    }
}

impl BootstrapConfig {
    /// Accuracy of the global passes.
    #[must_use]
    pub fn effective_global_accuracy(&self) -> f64 {
        self.global_accuracy.unwrap_or(self.accuracy)
    }

    /// Sets the accuracy.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Enables or disables `dont_throw`.
    #[must_use]
    pub fn with_dont_throw(mut self, dont_throw: bool) -> Self {
        self.dont_throw = dont_throw;
        self
    }

    fn check(&self, curve_id: &str) -> MarketResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.accuracy) {
            return Err(MarketError::invalid_config(
                curve_id,
                format!("bootstrap accuracy must be positive and finite, got {}", self.accuracy),
            ));
        }
        if let Some(g) = self.global_accuracy {
            if !positive(g) {
                return Err(MarketError::invalid_config(
                    curve_id,
                    format!("bootstrap global accuracy must be positive and finite, got {g}"),
                ));
            }
        }
        if !(self.min_factor.is_finite() && self.min_factor >= 1.0)
            || !(self.max_factor.is_finite() && self.max_factor >= 1.0)
        {
            return Err(MarketError::invalid_config(
                curve_id,
                "bootstrap min and max factors must be finite and at least 1",
            ));
        }
        if self.max_attempts == 0 {
            return Err(MarketError::invalid_config(
                curve_id,
                "bootstrap max attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// BOND DEFINITIONS
// =============================================================================

/// Static data of a fixed-rate bullet bond referenced by bond quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondDefinition {
    /// Security id used in `BOND/PRICE/<id>` and `BOND/YIELD/<id>` quotes.
    pub security_id: String,
    /// Issue date; the first coupon period starts here when given.
    #[serde(default)]
    pub issue_date: Option<Date>,
    /// Maturity date.
    pub maturity: Date,
    /// Annual coupon rate.
    pub coupon: f64,
    /// Coupon frequency.
    #[serde(default)]
    pub frequency: Frequency,
    /// Accrual day count.
    #[serde(default)]
    pub day_count: DayCountConvention,
    /// Payment calendar.
    #[serde(default)]
    pub calendar: MarketCalendar,
    /// Payment adjustment.
    #[serde(default)]
    pub convention: BusinessDayConvention,
    /// Settlement days.
    #[serde(default = "default_settlement_days")]
    pub settlement_days: u32,
    /// Redemption per 100 notional.
    #[serde(default = "default_redemption")]
    pub redemption: f64,
}

// =============================================================================
// SEGMENTS
// =============================================================================

/// Kind-specific part of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SegmentKind {
    /// Deposits.
    Deposit,
    /// Forward rate agreements.
    Fra {
        /// Projection curve of the FRA index; the curve itself when absent.
        #[serde(default)]
        projection_curve_id: Option<String>,
    },
    /// Money-market futures.
    Future {
        /// Projection curve of the future index.
        #[serde(default)]
        projection_curve_id: Option<String>,
    },
    /// Overnight indexed swaps.
    Ois {
        /// Projection curve of the overnight index.
        #[serde(default)]
        projection_curve_id: Option<String>,
    },
    /// Fixed versus floating swaps.
    Swap {
        /// Projection curve of the floating index.
        #[serde(default)]
        projection_curve_id: Option<String>,
    },
    /// Averaging OIS versus fixed, quoted as (rate, spread) pairs.
    AverageOis {
        /// Projection curve of the overnight index.
        #[serde(default)]
        projection_curve_id: Option<String>,
    },
    /// Floating versus floating tenor basis swaps.
    TenorBasis {
        /// Projection curve of the short tenor index.
        #[serde(default)]
        short_projection_curve_id: Option<String>,
        /// Projection curve of the long tenor index.
        #[serde(default)]
        long_projection_curve_id: Option<String>,
    },
    /// Tenor basis as the difference of two vanilla swaps.
    TenorBasisTwo {
        /// Projection curve of the short tenor index.
        #[serde(default)]
        short_projection_curve_id: Option<String>,
        /// Projection curve of the long tenor index.
        #[serde(default)]
        long_projection_curve_id: Option<String>,
    },
    /// BMA ratio swaps; the curve built is the BMA projection curve.
    BmaBasis {
        /// Projection curve of the Libor index.
        libor_projection_curve_id: String,
    },
    /// FX forwards implying the curve from a foreign discount curve.
    FxForward {
        /// FX spot quote id.
        spot_rate_id: String,
        /// Discount curve of the other currency.
        foreign_discount_curve_id: String,
    },
    /// Cross-currency basis swaps.
    CrossCcyBasis {
        /// FX spot quote id.
        spot_rate_id: String,
        /// Discount curve of the other currency.
        foreign_discount_curve_id: String,
        /// Projection curve for this currency's index; the curve itself when absent.
        #[serde(default)]
        domestic_projection_curve_id: Option<String>,
        /// Projection curve for the other currency's index.
        #[serde(default)]
        foreign_projection_curve_id: Option<String>,
    },
    /// Cross-currency fixed versus floating swaps.
    CrossCcyFixFloat {
        /// FX spot quote id.
        spot_rate_id: String,
        /// Discount curve of the floating currency.
        foreign_discount_curve_id: String,
        /// Projection curve of the floating index.
        #[serde(default)]
        foreign_projection_curve_id: Option<String>,
    },
    /// Discount factors quoted directly.
    Discount,
    /// Zero rates quoted directly.
    Zero,
    /// Zero spreads over a reference curve.
    ZeroSpread {
        /// Curve the spreads apply to.
        reference_curve_id: String,
    },
    /// `base × numerator / denominator`.
    DiscountRatio {
        /// Base curve id.
        base_curve_id: String,
        /// Base curve currency.
        base_curve_currency: Currency,
        /// Numerator curve id.
        numerator_curve_id: String,
        /// Numerator curve currency.
        numerator_curve_currency: Currency,
        /// Denominator curve id.
        denominator_curve_id: String,
        /// Denominator curve currency.
        denominator_curve_currency: Currency,
    },
    /// Parametric curve fitted to bond prices.
    FittedBond {
        /// Bonds referenced by the quotes.
        securities: Vec<BondDefinition>,
        /// Index name to projection curve id, for floating bonds' indices.
        #[serde(default)]
        ibor_index_curves: BTreeMap<String, String>,
        /// Extrapolate the zero rate flat beyond the last bond.
        #[serde(default)]
        extrapolate_flat: bool,
        /// Restarts of the minimiser.
        #[serde(default = "default_trials")]
        calibration_trials: u32,
    },
    /// Zero-rate weighted average of two curves.
    WeightedAverage {
        /// First curve.
        reference_curve_id1: String,
        /// Second curve.
        reference_curve_id2: String,
        /// Weight of the first curve.
        weight1: f64,
        /// Weight of the second curve.
        weight2: f64,
    },
    /// A reference curve times weighted survival probabilities.
    YieldPlusDefault {
        /// Reference yield curve.
        reference_curve_id: String,
        /// Default curve ids.
        default_curve_ids: Vec<String>,
        /// One weight per default curve.
        weights: Vec<f64>,
    },
    /// RFR curve plus a fallback spread.
    IborFallback {
        /// The Ibor index projected by the curve.
        ibor_index: RateIndex,
        /// The RFR curve id.
        rfr_curve_id: String,
        /// The fallback spread, simple compounded over the index tenor.
        spread: f64,
    },
    /// A reference curve shifted by the average bond yield spread.
    BondYieldShifted {
        /// Curve being shifted.
        reference_curve_id: String,
        /// Bonds referenced by the yield quotes.
        securities: Vec<BondDefinition>,
        /// Extrapolate the shifted curve flat.
        #[serde(default)]
        extrapolate_flat: bool,
    },
}

impl SegmentKind {
    /// Short name used in logs and error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Fra { .. } => "FRA",
            Self::Future { .. } => "Future",
            Self::Ois { .. } => "OIS",
            Self::Swap { .. } => "Swap",
            Self::AverageOis { .. } => "AverageOIS",
            Self::TenorBasis { .. } => "TenorBasis",
            Self::TenorBasisTwo { .. } => "TenorBasisTwo",
            Self::BmaBasis { .. } => "BMABasis",
            Self::FxForward { .. } => "FXForward",
            Self::CrossCcyBasis { .. } => "CrossCurrencyBasis",
            Self::CrossCcyFixFloat { .. } => "CrossCurrencyFixFloat",
            Self::Discount => "Discount",
            Self::Zero => "Zero",
            Self::ZeroSpread { .. } => "ZeroSpread",
            Self::DiscountRatio { .. } => "DiscountRatio",
            Self::FittedBond { .. } => "FittedBond",
            Self::WeightedAverage { .. } => "WeightedAverage",
            Self::YieldPlusDefault { .. } => "YieldPlusDefault",
            Self::IborFallback { .. } => "IborFallback",
            Self::BondYieldShifted { .. } => "BondYieldShifted",
        }
    }

    /// True for kinds that build the whole curve directly.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.direct_description().is_some()
    }

    /// Description used in single-segment errors, `None` for bootstrap kinds.
    #[must_use]
    pub fn direct_description(&self) -> Option<&'static str> {
        match self {
            Self::Discount => Some("discount"),
            Self::Zero => Some("zero"),
            Self::ZeroSpread { .. } => Some("zero spread"),
            Self::DiscountRatio { .. } => Some("discount ratio"),
            Self::FittedBond { .. } => Some("fitted bond"),
            Self::WeightedAverage { .. } => Some("weighted average"),
            Self::YieldPlusDefault { .. } => Some("yield plus default"),
            Self::IborFallback { .. } => Some("ibor fallback"),
            Self::BondYieldShifted { .. } => Some("bond yield shifted"),
            _ => None,
        }
    }

    /// True when the kind reads quotes from the store.
    #[must_use]
    pub fn needs_quotes(&self) -> bool {
        !matches!(
            self,
            Self::DiscountRatio { .. }
                | Self::WeightedAverage { .. }
                | Self::YieldPlusDefault { .. }
                | Self::IborFallback { .. }
        )
    }

    /// True when the kind resolves a convention id.
    #[must_use]
    pub fn needs_conventions(&self) -> bool {
        !matches!(
            self,
            Self::DiscountRatio { .. }
                | Self::WeightedAverage { .. }
                | Self::YieldPlusDefault { .. }
                | Self::IborFallback { .. }
                | Self::FittedBond { .. }
                | Self::BondYieldShifted { .. }
                | Self::Discount
        )
    }
}

/// One segment of a yield curve configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveSegment {
    /// Kind and kind-specific fields.
    #[serde(flatten)]
    pub kind: SegmentKind,
    /// Convention id.
    #[serde(default)]
    pub conventions_id: String,
    /// Quote names, or a single wildcard pattern.
    #[serde(default)]
    pub quotes: Vec<String>,
    /// Pillar date policy of the helpers.
    #[serde(default)]
    pub pillar_choice: PillarChoice,
    /// Lower numbers are more trusted when pillars of adjacent segments overlap.
    #[serde(default)]
    pub priority: u32,
    /// Calendar days kept clear around the neighbouring segment's pillars.
    #[serde(default)]
    pub min_distance: u32,
}

impl YieldCurveSegment {
    /// Creates a segment with default pillar choice, priority and distance.
    #[must_use]
    pub fn new(kind: SegmentKind, conventions_id: impl Into<String>, quotes: Vec<String>) -> Self {
        Self {
            kind,
            conventions_id: conventions_id.into(),
            quotes,
            pillar_choice: PillarChoice::default(),
            priority: 0,
            min_distance: 0,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the minimum distance in calendar days.
    #[must_use]
    pub fn with_min_distance(mut self, days: u32) -> Self {
        self.min_distance = days;
        self
    }

    /// Sets the pillar choice.
    #[must_use]
    pub fn with_pillar_choice(mut self, choice: PillarChoice) -> Self {
        self.pillar_choice = choice;
        self
    }

    /// Parses the quote list into wildcard or explicit mode.
    pub fn quote_selection(&self, curve_id: &str) -> MarketResult<QuoteSelection> {
        QuoteSelection::from_quotes(curve_id, &self.quotes)
    }
}

// =============================================================================
// YIELD CURVE CONFIG
// =============================================================================

/// Configuration of one yield curve.
///
/// # Example
///
/// ```rust
/// use pillar_market::config::{InterpolationMethod, YieldCurveConfig};
///
/// let json = r#"{
///     "curve_id": "EUR-ESTR",
///     "currency": "EUR",
///     "segments": [
///         { "type": "Deposit", "conventions_id": "EUR-ON-DEP", "quotes": ["MM/RATE/EUR/0D/1D"] },
///         { "type": "Ois", "conventions_id": "EUR-OIS", "quotes": ["IR_SWAP/RATE/EUR/2D/1D/*"] }
///     ]
/// }"#;
/// let config: YieldCurveConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.interpolation_method, InterpolationMethod::LogLinear);
/// assert!(config.validate_config().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveConfig {
    /// Curve id.
    pub curve_id: String,
    /// Curve currency.
    pub currency: Currency,
    /// Exogenous discount curve for the helpers; the curve itself when absent.
    #[serde(default)]
    pub discount_curve_id: Option<String>,
    /// Segments in configured order.
    pub segments: Vec<YieldCurveSegment>,
    /// Interpolated quantity.
    #[serde(default)]
    pub interpolation_variable: InterpolationVariable,
    /// Interpolation or fitting method.
    #[serde(default)]
    pub interpolation_method: InterpolationMethod,
    /// Day count used to turn dates into curve times.
    #[serde(default = "default_zero_day_counter")]
    pub zero_day_counter: DayCountConvention,
    /// Calendar of the curve, used for report grids.
    #[serde(default)]
    pub calendar: MarketCalendar,
    /// Allow evaluation beyond the last pillar.
    #[serde(default = "default_true")]
    pub extrapolation: bool,
    /// Number of leading segments interpolated log-linearly by mixed methods.
    #[serde(default = "default_cutoff")]
    pub mixed_interpolation_cutoff: usize,
    /// Keep the helpers attached to the built curve instead of re-baking it.
    #[serde(default)]
    pub preserve_quote_linkage: bool,
    /// Bootstrap settings.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl YieldCurveConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(curve_id: impl Into<String>, currency: Currency, segments: Vec<YieldCurveSegment>) -> Self {
        Self {
            curve_id: curve_id.into(),
            currency,
            discount_curve_id: None,
            segments,
            interpolation_variable: InterpolationVariable::default(),
            interpolation_method: InterpolationMethod::default(),
            zero_day_counter: default_zero_day_counter(),
            calendar: MarketCalendar::default(),
            extrapolation: true,
            mixed_interpolation_cutoff: default_cutoff(),
            preserve_quote_linkage: false,
            bootstrap: BootstrapConfig::default(),
        }
    }

    /// Sets the interpolation method and variable.
    #[must_use]
    pub fn with_interpolation(mut self, method: InterpolationMethod, variable: InterpolationVariable) -> Self {
        self.interpolation_method = method;
        self.interpolation_variable = variable;
        self
    }

    /// Sets the exogenous discount curve.
    #[must_use]
    pub fn with_discount_curve(mut self, curve_id: impl Into<String>) -> Self {
        self.discount_curve_id = Some(curve_id.into());
        self
    }

    /// Sets quote linkage preservation.
    #[must_use]
    pub fn with_preserve_quote_linkage(mut self, preserve: bool) -> Self {
        self.preserve_quote_linkage = preserve;
        self
    }

    /// Sets the bootstrap settings.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Sets the mixed interpolation cutoff.
    #[must_use]
    pub fn with_mixed_interpolation_cutoff(mut self, cutoff: usize) -> Self {
        self.mixed_interpolation_cutoff = cutoff;
        self
    }

    /// Id of the discount curve used by the helpers, `None` for self-discounting.
    #[must_use]
    pub fn exogenous_discount_curve(&self) -> Option<&str> {
        self.discount_curve_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != self.curve_id)
    }

    /// The single direct segment, if the curve is built directly.
    #[must_use]
    pub fn direct_segment(&self) -> Option<&YieldCurveSegment> {
        match self.segments.as_slice() {
            [only] if only.kind.is_direct() => Some(only),
            _ => None,
        }
    }

    /// Yield curve ids this curve needs built first, excluding itself.
    #[must_use]
    pub fn required_curve_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        if let Some(id) = self.exogenous_discount_curve() {
            ids.insert(id.to_string());
        }
        let mut add = |id: &Option<String>| {
            if let Some(id) = id {
                ids.insert(id.clone());
            }
        };
        for segment in &self.segments {
            match &segment.kind {
                SegmentKind::Fra { projection_curve_id }
                | SegmentKind::Future { projection_curve_id }
                | SegmentKind::Ois { projection_curve_id }
                | SegmentKind::Swap { projection_curve_id }
                | SegmentKind::AverageOis { projection_curve_id } => add(projection_curve_id),
                SegmentKind::TenorBasis {
                    short_projection_curve_id,
                    long_projection_curve_id,
                }
                | SegmentKind::TenorBasisTwo {
                    short_projection_curve_id,
                    long_projection_curve_id,
                } => {
                    add(short_projection_curve_id);
                    add(long_projection_curve_id);
                }
                SegmentKind::BmaBasis {
                    libor_projection_curve_id,
                } => add(&Some(libor_projection_curve_id.clone())),
                SegmentKind::FxForward {
                    foreign_discount_curve_id,
                    ..
                } => add(&Some(foreign_discount_curve_id.clone())),
                SegmentKind::CrossCcyBasis {
                    foreign_discount_curve_id,
                    domestic_projection_curve_id,
                    foreign_projection_curve_id,
                    ..
                } => {
                    add(&Some(foreign_discount_curve_id.clone()));
                    add(domestic_projection_curve_id);
                    add(foreign_projection_curve_id);
                }
                SegmentKind::CrossCcyFixFloat {
                    foreign_discount_curve_id,
                    foreign_projection_curve_id,
                    ..
                } => {
                    add(&Some(foreign_discount_curve_id.clone()));
                    add(foreign_projection_curve_id);
                }
                SegmentKind::ZeroSpread { reference_curve_id }
                | SegmentKind::YieldPlusDefault {
                    reference_curve_id, ..
                }
                | SegmentKind::BondYieldShifted {
                    reference_curve_id, ..
                } => add(&Some(reference_curve_id.clone())),
                SegmentKind::DiscountRatio {
                    base_curve_id,
                    numerator_curve_id,
                    denominator_curve_id,
                    ..
                } => {
                    add(&Some(base_curve_id.clone()));
                    add(&Some(numerator_curve_id.clone()));
                    add(&Some(denominator_curve_id.clone()));
                }
                SegmentKind::FittedBond {
                    ibor_index_curves, ..
                } => {
                    for id in ibor_index_curves.values() {
                        add(&Some(id.clone()));
                    }
                }
                SegmentKind::WeightedAverage {
                    reference_curve_id1,
                    reference_curve_id2,
                    ..
                } => {
                    add(&Some(reference_curve_id1.clone()));
                    add(&Some(reference_curve_id2.clone()));
                }
                SegmentKind::IborFallback { rfr_curve_id, .. } => add(&Some(rfr_curve_id.clone())),
                SegmentKind::Deposit | SegmentKind::Discount | SegmentKind::Zero => {}
            }
        }
        ids.remove(&self.curve_id);
        ids
    }

    /// Default curve ids needed by a yield-plus-default curve.
    #[must_use]
    pub fn required_default_curve_ids(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|s| match &s.kind {
                SegmentKind::YieldPlusDefault {
                    default_curve_ids, ..
                } => Some(default_curve_ids.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Runs [`Validate::validate`].
    pub fn validate_config(&self) -> MarketResult<()> {
        self.validate()
    }
}

impl Validate for YieldCurveConfig {
    fn validate(&self) -> MarketResult<()> {
        let id = self.curve_id.as_str();
        if self.segments.is_empty() {
            return Err(MarketError::invalid_config(id, "no segments configured"));
        }
        self.bootstrap.check(id)?;

        if self.segments.len() > 1 {
            if let Some(desc) = self
                .segments
                .iter()
                .find_map(|s| s.kind.direct_description())
            {
                return Err(MarketError::invalid_config(
                    id,
                    format!("A {desc} curve must contain exactly one segment"),
                ));
            }
        }

        for segment in &self.segments {
            let kind = &segment.kind;
            if kind.needs_quotes() {
                let selection = segment.quote_selection(id)?;
                if matches!(kind, SegmentKind::AverageOis { .. }) {
                    if selection.is_wildcard() {
                        return Err(MarketError::InvalidWildcard {
                            curve_id: id.to_string(),
                            reason: "average OIS quotes come in explicit (rate, spread) pairs".into(),
                        });
                    }
                    if segment.quotes.len() % 2 != 0 {
                        return Err(MarketError::invalid_config(
                            id,
                            "average OIS quotes must come in (rate, spread) pairs",
                        ));
                    }
                }
            }
            if kind.needs_conventions() && segment.conventions_id.is_empty() {
                return Err(MarketError::invalid_config(
                    id,
                    format!("{} segment has no conventions id", kind.type_name()),
                ));
            }

            match kind {
                SegmentKind::FittedBond { .. } => {
                    if !self.interpolation_method.is_fitting_method() {
                        return Err(MarketError::invalid_config(
                            id,
                            format!(
                                "fitted bond curves need ExponentialSplines, NelsonSiegel or Svensson, got {:?}",
                                self.interpolation_method
                            ),
                        ));
                    }
                }
                SegmentKind::WeightedAverage { weight1, weight2, .. } => {
                    if !weight1.is_finite() || !weight2.is_finite() {
                        return Err(MarketError::invalid_config(id, "weights must be finite"));
                    }
                }
                SegmentKind::YieldPlusDefault {
                    default_curve_ids,
                    weights,
                    ..
                } => {
                    if default_curve_ids.len() != weights.len() {
                        return Err(MarketError::invalid_config(
                            id,
                            format!(
                                "{} default curves but {} weights",
                                default_curve_ids.len(),
                                weights.len()
                            ),
                        ));
                    }
                    if weights.iter().any(|w| !w.is_finite()) {
                        return Err(MarketError::invalid_config(id, "weights must be finite"));
                    }
                }
                SegmentKind::IborFallback { spread, .. } if !spread.is_finite() => {
                    return Err(MarketError::invalid_config(id, "fallback spread must be finite"));
                }
                _ => {}
            }
        }

        if self.interpolation_method.is_fitting_method() && self.direct_segment().is_none() {
            return Err(MarketError::invalid_config(
                id,
                format!(
                    "{:?} is only available for fitted bond curves",
                    self.interpolation_method
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn deposit() -> YieldCurveSegment {
        YieldCurveSegment::new(SegmentKind::Deposit, "EUR-DEP", quotes(&["MM/RATE/EUR/2D/3M"]))
    }

    #[test]
    fn test_defaults() {
        let config = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![deposit()]);
        assert_eq!(config.interpolation_variable, InterpolationVariable::Discount);
        assert_eq!(config.interpolation_method, InterpolationMethod::LogLinear);
        assert_eq!(config.zero_day_counter, DayCountConvention::Act365Fixed);
        assert!(config.extrapolation);
        assert!(!config.preserve_quote_linkage);
        assert_eq!(config.mixed_interpolation_cutoff, 1);
        assert_eq!(config.bootstrap.accuracy, 1e-12);
        assert_eq!(config.bootstrap.max_attempts, 5);
        assert_eq!(config.bootstrap.dont_throw_steps, 10);
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_segment_json_shape() {
        let json = r#"{
            "type": "Swap",
            "projection_curve_id": "EUR-6M",
            "conventions_id": "EUR-SWAP",
            "quotes": ["IR_SWAP/RATE/EUR/2D/6M/*"],
            "priority": 1,
            "min_distance": 30
        }"#;
        let segment: YieldCurveSegment = serde_json::from_str(json).unwrap();
        assert_eq!(
            segment.kind,
            SegmentKind::Swap {
                projection_curve_id: Some("EUR-6M".into())
            }
        );
        assert_eq!(segment.priority, 1);
        assert_eq!(segment.min_distance, 30);
        assert_eq!(segment.pillar_choice, PillarChoice::LastRelevantDate);
    }

    #[test]
    fn test_empty_segments_rejected() {
        let config = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![]);
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_direct_segment_must_be_alone() {
        let ratio = YieldCurveSegment::new(
            SegmentKind::DiscountRatio {
                base_curve_id: "A".into(),
                base_curve_currency: Currency::EUR,
                numerator_curve_id: "B".into(),
                numerator_curve_currency: Currency::EUR,
                denominator_curve_id: "C".into(),
                denominator_curve_currency: Currency::EUR,
            },
            "",
            vec![],
        );
        let config = YieldCurveConfig::new("X", Currency::EUR, vec![deposit(), ratio.clone()]);
        let err = config.validate_config().unwrap_err();
        assert!(err
            .to_string()
            .contains("A discount ratio curve must contain exactly one segment"));

        let alone = YieldCurveConfig::new("X", Currency::EUR, vec![ratio]);
        assert!(alone.validate_config().is_ok());
        assert!(alone.direct_segment().is_some());
        let required: Vec<String> = alone.required_curve_ids().into_iter().collect();
        assert_eq!(required, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_wildcard_mixed_with_explicit_rejected() {
        let segment = YieldCurveSegment::new(
            SegmentKind::Deposit,
            "EUR-DEP",
            quotes(&["MM/RATE/EUR/*", "MM/RATE/EUR/2D/3M"]),
        );
        let config = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![segment]);
        let err = config.validate_config().unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_non_finite_tolerance_rejected() {
        let config = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![deposit()])
            .with_bootstrap(BootstrapConfig::default().with_accuracy(f64::NAN));
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_required_curve_ids_skip_self() {
        let fra = YieldCurveSegment::new(
            SegmentKind::Fra {
                projection_curve_id: Some("EUR-6M".into()),
            },
            "EUR-FRA",
            quotes(&["FRA/RATE/EUR/*"]),
        );
        let config = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![deposit(), fra])
            .with_discount_curve("EUR-ESTR");
        let required: Vec<String> = config.required_curve_ids().into_iter().collect();
        assert_eq!(required, vec!["EUR-ESTR"]);
    }

    #[test]
    fn test_fitting_method_checks() {
        let fitted = YieldCurveSegment::new(
            SegmentKind::FittedBond {
                securities: vec![],
                ibor_index_curves: BTreeMap::new(),
                extrapolate_flat: false,
                calibration_trials: 1,
            },
            "",
            quotes(&["BOND/PRICE/*"]),
        );
        let config = YieldCurveConfig::new("EUR-BONDS", Currency::EUR, vec![fitted]);
        assert!(config.validate_config().is_err());
        let config = config.with_interpolation(InterpolationMethod::NelsonSiegel, InterpolationVariable::Discount);
        assert!(config.validate_config().is_ok());

        let swap_with_ns = YieldCurveConfig::new("EUR-6M", Currency::EUR, vec![deposit()])
            .with_interpolation(InterpolationMethod::Svensson, InterpolationVariable::Discount);
        assert!(swap_with_ns.validate_config().is_err());
    }
}

//! Curve specifications.
//!
//! A spec identifies a built curve by currency and curve id. Its `name()`
//! is the key under which the curve is stored in a market snapshot.

use std::fmt;

use pillar_core::Currency;
use serde::{Deserialize, Serialize};

/// Identifies a yield curve: `Yield/EUR/EUR-ESTR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YieldCurveSpec {
    /// Curve currency.
    pub currency: Currency,
    /// Curve id.
    pub curve_id: String,
}

impl YieldCurveSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(currency: Currency, curve_id: impl Into<String>) -> Self {
        Self {
            currency,
            curve_id: curve_id.into(),
        }
    }

    /// Snapshot key.
    #[must_use]
    pub fn name(&self) -> String {
        format!("Yield/{}/{}", self.currency.code(), self.curve_id)
    }
}

impl fmt::Display for YieldCurveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Identifies a commodity price curve: `Commodity/USD/WTI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommodityCurveSpec {
    /// Curve currency.
    pub currency: Currency,
    /// Curve id, usually the commodity name.
    pub curve_id: String,
}

impl CommodityCurveSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(currency: Currency, curve_id: impl Into<String>) -> Self {
        Self {
            currency,
            curve_id: curve_id.into(),
        }
    }

    /// Snapshot key.
    #[must_use]
    pub fn name(&self) -> String {
        format!("Commodity/{}/{}", self.currency.code(), self.curve_id)
    }
}

impl fmt::Display for CommodityCurveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Identifies a commodity volatility surface: `CommodityVolatility/USD/WTI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommodityVolSpec {
    /// Surface currency.
    pub currency: Currency,
    /// Curve id.
    pub curve_id: String,
}

impl CommodityVolSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(currency: Currency, curve_id: impl Into<String>) -> Self {
        Self {
            currency,
            curve_id: curve_id.into(),
        }
    }

    /// Snapshot key.
    #[must_use]
    pub fn name(&self) -> String {
        format!("CommodityVolatility/{}/{}", self.currency.code(), self.curve_id)
    }
}

impl fmt::Display for CommodityVolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

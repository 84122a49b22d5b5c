//! # Pillar Vol
//!
//! Commodity option volatility surfaces for the Pillar term-structure
//! library.
//!
//! This crate provides:
//!
//! - **Surfaces**: constant, expiry curves, strike grids (dense or sparse),
//!   delta and moneyness grids, average price option surfaces and proxies
//!   of other commodities, all behind [`BlackVolTermStructure`]
//! - **Quote handling**: expiries as dates, tenors or future continuations,
//!   wildcard and explicit quote selection, premium stripping
//! - **Builder**: [`CommodityVolCurveBuilder`] tries the configured variants
//!   in priority order and keeps the first that builds
//! - **Diagnostics**: a per-expiry calibration report with call spread,
//!   butterfly and calendar arbitrage flags
//!
//! ## Example
//!
//! ```rust
//! use pillar_core::{Currency, Date};
//! use pillar_market::config::{
//!     CommodityVolatilityConfig, CurveInterpolation, Extrapolation, VolatilityConfig,
//!     VolatilityConfigKind, VolatilityCurveConfig,
//! };
//! use pillar_market::conventions::Conventions;
//! use pillar_market::quotes::InMemoryQuoteStore;
//! use pillar_market::specs::CommodityVolSpec;
//! use pillar_vol::prelude::*;
//!
//! let asof = Date::from_ymd(2024, 1, 15).unwrap();
//! let quotes = InMemoryQuoteStore::new()
//!     .with_quote(asof, "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/6M/ATM/AtmFwd", 0.32)
//!     .unwrap()
//!     .with_quote(asof, "COMMODITY_OPTION/RATE_LNVOL/WTI/USD/1Y/ATM/AtmFwd", 0.30)
//!     .unwrap();
//! let curve_config = VolatilityCurveConfig {
//!     quotes: vec!["COMMODITY_OPTION/RATE_LNVOL/WTI/USD/*".to_string()],
//!     interpolation: CurveInterpolation::Linear,
//!     extrapolation: Extrapolation::Flat,
//!     enforce_monotone_variance: true,
//! };
//! let config = CommodityVolatilityConfig::new(
//!     "WTI",
//!     Currency::USD,
//!     vec![VolatilityConfig::new(VolatilityConfigKind::Curve(curve_config))],
//! );
//! let spec = CommodityVolSpec::new(Currency::USD, "WTI");
//! let conventions = Conventions::default();
//!
//! let curve = CommodityVolCurveBuilder::new(asof, &spec, &config, &conventions, &quotes, VolDependencies::empty())
//!     .build()
//!     .unwrap();
//! assert_eq!(curve.variant(), "Curve");
//! let one_year = asof.add_period(pillar_core::Period::years(1), false).unwrap();
//! assert!((curve.black_vol(one_year, 100.0).unwrap() - 0.30).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::float_cmp)]

pub mod black;
mod builder;
pub mod correlation;
pub mod delta;
mod dependencies;
pub mod diagnostics;
pub mod error;
pub mod expiry;
mod price_correction;
pub mod surfaces;
pub mod term_structure;
mod vol_curve;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::CommodityVolCurveBuilder;
    pub use crate::correlation::{CorrelationTermStructure, FlatCorrelation};
    pub use crate::dependencies::{CorrelationMap, PriceCurveMap, VolDependencies, VolSurfaceMap};
    pub use crate::diagnostics::{CalibrationReportBuilder, VolCalibrationInfo};
    pub use crate::error::{VolError, VolResult};
    pub use crate::expiry::{get_expiry, ConventionsFutureExpiry, FutureExpiryCalculator};
    pub use crate::price_correction::correct_future_price_curve;
    pub use crate::term_structure::BlackVolTermStructure;
    pub use crate::vol_curve::CommodityVolCurve;
}

pub use builder::CommodityVolCurveBuilder;
pub use dependencies::{CorrelationMap, PriceCurveMap, VolDependencies, VolSurfaceMap};
pub use error::{VolError, VolResult};
pub use expiry::{get_expiry, ConventionsFutureExpiry, FutureExpiryCalculator};
pub use price_correction::correct_future_price_curve;
pub use term_structure::BlackVolTermStructure;
pub use vol_curve::CommodityVolCurve;

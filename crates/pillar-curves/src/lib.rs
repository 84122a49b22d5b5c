//! # Pillar Curves
//!
//! Yield curve construction for the Pillar term-structure library.
//!
//! This crate provides:
//!
//! - **Term structures**: the [`YieldTermStructure`] trait with discount,
//!   zero and forward rates in any convention
//! - **Rate helpers**: deposits, FRAs, futures, OIS, swaps, basis swaps,
//!   FX forwards and cross currency swaps
//! - **Bootstrap**: an iterative, optionally global, bootstrap over any
//!   interpolation method and variable, with re-baking into a plain curve
//! - **Direct curves**: discount and zero quotes, spreads over other curves,
//!   ratios, weighted averages, yield plus default, Ibor fallback, shifted
//!   and fitted bond curves
//! - **Builders**: [`YieldCurveBuilder`] for one configured curve and
//!   [`YieldCurveSet`] for a whole snapshot in dependency order
//! - **Price curves**: commodity forward prices by delivery date
//!
//! ## Example
//!
//! ```rust
//! use pillar_core::Date;
//! use pillar_curves::prelude::*;
//! use pillar_market::prelude::*;
//!
//! let asof = Date::from_ymd(2024, 1, 15).unwrap();
//! let conventions = Conventions::from_json_str(
//!     r#"{ "EUR-DEP": { "type": "Deposit", "index": "EUR-EURIBOR-6M" } }"#,
//! )
//! .unwrap();
//! let config: YieldCurveConfig = serde_json::from_str(
//!     r#"{
//!         "curve_id": "EUR-6M",
//!         "currency": "EUR",
//!         "segments": [
//!             { "type": "Deposit", "conventions_id": "EUR-DEP", "quotes": ["MM/RATE/EUR/2D/*"] }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//! let quotes = InMemoryQuoteStore::new()
//!     .with_quote(asof, "MM/RATE/EUR/2D/3M", 0.039)
//!     .unwrap()
//!     .with_quote(asof, "MM/RATE/EUR/2D/6M", 0.040)
//!     .unwrap();
//!
//! let built = YieldCurveMap::new();
//! let curve = YieldCurveBuilder::new(asof, &config, &conventions, &quotes, CurveDependencies::new(&built))
//!     .build()
//!     .unwrap();
//! assert_eq!(curve.discount(asof).unwrap(), 1.0);
//! assert!(curve.calibration_info().max_abs_error() < 1e-10);
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
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::float_cmp)]
#![allow(clippy::unreadable_literal)]

pub mod bonds;
pub mod bootstrap;
mod builder;
pub mod calibration;
mod curve_set;
pub mod curves;
mod dependencies;
pub mod error;
pub mod helpers;
mod price_curve;
pub mod term_structure;
mod yield_curve;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bootstrap::{IterativeBootstrap, PiecewiseYieldCurve};
    pub use crate::builder::YieldCurveBuilder;
    pub use crate::calibration::{HelperCalibration, YieldCurveCalibrationInfo};
    pub use crate::curve_set::YieldCurveSet;
    pub use crate::curves::{InterpolatedCurve, InterpolationSpec, ZeroSpreadedCurve};
    pub use crate::dependencies::{CurveDependencies, DefaultCurveMap, YieldCurveMap};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::helpers::{CurveHandle, RateHelper, SharedHelper};
    pub use crate::price_curve::{PriceCurve, PriceInterpolation};
    pub use crate::term_structure::{FlatForwardCurve, YieldTermStructure};
    pub use crate::yield_curve::YieldCurve;
}

pub use builder::YieldCurveBuilder;
pub use curve_set::{dependency_layers, YieldCurveSet};
pub use dependencies::{CurveDependencies, DefaultCurveMap, YieldCurveMap};
pub use error::{CurveError, CurveResult};
pub use price_curve::{PriceCurve, PriceInterpolation};
pub use term_structure::{FlatForwardCurve, YieldTermStructure};
pub use yield_curve::YieldCurve;

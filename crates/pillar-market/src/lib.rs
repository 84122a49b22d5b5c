//! # Pillar Market
//!
//! Market inputs for the Pillar curve and surface builders:
//!
//! - **Quotes**: slash-delimited quote names parsed into [`quotes::MarketDatum`],
//!   the [`quotes::QuoteStore`] trait, an in-memory store with CSV loading
//!   and `*` wildcard selection
//! - **Conventions**: the [`conventions::Convention`] tagged enum and the
//!   [`conventions::Conventions`] registry with typed lookups
//! - **Specs**: curve identifiers used as snapshot keys
//! - **Configuration**: serde models for yield curves and commodity
//!   volatility surfaces, loadable from JSON or TOML
//!
//! ## Example
//!
//! ```rust
//! use pillar_market::prelude::*;
//!
//! let asof = Date::from_ymd(2024, 1, 15).unwrap();
//! let store = InMemoryQuoteStore::new()
//!     .with_quote(asof, "MM/RATE/EUR/2D/3M", 0.039)
//!     .unwrap();
//! let datum = store.get("MM/RATE/EUR/2D/3M", asof).unwrap();
//! assert_eq!(datum.instrument_type(), InstrumentType::MoneyMarket);
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
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::similar_names)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::float_cmp)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::trivially_copy_pass_by_ref)]

pub mod config;
pub mod conventions;
pub mod error;
pub mod quotes;
pub mod specs;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        CommodityVolatilityConfig, CurveConfigurations, SegmentKind, Validate, VolatilityConfig,
        VolatilityConfigKind, YieldCurveConfig, YieldCurveSegment,
    };
    pub use crate::conventions::{Convention, Conventions, RateIndex};
    pub use crate::error::{MarketError, MarketResult};
    pub use crate::quotes::{
        Expiry, InMemoryQuoteStore, InstrumentType, MarketDatum, QuoteDetails, QuoteSelection,
        QuoteStore, QuoteType, Strike, Wildcard,
    };
    pub use crate::specs::{CommodityCurveSpec, CommodityVolSpec, YieldCurveSpec};
    pub use pillar_core::{Currency, Date, Period};
}

pub use error::{MarketError, MarketResult};

//! # Pillar Core
//!
//! Date arithmetic and market conventions for the Pillar term-structure library.
//!
//! This crate provides the foundational building blocks used by the curve and
//! surface builders:
//!
//! - **Types**: `Date`, `Period`, `Currency`, `Frequency`, `Compounding`
//! - **Day Count Conventions**: year fractions for Act/360, Act/365F, Act/Act and 30/360
//! - **Business Day Calendars**: weekend-only, TARGET, UK, US and joint calendars
//! - **Business Day Conventions**: Following, Modified Following, Preceding, ...
//! - **Schedules**: backward/forward rolled leg schedules
//!
//! Every market-facing type parses from the short names used in curve
//! configurations (`"A365"`, `"TARGET"`, `"MF"`, `"6M"`) and serializes back
//! to the same strings.
//!
//! ## Example
//!
//! ```rust
//! use pillar_core::prelude::*;
//!
//! let asof = Date::from_ymd(2024, 1, 15).unwrap();
//! let cal: MarketCalendar = "TARGET".parse().unwrap();
//! let maturity = cal
//!     .advance(asof, "6M".parse().unwrap(), BusinessDayConvention::ModifiedFollowing, false)
//!     .unwrap();
//! let t = DayCountConvention::Act365Fixed.year_fraction(asof, maturity);
//! assert!(t > 0.49 && t < 0.51);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_possible_truncation)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod schedule;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{
        BusinessDayConvention, Calendar, JointCalendar, MarketCalendar, WeekendCalendar,
    };
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::schedule::{DateGenerationRule, Schedule, ScheduleConfig};
    pub use crate::types::{
        Compounding, Currency, Date, Frequency, InterestRate, Period, TimeUnit,
    };
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use types::{Currency, Date, Period};

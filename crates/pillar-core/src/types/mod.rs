//! Domain types for term-structure construction.
//!
//! - [`Date`]: Calendar date with month/period arithmetic
//! - [`Period`]: Tenor such as `3M`, `10Y`, `ON`
//! - [`Currency`]: ISO currency codes
//! - [`Frequency`]: Payment frequency
//! - [`Compounding`]: Interest compounding convention
//! - [`InterestRate`]: Rate with its compounding, for conversions

mod currency;
mod date;
mod frequency;
mod period;
mod rate;

pub use currency::Currency;
pub use date::Date;
pub use frequency::{Compounding, Frequency};
pub use period::{Period, TimeUnit};
pub use rate::InterestRate;

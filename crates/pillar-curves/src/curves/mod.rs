//! Yield curve representations.
//!
//! - [`InterpolatedCurve`]: nodes interpolated over discount, zero or forward
//! - [`ZeroSpreadedCurve`]: a base curve plus a zero spread term structure
//! - [`DiscountRatioCurve`] and [`WeightedAverageCurve`]: compositions
//! - [`YieldPlusDefaultCurve`]: a yield curve times survival probabilities
//! - [`FittedBondCurve`]: a parametric form fitted to bond prices

mod composite;
mod fitted;
mod interpolated;
mod spreaded;
mod survival;

pub use composite::{DiscountRatioCurve, WeightedAverageCurve};
pub use fitted::{BondQuote, FitSettings, FittedBondCurve, FittingMethod};
pub use interpolated::{InterpolatedCurve, InterpolationSpec};
pub use spreaded::ZeroSpreadedCurve;
pub use survival::{InterpolatedSurvivalCurve, SurvivalTermStructure, YieldPlusDefaultCurve};

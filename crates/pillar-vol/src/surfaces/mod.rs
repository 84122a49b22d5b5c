//! Volatility surface representations.
//!
//! - [`ConstantVol`]: one number
//! - [`BlackVarianceCurve`]: volatility by expiry only
//! - [`BlackVarianceSurface`]: full expiry by strike grid
//! - [`BlackVolSurfaceSparse`]: scattered expiry and strike points
//! - [`BlackVolatilitySurfaceDelta`]: expiry by delta grid with ATM column
//! - [`BlackVolatilitySurfaceMoneyness`]: expiry by spot or forward moneyness
//! - [`ApoFutureSurface`]: monthly average price options from a future surface
//! - [`ProxyBlackVolSurface`]: another commodity's surface, FX adjusted
//! - [`InvertedBlackVolSurface`]: an FX surface for the reversed pair
//!
//! All grid surfaces interpolate linearly in total variance across time
//! and extrapolate flat in volatility past the quoted expiries.

mod apo;
mod constant;
mod delta;
mod moneyness;
mod proxy;
pub(crate) mod smile;
mod sparse;
mod variance_curve;
mod variance_surface;

pub use apo::{ApoBaseMarket, ApoFutureSurface};
pub use constant::ConstantVol;
pub use delta::{BlackVolatilitySurfaceDelta, DeltaConvention};
pub use moneyness::BlackVolatilitySurfaceMoneyness;
pub use proxy::{FxAdjustment, InvertedBlackVolSurface, ProxyBlackVolSurface};
pub use sparse::BlackVolSurfaceSparse;
pub use variance_curve::BlackVarianceCurve;
pub use variance_surface::BlackVarianceSurface;

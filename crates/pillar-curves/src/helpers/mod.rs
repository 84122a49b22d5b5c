//! Rate helpers for the iterative bootstrap.
//!
//! A rate helper wraps one quoted calibration instrument. It knows the date
//! at which it constrains the curve (its pillar) and, given a trial version
//! of the curve being built, the quote the instrument would have. The
//! bootstrap moves the node at the pillar until the two agree.
//!
//! # Available Helpers
//!
//! ## Money Market
//! - [`DepositHelper`]: deposits, quoted as simple rates
//! - [`FraHelper`]: forward rate agreements
//! - [`FutureHelper`]: money-market futures, quoted as `100 - rate`
//!
//! ## Swaps
//! - [`OisHelper`]: overnight indexed swaps
//! - [`SwapHelper`]: fixed versus Ibor swaps
//! - [`AverageOisHelper`]: fixed versus averaged overnight plus spread
//! - [`TenorBasisHelper`]: Ibor versus Ibor of another tenor
//! - [`TenorBasisTwoHelper`]: difference of two vanilla swap rates
//! - [`BmaRatioHelper`]: BMA versus a ratio of Libor
//!
//! ## Cross Currency
//! - [`FxForwardHelper`]: FX forward points
//! - [`CrossCcyBasisHelper`]: float versus float with notional exchange
//! - [`CrossCcyFixFloatHelper`]: fixed versus float with notional exchange
//!
//! Helpers refer to curves through a [`CurveHandle`]: either the curve
//! being built, supplied by the bootstrap on each evaluation, or an
//! already-built dependency held by `Arc`.

mod cross_currency;
mod legs;
mod money_market;
mod swaps;

pub use cross_currency::{CrossCcyBasisHelper, CrossCcyFixFloatHelper, FxForwardHelper};
pub use legs::{FixedLeg, FloatLeg, LegDates};
pub use money_market::{imm_date, DepositHelper, FraHelper, FutureHelper};
pub use swaps::{
    AverageOisHelper, BmaRatioHelper, OisHelper, SwapHelper, TenorBasisHelper,
    TenorBasisTwoHelper,
};

use std::fmt;
use std::sync::Arc;

use pillar_core::Date;
use pillar_market::config::PillarChoice;

use crate::error::CurveResult;
use crate::term_structure::YieldTermStructure;

/// A curve used by a helper.
#[derive(Clone)]
pub enum CurveHandle {
    /// The curve being bootstrapped.
    Own,
    /// A curve built before this one.
    External(Arc<dyn YieldTermStructure>),
}

impl CurveHandle {
    /// Handle to an optional external curve; the curve being built when `None`.
    #[must_use]
    pub fn own_or(curve: Option<Arc<dyn YieldTermStructure>>) -> Self {
        curve.map_or(Self::Own, Self::External)
    }

    /// The curve to evaluate, given the trial curve being built.
    #[must_use]
    pub fn resolve<'a>(&'a self, own: &'a dyn YieldTermStructure) -> &'a dyn YieldTermStructure {
        match self {
            Self::Own => own,
            Self::External(curve) => curve.as_ref(),
        }
    }

    /// True for the curve being built.
    #[must_use]
    pub fn is_own(&self) -> bool {
        matches!(self, Self::Own)
    }
}

impl fmt::Debug for CurveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => f.write_str("Own"),
            Self::External(curve) => write!(f, "External(ref={})", curve.reference_date()),
        }
    }
}

/// Dates shared by every helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperDates {
    /// First date the instrument depends on.
    pub earliest: Date,
    /// Instrument maturity.
    pub maturity: Date,
    /// Last date the instrument depends on.
    pub latest_relevant: Date,
    /// Date of the node the helper solves for.
    pub pillar: Date,
}

impl HelperDates {
    /// Builds the dates, choosing the pillar by `choice`.
    #[must_use]
    pub fn new(earliest: Date, maturity: Date, latest_relevant: Date, choice: PillarChoice) -> Self {
        let latest_relevant = latest_relevant.max(maturity);
        let pillar = match choice {
            PillarChoice::MaturityDate => maturity,
            PillarChoice::LastRelevantDate => latest_relevant,
        };
        Self {
            earliest,
            maturity,
            latest_relevant,
            pillar,
        }
    }
}

/// One calibration instrument of the bootstrap.
pub trait RateHelper: Send + Sync + fmt::Debug {
    /// Name of the market quote.
    fn quote_name(&self) -> &str;

    /// Market quote the helper must reprice.
    fn quote(&self) -> f64;

    /// Dates of the instrument.
    fn dates(&self) -> &HelperDates;

    /// Quote implied by `curve`, the trial curve being built.
    ///
    /// # Errors
    ///
    /// Fails when a curve cannot be evaluated at one of the instrument dates.
    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64>;

    /// Date of the node the helper solves for.
    fn pillar_date(&self) -> Date {
        self.dates().pillar
    }

    /// Instrument maturity.
    fn maturity_date(&self) -> Date {
        self.dates().maturity
    }

    /// Implied minus market quote.
    ///
    /// # Errors
    ///
    /// Propagates [`implied_quote`](Self::implied_quote) failures.
    fn quote_error(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        Ok(self.implied_quote(curve)? - self.quote())
    }

    /// Short instrument description for logs.
    fn description(&self) -> String {
        format!("{} (pillar {})", self.quote_name(), self.pillar_date())
    }
}

impl<T: RateHelper + ?Sized> RateHelper for Arc<T> {
    fn quote_name(&self) -> &str {
        (**self).quote_name()
    }

    fn quote(&self) -> f64 {
        (**self).quote()
    }

    fn dates(&self) -> &HelperDates {
        (**self).dates()
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        (**self).implied_quote(curve)
    }
}

/// Shared handle to a helper.
pub type SharedHelper = Arc<dyn RateHelper>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use pillar_core::daycounts::DayCountConvention;

    #[test]
    fn test_pillar_choice() {
        let d = |m| Date::from_ymd(2024, m, 15).unwrap();
        let maturity = HelperDates::new(d(1), d(6), d(7), PillarChoice::MaturityDate);
        assert_eq!(maturity.pillar, d(6));
        let last = HelperDates::new(d(1), d(6), d(7), PillarChoice::LastRelevantDate);
        assert_eq!(last.pillar, d(7));
        // latest relevant is never before maturity
        let clamped = HelperDates::new(d(1), d(6), d(3), PillarChoice::LastRelevantDate);
        assert_eq!(clamped.pillar, d(6));
    }

    #[test]
    fn test_curve_handle_resolution() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let own = FlatForwardCurve::new(asof, 0.01, DayCountConvention::Act365Fixed);
        let other: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForwardCurve::new(asof, 0.05, DayCountConvention::Act365Fixed));

        let handle = CurveHandle::own_or(None);
        assert!(handle.is_own());
        let df = handle.resolve(&own).discount_t(1.0, false).unwrap();
        assert!((df - (-0.01f64).exp()).abs() < 1e-15);

        let handle = CurveHandle::own_or(Some(other));
        let df = handle.resolve(&own).discount_t(1.0, false).unwrap();
        assert!((df - (-0.05f64).exp()).abs() < 1e-15);
    }
}

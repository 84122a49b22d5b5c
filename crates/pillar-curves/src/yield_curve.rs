//! A built yield curve with its identity and diagnostics.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::specs::YieldCurveSpec;

use crate::bootstrap::PiecewiseYieldCurve;
use crate::calibration::YieldCurveCalibrationInfo;
use crate::error::CurveResult;
use crate::term_structure::YieldTermStructure;

/// A yield curve built for one as-of date.
///
/// Evaluation delegates to the underlying term structure. Bootstrapped
/// curves built with quote linkage keep their [`PiecewiseYieldCurve`] and can
/// report implied quotes; otherwise the curve holds node values only.
pub struct YieldCurve {
    spec: YieldCurveSpec,
    asof: Date,
    curve: Arc<dyn YieldTermStructure>,
    piecewise: Option<Arc<PiecewiseYieldCurve>>,
    calibration: YieldCurveCalibrationInfo,
}

impl fmt::Debug for YieldCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YieldCurve")
            .field("spec", &self.spec.name())
            .field("asof", &self.asof)
            .field("quote_linked", &self.piecewise.is_some())
            .finish_non_exhaustive()
    }
}

impl YieldCurve {
    /// Wraps a curve without helpers.
    #[must_use]
    pub fn new(
        spec: YieldCurveSpec,
        asof: Date,
        curve: Arc<dyn YieldTermStructure>,
        calibration: YieldCurveCalibrationInfo,
    ) -> Self {
        Self {
            spec,
            asof,
            curve,
            piecewise: None,
            calibration,
        }
    }

    /// Wraps a bootstrapped curve that keeps its helpers.
    #[must_use]
    pub fn quote_linked(
        spec: YieldCurveSpec,
        asof: Date,
        curve: Arc<PiecewiseYieldCurve>,
        calibration: YieldCurveCalibrationInfo,
    ) -> Self {
        Self {
            spec,
            asof,
            curve: curve.clone(),
            piecewise: Some(curve),
            calibration,
        }
    }

    /// Curve identity.
    #[must_use]
    pub fn spec(&self) -> &YieldCurveSpec {
        &self.spec
    }

    /// As-of date of the build.
    #[must_use]
    pub fn asof(&self) -> Date {
        self.asof
    }

    /// Shared handle to the term structure.
    #[must_use]
    pub fn handle(&self) -> Arc<dyn YieldTermStructure> {
        self.curve.clone()
    }

    /// The bootstrapped curve, when quote linkage was preserved.
    #[must_use]
    pub fn piecewise(&self) -> Option<&PiecewiseYieldCurve> {
        self.piecewise.as_deref()
    }

    /// Quote name and implied quote of each helper, when quote linkage was
    /// preserved.
    pub fn implied_quotes(&self) -> Option<CurveResult<Vec<(String, f64)>>> {
        self.piecewise.as_ref().map(|p| {
            let implied = p.implied_quotes()?;
            Ok(p.helpers()
                .iter()
                .map(|h| h.quote_name().to_string())
                .zip(implied)
                .collect())
        })
    }

    /// Pillars, rates and helper errors recorded at build time.
    #[must_use]
    pub fn calibration_info(&self) -> &YieldCurveCalibrationInfo {
        &self.calibration
    }
}

impl YieldTermStructure for YieldCurve {
    fn reference_date(&self) -> Date {
        self.curve.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.curve.day_counter()
    }

    fn max_date(&self) -> Date {
        self.curve.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.curve.allows_extrapolation()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        self.curve.discount_impl(t)
    }
}

//! A built commodity volatility surface with its identity and report.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::specs::CommodityVolSpec;

use crate::diagnostics::VolCalibrationInfo;
use crate::error::VolResult;
use crate::term_structure::BlackVolTermStructure;

/// A commodity volatility surface built for one as-of date.
///
/// Evaluation delegates to the surface of the configured variant that
/// succeeded first.
pub struct CommodityVolCurve {
    spec: CommodityVolSpec,
    asof: Date,
    surface: Arc<dyn BlackVolTermStructure>,
    variant: &'static str,
    calibration: Option<VolCalibrationInfo>,
}

impl fmt::Debug for CommodityVolCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommodityVolCurve")
            .field("spec", &self.spec.name())
            .field("asof", &self.asof)
            .field("variant", &self.variant)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl CommodityVolCurve {
    /// Wraps a built surface.
    #[must_use]
    pub fn new(
        spec: CommodityVolSpec,
        asof: Date,
        surface: Arc<dyn BlackVolTermStructure>,
        variant: &'static str,
        calibration: Option<VolCalibrationInfo>,
    ) -> Self {
        Self {
            spec,
            asof,
            surface,
            variant,
            calibration,
        }
    }

    /// Surface identity.
    #[must_use]
    pub fn spec(&self) -> &CommodityVolSpec {
        &self.spec
    }

    /// As-of date of the build.
    #[must_use]
    pub fn asof(&self) -> Date {
        self.asof
    }

    /// Shared handle to the surface.
    #[must_use]
    pub fn handle(&self) -> Arc<dyn BlackVolTermStructure> {
        self.surface.clone()
    }

    /// Type name of the configured variant that built the surface.
    #[must_use]
    pub fn variant(&self) -> &'static str {
        self.variant
    }

    /// Calibration report, when one was configured and could be built.
    #[must_use]
    pub fn calibration_info(&self) -> Option<&VolCalibrationInfo> {
        self.calibration.as_ref()
    }
}

impl BlackVolTermStructure for CommodityVolCurve {
    fn reference_date(&self) -> Date {
        self.surface.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.surface.day_counter()
    }

    fn max_date(&self) -> Date {
        self.surface.max_date()
    }

    fn allows_extrapolation(&self) -> bool {
        self.surface.allows_extrapolation()
    }

    fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
        self.surface.black_vol_impl(t, strike)
    }

    fn is_strike_dependent(&self) -> bool {
        self.surface.is_strike_dependent()
    }

    fn min_strike(&self) -> f64 {
        self.surface.min_strike()
    }

    fn max_strike(&self) -> f64 {
        self.surface.max_strike()
    }

    fn atm_vol(&self, t: f64) -> VolResult<f64> {
        self.surface.atm_vol(t)
    }

    fn max_time(&self) -> f64 {
        self.surface.max_time()
    }
}

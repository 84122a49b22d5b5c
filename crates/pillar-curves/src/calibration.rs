//! Diagnostic report of a built yield curve.

use pillar_core::Date;
use serde::Serialize;

use crate::error::CurveResult;
use crate::helpers::SharedHelper;
use crate::term_structure::YieldTermStructure;

/// Repricing of one helper on the final curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelperCalibration {
    /// Quote name.
    pub quote_name: String,
    /// Pillar date.
    pub pillar: Date,
    /// Instrument maturity.
    pub maturity: Date,
    /// Market quote.
    pub market: f64,
    /// Quote implied by the curve.
    pub implied: f64,
    /// `implied - market`.
    pub error: f64,
}

/// Pillar grid of a yield curve with the helper repricing errors.
///
/// The report is derived from the curve and never feeds back into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YieldCurveCalibrationInfo {
    /// Pillar dates, starting at the reference date.
    pub dates: Vec<Date>,
    /// Curve times of the pillars.
    pub times: Vec<f64>,
    /// Continuously compounded zero rates.
    pub zero_rates: Vec<f64>,
    /// Discount factors.
    pub discount_factors: Vec<f64>,
    /// One entry per bootstrap helper; empty for direct curves.
    pub helpers: Vec<HelperCalibration>,
}

impl YieldCurveCalibrationInfo {
    /// Samples `curve` at the given dates.
    ///
    /// Dates before the reference date are skipped and the reference date
    /// is added when missing.
    pub fn from_curve(curve: &dyn YieldTermStructure, pillars: &[Date]) -> CurveResult<Self> {
        let reference = curve.reference_date();
        let mut dates: Vec<Date> = pillars.iter().copied().filter(|d| *d >= reference).collect();
        dates.push(reference);
        dates.sort_unstable();
        dates.dedup();

        let mut info = Self::default();
        for date in dates {
            let t = curve.time_from_reference(date);
            info.discount_factors.push(curve.discount_t(t, true)?);
            info.zero_rates.push(curve.zero_rate_t(t)?);
            info.times.push(t);
            info.dates.push(date);
        }
        Ok(info)
    }

    /// Adds the repricing of each helper on `curve`.
    pub fn with_helpers(
        mut self,
        curve: &dyn YieldTermStructure,
        helpers: &[SharedHelper],
    ) -> CurveResult<Self> {
        for helper in helpers {
            let implied = helper.implied_quote(curve)?;
            self.helpers.push(HelperCalibration {
                quote_name: helper.quote_name().to_string(),
                pillar: helper.pillar_date(),
                maturity: helper.maturity_date(),
                market: helper.quote(),
                implied,
                error: implied - helper.quote(),
            });
        }
        Ok(self)
    }

    /// Largest absolute helper error, zero without helpers.
    #[must_use]
    pub fn max_abs_error(&self) -> f64 {
        self.helpers.iter().map(|h| h.error.abs()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;
    use pillar_core::daycounts::DayCountConvention;

    #[test]
    fn test_grid_starts_at_reference() {
        let asof = Date::from_ymd(2024, 1, 15).unwrap();
        let curve = FlatForwardCurve::new(asof, 0.03, DayCountConvention::Act365Fixed);
        let pillars = [asof.add_days(365), asof.add_days(-10), asof.add_days(730)];
        let info = YieldCurveCalibrationInfo::from_curve(&curve, &pillars).unwrap();
        assert_eq!(info.dates, vec![asof, asof.add_days(365), asof.add_days(730)]);
        assert_eq!(info.discount_factors[0], 1.0);
        assert_relative_eq!(info.zero_rates[2], 0.03, epsilon = 1e-12);
        assert_eq!(info.max_abs_error(), 0.0);
    }
}

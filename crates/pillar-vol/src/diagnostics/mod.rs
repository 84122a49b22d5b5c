//! Calibration report of a built volatility surface.
//!
//! The report samples the surface on a grid of expiries by deltas and by
//! forward moneyness, prices calls and puts at each point and runs the
//! static arbitrage checks of [`arbitrage`]. It is diagnostic only: a cell
//! that cannot be computed marks its slice invalid and the surface as not
//! arbitrage free, and the rest of the grid is still filled.

pub mod arbitrage;

use std::fmt;
use std::str::FromStr;

use pillar_core::Date;
use pillar_curves::{PriceCurve, YieldTermStructure};
use pillar_market::config::CalibrationReportConfig;
use pillar_market::quotes::{AtmType, DeltaVolType, OptionType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::black::black_price_vol;
use crate::delta::BlackDeltaCalculator;
use crate::error::{VolError, VolResult};
use crate::term_structure::BlackVolTermStructure;

use arbitrage::{check_calendar, check_slice};

/// Fixed-point iterations allowed when a strike depends on its own vol.
const MAX_STRIKE_ITERATIONS: usize = 100;

/// Relative strike change accepted as converged.
const STRIKE_TOLERANCE: f64 = 1.0e-8;

/// A point of the report's delta axis: `10P`, `ATM` or `25C`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DeltaPoint {
    /// The ATM strike.
    Atm,
    /// A put delta, as a positive magnitude.
    Put(f64),
    /// A call delta.
    Call(f64),
}

impl FromStr for DeltaPoint {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.eq_ignore_ascii_case("ATM") {
            return Ok(Self::Atm);
        }
        let invalid = || VolError::invalid_data(format!("invalid report delta '{label}'"));
        let (number, option_type) = if let Some(n) = label.strip_suffix('P').or_else(|| label.strip_suffix('p')) {
            (n, OptionType::Put)
        } else if let Some(n) = label.strip_suffix('C').or_else(|| label.strip_suffix('c')) {
            (n, OptionType::Call)
        } else {
            return Err(invalid());
        };
        let delta = number.trim().parse::<f64>().map_err(|_| invalid())? / 100.0;
        if !(delta > 0.0 && delta < 1.0) {
            return Err(invalid());
        }
        Ok(match option_type {
            OptionType::Put => Self::Put(delta),
            OptionType::Call => Self::Call(delta),
        })
    }
}

impl fmt::Display for DeltaPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atm => f.write_str("ATM"),
            Self::Put(d) => write!(f, "{}P", d * 100.0),
            Self::Call(d) => write!(f, "{}C", d * 100.0),
        }
    }
}

/// One expiry of the report.
///
/// Vectors are aligned with the report's deltas or moneyness levels. Cells
/// that failed hold `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceCalibration {
    /// Expiry date.
    pub expiry: Date,
    /// Surface time of the expiry.
    pub time: f64,
    /// Forward price at the expiry.
    pub forward: f64,
    /// Discount factor to the expiry.
    pub discount: f64,
    /// ATM strike under the slice's convention.
    pub atm_strike: f64,
    /// Strike of each cell.
    pub strikes: Vec<f64>,
    /// Volatility of each cell.
    pub vols: Vec<f64>,
    /// Discounted call premium of each cell.
    pub call_prices: Vec<f64>,
    /// Discounted put premium of each cell.
    pub put_prices: Vec<f64>,
    /// Call spread arbitrage flag of each cell.
    pub call_spread_arbitrage: Vec<bool>,
    /// Butterfly arbitrage flag of each cell.
    pub butterfly_arbitrage: Vec<bool>,
    /// False when any cell could not be computed.
    pub is_valid: bool,
}

impl SliceCalibration {
    fn empty(expiry: Date, time: f64, cells: usize) -> Self {
        Self {
            expiry,
            time,
            forward: f64::NAN,
            discount: f64::NAN,
            atm_strike: f64::NAN,
            strikes: vec![f64::NAN; cells],
            vols: vec![f64::NAN; cells],
            call_prices: vec![f64::NAN; cells],
            put_prices: vec![f64::NAN; cells],
            call_spread_arbitrage: vec![false; cells],
            butterfly_arbitrage: vec![false; cells],
            is_valid: true,
        }
    }

    fn record(&mut self, cell: usize, strike: f64, vol: f64, market: &SliceMarket) {
        self.strikes[cell] = strike;
        self.vols[cell] = vol;
        self.call_prices[cell] = black_price_vol(OptionType::Call, market.forward, strike, vol, market.t, market.discount);
        self.put_prices[cell] = black_price_vol(OptionType::Put, market.forward, strike, vol, market.t, market.discount);
    }

    fn check_arbitrage(&mut self) {
        let undiscounted: Vec<f64> = self.call_prices.iter().map(|c| c / self.discount).collect();
        let flags = check_slice(self.forward, &self.strikes, &undiscounted);
        self.call_spread_arbitrage = flags.call_spread;
        self.butterfly_arbitrage = flags.butterfly;
    }

    fn is_arbitrage_free(&self) -> bool {
        self.is_valid
            && !self
                .call_spread_arbitrage
                .iter()
                .chain(&self.butterfly_arbitrage)
                .any(|f| *f)
    }
}

/// Report of a volatility surface on a delta and a moneyness grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolCalibrationInfo {
    /// Report expiries.
    pub dates: Vec<Date>,
    /// Surface times of the expiries.
    pub times: Vec<f64>,
    /// Delta labels of the delta grid.
    pub deltas: Vec<String>,
    /// Forward moneyness levels of the moneyness grid.
    pub moneyness: Vec<f64>,
    /// Delta grid, one slice per expiry; empty without deltas.
    pub delta_slices: Vec<SliceCalibration>,
    /// Moneyness grid, one slice per expiry; empty without levels.
    pub moneyness_slices: Vec<SliceCalibration>,
    /// Calendar arbitrage flags of the moneyness grid, by expiry and level.
    pub calendar_arbitrage: Vec<Vec<bool>>,
    /// True when every slice is valid and nothing is flagged.
    pub is_arbitrage_free: bool,
    /// Cell failures, in the order they occurred.
    pub messages: Vec<String>,
}

/// Market data of one report expiry.
#[derive(Debug, Clone, Copy)]
struct SliceMarket {
    expiry: Date,
    t: f64,
    forward: f64,
    spot: f64,
    discount: f64,
}

/// Builds a [`VolCalibrationInfo`].
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::{Currency, Date};
/// use pillar_curves::{FlatForwardCurve, PriceCurve, PriceInterpolation};
/// use pillar_market::config::CalibrationReportConfig;
/// use pillar_vol::diagnostics::CalibrationReportBuilder;
/// use pillar_vol::surfaces::ConstantVol;
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let dc = DayCountConvention::Act365Fixed;
/// let prices = PriceCurve::new(
///     asof, Currency::USD, vec![asof, asof.add_days(4000)], vec![80.0, 80.0],
///     dc, PriceInterpolation::Linear, true,
/// ).unwrap();
/// let config = CalibrationReportConfig::default();
/// let info = CalibrationReportBuilder::new(asof, &config)
///     .build(&ConstantVol::new(asof, 0.3, dc), &prices, &FlatForwardCurve::new(asof, 0.03, dc))
///     .unwrap();
/// assert!(info.is_arbitrage_free);
/// assert_eq!(info.delta_slices.len(), config.expiries.len());
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationReportBuilder<'a> {
    asof: Date,
    config: &'a CalibrationReportConfig,
    max_quoted_expiry: Option<Date>,
}

impl<'a> CalibrationReportBuilder<'a> {
    /// Creates a builder for the grid of `config`.
    #[must_use]
    pub fn new(asof: Date, config: &'a CalibrationReportConfig) -> Self {
        Self {
            asof,
            config,
            max_quoted_expiry: None,
        }
    }

    /// Last quoted expiry of the surface. Later report expiries use forward
    /// delta and ATM delta neutral.
    #[must_use]
    pub fn with_max_quoted_expiry(mut self, expiry: Option<Date>) -> Self {
        self.max_quoted_expiry = expiry;
        self
    }

    /// Samples `surface` with forwards from `prices` and discount factors
    /// from `discount`.
    ///
    /// # Errors
    ///
    /// Fails only on a malformed report grid, such as a delta label that is
    /// not `ATM`, `<n>P` or `<n>C`. Numerical failures are recorded in the
    /// report.
    pub fn build(
        &self,
        surface: &dyn BlackVolTermStructure,
        prices: &PriceCurve,
        discount: &dyn YieldTermStructure,
    ) -> VolResult<VolCalibrationInfo> {
        let points = self
            .config
            .deltas
            .iter()
            .map(|d| d.parse::<DeltaPoint>())
            .collect::<VolResult<Vec<_>>>()?;

        let mut info = VolCalibrationInfo {
            deltas: self.config.deltas.clone(),
            moneyness: self.config.moneyness.clone(),
            is_arbitrage_free: true,
            ..VolCalibrationInfo::default()
        };

        for tenor in &self.config.expiries {
            let expiry = self.asof.add_period(*tenor, false)?;
            let t = surface.time_from_reference(expiry);
            if t <= 0.0 {
                debug!(%expiry, "report expiry not after the reference date");
                continue;
            }
            info.dates.push(expiry);
            info.times.push(t);

            let market = match self.market(expiry, t, prices, discount) {
                Ok(market) => market,
                Err(e) => {
                    fail(&mut info, format!("no market data at {expiry}: {e}"));
                    if !points.is_empty() {
                        info.delta_slices.push(invalid_slice(expiry, t, points.len()));
                    }
                    if !self.config.moneyness.is_empty() {
                        info.moneyness_slices.push(invalid_slice(expiry, t, self.config.moneyness.len()));
                    }
                    continue;
                }
            };

            if !points.is_empty() {
                let slice = self.delta_slice(surface, &market, &points, &mut info);
                info.delta_slices.push(slice);
            }
            if !self.config.moneyness.is_empty() {
                let slice = self.moneyness_slice(surface, &market, &mut info);
                info.moneyness_slices.push(slice);
            }
        }

        // calendar spreads are compared across a strike grid only
        if surface.is_strike_dependent() && !info.moneyness_slices.is_empty() {
            let normalized: Vec<Vec<f64>> = info
                .moneyness_slices
                .iter()
                .map(|s| {
                    s.call_prices
                        .iter()
                        .map(|c| c / (s.forward * s.discount))
                        .collect()
                })
                .collect();
            info.calendar_arbitrage = check_calendar(&normalized);
        }

        let slices_free = info
            .delta_slices
            .iter()
            .chain(&info.moneyness_slices)
            .all(SliceCalibration::is_arbitrage_free);
        let calendar_free = !info.calendar_arbitrage.iter().flatten().any(|f| *f);
        info.is_arbitrage_free = info.is_arbitrage_free && slices_free && calendar_free;
        debug!(
            expiries = info.dates.len(),
            arbitrage_free = info.is_arbitrage_free,
            "calibration report built"
        );
        Ok(info)
    }

    fn market(
        &self,
        expiry: Date,
        t: f64,
        prices: &PriceCurve,
        discount: &dyn YieldTermStructure,
    ) -> VolResult<SliceMarket> {
        Ok(SliceMarket {
            expiry,
            t,
            forward: prices.price(expiry)?,
            spot: prices.price(self.asof)?,
            discount: discount.discount(expiry)?,
        })
    }

    fn conventions(&self, expiry: Date) -> (DeltaVolType, AtmType) {
        match self.max_quoted_expiry {
            Some(max) if expiry > max => (DeltaVolType::Fwd, AtmType::AtmDeltaNeutral),
            _ => (self.config.delta_type, self.config.atm_type),
        }
    }

    fn delta_slice(
        &self,
        surface: &dyn BlackVolTermStructure,
        market: &SliceMarket,
        points: &[DeltaPoint],
        info: &mut VolCalibrationInfo,
    ) -> SliceCalibration {
        let (delta_type, atm_type) = self.conventions(market.expiry);
        let mut slice = SliceCalibration::empty(market.expiry, market.t, points.len());
        slice.forward = market.forward;
        slice.discount = market.discount;

        let calculator = |vol: f64| {
            BlackDeltaCalculator::new(delta_type, market.forward, market.spot, market.discount, vol, market.t)
        };
        match solve_strike(surface, market, |vol| calculator(vol)?.atm_strike(atm_type, None)) {
            Ok((strike, _)) => slice.atm_strike = strike,
            Err(e) => {
                slice.is_valid = false;
                fail(info, format!("ATM strike at {}: {e}", market.expiry));
            }
        }

        for (cell, point) in points.iter().enumerate() {
            let solved = match *point {
                DeltaPoint::Atm if slice.atm_strike.is_finite() => {
                    surface.black_vol_t(market.t, slice.atm_strike, true).map(|v| (slice.atm_strike, v))
                }
                DeltaPoint::Atm => continue,
                DeltaPoint::Put(d) => solve_strike(surface, market, |vol| {
                    calculator(vol)?.strike_from_delta(OptionType::Put, -d)
                }),
                DeltaPoint::Call(d) => solve_strike(surface, market, |vol| {
                    calculator(vol)?.strike_from_delta(OptionType::Call, d)
                }),
            };
            match solved {
                Ok((strike, vol)) => slice.record(cell, strike, vol, market),
                Err(e) => {
                    slice.is_valid = false;
                    fail(info, format!("{point} at {}: {e}", market.expiry));
                }
            }
        }
        slice.check_arbitrage();
        slice
    }

    fn moneyness_slice(
        &self,
        surface: &dyn BlackVolTermStructure,
        market: &SliceMarket,
        info: &mut VolCalibrationInfo,
    ) -> SliceCalibration {
        let levels = &self.config.moneyness;
        let mut slice = SliceCalibration::empty(market.expiry, market.t, levels.len());
        slice.forward = market.forward;
        slice.discount = market.discount;
        slice.atm_strike = market.forward;
        for (cell, level) in levels.iter().enumerate() {
            let strike = level * market.forward;
            match surface.black_vol_t(market.t, strike, true) {
                Ok(vol) => slice.record(cell, strike, vol, market),
                Err(e) => {
                    slice.is_valid = false;
                    fail(info, format!("moneyness {level} at {}: {e}", market.expiry));
                }
            }
        }
        slice.check_arbitrage();
        slice
    }
}

fn invalid_slice(expiry: Date, t: f64, cells: usize) -> SliceCalibration {
    let mut slice = SliceCalibration::empty(expiry, t, cells);
    slice.is_valid = false;
    slice
}

fn fail(info: &mut VolCalibrationInfo, message: String) {
    warn!(%message, "calibration report cell failed");
    info.is_arbitrage_free = false;
    info.messages.push(message);
}

/// Strike that is a fixed point of `strike_for_vol` under the surface's
/// smile, with its vol.
fn solve_strike<F>(surface: &dyn BlackVolTermStructure, market: &SliceMarket, strike_for_vol: F) -> VolResult<(f64, f64)>
where
    F: Fn(f64) -> VolResult<f64>,
{
    let mut strike = market.forward;
    for _ in 0..MAX_STRIKE_ITERATIONS {
        let vol = surface.black_vol_t(market.t, strike, true)?;
        let next = strike_for_vol(vol)?;
        if (next - strike).abs() <= STRIKE_TOLERANCE * strike.abs().max(1.0) {
            return Ok((next, surface.black_vol_t(market.t, next, true)?));
        }
        strike = next;
    }
    Err(VolError::strike_inversion(
        "smile",
        market.t,
        format!("strike did not converge in {MAX_STRIKE_ITERATIONS} iterations"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surfaces::{BlackVarianceCurve, ConstantVol};
    use pillar_core::daycounts::DayCountConvention;
    use pillar_market::config::CurveInterpolation;
    use pillar_core::{Currency, Period};
    use pillar_curves::{FlatForwardCurve, PriceInterpolation};

    const DC: DayCountConvention = DayCountConvention::Act365Fixed;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn prices(level: f64) -> PriceCurve {
        PriceCurve::new(
            asof(),
            Currency::USD,
            vec![asof(), asof().add_days(4000)],
            vec![level, level],
            DC,
            PriceInterpolation::Linear,
            true,
        )
        .unwrap()
    }

    fn config(deltas: &[&str], moneyness: Vec<f64>) -> CalibrationReportConfig {
        CalibrationReportConfig {
            expiries: vec![Period::years(1)],
            deltas: deltas.iter().map(|d| (*d).to_string()).collect(),
            moneyness,
            delta_type: DeltaVolType::PaFwd,
            atm_type: AtmType::AtmDeltaNeutral,
        }
    }

    #[test]
    fn test_delta_labels() {
        assert_eq!("25P".parse::<DeltaPoint>().unwrap(), DeltaPoint::Put(0.25));
        assert_eq!("atm".parse::<DeltaPoint>().unwrap(), DeltaPoint::Atm);
        assert_eq!("10C".parse::<DeltaPoint>().unwrap(), DeltaPoint::Call(0.1));
        assert!("25X".parse::<DeltaPoint>().is_err());
        assert!("C".parse::<DeltaPoint>().is_err());
        assert!("".parse::<DeltaPoint>().is_err());
    }

    #[test]
    fn test_unattainable_cell_is_recorded_not_raised() {
        let config = config(&["25P", "ATM", "25C", "95C"], vec![]);
        let surface = ConstantVol::new(asof(), 0.5, DC);
        let info = CalibrationReportBuilder::new(asof(), &config)
            .build(&surface, &prices(100.0), &FlatForwardCurve::new(asof(), 0.0, DC))
            .unwrap();

        assert!(!info.is_arbitrage_free);
        assert_eq!(info.delta_slices.len(), 1);
        let slice = &info.delta_slices[0];
        assert!(!slice.is_valid);
        assert!(slice.strikes[..3].iter().all(|k| k.is_finite()));
        assert!(slice.strikes[3].is_nan());
        assert!(slice.strikes[0] < slice.strikes[1] && slice.strikes[1] < slice.strikes[2]);
        assert_eq!(info.messages.len(), 1);
    }

    #[test]
    fn test_constant_surface_is_arbitrage_free() {
        let config = config(&["10P", "25P", "ATM", "25C", "10C"], vec![0.8, 1.0, 1.2]);
        let mut config = config;
        config.expiries = vec![Period::months(6), Period::years(1), Period::years(2)];
        let surface = ConstantVol::new(asof(), 0.3, DC);
        let info = CalibrationReportBuilder::new(asof(), &config)
            .build(&surface, &prices(80.0), &FlatForwardCurve::new(asof(), 0.02, DC))
            .unwrap();

        assert!(info.is_arbitrage_free, "{:?}", info.messages);
        assert_eq!(info.moneyness_slices.len(), 3);
        assert!(info.calendar_arbitrage.is_empty());
        let atm = &info.moneyness_slices[1];
        assert!((atm.strikes[1] - 80.0).abs() < 1e-9);
        assert!(atm.call_prices.iter().all(|p| *p > 0.0));
    }

    /// Total variance falls from 0.25 at one year to 0.08 at two years.
    fn falling_variance_curve() -> BlackVarianceCurve {
        BlackVarianceCurve::new(
            asof(),
            vec![
                asof().add_period(Period::years(1), false).unwrap(),
                asof().add_period(Period::years(2), false).unwrap(),
            ],
            vec![0.5, 0.2],
            DC,
            CurveInterpolation::Linear,
            true,
            false,
        )
        .unwrap()
    }

    /// The same term structure, reported as a strike surface.
    #[derive(Debug)]
    struct FlatSmile(BlackVarianceCurve);

    impl BlackVolTermStructure for FlatSmile {
        fn reference_date(&self) -> Date {
            self.0.reference_date()
        }

        fn day_counter(&self) -> DayCountConvention {
            self.0.day_counter()
        }

        fn max_date(&self) -> Date {
            self.0.max_date()
        }

        fn allows_extrapolation(&self) -> bool {
            self.0.allows_extrapolation()
        }

        fn black_vol_impl(&self, t: f64, strike: f64) -> VolResult<f64> {
            self.0.black_vol_impl(t, strike)
        }
    }

    fn two_year_config() -> CalibrationReportConfig {
        let mut config = config(&[], vec![0.8, 1.0, 1.2]);
        config.expiries = vec![Period::years(1), Period::years(2)];
        config
    }

    #[test]
    fn test_calendar_check_skipped_for_expiry_only_curve() {
        let curve = falling_variance_curve();
        assert!(!curve.is_strike_dependent());
        let info = CalibrationReportBuilder::new(asof(), &two_year_config())
            .build(&curve, &prices(80.0), &FlatForwardCurve::new(asof(), 0.02, DC))
            .unwrap();
        assert_eq!(info.moneyness_slices.len(), 2);
        assert!(info.calendar_arbitrage.is_empty());
        assert!(info.is_arbitrage_free, "{:?}", info.messages);
    }

    #[test]
    fn test_calendar_check_flags_strike_surface() {
        let surface = FlatSmile(falling_variance_curve());
        let info = CalibrationReportBuilder::new(asof(), &two_year_config())
            .build(&surface, &prices(80.0), &FlatForwardCurve::new(asof(), 0.02, DC))
            .unwrap();
        assert_eq!(info.calendar_arbitrage.len(), 2);
        assert!(info.calendar_arbitrage[0].iter().all(|f| !*f));
        assert!(info.calendar_arbitrage[1].iter().all(|f| *f));
        assert!(!info.is_arbitrage_free);
    }

    #[test]
    fn test_conventions_switch_past_last_quoted_expiry() {
        let config = config(&["ATM"], vec![]);
        let builder = CalibrationReportBuilder::new(asof(), &config).with_max_quoted_expiry(Some(asof().add_days(30)));
        assert_eq!(
            builder.conventions(asof().add_days(365)),
            (DeltaVolType::Fwd, AtmType::AtmDeltaNeutral)
        );
        assert_eq!(builder.conventions(asof().add_days(10)), (DeltaVolType::PaFwd, AtmType::AtmDeltaNeutral));
    }
}

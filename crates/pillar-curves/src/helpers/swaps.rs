//! Single-currency swap helpers.

use pillar_market::config::PillarChoice;

use super::legs::{FixedLeg, FloatLeg, LegDates};
use super::{CurveHandle, HelperDates, RateHelper};
use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// Helper dates spanning `first` and the `rest` of the legs.
pub(crate) fn span(first: &LegDates, rest: &[&LegDates], choice: PillarChoice) -> HelperDates {
    let (earliest, maturity, latest) = rest.iter().fold(
        (first.start(), first.end(), first.last_payment()),
        |(e, m, l), leg| (e.min(leg.start()), m.max(leg.end()), l.max(leg.last_payment())),
    );
    HelperDates::new(earliest, maturity, latest, choice)
}

fn ratio(numerator: f64, denominator: f64, what: &str) -> CurveResult<f64> {
    if denominator.abs() < f64::EPSILON {
        return Err(CurveError::invalid_data(format!("zero {what} annuity")));
    }
    Ok(numerator / denominator)
}

/// Fair fixed rate of a fixed versus float swap.
fn fair_rate(
    fixed: &FixedLeg,
    float: &FloatLeg,
    projection: &dyn YieldTermStructure,
    discount: &dyn YieldTermStructure,
) -> CurveResult<f64> {
    ratio(float.pv(projection, discount)?, fixed.annuity(discount)?, "fixed leg")
}

macro_rules! helper_accessors {
    () => {
        fn quote_name(&self) -> &str {
            &self.quote_name
        }

        fn quote(&self) -> f64 {
            self.quote
        }

        fn dates(&self) -> &HelperDates {
            &self.dates
        }
    };
}

// =============================================================================
// OIS AND VANILLA SWAPS
// =============================================================================

/// Fixed versus compounded overnight, quoted as the fair fixed rate.
#[derive(Debug, Clone)]
pub struct OisHelper {
    quote_name: String,
    quote: f64,
    fixed: FixedLeg,
    overnight: FloatLeg,
    projection: CurveHandle,
    discount: CurveHandle,
    dates: HelperDates,
}

impl OisHelper {
    /// Creates the helper; the overnight leg compounds over the fixed periods.
    #[must_use]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        fixed: FixedLeg,
        overnight: FloatLeg,
        projection: CurveHandle,
        discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(fixed.dates(), &[overnight.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            fixed,
            overnight,
            projection,
            discount,
            dates,
        }
    }
}

impl RateHelper for OisHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        fair_rate(
            &self.fixed,
            &self.overnight,
            self.projection.resolve(curve),
            self.discount.resolve(curve),
        )
    }
}

/// Fixed versus Ibor, quoted as the fair fixed rate.
#[derive(Debug, Clone)]
pub struct SwapHelper {
    quote_name: String,
    quote: f64,
    fixed: FixedLeg,
    float: FloatLeg,
    projection: CurveHandle,
    discount: CurveHandle,
    dates: HelperDates,
}

impl SwapHelper {
    /// Creates the helper.
    #[must_use]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        fixed: FixedLeg,
        float: FloatLeg,
        projection: CurveHandle,
        discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(fixed.dates(), &[float.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            fixed,
            float,
            projection,
            discount,
            dates,
        }
    }
}

impl RateHelper for SwapHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        fair_rate(
            &self.fixed,
            &self.float,
            self.projection.resolve(curve),
            self.discount.resolve(curve),
        )
    }
}

/// Fixed versus averaged overnight plus a quoted spread.
///
/// The market quote is the fixed rate; the spread on the overnight leg
/// comes from its own quote.
#[derive(Debug, Clone)]
pub struct AverageOisHelper {
    quote_name: String,
    quote: f64,
    spread: f64,
    fixed: FixedLeg,
    overnight: FloatLeg,
    projection: CurveHandle,
    discount: CurveHandle,
    dates: HelperDates,
}

impl AverageOisHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        spread: f64,
        fixed: FixedLeg,
        overnight: FloatLeg,
        projection: CurveHandle,
        discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(fixed.dates(), &[overnight.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            spread,
            fixed,
            overnight,
            projection,
            discount,
            dates,
        }
    }

    /// Spread paid over the averaged overnight rate.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.spread
    }
}

impl RateHelper for AverageOisHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let projection = self.projection.resolve(curve);
        let discount = self.discount.resolve(curve);
        let overnight = self.overnight.averaged_pv(projection, discount)?
            + self.spread * self.overnight.annuity(discount)?;
        ratio(overnight, self.fixed.annuity(discount)?, "fixed leg")
    }
}

// =============================================================================
// BASIS SWAPS
// =============================================================================

/// Ibor versus Ibor of another tenor, quoted as a spread on one leg.
#[derive(Debug, Clone)]
pub struct TenorBasisHelper {
    quote_name: String,
    quote: f64,
    long: FloatLeg,
    short: FloatLeg,
    long_projection: CurveHandle,
    short_projection: CurveHandle,
    discount: CurveHandle,
    spread_on_short: bool,
    dates: HelperDates,
}

impl TenorBasisHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        long: FloatLeg,
        short: FloatLeg,
        long_projection: CurveHandle,
        short_projection: CurveHandle,
        discount: CurveHandle,
        spread_on_short: bool,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(long.dates(), &[short.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            long,
            short,
            long_projection,
            short_projection,
            discount,
            spread_on_short,
            dates,
        }
    }
}

impl RateHelper for TenorBasisHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let long = self.long.pv(self.long_projection.resolve(curve), discount)?;
        let short = self.short.pv(self.short_projection.resolve(curve), discount)?;
        if self.spread_on_short {
            ratio(long - short, self.short.annuity(discount)?, "short leg")
        } else {
            ratio(short - long, self.long.annuity(discount)?, "long leg")
        }
    }
}

/// Tenor basis quoted as the difference of two vanilla swap rates.
#[derive(Debug, Clone)]
pub struct TenorBasisTwoHelper {
    quote_name: String,
    quote: f64,
    long: (FixedLeg, FloatLeg),
    short: (FixedLeg, FloatLeg),
    long_projection: CurveHandle,
    short_projection: CurveHandle,
    discount: CurveHandle,
    long_minus_short: bool,
    dates: HelperDates,
}

impl TenorBasisTwoHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        long: (FixedLeg, FloatLeg),
        short: (FixedLeg, FloatLeg),
        long_projection: CurveHandle,
        short_projection: CurveHandle,
        discount: CurveHandle,
        long_minus_short: bool,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(
            long.0.dates(),
            &[long.1.dates(), short.0.dates(), short.1.dates()],
            choice,
        );
        Self {
            quote_name: quote_name.into(),
            quote,
            long,
            short,
            long_projection,
            short_projection,
            discount,
            long_minus_short,
            dates,
        }
    }
}

impl RateHelper for TenorBasisTwoHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let long = fair_rate(&self.long.0, &self.long.1, self.long_projection.resolve(curve), discount)?;
        let short = fair_rate(&self.short.0, &self.short.1, self.short_projection.resolve(curve), discount)?;
        Ok(if self.long_minus_short {
            long - short
        } else {
            short - long
        })
    }
}

/// BMA leg against a fraction of Libor, quoted as the fraction.
///
/// The curve built is the BMA projection curve.
#[derive(Debug, Clone)]
pub struct BmaRatioHelper {
    quote_name: String,
    quote: f64,
    bma: FloatLeg,
    libor: FloatLeg,
    bma_projection: CurveHandle,
    libor_projection: CurveHandle,
    discount: CurveHandle,
    dates: HelperDates,
}

impl BmaRatioHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        bma: FloatLeg,
        libor: FloatLeg,
        bma_projection: CurveHandle,
        libor_projection: CurveHandle,
        discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(bma.dates(), &[libor.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            bma,
            libor,
            bma_projection,
            libor_projection,
            discount,
            dates,
        }
    }
}

impl RateHelper for BmaRatioHelper {
    helper_accessors!();

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let bma = self.bma.pv(self.bma_projection.resolve(curve), discount)?;
        let libor = self.libor.pv(self.libor_projection.resolve(curve), discount)?;
        ratio(bma, libor, "libor leg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::FlatForwardCurve;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, MarketCalendar};
    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::{Date, Period};
    use std::sync::Arc;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn leg_dates(tenor: Period) -> LegDates {
        LegDates::generate(
            asof(),
            Date::from_ymd(2029, 1, 15).unwrap(),
            tenor,
            &MarketCalendar::Null,
            BusinessDayConvention::Unadjusted,
            false,
            0,
        )
        .unwrap()
    }

    fn flat(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForwardCurve::new(asof(), rate, DayCountConvention::Act365Fixed))
    }

    #[test]
    fn test_ois_fair_rate_single_curve() {
        let curve = flat(0.03);
        let fixed = FixedLeg::new(leg_dates(Period::years(1)), DayCountConvention::Act360);
        let overnight = FloatLeg::new(leg_dates(Period::years(1)), DayCountConvention::Act360);
        let helper = OisHelper::new(
            "IR_SWAP/RATE/EUR/2D/1D/5Y",
            0.03,
            fixed.clone(),
            overnight,
            CurveHandle::Own,
            CurveHandle::Own,
            PillarChoice::LastRelevantDate,
        );
        let implied = helper.implied_quote(curve.as_ref()).unwrap();
        let end = Date::from_ymd(2029, 1, 15).unwrap();
        let expected = (1.0 - curve.discount(end).unwrap()) / fixed.annuity(curve.as_ref()).unwrap();
        assert_relative_eq!(implied, expected, epsilon = 1e-14);
        assert_eq!(helper.pillar_date(), end);
    }

    #[test]
    fn test_tenor_basis_zero_when_projections_agree() {
        let curve = flat(0.025);
        let helper = TenorBasisHelper::new(
            "BASIS_SWAP/BASIS_SPREAD/6M/3M/EUR/5Y",
            0.0,
            FloatLeg::new(leg_dates(Period::months(6)), DayCountConvention::Act360),
            FloatLeg::new(leg_dates(Period::months(3)), DayCountConvention::Act360),
            CurveHandle::Own,
            CurveHandle::Own,
            CurveHandle::Own,
            true,
            PillarChoice::LastRelevantDate,
        );
        assert!(helper.implied_quote(curve.as_ref()).unwrap().abs() < 1e-14);
    }

    #[test]
    fn test_tenor_basis_sign_follows_spread_leg() {
        let own = flat(0.02);
        let long: Arc<dyn YieldTermStructure> = flat(0.03);
        let make = |spread_on_short| {
            TenorBasisHelper::new(
                "BASIS_SWAP/BASIS_SPREAD/6M/3M/EUR/5Y",
                0.0,
                FloatLeg::new(leg_dates(Period::months(6)), DayCountConvention::Act360),
                FloatLeg::new(leg_dates(Period::months(3)), DayCountConvention::Act360),
                CurveHandle::External(long.clone()),
                CurveHandle::Own,
                CurveHandle::Own,
                spread_on_short,
                PillarChoice::LastRelevantDate,
            )
        };
        // the short leg projects lower rates, so it needs a positive spread
        assert!(make(true).implied_quote(own.as_ref()).unwrap() > 0.0);
        assert!(make(false).implied_quote(own.as_ref()).unwrap() < 0.0);
    }

    #[test]
    fn test_bma_ratio() {
        let own = flat(0.02);
        let libor = flat(0.03);
        let helper = BmaRatioHelper::new(
            "BMA_SWAP/RATIO/USD/3M/5Y",
            0.7,
            FloatLeg::new(leg_dates(Period::months(3)), DayCountConvention::ActActIsda),
            FloatLeg::new(leg_dates(Period::months(3)), DayCountConvention::Act360),
            CurveHandle::Own,
            CurveHandle::External(libor),
            CurveHandle::Own,
            PillarChoice::LastRelevantDate,
        );
        let r = helper.implied_quote(own.as_ref()).unwrap();
        assert!(r > 0.6 && r < 0.7, "ratio {r}");
    }

    #[test]
    fn test_average_ois_spread_shifts_rate() {
        let curve = flat(0.03);
        let make = |spread| {
            AverageOisHelper::new(
                "IR_SWAP/RATE/USD/2D/1D/5Y",
                0.03,
                spread,
                FixedLeg::new(leg_dates(Period::years(1)), DayCountConvention::Act360),
                FloatLeg::new(leg_dates(Period::months(3)), DayCountConvention::Act360),
                CurveHandle::Own,
                CurveHandle::Own,
                PillarChoice::LastRelevantDate,
            )
        };
        let base = make(0.0).implied_quote(curve.as_ref()).unwrap();
        let shifted = make(0.001).implied_quote(curve.as_ref()).unwrap();
        assert_relative_eq!(base, 0.03, epsilon = 1e-3);
        assert!(shifted > base);
        assert_eq!(make(0.001).spread(), 0.001);
    }
}

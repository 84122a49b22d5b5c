//! FX forward and cross-currency swap helpers.
//!
//! Each helper refers to one discount curve per currency. The curve being
//! built plays the role of the currency the configuration is for, and every
//! other curve is an external dependency.

use pillar_core::Date;
use pillar_market::config::PillarChoice;

use super::legs::{discount_at, FixedLeg, FloatLeg};
use super::swaps::span;
use super::{CurveHandle, HelperDates, RateHelper};
use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// FX forward quoted in points, `(F - S) · points_factor`.
///
/// Spot is quoted as units of the second currency per unit of the first.
#[derive(Debug, Clone)]
pub struct FxForwardHelper {
    quote_name: String,
    points: f64,
    spot: f64,
    points_factor: f64,
    spot_date: Date,
    unit_discount: CurveHandle,
    quoted_discount: CurveHandle,
    dates: HelperDates,
}

impl FxForwardHelper {
    /// Creates the helper for an outright settling on `maturity`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        points: f64,
        spot: f64,
        points_factor: f64,
        spot_date: Date,
        maturity: Date,
        unit_discount: CurveHandle,
        quoted_discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        Self {
            quote_name: quote_name.into(),
            points,
            spot,
            points_factor,
            spot_date,
            unit_discount,
            quoted_discount,
            dates: HelperDates::new(spot_date.min(maturity), maturity, maturity, choice),
        }
    }

    /// Outright forward implied by the quote.
    #[must_use]
    pub fn outright(&self) -> f64 {
        self.spot + self.points / self.points_factor
    }

    /// FX spot rate.
    #[must_use]
    pub fn spot(&self) -> f64 {
        self.spot
    }
}

impl RateHelper for FxForwardHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.points
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let unit = self.unit_discount.resolve(curve);
        let quoted = self.quoted_discount.resolve(curve);
        let maturity = self.dates.maturity;
        let unit_growth = discount_at(unit, maturity)? / discount_at(unit, self.spot_date)?;
        let quoted_growth = discount_at(quoted, maturity)? / discount_at(quoted, self.spot_date)?;
        if quoted_growth <= 0.0 {
            return Err(CurveError::invalid_data(format!(
                "non-positive discount ratio for {}",
                self.quote_name
            )));
        }
        let forward = self.spot * unit_growth / quoted_growth;
        Ok((forward - self.spot) * self.points_factor)
    }
}

/// Value per unit notional of a float leg with notional exchanges.
fn leg_with_exchange(
    leg: &FloatLeg,
    projection: &dyn YieldTermStructure,
    discount: &dyn YieldTermStructure,
) -> CurveResult<f64> {
    Ok(leg.pv(projection, discount)? + leg.notional_exchange(discount)?)
}

/// Float versus float in two currencies, quoted as a spread on one leg.
///
/// Both legs exchange notionals at start and maturity, sized at spot so
/// the legs are worth the same per unit of notional.
#[derive(Debug, Clone)]
pub struct CrossCcyBasisHelper {
    quote_name: String,
    quote: f64,
    flat: FloatLeg,
    spread: FloatLeg,
    flat_projection: CurveHandle,
    flat_discount: CurveHandle,
    spread_projection: CurveHandle,
    spread_discount: CurveHandle,
    dates: HelperDates,
}

impl CrossCcyBasisHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        flat: FloatLeg,
        spread: FloatLeg,
        flat_projection: CurveHandle,
        flat_discount: CurveHandle,
        spread_projection: CurveHandle,
        spread_discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(flat.dates(), &[spread.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            flat,
            spread,
            flat_projection,
            flat_discount,
            spread_projection,
            spread_discount,
            dates,
        }
    }
}

impl RateHelper for CrossCcyBasisHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.quote
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let flat = leg_with_exchange(
            &self.flat,
            self.flat_projection.resolve(curve),
            self.flat_discount.resolve(curve),
        )?;
        let spread_discount = self.spread_discount.resolve(curve);
        let spread = leg_with_exchange(&self.spread, self.spread_projection.resolve(curve), spread_discount)?;
        let annuity = self.spread.annuity(spread_discount)?;
        if annuity.abs() < f64::EPSILON {
            return Err(CurveError::invalid_data("zero spread leg annuity"));
        }
        Ok((flat - spread) / annuity)
    }
}

/// Fixed in one currency against float in another, quoted as the fixed rate.
///
/// The float leg has unit notional and the fixed leg notional `spot`, the
/// price of one unit of the float currency in the fixed currency.
#[derive(Debug, Clone)]
pub struct CrossCcyFixFloatHelper {
    quote_name: String,
    quote: f64,
    spot: f64,
    fixed: FixedLeg,
    float: FloatLeg,
    fixed_discount: CurveHandle,
    float_projection: CurveHandle,
    float_discount: CurveHandle,
    dates: HelperDates,
}

impl CrossCcyFixFloatHelper {
    /// Creates the helper.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote_name: impl Into<String>,
        quote: f64,
        spot: f64,
        fixed: FixedLeg,
        float: FloatLeg,
        fixed_discount: CurveHandle,
        float_projection: CurveHandle,
        float_discount: CurveHandle,
        choice: PillarChoice,
    ) -> Self {
        let dates = span(fixed.dates(), &[float.dates()], choice);
        Self {
            quote_name: quote_name.into(),
            quote,
            spot,
            fixed,
            float,
            fixed_discount,
            float_projection,
            float_discount,
            dates,
        }
    }

    /// Spot in fixed currency per unit of float currency.
    #[must_use]
    pub fn spot(&self) -> f64 {
        self.spot
    }
}

impl RateHelper for CrossCcyFixFloatHelper {
    fn quote_name(&self) -> &str {
        &self.quote_name
    }

    fn quote(&self) -> f64 {
        self.quote
    }

    fn dates(&self) -> &HelperDates {
        &self.dates
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let float = leg_with_exchange(
            &self.float,
            self.float_projection.resolve(curve),
            self.float_discount.resolve(curve),
        )?;
        let fixed_discount = self.fixed_discount.resolve(curve);
        let notional = self.spot;
        let annuity = notional * self.fixed.annuity(fixed_discount)?;
        if annuity.abs() < f64::EPSILON {
            return Err(CurveError::invalid_data("zero fixed leg annuity"));
        }
        let exchange = discount_at(fixed_discount, self.fixed.dates().start())?
            - discount_at(fixed_discount, self.fixed.dates().last_payment())?;
        Ok((self.spot * float + notional * exchange) / annuity)
    }
}

//! Curves interpolated over pillar nodes.
//!
//! An [`InterpolatedCurve`] holds one value per pillar date, interpreted as a
//! discount factor, a continuously compounded zero rate or an instantaneous
//! forward rate, and interpolates it in time with one of the configured
//! methods. Beyond the last pillar the instantaneous forward is held flat,
//! whatever the interpolated variable.

use std::fmt;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::{InterpolationMethod, InterpolationVariable};
use pillar_math::interpolation::{
    BackwardFlatInterpolator, BoundaryCondition, CubicInterpolator, DerivativeApprox,
    Interpolator, LinearInterpolator, LogInterpolator, MixedInterpolator, MonotoneConvex,
    QuadraticInterpolator,
};
use pillar_math::MathResult;

use crate::error::{CurveError, CurveResult};
use crate::term_structure::YieldTermStructure;

/// How node values are interpolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationSpec {
    /// Interpolation method.
    pub method: InterpolationMethod,
    /// Interpolated quantity.
    pub variable: InterpolationVariable,
    /// Day count of curve times.
    pub day_counter: DayCountConvention,
    /// Number of pillars after the reference date handled by the short end of
    /// mixed methods.
    pub mixed_size: usize,
    /// Allow evaluation past the last pillar.
    pub extrapolation: bool,
}

impl InterpolationSpec {
    /// Creates a spec with no mixed cutoff and extrapolation on.
    #[must_use]
    pub fn new(
        method: InterpolationMethod,
        variable: InterpolationVariable,
        day_counter: DayCountConvention,
    ) -> Self {
        Self {
            method,
            variable,
            day_counter,
            mixed_size: 1,
            extrapolation: true,
        }
    }

    /// Sets the mixed cutoff.
    #[must_use]
    pub fn with_mixed_size(mut self, mixed_size: usize) -> Self {
        self.mixed_size = mixed_size;
        self
    }

    /// Sets the extrapolation flag.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self
    }
}

/// Interpolant over the node values.
enum Shape {
    /// Node values interpolated directly.
    Plain(Box<dyn Interpolator>),
    /// Hagan-West forwards; discount factors come from the forward integral.
    ConvexMonotone(MonotoneConvex),
}

/// A yield curve interpolated over (time, value) nodes.
///
/// The first node sits at the reference date. For the zero and forward
/// variables its value carries no information and is set equal to the
/// second node's value by the builders.
///
/// # Example
///
/// ```rust
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::Date;
/// use pillar_curves::curves::{InterpolatedCurve, InterpolationSpec};
/// use pillar_curves::YieldTermStructure;
/// use pillar_market::config::{InterpolationMethod, InterpolationVariable};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let dates = vec![asof, asof.add_days(365), asof.add_days(730)];
/// let spec = InterpolationSpec::new(
///     InterpolationMethod::LogLinear,
///     InterpolationVariable::Discount,
///     DayCountConvention::Act365Fixed,
/// );
/// let curve = InterpolatedCurve::new(asof, dates, vec![1.0, 0.97, 0.94], spec).unwrap();
/// assert_eq!(curve.discount(asof).unwrap(), 1.0);
/// assert!((curve.discount(asof.add_days(365)).unwrap() - 0.97).abs() < 1e-14);
/// ```
pub struct InterpolatedCurve {
    reference_date: Date,
    dates: Vec<Date>,
    times: Vec<f64>,
    values: Vec<f64>,
    spec: InterpolationSpec,
    shape: Shape,
}

impl fmt::Debug for InterpolatedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatedCurve")
            .field("reference_date", &self.reference_date)
            .field("dates", &self.dates)
            .field("values", &self.values)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl InterpolatedCurve {
    /// Builds a curve from pillar dates and node values.
    ///
    /// # Errors
    ///
    /// Fails when the first date is not the reference date, the dates are
    /// not strictly increasing, fewer than two nodes are given, the method is
    /// a fitting method, or the interpolator rejects the values.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        values: Vec<f64>,
        spec: InterpolationSpec,
    ) -> CurveResult<Self> {
        if dates.len() != values.len() {
            return Err(CurveError::invalid_data(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if dates.len() < 2 {
            return Err(CurveError::invalid_data(
                "an interpolated curve needs at least two nodes",
            ));
        }
        if dates[0] != reference_date {
            return Err(CurveError::invalid_data(format!(
                "first node {} must be the reference date {}",
                dates[0], reference_date
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CurveError::invalid_data(format!(
                "pillar dates must be strictly increasing: {} then {}",
                w[0], w[1]
            )));
        }
        let times: Vec<f64> = dates
            .iter()
            .map(|d| spec.day_counter.year_fraction(reference_date, *d))
            .collect();
        if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CurveError::invalid_data(format!(
                "curve times must be strictly increasing: {} then {}",
                w[0], w[1]
            )));
        }
        let shape = build_shape(&spec, &times, &values)?;
        Ok(Self {
            reference_date,
            dates,
            times,
            values,
            spec,
            shape,
        })
    }

    /// Pillar dates, starting with the reference date.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Pillar times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Node values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Interpolation settings.
    #[must_use]
    pub fn spec(&self) -> &InterpolationSpec {
        &self.spec
    }

    /// Discount factor inside the node range.
    fn discount_in_range(&self, t: f64) -> MathResult<f64> {
        match &self.shape {
            Shape::ConvexMonotone(mc) => Ok((-mc.primitive(t)?).exp()),
            Shape::Plain(interp) => match self.spec.variable {
                InterpolationVariable::Discount => interp.interpolate(t),
                InterpolationVariable::Zero => Ok((-interp.interpolate(t)? * t).exp()),
                InterpolationVariable::Forward => Ok((-interp.primitive(t)?).exp()),
            },
        }
    }

    /// Instantaneous forward inside the node range.
    fn forward_in_range(&self, t: f64) -> MathResult<f64> {
        match &self.shape {
            Shape::ConvexMonotone(mc) => mc.interpolate(t),
            Shape::Plain(interp) => match self.spec.variable {
                InterpolationVariable::Discount => {
                    Ok(-interp.derivative(t)? / interp.interpolate(t)?)
                }
                InterpolationVariable::Zero => {
                    Ok(interp.interpolate(t)? + t * interp.derivative(t)?)
                }
                InterpolationVariable::Forward => interp.interpolate(t),
            },
        }
    }
}

impl YieldTermStructure for InterpolatedCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.spec.day_counter
    }

    fn max_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    fn allows_extrapolation(&self) -> bool {
        self.spec.extrapolation
    }

    fn max_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let t_max = self.max_time();
        if t <= t_max {
            return Ok(self.discount_in_range(t)?);
        }
        let df_max = self.discount_in_range(t_max)?;
        let f_max = self.forward_in_range(t_max)?;
        Ok(df_max * (-f_max * (t - t_max)).exp())
    }
}

fn build_shape(spec: &InterpolationSpec, times: &[f64], values: &[f64]) -> CurveResult<Shape> {
    if spec.method.is_fitting_method() {
        return Err(CurveError::invalid_data(format!(
            "{:?} is a fitting method and cannot interpolate pillar nodes",
            spec.method
        )));
    }
    if spec.method == InterpolationMethod::ConvexMonotone {
        let forwards = discrete_forwards(spec.variable, times, values)?;
        let mc = MonotoneConvex::new(times.to_vec(), forwards)?.with_extrapolation();
        return Ok(Shape::ConvexMonotone(mc));
    }
    let interp = plain_interpolator(spec.method, spec.mixed_size, times.to_vec(), values.to_vec())?;
    Ok(Shape::Plain(interp))
}

/// Average forwards between nodes implied by the node values.
fn discrete_forwards(
    variable: InterpolationVariable,
    times: &[f64],
    values: &[f64],
) -> CurveResult<Vec<f64>> {
    let mut forwards = Vec::with_capacity(times.len() - 1);
    for i in 1..times.len() {
        let dt = times[i] - times[i - 1];
        let fd = match variable {
            InterpolationVariable::Discount => {
                if values[i] <= 0.0 || values[i - 1] <= 0.0 {
                    return Err(CurveError::invalid_data(format!(
                        "non-positive discount factor {} at node {i}",
                        values[i].min(values[i - 1])
                    )));
                }
                (values[i - 1] / values[i]).ln() / dt
            }
            InterpolationVariable::Zero => {
                (values[i] * times[i] - values[i - 1] * times[i - 1]) / dt
            }
            InterpolationVariable::Forward => values[i],
        };
        forwards.push(fd);
    }
    Ok(forwards)
}

/// Builds the interpolator for every method but monotone convex.
fn plain_interpolator(
    method: InterpolationMethod,
    mixed_size: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
) -> CurveResult<Box<dyn Interpolator>> {
    use InterpolationMethod as M;
    let interp: Box<dyn Interpolator> = match method {
        M::Linear => Box::new(LinearInterpolator::new(xs, ys)?.with_extrapolation()),
        M::LogLinear => Box::new(LogInterpolator::log_linear(xs, ys)?.with_extrapolation()),
        M::NaturalCubic => Box::new(
            CubicInterpolator::new(
                xs,
                ys,
                DerivativeApprox::Kruger,
                true,
                BoundaryCondition::SecondDerivative(0.0),
                BoundaryCondition::SecondDerivative(0.0),
            )?
            .with_extrapolation(),
        ),
        M::FinancialCubic => Box::new(
            CubicInterpolator::new(
                xs,
                ys,
                DerivativeApprox::Kruger,
                true,
                BoundaryCondition::SecondDerivative(0.0),
                BoundaryCondition::FirstDerivative(0.0),
            )?
            .with_extrapolation(),
        ),
        M::Quadratic => Box::new(QuadraticInterpolator::new(xs, ys)?.with_extrapolation()),
        M::LogQuadratic => Box::new(LogInterpolator::log_quadratic(xs, ys)?.with_extrapolation()),
        M::Hermite => Box::new(CubicInterpolator::hermite(xs, ys)?.with_extrapolation()),
        M::CubicSpline => Box::new(CubicInterpolator::natural_spline(xs, ys)?.with_extrapolation()),
        M::BackwardFlat => Box::new(BackwardFlatInterpolator::new(xs, ys)?.with_extrapolation()),
        M::DefaultLogMixedLinearCubic
        | M::MonotonicLogMixedLinearCubic
        | M::KrugerLogMixedLinearCubic
        | M::LogMixedLinearCubicNaturalSpline => {
            let (approx, monotonic) = match method {
                M::MonotonicLogMixedLinearCubic => (DerivativeApprox::Spline, true),
                M::KrugerLogMixedLinearCubic => (DerivativeApprox::Kruger, false),
                _ => (DerivativeApprox::Spline, false),
            };
            let short = LogInterpolator::log_linear(xs.clone(), ys.clone())?.with_extrapolation();
            let long = LogInterpolator::new(xs.clone(), &ys, |x, y| {
                Ok(Box::new(
                    CubicInterpolator::new(
                        x,
                        y,
                        approx,
                        monotonic,
                        BoundaryCondition::SecondDerivative(0.0),
                        BoundaryCondition::SecondDerivative(0.0),
                    )?
                    .with_extrapolation(),
                ))
            })?
            .with_extrapolation();
            Box::new(
                MixedInterpolator::new(xs, mixed_size + 1, Box::new(short), Box::new(long))?
                    .with_extrapolation(),
            )
        }
        M::ConvexMonotone | M::ExponentialSplines | M::NelsonSiegel | M::Svensson => {
            return Err(CurveError::invalid_data(format!(
                "{method:?} has no plain interpolator"
            )))
        }
    };
    Ok(interp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn dates() -> Vec<Date> {
        [0, 182, 365, 730, 1826, 3652]
            .iter()
            .map(|d| asof().add_days(*d))
            .collect()
    }

    fn zero_rates() -> Vec<f64> {
        vec![0.030, 0.030, 0.032, 0.034, 0.036, 0.037]
    }

    fn discount_factors() -> Vec<f64> {
        let dc = DayCountConvention::Act365Fixed;
        dates()
            .iter()
            .zip(zero_rates())
            .map(|(d, z)| (-z * dc.year_fraction(asof(), *d)).exp())
            .collect()
    }

    fn spec(method: InterpolationMethod, variable: InterpolationVariable) -> InterpolationSpec {
        InterpolationSpec::new(method, variable, DayCountConvention::Act365Fixed).with_mixed_size(2)
    }

    const METHODS: [InterpolationMethod; 14] = [
        InterpolationMethod::Linear,
        InterpolationMethod::LogLinear,
        InterpolationMethod::NaturalCubic,
        InterpolationMethod::FinancialCubic,
        InterpolationMethod::ConvexMonotone,
        InterpolationMethod::Quadratic,
        InterpolationMethod::LogQuadratic,
        InterpolationMethod::Hermite,
        InterpolationMethod::CubicSpline,
        InterpolationMethod::DefaultLogMixedLinearCubic,
        InterpolationMethod::MonotonicLogMixedLinearCubic,
        InterpolationMethod::KrugerLogMixedLinearCubic,
        InterpolationMethod::LogMixedLinearCubicNaturalSpline,
        InterpolationMethod::BackwardFlat,
    ];

    #[test]
    fn test_discount_variable_reprices_nodes_for_every_method() {
        for method in METHODS {
            let curve = InterpolatedCurve::new(
                asof(),
                dates(),
                discount_factors(),
                spec(method, InterpolationVariable::Discount),
            )
            .unwrap();
            assert_eq!(curve.discount(asof()).unwrap(), 1.0, "{method:?}");
            for (d, df) in dates().iter().zip(discount_factors()) {
                assert_relative_eq!(curve.discount(*d).unwrap(), df, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_variable_reprices_nodes_for_every_method() {
        for method in METHODS {
            let curve = InterpolatedCurve::new(
                asof(),
                dates(),
                zero_rates(),
                spec(method, InterpolationVariable::Zero),
            )
            .unwrap();
            for (d, df) in dates().iter().zip(discount_factors()) {
                assert_relative_eq!(curve.discount(*d).unwrap(), df, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_flat_forward_variable_for_every_method() {
        for method in METHODS {
            let curve = InterpolatedCurve::new(
                asof(),
                dates(),
                vec![0.03; 6],
                spec(method, InterpolationVariable::Forward),
            )
            .unwrap();
            for days in [0, 90, 182, 500, 1826, 3000, 3652] {
                let d = asof().add_days(days);
                let t = curve.time_from_reference(d);
                assert_relative_eq!(curve.discount(d).unwrap(), (-0.03 * t).exp(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_log_mixed_switches_at_mixed_size_node() {
        let d = dates();
        let log_linear = InterpolatedCurve::new(
            asof(),
            d.clone(),
            discount_factors(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
        )
        .unwrap();
        for method in [
            InterpolationMethod::DefaultLogMixedLinearCubic,
            InterpolationMethod::MonotonicLogMixedLinearCubic,
            InterpolationMethod::KrugerLogMixedLinearCubic,
            InterpolationMethod::LogMixedLinearCubicNaturalSpline,
        ] {
            for mixed_size in [1, 2] {
                let mixed = InterpolatedCurve::new(
                    asof(),
                    d.clone(),
                    discount_factors(),
                    spec(method, InterpolationVariable::Discount).with_mixed_size(mixed_size),
                )
                .unwrap();
                // log-linear on every segment before dates[mixed_size], log-cubic after
                for days in [100, 300, 500, 1000] {
                    let date = asof().add_days(days);
                    let short = date < d[mixed_size];
                    let gap = (mixed.discount(date).unwrap() - log_linear.discount(date).unwrap()).abs();
                    if short {
                        assert!(gap < 1e-15, "{method:?}/{mixed_size} at {days}: {gap:e}");
                    } else {
                        assert!(gap > 1e-5, "{method:?}/{mixed_size} at {days}: {gap:e}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_forward_variable_integrates_forwards() {
        let d = dates();
        let curve = InterpolatedCurve::new(
            asof(),
            d.clone(),
            vec![0.03; 6],
            spec(InterpolationMethod::Linear, InterpolationVariable::Forward),
        )
        .unwrap();
        let t = curve.time_from_reference(d[3]);
        assert_relative_eq!(curve.discount(d[3]).unwrap(), (-0.03 * t).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_flat_forward_extrapolation() {
        let curve = InterpolatedCurve::new(
            asof(),
            dates(),
            discount_factors(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
        )
        .unwrap();
        let t_max = curve.max_time();
        let f_last = curve.instantaneous_forward(t_max - 0.01).unwrap();
        let df_max = curve.discount_t(t_max, false).unwrap();
        let df = curve.discount_t(t_max + 2.0, false).unwrap();
        assert_relative_eq!(df, df_max * (-f_last * 2.0).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_extrapolation_flag() {
        let curve = InterpolatedCurve::new(
            asof(),
            dates(),
            discount_factors(),
            spec(InterpolationMethod::Linear, InterpolationVariable::Discount).with_extrapolation(false),
        )
        .unwrap();
        assert!(matches!(
            curve.discount(asof().add_days(4000)),
            Err(CurveError::Extrapolation { .. })
        ));
        assert!(curve.discount_t(11.0, true).is_ok());
    }

    #[test]
    fn test_rejects_bad_nodes() {
        let mut d = dates();
        d.swap(2, 3);
        assert!(InterpolatedCurve::new(
            asof(),
            d,
            discount_factors(),
            spec(InterpolationMethod::Linear, InterpolationVariable::Discount)
        )
        .is_err());
        assert!(InterpolatedCurve::new(
            asof(),
            dates(),
            discount_factors(),
            spec(InterpolationMethod::NelsonSiegel, InterpolationVariable::Discount)
        )
        .is_err());
    }
}

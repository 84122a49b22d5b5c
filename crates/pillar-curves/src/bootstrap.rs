//! Iterative bootstrap of an interpolated curve from rate helpers.
//!
//! Helpers are sorted by pillar date and solved one node at a time: the
//! node at each pillar is moved until its helper reprices, with every
//! earlier node held fixed. Discount nodes are searched in continuously
//! compounded rate space. Zero and forward nodes are searched directly,
//! or through their logarithm when the method interpolates logarithms, so
//! trial values of log methods stay positive. Each bracket is expanded
//! until it holds a sign change before the root finder runs.
//!
//! Methods whose interpolant is not local ([`InterpolationMethod::is_global`])
//! change earlier segments when a later node moves, so the whole sweep is
//! repeated until no node moves by more than the global accuracy.
//!
//! [`InterpolationMethod::is_global`]: pillar_market::config::InterpolationMethod::is_global

use std::cell::RefCell;
use std::fmt;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;
use pillar_market::config::{BootstrapConfig, InterpolationVariable};
use pillar_math::solvers::{brent, expand_bracket, SolverConfig};
use tracing::{debug, warn};

use crate::curves::{InterpolatedCurve, InterpolationSpec};
use crate::error::{CurveError, CurveResult};
use crate::helpers::SharedHelper;
use crate::term_structure::YieldTermStructure;

/// Rate used to start the search at the first pillar.
const INITIAL_RATE_GUESS: f64 = 0.02;

/// Half width of the first bracket around the guess, in rate units.
const INITIAL_HALF_WIDTH: f64 = 0.05;

/// Half width of the first bracket when searching the logarithm of the
/// node value: the value may halve or double.
const INITIAL_LOG_HALF_WIDTH: f64 = std::f64::consts::LN_2;

/// Bracket expansions before an attempt gives up.
const MAX_BRACKET_EXPANSIONS: u32 = 20;

/// Root finder iterations per bracket.
const MAX_SOLVER_ITERATIONS: u32 = 100;

/// Root tolerance as a fraction of the configured accuracy, so that
/// re-solving a settled node moves it by less than the global accuracy.
const ROOT_TOLERANCE_RATIO: f64 = 0.01;

/// Outer passes for global interpolation methods.
const MAX_GLOBAL_PASSES: u32 = 100;

// =============================================================================
// SEARCH COORDINATE
// =============================================================================

/// Coordinate the root finder moves for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchSpace {
    /// Continuously compounded rate of a discount factor.
    DiscountRate,
    /// The node value itself.
    Value,
    /// Natural logarithm of a node value that must stay positive.
    LogValue,
}

impl SearchSpace {
    fn of(spec: &InterpolationSpec) -> Self {
        match spec.variable {
            InterpolationVariable::Discount => Self::DiscountRate,
            InterpolationVariable::Zero | InterpolationVariable::Forward if spec.method.is_log() => {
                Self::LogValue
            }
            InterpolationVariable::Zero | InterpolationVariable::Forward => Self::Value,
        }
    }

    fn half_width(self) -> f64 {
        match self {
            Self::DiscountRate | Self::Value => INITIAL_HALF_WIDTH,
            Self::LogValue => INITIAL_LOG_HALF_WIDTH,
        }
    }

    /// Node value at coordinate `x` for a node at time `t`.
    fn value(self, x: f64, t: f64) -> f64 {
        match self {
            Self::DiscountRate => (-x * t).exp(),
            Self::Value => x,
            Self::LogValue => x.exp(),
        }
    }

    /// Coordinate of node value `value` at time `t`.
    fn coordinate(self, value: f64, t: f64) -> f64 {
        match self {
            Self::DiscountRate => -value.ln() / t,
            Self::Value => value,
            Self::LogValue => value.ln(),
        }
    }

    /// Coordinate of the starting rate guess.
    fn initial_guess(self) -> f64 {
        match self {
            Self::DiscountRate | Self::Value => INITIAL_RATE_GUESS,
            Self::LogValue => INITIAL_RATE_GUESS.ln(),
        }
    }
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// Result of a bootstrap run.
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// The bootstrapped curve.
    pub curve: InterpolatedCurve,
    /// Helpers in pillar order.
    pub helpers: Vec<SharedHelper>,
    /// Sweeps over all pillars.
    pub passes: u32,
    /// Largest node change of the last sweep; zero for local methods.
    pub last_change: f64,
}

/// Iterative bootstrapper.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pillar_core::daycounts::DayCountConvention;
/// use pillar_core::Date;
/// use pillar_curves::bootstrap::IterativeBootstrap;
/// use pillar_curves::curves::InterpolationSpec;
/// use pillar_curves::helpers::{DepositHelper, SharedHelper};
/// use pillar_curves::YieldTermStructure;
/// use pillar_market::config::{BootstrapConfig, InterpolationMethod, InterpolationVariable, PillarChoice};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let helpers: Vec<SharedHelper> = [(90, 0.040), (180, 0.042), (360, 0.045)]
///     .into_iter()
///     .map(|(days, rate)| {
///         let end = asof.add_days(days);
///         Arc::new(DepositHelper::new(
///             format!("MM/RATE/USD/0D/{days}D"),
///             rate,
///             asof,
///             end,
///             DayCountConvention::Act360,
///             PillarChoice::LastRelevantDate,
///         )) as SharedHelper
///     })
///     .collect();
/// let spec = InterpolationSpec::new(
///     InterpolationMethod::LogLinear,
///     InterpolationVariable::Discount,
///     DayCountConvention::Act365Fixed,
/// );
/// let outcome = IterativeBootstrap::new(asof, spec, BootstrapConfig::default())
///     .run(&helpers)
///     .unwrap();
/// for helper in &outcome.helpers {
///     assert!(helper.quote_error(&outcome.curve).unwrap().abs() < 1e-10);
/// }
/// ```
#[derive(Clone)]
pub struct IterativeBootstrap {
    reference_date: Date,
    spec: InterpolationSpec,
    config: BootstrapConfig,
}

impl fmt::Debug for IterativeBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterativeBootstrap")
            .field("reference_date", &self.reference_date)
            .field("method", &self.spec.method)
            .field("variable", &self.spec.variable)
            .finish_non_exhaustive()
    }
}

/// One sweep's view of the nodes.
struct Nodes<'a> {
    dates: &'a [Date],
    times: &'a [f64],
}

impl IterativeBootstrap {
    /// Creates a bootstrapper for curves anchored at `reference_date`.
    #[must_use]
    pub fn new(reference_date: Date, spec: InterpolationSpec, config: BootstrapConfig) -> Self {
        Self {
            reference_date,
            spec,
            config,
        }
    }

    /// Replaces the numerical settings.
    #[must_use]
    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Interpolation settings of the curves produced.
    #[must_use]
    pub fn spec(&self) -> &InterpolationSpec {
        &self.spec
    }

    /// Solves one node per helper.
    ///
    /// # Errors
    ///
    /// Fails when there are no helpers, two helpers share a pillar, a
    /// pillar is not after the reference date, a pillar cannot be solved
    /// (unless `dont_throw` is set) or the global sweeps do not settle.
    pub fn run(&self, helpers: &[SharedHelper]) -> CurveResult<BootstrapOutcome> {
        if helpers.is_empty() {
            return Err(CurveError::invalid_data("no instruments to bootstrap"));
        }
        let mut helpers = helpers.to_vec();
        helpers.sort_by_key(|h| h.pillar_date());
        self.check_pillars(&helpers)?;

        let day_counter = self.spec.day_counter;
        let mut dates = Vec::with_capacity(helpers.len() + 1);
        dates.push(self.reference_date);
        dates.extend(helpers.iter().map(|h| h.pillar_date()));
        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction(self.reference_date, *d))
            .collect();
        if let Some(i) = (1..times.len()).find(|&i| times[i] <= times[i - 1]) {
            return Err(CurveError::invalid_data(format!(
                "pillar {} maps to a non-increasing curve time under {day_counter:?}",
                dates[i]
            )));
        }

        let variable = self.spec.variable;
        let space = SearchSpace::of(&self.spec);
        let mut values: Vec<f64> = times
            .iter()
            .map(|t| space.value(space.initial_guess(), *t))
            .collect();
        let nodes = Nodes {
            dates: &dates,
            times: &times,
        };

        let global = self.spec.method.is_global() && helpers.len() > 1;
        let global_accuracy = self.config.effective_global_accuracy();
        let mut passes = 0;
        let mut last_change = 0.0;
        loop {
            let previous = values.clone();
            for i in 1..dates.len() {
                let value = self.solve_node(i, passes, &helpers[i - 1], &nodes, &values)?;
                values[i] = value;
                if i == 1 && variable != InterpolationVariable::Discount {
                    values[0] = value;
                }
            }
            passes += 1;
            if !global {
                break;
            }
            last_change = values
                .iter()
                .zip(&previous)
                .skip(1)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            debug!(pass = passes, change = last_change, "global bootstrap pass");
            if last_change <= global_accuracy {
                break;
            }
            if passes >= MAX_GLOBAL_PASSES {
                if self.config.dont_throw {
                    warn!(
                        passes,
                        change = last_change,
                        accuracy = global_accuracy,
                        "global bootstrap did not settle, keeping last pass"
                    );
                    break;
                }
                return Err(CurveError::GlobalConvergence {
                    iterations: passes,
                    change: last_change,
                    accuracy: global_accuracy,
                });
            }
        }

        let curve = InterpolatedCurve::new(self.reference_date, dates, values, self.spec)?;
        Ok(BootstrapOutcome {
            curve,
            helpers,
            passes,
            last_change,
        })
    }

    fn check_pillars(&self, helpers: &[SharedHelper]) -> CurveResult<()> {
        if let Some(h) = helpers.iter().find(|h| h.pillar_date() <= self.reference_date) {
            return Err(CurveError::invalid_data(format!(
                "pillar {} of {} is not after the reference date {}",
                h.pillar_date(),
                h.quote_name(),
                self.reference_date
            )));
        }
        if let Some(w) = helpers
            .windows(2)
            .find(|w| w[0].pillar_date() == w[1].pillar_date())
        {
            return Err(CurveError::invalid_data(format!(
                "more than one instrument with pillar {}: {} and {}",
                w[0].pillar_date(),
                w[0].quote_name(),
                w[1].quote_name()
            )));
        }
        Ok(())
    }

    /// Finds the node value at `i` repricing `helper`.
    ///
    /// On the first sweep the trial curve ends at node `i`; later sweeps use
    /// every node with the values of the previous sweep.
    fn solve_node(
        &self,
        i: usize,
        pass: u32,
        helper: &SharedHelper,
        nodes: &Nodes<'_>,
        values: &[f64],
    ) -> CurveResult<f64> {
        let variable = self.spec.variable;
        let space = SearchSpace::of(&self.spec);
        let t = nodes.times[i];
        let end = if pass == 0 { i + 1 } else { nodes.dates.len() };
        let guess = if pass > 0 {
            space.coordinate(values[i], t)
        } else if i > 1 {
            space.coordinate(values[i - 1], nodes.times[i - 1])
        } else {
            space.initial_guess()
        };
        let trial_spec = self.spec.with_extrapolation(true);

        let failure: RefCell<Option<String>> = RefCell::new(None);
        let mut objective = |x: f64| -> f64 {
            let mut trial = values[..end].to_vec();
            trial[i] = space.value(x, t);
            if i == 1 && variable != InterpolationVariable::Discount {
                trial[0] = trial[1];
            }
            let error = InterpolatedCurve::new(
                self.reference_date,
                nodes.dates[..end].to_vec(),
                trial,
                trial_spec,
            )
            .and_then(|curve| helper.quote_error(&curve));
            match error {
                Ok(e) => e,
                Err(e) => {
                    *failure.borrow_mut() = Some(e.to_string());
                    f64::NAN
                }
            }
        };

        let solver = SolverConfig::new(
            self.config.accuracy * ROOT_TOLERANCE_RATIO,
            MAX_SOLVER_ITERATIONS,
        );
        let mut below = space.half_width();
        let mut above = space.half_width();
        let mut reason = String::new();
        for attempt in 1..=self.config.max_attempts {
            let (lo, hi) = (guess - below, guess + above);
            let solved = expand_bracket(&mut objective, lo, hi, MAX_BRACKET_EXPANSIONS)
                .and_then(|(a, b, _, _)| brent(&mut objective, a, b, &solver));
            match solved {
                Ok(result) => {
                    debug!(
                        pillar = %helper.pillar_date(),
                        quote = helper.quote_name(),
                        attempt,
                        iterations = result.iterations,
                        "pillar solved"
                    );
                    return Ok(space.value(result.root, t));
                }
                Err(e) => {
                    reason = failure.borrow_mut().take().unwrap_or_else(|| e.to_string());
                    debug!(
                        pillar = %helper.pillar_date(),
                        attempt,
                        lo,
                        hi,
                        error = %reason,
                        "bracket failed, widening"
                    );
                    below *= self.config.min_factor;
                    above *= self.config.max_factor;
                }
            }
        }

        if self.config.dont_throw {
            let (lo, hi) = (guess - below, guess + above);
            let steps = self.config.dont_throw_steps.max(1);
            let best = (0..=steps)
                .map(|k| lo + (hi - lo) * f64::from(k) / f64::from(steps))
                .map(|x| (x, objective(x)))
                .filter(|(_, e)| e.is_finite())
                .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));
            if let Some((x, error)) = best {
                warn!(
                    pillar = %helper.pillar_date(),
                    quote = helper.quote_name(),
                    error,
                    reason = %reason,
                    "pillar not solved, using best grid value"
                );
                return Ok(space.value(x, t));
            }
        }

        Err(CurveError::BootstrapFailed {
            pillar_index: i,
            maturity: helper.maturity_date(),
            pillar: helper.pillar_date(),
            attempts: self.config.max_attempts,
            reason,
        })
    }
}

// =============================================================================
// PIECEWISE CURVE
// =============================================================================

/// A bootstrapped curve that keeps its helpers.
///
/// The helpers can report the quotes implied by the curve; [`rebake`]
/// detaches the nodes into a plain [`InterpolatedCurve`].
///
/// [`rebake`]: PiecewiseYieldCurve::rebake
#[derive(Debug)]
pub struct PiecewiseYieldCurve {
    curve: InterpolatedCurve,
    helpers: Vec<SharedHelper>,
    passes: u32,
}

impl PiecewiseYieldCurve {
    /// Bootstraps the curve.
    ///
    /// # Errors
    ///
    /// Propagates [`IterativeBootstrap::run`] failures.
    pub fn bootstrap(
        reference_date: Date,
        helpers: &[SharedHelper],
        spec: InterpolationSpec,
        config: BootstrapConfig,
    ) -> CurveResult<Self> {
        let outcome = IterativeBootstrap::new(reference_date, spec, config).run(helpers)?;
        Ok(Self::from(outcome))
    }

    /// Helpers in pillar order.
    #[must_use]
    pub fn helpers(&self) -> &[SharedHelper] {
        &self.helpers
    }

    /// Bootstrapped nodes.
    #[must_use]
    pub fn nodes(&self) -> &InterpolatedCurve {
        &self.curve
    }

    /// Sweeps the bootstrap needed.
    #[must_use]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Quote implied by the curve for each helper, in pillar order.
    pub fn implied_quotes(&self) -> CurveResult<Vec<f64>> {
        self.helpers
            .iter()
            .map(|h| h.implied_quote(&self.curve))
            .collect()
    }

    /// A quote-independent copy of the curve.
    ///
    /// Node values are sampled from the curve at every pillar in the
    /// interpolated variable and interpolated with the same method.
    pub fn rebake(&self) -> CurveResult<InterpolatedCurve> {
        let spec = *self.curve.spec();
        let dates = self.curve.dates().to_vec();
        let times = self.curve.times();
        let values = match spec.variable {
            InterpolationVariable::Discount => dates
                .iter()
                .map(|d| self.curve.discount(*d))
                .collect::<CurveResult<Vec<_>>>()?,
            InterpolationVariable::Zero => {
                let mut zeros = Vec::with_capacity(dates.len());
                zeros.push(0.0);
                for t in &times[1..] {
                    zeros.push(-self.curve.discount_t(*t, false)?.ln() / t);
                }
                zeros[0] = zeros[1];
                zeros
            }
            InterpolationVariable::Forward => self.curve.values().to_vec(),
        };
        InterpolatedCurve::new(self.curve.reference_date(), dates, values, spec)
    }
}

impl From<BootstrapOutcome> for PiecewiseYieldCurve {
    fn from(outcome: BootstrapOutcome) -> Self {
        Self {
            curve: outcome.curve,
            helpers: outcome.helpers,
            passes: outcome.passes,
        }
    }
}

impl YieldTermStructure for PiecewiseYieldCurve {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{DepositHelper, RateHelper};
    use approx::assert_relative_eq;
    use pillar_market::config::{InterpolationMethod, PillarChoice};
    use std::sync::Arc;

    fn asof() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn deposits(quotes: &[(i64, f64)]) -> Vec<SharedHelper> {
        quotes
            .iter()
            .map(|(days, rate)| {
                Arc::new(DepositHelper::new(
                    format!("MM/RATE/USD/0D/{days}D"),
                    *rate,
                    asof(),
                    asof().add_days(*days),
                    DayCountConvention::Act360,
                    PillarChoice::LastRelevantDate,
                )) as SharedHelper
            })
            .collect()
    }

    fn strip() -> Vec<SharedHelper> {
        deposits(&[
            (30, 0.0400),
            (91, 0.0410),
            (182, 0.0425),
            (365, 0.0440),
            (730, 0.0455),
            (1095, 0.0460),
            (1825, 0.0470),
        ])
    }

    fn spec(method: InterpolationMethod, variable: InterpolationVariable) -> InterpolationSpec {
        InterpolationSpec::new(method, variable, DayCountConvention::Act365Fixed)
    }

    fn assert_reprices(outcome: &BootstrapOutcome, tolerance: f64) {
        for helper in &outcome.helpers {
            let error = helper.quote_error(&outcome.curve).unwrap();
            assert!(
                error.abs() < tolerance,
                "{} misprices by {error:e}",
                helper.description()
            );
        }
    }

    const ALL_METHODS: [InterpolationMethod; 14] = [
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

    const ALL_VARIABLES: [InterpolationVariable; 3] = [
        InterpolationVariable::Discount,
        InterpolationVariable::Zero,
        InterpolationVariable::Forward,
    ];

    /// Deposits quoted off a flat 4% continuously compounded curve.
    fn flat_strip() -> Vec<SharedHelper> {
        let quotes: Vec<(i64, f64)> = [30, 91, 182, 365, 730, 1095, 1825]
            .into_iter()
            .map(|days: i64| {
                let t = days as f64 / 365.0;
                (days, ((0.04 * t).exp() - 1.0) * 360.0 / days as f64)
            })
            .collect();
        deposits(&quotes)
    }

    fn bootstrap(
        method: InterpolationMethod,
        variable: InterpolationVariable,
        helpers: &[SharedHelper],
    ) -> BootstrapOutcome {
        IterativeBootstrap::new(asof(), spec(method, variable), BootstrapConfig::default())
            .run(helpers)
            .unwrap_or_else(|e| panic!("{method:?}/{variable:?}: {e}"))
    }

    #[test]
    fn test_every_method_and_variable_reprices_flat_curve() {
        for method in ALL_METHODS {
            for variable in ALL_VARIABLES {
                let outcome = bootstrap(method, variable, &flat_strip());
                assert_reprices(&outcome, 1e-9);
                assert_eq!(outcome.curve.discount(asof()).unwrap(), 1.0);
                let d = asof().add_days(1825);
                assert_relative_eq!(
                    outcome.curve.discount(d).unwrap(),
                    (-0.04 * 5.0_f64).exp(),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_every_method_and_variable_reprices_upward_strip() {
        for method in ALL_METHODS {
            for variable in ALL_VARIABLES {
                // C1 log-quadratic forwards double any mismatch at each
                // pillar and blow up on a seven-pillar strip
                if method == InterpolationMethod::LogQuadratic
                    && variable == InterpolationVariable::Forward
                {
                    continue;
                }
                let outcome = bootstrap(method, variable, &strip());
                assert_reprices(&outcome, 1e-9);
                assert_eq!(outcome.curve.discount(asof()).unwrap(), 1.0);
            }
        }
    }

    #[test]
    fn test_log_methods_keep_zero_and_forward_nodes_positive() {
        for method in ALL_METHODS.into_iter().filter(InterpolationMethod::is_log) {
            for variable in [InterpolationVariable::Zero, InterpolationVariable::Forward] {
                let helpers = if method == InterpolationMethod::LogQuadratic
                    && variable == InterpolationVariable::Forward
                {
                    flat_strip()
                } else {
                    strip()
                };
                let outcome = bootstrap(method, variable, &helpers);
                assert_reprices(&outcome, 1e-9);
                assert!(outcome.curve.values().iter().all(|v| *v > 0.0));
            }
        }
    }

    #[test]
    fn test_quadratic_forward_root_far_from_guess() {
        // the quadratic forward nodes oscillate well beyond any rate-sized
        // bracket around the previous node
        let outcome = bootstrap(
            InterpolationMethod::Quadratic,
            InterpolationVariable::Forward,
            &strip(),
        );
        assert_reprices(&outcome, 1e-9);
        assert_eq!(outcome.passes, 1);
        let lowest = outcome.curve.values().iter().copied().fold(f64::INFINITY, f64::min);
        assert!(lowest < -1.0, "lowest node {lowest}");
    }

    #[test]
    fn test_short_log_quadratic_forward_strip() {
        let outcome = bootstrap(
            InterpolationMethod::LogQuadratic,
            InterpolationVariable::Forward,
            &strip()[..5],
        );
        assert_reprices(&outcome, 1e-9);
    }

    #[test]
    fn test_local_method_needs_one_pass() {
        let outcome = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
            BootstrapConfig::default(),
        )
        .run(&strip())
        .unwrap();
        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.curve.dates().len(), 8);
    }

    #[test]
    fn test_global_method_iterates() {
        let outcome = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::NaturalCubic, InterpolationVariable::Zero),
            BootstrapConfig::default(),
        )
        .run(&strip())
        .unwrap();
        assert!(outcome.passes > 1);
        assert!(outcome.last_change <= 1e-12);
    }

    #[test]
    fn test_unsorted_helpers_are_sorted() {
        let mut helpers = strip();
        helpers.reverse();
        let outcome = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::Linear, InterpolationVariable::Zero),
            BootstrapConfig::default(),
        )
        .run(&helpers)
        .unwrap();
        let pillars: Vec<Date> = outcome.helpers.iter().map(|h| h.pillar_date()).collect();
        assert!(pillars.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_duplicate_pillar_rejected() {
        let helpers = deposits(&[(91, 0.04), (91, 0.041)]);
        let err = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
            BootstrapConfig::default(),
        )
        .run(&helpers)
        .unwrap_err();
        assert!(err.to_string().contains("more than one instrument"));
    }

    #[test]
    fn test_unreachable_quote_fails_with_pillar() {
        // no discount factor reprices a deposit at -500%
        let helpers = deposits(&[(91, 0.04), (182, -5.0)]);
        let config = BootstrapConfig {
            max_attempts: 2,
            ..BootstrapConfig::default()
        };
        let err = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
            config,
        )
        .run(&helpers)
        .unwrap_err();
        match err {
            CurveError::BootstrapFailed {
                pillar_index,
                attempts,
                pillar,
                ..
            } => {
                assert_eq!(pillar_index, 2);
                assert_eq!(attempts, 2);
                assert_eq!(pillar, asof().add_days(182));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_dont_throw_keeps_best_value() {
        let helpers = deposits(&[(91, 0.04), (182, -5.0)]);
        let config = BootstrapConfig {
            max_attempts: 2,
            ..BootstrapConfig::default()
        }
        .with_dont_throw(true);
        let outcome = IterativeBootstrap::new(
            asof(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
            config,
        )
        .run(&helpers)
        .unwrap();
        assert_eq!(outcome.curve.dates().len(), 3);
        assert!(outcome.helpers[0].quote_error(&outcome.curve).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_rebake_matches_live_curve() {
        for variable in [
            InterpolationVariable::Discount,
            InterpolationVariable::Zero,
            InterpolationVariable::Forward,
        ] {
            let live = PiecewiseYieldCurve::bootstrap(
                asof(),
                &strip(),
                spec(InterpolationMethod::Linear, variable),
                BootstrapConfig::default(),
            )
            .unwrap();
            let baked = live.rebake().unwrap();
            for days in [0, 15, 30, 200, 365, 1000, 1825, 2500] {
                let d = asof().add_days(days);
                assert_relative_eq!(
                    live.discount(d).unwrap(),
                    baked.discount(d).unwrap(),
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn test_implied_quotes_match_market() {
        let live = PiecewiseYieldCurve::bootstrap(
            asof(),
            &strip(),
            spec(InterpolationMethod::LogLinear, InterpolationVariable::Discount),
            BootstrapConfig::default(),
        )
        .unwrap();
        let implied = live.implied_quotes().unwrap();
        for (helper, quote) in live.helpers().iter().zip(implied) {
            assert_relative_eq!(helper.quote(), quote, epsilon = 1e-10);
        }
    }
}

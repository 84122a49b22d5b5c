//! Derivative-free optimization.
//!
//! Used for the parametric fitted-bond curves, where the objective is a
//! sum of squared price errors with no convenient analytic gradient.

use nalgebra::DVector;

use crate::error::{MathError, MathResult};

/// Tuning constants for the Nelder-Mead simplex search.
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    /// Maximum number of simplex iterations.
    pub max_iterations: u32,
    /// Relative size of the initial simplex around the starting point.
    pub initial_step: f64,
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Stop when both the value spread and the simplex size fall below this.
    pub tolerance: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 240,
            initial_step: 0.08,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            tolerance: 1e-7,
        }
    }
}

impl NelderMeadOptions {
    /// Sets the iteration limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the initial simplex step.
    #[must_use]
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameters found.
    pub parameters: Vec<f64>,
    /// Final objective function value.
    pub objective_value: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// Minimizes `objective` with the Nelder-Mead downhill simplex method.
///
/// Non-finite objective values are treated as `+inf`, so the simplex moves
/// away from regions where the objective is undefined. Hitting the
/// iteration limit is not an error: the best vertex is returned with
/// `converged == false` and callers decide whether it is good enough.
///
/// # Example
///
/// ```rust
/// use pillar_math::optimization::{nelder_mead, NelderMeadOptions};
///
/// let result = nelder_mead(
///     |p| (p[0] - 1.0).powi(2) + (p[1] + 2.0).powi(2),
///     &[0.0, 0.0],
///     &NelderMeadOptions::default().with_max_iterations(1000).with_tolerance(1e-10),
/// )
/// .unwrap();
/// assert!((result.parameters[0] - 1.0).abs() < 1e-4);
/// ```
pub fn nelder_mead<F>(
    mut objective: F,
    initial: &[f64],
    options: &NelderMeadOptions,
) -> MathResult<OptimizationResult>
where
    F: FnMut(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        return Err(MathError::invalid_input("Nelder-Mead needs at least one parameter"));
    }
    if initial.iter().any(|x| !x.is_finite()) {
        return Err(MathError::invalid_input("Nelder-Mead starting point must be finite"));
    }

    let mut eval = |x: &DVector<f64>| {
        let value = objective(x.as_slice());
        if value.is_finite() {
            value
        } else {
            f64::INFINITY
        }
    };

    let x0 = DVector::from_column_slice(initial);
    let mut simplex = Vec::with_capacity(dim + 1);
    let mut values = Vec::with_capacity(dim + 1);
    values.push(eval(&x0));
    simplex.push(x0.clone());

    let step = options.initial_step.max(1e-4);
    for d in 0..dim {
        let mut x = x0.clone();
        x[d] += if x0[d].abs() > 1e-8 { step * x0[d].abs() } else { step };
        values.push(eval(&x));
        simplex.push(x);
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let centroid = simplex.iter().take(dim).fold(DVector::zeros(dim), |acc, x| acc + x)
            / dim as f64;

        let spread = (values[dim] - values[0]).abs();
        let size = simplex
            .iter()
            .map(|x| (x - &centroid).norm())
            .fold(0.0_f64, f64::max);
        if spread <= options.tolerance && size <= options.tolerance {
            converged = true;
            break;
        }

        let reflected = &centroid + (&centroid - &simplex[dim]) * options.reflection;
        let fr = eval(&reflected);

        if fr < values[0] {
            let expanded = &centroid + (&reflected - &centroid) * options.expansion;
            let fe = eval(&expanded);
            if fe < fr {
                simplex[dim] = expanded;
                values[dim] = fe;
            } else {
                simplex[dim] = reflected;
                values[dim] = fr;
            }
            continue;
        }

        if fr < values[dim - 1] || (dim == 1 && fr < values[dim]) {
            simplex[dim] = reflected;
            values[dim] = fr;
            continue;
        }

        let contracted = &centroid + (&simplex[dim] - &centroid) * options.contraction;
        let fc = eval(&contracted);
        if fc < values[dim] {
            simplex[dim] = contracted;
            values[dim] = fc;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=dim {
            simplex[i] = &best + (&simplex[i] - &best) * options.shrink;
            values[i] = eval(&simplex[i]);
        }
    }

    let (best, objective_value) = simplex
        .iter()
        .zip(values.iter())
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(x, v)| (x.as_slice().to_vec(), *v))
        .ok_or_else(|| MathError::invalid_input("empty simplex"))?;

    Ok(OptimizationResult {
        parameters: best,
        objective_value,
        iterations,
        converged,
    })
}

//! Correlation term structures used by proxy surfaces.

use std::fmt;

use pillar_math::interpolation::{Interpolator, LinearInterpolator};

use crate::error::{VolError, VolResult};

/// Correlation between two underlyings as a function of time.
pub trait CorrelationTermStructure: Send + Sync + fmt::Debug {
    /// Correlation at time `t`, in `[-1, 1]`.
    fn correlation(&self, t: f64) -> VolResult<f64>;
}

fn check_correlation(rho: f64) -> VolResult<f64> {
    if !(rho.is_finite() && (-1.0..=1.0).contains(&rho)) {
        return Err(VolError::invalid_data(format!(
            "correlation {rho} is outside [-1, 1]"
        )));
    }
    Ok(rho)
}

/// The same correlation at every time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCorrelation {
    rho: f64,
}

impl FlatCorrelation {
    /// Creates a flat correlation.
    ///
    /// # Errors
    ///
    /// Fails outside `[-1, 1]`.
    pub fn new(rho: f64) -> VolResult<Self> {
        Ok(Self {
            rho: check_correlation(rho)?,
        })
    }
}

impl CorrelationTermStructure for FlatCorrelation {
    fn correlation(&self, _t: f64) -> VolResult<f64> {
        Ok(self.rho)
    }
}

/// Correlations at increasing times, linear in between and flat outside.
#[derive(Debug)]
pub struct InterpolatedCorrelation {
    times: Vec<f64>,
    values: Vec<f64>,
    interpolator: Option<LinearInterpolator>,
}

impl InterpolatedCorrelation {
    /// Creates a curve through `(time, correlation)` nodes.
    ///
    /// # Errors
    ///
    /// Fails on empty or unsorted nodes and on values outside `[-1, 1]`.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> VolResult<Self> {
        if times.is_empty() || times.len() != values.len() {
            return Err(VolError::invalid_data(
                "correlation curve needs matching non-empty times and values",
            ));
        }
        for rho in &values {
            check_correlation(*rho)?;
        }
        let interpolator = if times.len() > 1 {
            Some(LinearInterpolator::new(times.clone(), values.clone())?)
        } else {
            None
        };
        Ok(Self {
            times,
            values,
            interpolator,
        })
    }
}

impl CorrelationTermStructure for InterpolatedCorrelation {
    fn correlation(&self, t: f64) -> VolResult<f64> {
        let Some(interpolator) = &self.interpolator else {
            return Ok(self.values[0]);
        };
        let t = t.clamp(self.times[0], self.times[self.times.len() - 1]);
        Ok(interpolator.interpolate(t)?)
    }
}

//! Smile sections and time slicing shared by the grid surfaces.

use pillar_market::config::SmileInterpolation;
use pillar_math::interpolation::{CubicInterpolator, Interpolator, LinearInterpolator};

use crate::error::{VolError, VolResult};

/// Builds an extrapolating interpolator for one smile.
pub(crate) fn smile_interpolator(
    method: SmileInterpolation,
    xs: Vec<f64>,
    ys: Vec<f64>,
) -> VolResult<Box<dyn Interpolator>> {
    let interpolator: Box<dyn Interpolator> = match method {
        SmileInterpolation::Linear => Box::new(LinearInterpolator::new(xs, ys)?.with_extrapolation()),
        SmileInterpolation::NaturalCubic => {
            Box::new(CubicInterpolator::natural_spline(xs, ys)?.with_extrapolation())
        }
        SmileInterpolation::FinancialCubic => {
            Box::new(CubicInterpolator::kruger(xs, ys, true)?.with_extrapolation())
        }
        SmileInterpolation::CubicSpline if xs.len() >= 4 => {
            Box::new(CubicInterpolator::not_a_knot(xs, ys)?.with_extrapolation())
        }
        SmileInterpolation::CubicSpline => {
            Box::new(CubicInterpolator::natural_spline(xs, ys)?.with_extrapolation())
        }
    };
    Ok(interpolator)
}

/// One expiry's values across strikes or moneyness levels.
///
/// A single node is a constant smile. Interpolated values are floored at
/// zero.
#[derive(Debug)]
pub(crate) struct Smile {
    xs: Vec<f64>,
    ys: Vec<f64>,
    interpolator: Option<Box<dyn Interpolator>>,
    flat: bool,
}

impl Smile {
    pub(crate) fn new(method: SmileInterpolation, xs: Vec<f64>, ys: Vec<f64>, flat: bool) -> VolResult<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(VolError::invalid_data(format!(
                "smile needs matching non-empty nodes, got {} levels and {} values",
                xs.len(),
                ys.len()
            )));
        }
        let interpolator = if xs.len() == 1 {
            None
        } else {
            Some(smile_interpolator(method, xs.clone(), ys.clone())?)
        };
        Ok(Self {
            xs,
            ys,
            interpolator,
            flat,
        })
    }

    pub(crate) fn value(&self, x: f64) -> VolResult<f64> {
        let Some(interpolator) = &self.interpolator else {
            return Ok(self.ys[0]);
        };
        let x = if self.flat {
            x.clamp(self.min_x(), self.max_x())
        } else {
            x
        };
        Ok(interpolator.interpolate(x)?.max(0.0))
    }

    pub(crate) fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub(crate) fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub(crate) fn min_x(&self) -> f64 {
        self.xs[0]
    }

    pub(crate) fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

/// Whether smile values are total variances or volatilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SliceValue {
    Variance,
    Vol,
}

/// Smiles at increasing option times, linear in total variance across
/// time and flat in volatility outside the quoted times.
#[derive(Debug)]
pub(crate) struct SmileSlices {
    times: Vec<f64>,
    smiles: Vec<Smile>,
    value: SliceValue,
}

impl SmileSlices {
    pub(crate) fn new(times: Vec<f64>, smiles: Vec<Smile>, value: SliceValue) -> VolResult<Self> {
        if times.is_empty() || times.len() != smiles.len() {
            return Err(VolError::invalid_data("surface needs one smile per expiry"));
        }
        if times[0] <= 0.0 {
            return Err(VolError::invalid_data(format!(
                "first expiry time {} must be positive",
                times[0]
            )));
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(VolError::invalid_data("expiry times must be strictly increasing"));
        }
        Ok(Self { times, smiles, value })
    }

    pub(crate) fn times(&self) -> &[f64] {
        &self.times
    }

    pub(crate) fn smiles(&self) -> &[Smile] {
        &self.smiles
    }

    fn slice_variance(&self, i: usize, x: f64) -> VolResult<f64> {
        let y = self.smiles[i].value(x)?;
        Ok(match self.value {
            SliceValue::Variance => y,
            SliceValue::Vol => y * y * self.times[i],
        })
    }

    /// Total variance at time `t`.
    pub(crate) fn variance(&self, t: f64, x: f64) -> VolResult<f64> {
        let n = self.times.len();
        if t <= self.times[0] {
            return Ok(self.slice_variance(0, x)? / self.times[0] * t);
        }
        if t >= self.times[n - 1] {
            return Ok(self.slice_variance(n - 1, x)? / self.times[n - 1] * t);
        }
        let i = interval(&self.times, t);
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let v0 = self.slice_variance(i, x)?;
        let v1 = self.slice_variance(i + 1, x)?;
        Ok(v0 + (v1 - v0) * (t - t0) / (t1 - t0))
    }

    /// Volatility at time `t`, the first slice's for `t <= 0`.
    pub(crate) fn vol(&self, t: f64, x: f64) -> VolResult<f64> {
        let t = if t <= 0.0 { self.times[0] } else { t };
        Ok((self.variance(t, x)? / t).max(0.0).sqrt())
    }
}

/// Index `i` with `xs[i] <= x < xs[i + 1]`, clamped to `[0, n - 2]`.
pub(crate) fn interval(xs: &[f64], x: f64) -> usize {
    let n = xs.len();
    if n < 2 || x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    xs.partition_point(|&v| v <= x) - 1
}

//! Mixed interpolation: one scheme on the short end, another beyond.

use crate::error::{MathError, MathResult};
use crate::interpolation::{check_range, Interpolator};

/// Uses `short` left of the switch node and `long` from it onwards.
///
/// Both interpolators are built over the full node set, so they agree at
/// every node and the combined function is continuous at the switch.
#[derive(Debug)]
pub struct MixedInterpolator {
    xs: Vec<f64>,
    switch_x: f64,
    short: Box<dyn Interpolator>,
    long: Box<dyn Interpolator>,
    allow_extrapolation: bool,
}

impl MixedInterpolator {
    /// Combines two interpolators built over `xs`.
    ///
    /// `switch_index` is the number of leading nodes handled by `short`;
    /// it is clamped to `[1, xs.len()]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the two interpolators do not span `xs`.
    pub fn new(
        xs: Vec<f64>,
        switch_index: usize,
        short: Box<dyn Interpolator>,
        long: Box<dyn Interpolator>,
    ) -> MathResult<Self> {
        if xs.len() < 2 {
            return Err(MathError::insufficient_data(2, xs.len()));
        }
        let (min, max) = (xs[0], xs[xs.len() - 1]);
        for interp in [&short, &long] {
            if (interp.min_x() - min).abs() > 1e-14 || (interp.max_x() - max).abs() > 1e-14 {
                return Err(MathError::invalid_input(
                    "mixed interpolation parts must share the node range",
                ));
            }
        }
        let switch_index = switch_index.clamp(1, xs.len());
        let switch_x = xs[switch_index - 1];
        Ok(Self {
            xs,
            switch_x,
            short,
            long,
            allow_extrapolation: false,
        })
    }

    /// Enables extrapolation beyond the data range.
    ///
    /// The parts must themselves extrapolate for points outside the grid.
    #[must_use]
    pub fn with_extrapolation(mut self) -> Self {
        self.allow_extrapolation = true;
        self
    }

    /// Abscissa where the long-end scheme takes over.
    #[must_use]
    pub fn switch_x(&self) -> f64 {
        self.switch_x
    }
}

impl Interpolator for MixedInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        if x < self.switch_x {
            self.short.interpolate(x)
        } else {
            self.long.interpolate(x)
        }
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        if x < self.switch_x {
            self.short.derivative(x)
        } else {
            self.long.derivative(x)
        }
    }

    fn primitive(&self, x: f64) -> MathResult<f64> {
        check_range(&self.xs, x, self.allow_extrapolation)?;
        if x < self.switch_x {
            return self.short.primitive(x);
        }
        let head = self.short.primitive(self.switch_x)?;
        Ok(head + self.long.primitive(x)? - self.long.primitive(self.switch_x)?)
    }

    fn allows_extrapolation(&self) -> bool {
        self.allow_extrapolation
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

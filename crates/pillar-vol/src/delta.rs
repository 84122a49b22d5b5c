//! Delta and ATM strike conventions.
//!
//! [`BlackDeltaCalculator`] converts between Black deltas and strikes for
//! one expiry, given the forward, the spot and the discount factor. Deltas
//! are signed: put deltas are negative.
//!
//! With `f = F·DF/S` the foreign discount factor implied by the forward:
//!
//! ```text
//! Fwd    Δ = φ N(φ d1)            PaFwd    Δ = φ (K/F) N(φ d2)
//! Spot   Δ = φ f N(φ d1)          PaSpot   Δ = φ f (K/F) N(φ d2)
//! ```

use pillar_market::quotes::{AtmType, DeltaVolType, OptionType};
use pillar_math::distributions::{norm_cdf, norm_inv, norm_pdf};
use pillar_math::solvers::{brent, SolverConfig};

use crate::error::{VolError, VolResult};

/// Doublings tried when bracketing a premium-adjusted strike.
const MAX_BRACKET_STEPS: u32 = 200;

/// True for the premium-adjusted conventions.
#[must_use]
pub fn is_premium_adjusted(delta_type: DeltaVolType) -> bool {
    matches!(delta_type, DeltaVolType::PaSpot | DeltaVolType::PaFwd)
}

/// Delta and strike conversions at one expiry.
#[derive(Debug, Clone, Copy)]
pub struct BlackDeltaCalculator {
    delta_type: DeltaVolType,
    forward: f64,
    spot: f64,
    foreign_discount: f64,
    std_dev: f64,
    t: f64,
}

impl BlackDeltaCalculator {
    /// Creates a calculator for total standard deviation `vol·√t`.
    ///
    /// # Errors
    ///
    /// Fails for non-positive forward, spot or discount factor.
    pub fn new(
        delta_type: DeltaVolType,
        forward: f64,
        spot: f64,
        discount: f64,
        vol: f64,
        t: f64,
    ) -> VolResult<Self> {
        if forward <= 0.0 || spot <= 0.0 || discount <= 0.0 {
            return Err(VolError::strike_inversion(
                delta_type.to_string(),
                t,
                format!("forward {forward}, spot {spot} and discount {discount} must be positive"),
            ));
        }
        if !(vol.is_finite() && vol >= 0.0) {
            return Err(VolError::strike_inversion(
                delta_type.to_string(),
                t,
                format!("invalid volatility {vol}"),
            ));
        }
        Ok(Self {
            delta_type,
            forward,
            spot,
            foreign_discount: forward * discount / spot,
            std_dev: vol * t.max(0.0).sqrt(),
            t,
        })
    }

    /// The delta convention.
    #[must_use]
    pub fn delta_type(&self) -> DeltaVolType {
        self.delta_type
    }

    fn scale(&self) -> f64 {
        match self.delta_type {
            DeltaVolType::Spot | DeltaVolType::PaSpot => self.foreign_discount,
            DeltaVolType::Fwd | DeltaVolType::PaFwd => 1.0,
        }
    }

    fn fail(&self, reason: impl Into<String>) -> VolError {
        VolError::strike_inversion(self.delta_type.to_string(), self.t, reason)
    }

    fn strike_from_d1(&self, d1: f64) -> f64 {
        self.forward * (-d1 * self.std_dev + 0.5 * self.std_dev * self.std_dev).exp()
    }

    fn strike_from_d2(&self, d2: f64) -> f64 {
        self.forward * (-d2 * self.std_dev - 0.5 * self.std_dev * self.std_dev).exp()
    }

    fn d2(&self, strike: f64) -> f64 {
        (self.forward / strike).ln() / self.std_dev - 0.5 * self.std_dev
    }

    /// Signed delta of an option struck at `strike`.
    #[must_use]
    pub fn delta_from_strike(&self, option_type: OptionType, strike: f64) -> f64 {
        let phi = option_type.sign();
        if self.std_dev <= 0.0 {
            let itm = if phi * (self.forward - strike) > 0.0 { 1.0 } else { 0.0 };
            let moneyness = if is_premium_adjusted(self.delta_type) {
                strike / self.forward
            } else {
                1.0
            };
            return phi * self.scale() * moneyness * itm;
        }
        let d2 = self.d2(strike);
        let d1 = d2 + self.std_dev;
        if is_premium_adjusted(self.delta_type) {
            phi * self.scale() * (strike / self.forward) * norm_cdf(phi * d2)
        } else {
            phi * self.scale() * norm_cdf(phi * d1)
        }
    }

    /// Strike at which an option has the given signed delta.
    ///
    /// # Errors
    ///
    /// Returns `VolError::StrikeInversion` when the delta has the wrong sign
    /// or cannot be attained under the convention.
    pub fn strike_from_delta(&self, option_type: OptionType, delta: f64) -> VolResult<f64> {
        let phi = option_type.sign();
        let target = phi * delta / self.scale();
        if !(target > 0.0 && target < 1.0) {
            return Err(self.fail(format!(
                "{option_type} delta {delta} is outside the attainable range"
            )));
        }
        if !is_premium_adjusted(self.delta_type) {
            let d1 = phi * norm_inv(target);
            return Ok(self.strike_from_d1(d1));
        }
        if self.std_dev <= 0.0 {
            return Err(self.fail("premium adjusted delta needs a positive volatility"));
        }
        match option_type {
            OptionType::Put => self.premium_adjusted_put_strike(target),
            OptionType::Call => self.premium_adjusted_call_strike(target),
        }
    }

    /// `(K/F) N(φ d2)`, the unsigned premium adjusted forward delta.
    fn premium_adjusted(&self, option_type: OptionType, strike: f64) -> f64 {
        let phi = option_type.sign();
        (strike / self.forward) * norm_cdf(phi * self.d2(strike))
    }

    fn premium_adjusted_put_strike(&self, target: f64) -> VolResult<f64> {
        // Increasing in the strike from 0 towards infinity.
        let g = |k: f64| self.premium_adjusted(OptionType::Put, k) - target;
        let lo = self.strike_from_d1(8.0);
        let mut hi = self.forward;
        let mut steps = 0;
        while g(hi) < 0.0 {
            hi *= 2.0;
            steps += 1;
            if steps > MAX_BRACKET_STEPS {
                return Err(self.fail(format!("no put strike has premium adjusted delta {target}")));
            }
        }
        solve(g, lo, hi).map_err(|reason| self.fail(reason))
    }

    fn premium_adjusted_call_strike(&self, target: f64) -> VolResult<f64> {
        let sd = self.std_dev;
        // The call delta peaks where sd·N(d2) = n(d2).
        let peak = brent(
            |d2: f64| sd * norm_cdf(d2) - norm_pdf(d2),
            -sd,
            40.0,
            &SolverConfig::new(1.0e-14, 200),
        )
        .map_err(|e| self.fail(e.to_string()))?;
        let k_peak = self.strike_from_d2(peak.root);
        let max_delta = self.premium_adjusted(OptionType::Call, k_peak);
        if target > max_delta {
            return Err(self.fail(format!(
                "call delta {} exceeds the maximum premium adjusted delta {}",
                target * self.scale(),
                max_delta * self.scale()
            )));
        }

        // Decreasing beyond the peak.
        let g = |k: f64| self.premium_adjusted(OptionType::Call, k) - target;
        let mut hi = self.strike_from_d1(norm_inv(target)).max(k_peak);
        let mut steps = 0;
        while g(hi) > 0.0 {
            hi *= 2.0;
            steps += 1;
            if steps > MAX_BRACKET_STEPS {
                return Err(self.fail(format!("no call strike has premium adjusted delta {target}")));
            }
        }
        solve(g, k_peak, hi).map_err(|reason| self.fail(reason))
    }

    /// ATM strike under an ATM convention.
    ///
    /// `atm_delta_type` overrides the calculator's delta convention for the
    /// delta based ATM types.
    pub fn atm_strike(&self, atm_type: AtmType, atm_delta_type: Option<DeltaVolType>) -> VolResult<f64> {
        let calc = match atm_delta_type {
            Some(delta_type) if delta_type != self.delta_type => Self {
                delta_type,
                ..*self
            },
            _ => *self,
        };
        match atm_type {
            AtmType::AtmSpot => Ok(self.spot),
            AtmType::AtmFwd => Ok(self.forward),
            AtmType::AtmDeltaNeutral | AtmType::AtmDelta => {
                let half_variance = 0.5 * calc.std_dev * calc.std_dev;
                if is_premium_adjusted(calc.delta_type) {
                    Ok(calc.forward * (-half_variance).exp())
                } else {
                    Ok(calc.forward * half_variance.exp())
                }
            }
            AtmType::AtmPutCall50 => calc.strike_from_delta(OptionType::Call, 0.5),
        }
    }
}

fn solve<F>(f: F, lo: f64, hi: f64) -> Result<f64, String>
where
    F: FnMut(f64) -> f64,
{
    brent(f, lo, hi, &SolverConfig::new(1.0e-12, 200))
        .map(|r| r.root)
        .map_err(|e| e.to_string())
}

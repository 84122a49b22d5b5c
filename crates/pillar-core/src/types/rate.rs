//! Interest rates with an explicit compounding convention.

use super::frequency::{Compounding, Frequency};

/// An interest rate together with its compounding rule.
///
/// Used to move quoted zero rates between conventions, e.g. a
/// semi-annually compounded zero quote into the continuous rate a curve
/// stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestRate {
    /// The rate value (0.05 = 5%).
    pub rate: f64,
    /// Compounding convention.
    pub compounding: Compounding,
    /// Compounding frequency, used by the periodic conventions.
    pub frequency: Frequency,
}

impl InterestRate {
    /// Creates a new interest rate.
    #[must_use]
    pub fn new(rate: f64, compounding: Compounding, frequency: Frequency) -> Self {
        Self {
            rate,
            compounding,
            frequency,
        }
    }

    /// Continuously compounded rate.
    #[must_use]
    pub fn continuous(rate: f64) -> Self {
        Self::new(rate, Compounding::Continuous, Frequency::Annual)
    }

    fn periods(&self) -> f64 {
        f64::from(self.frequency.periods_per_year().max(1))
    }

    /// Growth factor over `t` years.
    #[must_use]
    pub fn compound_factor(&self, t: f64) -> f64 {
        let r = self.rate;
        match self.compounding {
            Compounding::Simple => 1.0 + r * t,
            Compounding::Compounded => (1.0 + r / self.periods()).powf(self.periods() * t),
            Compounding::Continuous => (r * t).exp(),
            Compounding::SimpleThenCompounded => {
                if t <= 1.0 / self.periods() {
                    1.0 + r * t
                } else {
                    (1.0 + r / self.periods()).powf(self.periods() * t)
                }
            }
        }
    }

    /// Discount factor over `t` years.
    #[must_use]
    pub fn discount_factor(&self, t: f64) -> f64 {
        1.0 / self.compound_factor(t)
    }

    /// The rate implied by a growth factor under the given convention.
    ///
    /// For `t == 0` the growth factor carries no information and a zero rate
    /// is returned.
    #[must_use]
    pub fn implied_rate(
        compound: f64,
        t: f64,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        let periods = f64::from(frequency.periods_per_year().max(1));
        let rate = if t.abs() < f64::EPSILON || compound == 1.0 {
            0.0
        } else {
            match compounding {
                Compounding::Simple => (compound - 1.0) / t,
                Compounding::Compounded => (compound.powf(1.0 / (periods * t)) - 1.0) * periods,
                Compounding::Continuous => compound.ln() / t,
                Compounding::SimpleThenCompounded => {
                    if t <= 1.0 / periods {
                        (compound - 1.0) / t
                    } else {
                        (compound.powf(1.0 / (periods * t)) - 1.0) * periods
                    }
                }
            }
        };
        Self::new(rate, compounding, frequency)
    }

    /// The equivalent rate under another convention over horizon `t`.
    #[must_use]
    pub fn equivalent_rate(&self, compounding: Compounding, frequency: Frequency, t: f64) -> Self {
        Self::implied_rate(self.compound_factor(t), t, compounding, frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_continuous_discount() {
        let r = InterestRate::continuous(0.05);
        assert_relative_eq!(r.discount_factor(2.0), (-0.1f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_equivalent_rate_roundtrip() {
        let semi = InterestRate::new(0.04, Compounding::Compounded, Frequency::SemiAnnual);
        let cont = semi.equivalent_rate(Compounding::Continuous, Frequency::Annual, 3.0);
        assert_relative_eq!(cont.rate, 2.0 * (1.02f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(
            cont.discount_factor(3.0),
            semi.discount_factor(3.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_simple_implied() {
        let r = InterestRate::implied_rate(1.025, 0.5, Compounding::Simple, Frequency::Annual);
        assert_relative_eq!(r.rate, 0.05, epsilon = 1e-14);
    }
}

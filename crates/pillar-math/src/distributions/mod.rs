//! Standard normal distribution helpers.
//!
//! Thin wrappers over `statrs` used by the Black formulas and the
//! delta-to-strike conversions.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

fn standard() -> Normal {
    Normal::standard()
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    standard().cdf(x)
}

/// Standard normal density.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    standard().pdf(x)
}

/// Inverse of the standard normal CDF.
///
/// Returns `-inf`/`+inf` at 0 and 1 and `NaN` outside `[0, 1]`.
#[must_use]
pub fn norm_inv(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    standard().inverse_cdf(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cdf_values() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(1.0), 0.841_344_75, epsilon = 1e-8);
        assert_relative_eq!(norm_cdf(-2.0), 0.022_750_13, epsilon = 1e-8);
    }

    #[test]
    fn test_pdf_peak() {
        assert_relative_eq!(norm_pdf(0.0), 1.0 / (2.0 * std::f64::consts::PI).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_round_trip() {
        for p in [0.01, 0.25, 0.5, 0.75, 0.99] {
            assert_relative_eq!(norm_cdf(norm_inv(p)), p, epsilon = 1e-9);
        }
        assert!(norm_inv(1.5).is_nan());
        assert_eq!(norm_inv(0.0), f64::NEG_INFINITY);
    }
}

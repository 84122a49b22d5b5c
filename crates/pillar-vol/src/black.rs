//! Black (1976) option formulas on forwards.
//!
//! Prices are discounted with an explicit discount factor so the same
//! functions serve futures options and spot-settled options.

use pillar_market::quotes::OptionType;
use pillar_math::distributions::norm_cdf;
use pillar_math::solvers::{brent, SolverConfig};

use crate::error::{VolError, VolResult};

/// Lowest volatility tried when stripping premiums.
const MIN_IMPLIED_VOL: f64 = 1.0e-6;

/// Highest volatility tried when stripping premiums.
const MAX_IMPLIED_VOL: f64 = 10.0;

/// Black price from a total standard deviation `σ√t`.
///
/// Returns the discounted intrinsic value when `std_dev` is zero.
#[must_use]
pub fn black_price(option_type: OptionType, forward: f64, strike: f64, std_dev: f64, discount: f64) -> f64 {
    let phi = option_type.sign();
    if std_dev <= 0.0 || strike <= 0.0 {
        return discount * (phi * (forward - strike)).max(0.0);
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    discount * phi * (forward * norm_cdf(phi * d1) - strike * norm_cdf(phi * d2))
}

/// Black price from a volatility and a time.
#[must_use]
pub fn black_price_vol(
    option_type: OptionType,
    forward: f64,
    strike: f64,
    vol: f64,
    t: f64,
    discount: f64,
) -> f64 {
    black_price(option_type, forward, strike, vol * t.max(0.0).sqrt(), discount)
}

/// Volatility reproducing a discounted Black premium.
///
/// # Errors
///
/// Returns `VolError::ImpliedVolatility` when the premium lies outside the
/// no-arbitrage bounds or the root search fails.
pub fn implied_volatility(
    option_type: OptionType,
    premium: f64,
    forward: f64,
    strike: f64,
    t: f64,
    discount: f64,
) -> VolResult<f64> {
    let fail = |reason: String| VolError::ImpliedVolatility {
        premium,
        strike,
        t,
        reason,
    };
    if t <= 0.0 {
        return Err(fail("option time must be positive".into()));
    }
    if forward <= 0.0 || strike <= 0.0 || discount <= 0.0 {
        return Err(fail(format!(
            "forward {forward}, strike {strike} and discount {discount} must be positive"
        )));
    }
    let intrinsic = discount * (option_type.sign() * (forward - strike)).max(0.0);
    let upper = match option_type {
        OptionType::Call => discount * forward,
        OptionType::Put => discount * strike,
    };
    if premium <= intrinsic {
        return Err(fail(format!("premium is not above intrinsic value {intrinsic}")));
    }
    if premium >= upper {
        return Err(fail(format!("premium is not below upper bound {upper}")));
    }

    let objective = |vol: f64| black_price_vol(option_type, forward, strike, vol, t, discount) - premium;
    let config = SolverConfig::new(1.0e-12, 200);
    brent(objective, MIN_IMPLIED_VOL, MAX_IMPLIED_VOL, &config)
        .map(|result| result.root)
        .map_err(|e| fail(e.to_string()))
}

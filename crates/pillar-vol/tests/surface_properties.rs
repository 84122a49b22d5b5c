//! Property tests for Black pricing and the arbitrage checks.

use pillar_market::quotes::OptionType;
use pillar_vol::black::{black_price_vol, implied_volatility};
use pillar_vol::diagnostics::arbitrage::{check_calendar, check_slice};
use proptest::prelude::*;

const MONEYNESS: [f64; 8] = [0.5, 0.75, 0.9, 1.0, 1.1, 1.25, 1.5, 2.0];

proptest! {
    #[test]
    fn put_call_parity(
        forward in 20.0f64..200.0,
        m in 0.5f64..2.0,
        vol in 0.05f64..1.0,
        t in 0.05f64..5.0,
        rate in -0.01f64..0.08,
    ) {
        let strike = m * forward;
        let df = (-rate * t).exp();
        let call = black_price_vol(OptionType::Call, forward, strike, vol, t, df);
        let put = black_price_vol(OptionType::Put, forward, strike, vol, t, df);
        prop_assert!((call - put - df * (forward - strike)).abs() < 1e-9 * forward);
    }

    #[test]
    fn flat_volatility_slices_are_arbitrage_free(
        forward in 20.0f64..200.0,
        vol in 0.05f64..1.0,
        t in 0.1f64..5.0,
    ) {
        let strikes: Vec<f64> = MONEYNESS.iter().map(|m| m * forward).collect();
        let calls: Vec<f64> = strikes
            .iter()
            .map(|k| black_price_vol(OptionType::Call, forward, *k, vol, t, 1.0))
            .collect();
        prop_assert!(check_slice(forward, &strikes, &calls).is_free());
    }

    #[test]
    fn growing_variance_has_no_calendar_arbitrage(
        vol in 0.05f64..1.0,
        t1 in 0.1f64..2.0,
        dt in 0.1f64..3.0,
    ) {
        let normalized: Vec<Vec<f64>> = [t1, t1 + dt]
            .iter()
            .map(|t| {
                MONEYNESS
                    .iter()
                    .map(|m| black_price_vol(OptionType::Call, 1.0, *m, vol, *t, 1.0))
                    .collect()
            })
            .collect();
        let flags = check_calendar(&normalized);
        prop_assert!(flags.iter().flatten().all(|f| !f));
    }

    #[test]
    fn out_of_the_money_premiums_imply_their_volatility(
        forward in 50.0f64..150.0,
        m in 0.8f64..1.25,
        vol in 0.1f64..0.8,
        t in 0.25f64..3.0,
    ) {
        let strike = m * forward;
        let option_type = if strike >= forward { OptionType::Call } else { OptionType::Put };
        let premium = black_price_vol(option_type, forward, strike, vol, t, 0.97);
        let implied = implied_volatility(option_type, premium, forward, strike, t, 0.97).unwrap();
        prop_assert!((implied - vol).abs() < 1e-6, "{implied} vs {vol}");
    }
}

//! Discrete static arbitrage checks on call prices.
//!
//! Follows Carr and Madan: on a strike grid extended with `(0, F)`, the
//! slopes `Qᵢ = (cᵢ₋₁ − cᵢ) / (kᵢ − kᵢ₋₁)` of undiscounted call prices
//! are probabilities of finishing above a strike and must lie in `[0, 1]`
//! (call spreads) and be non-increasing (butterflies).

/// Slack allowed before a violation is reported.
const ARBITRAGE_TOLERANCE: f64 = 1.0e-10;

/// Arbitrage flags of one expiry slice, aligned with its strikes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceArbitrage {
    /// Call spread ending at the strike has a price slope outside `[0, 1]`.
    pub call_spread: Vec<bool>,
    /// Butterfly centred on the strike has negative value.
    pub butterfly: Vec<bool>,
}

impl SliceArbitrage {
    /// True when no cell is flagged.
    #[must_use]
    pub fn is_free(&self) -> bool {
        !self.call_spread.iter().chain(&self.butterfly).any(|f| *f)
    }
}

/// Checks undiscounted call prices of one expiry.
///
/// Cells whose strike or price is not finite are skipped and never flagged.
/// Strikes need not be sorted; flags are returned in input order.
#[must_use]
pub fn check_slice(forward: f64, strikes: &[f64], calls: &[f64]) -> SliceArbitrage {
    let n = strikes.len().min(calls.len());
    let mut flags = SliceArbitrage {
        call_spread: vec![false; strikes.len()],
        butterfly: vec![false; strikes.len()],
    };

    let mut order: Vec<usize> = (0..n)
        .filter(|&i| strikes[i].is_finite() && strikes[i] > 0.0 && calls[i].is_finite())
        .collect();
    order.sort_by(|a, b| strikes[*a].total_cmp(&strikes[*b]));
    order.dedup_by(|a, b| (strikes[*a] - strikes[*b]).abs() <= ARBITRAGE_TOLERANCE * strikes[*b]);

    let mut previous = (0.0, forward);
    let mut slopes = Vec::with_capacity(order.len());
    for &i in &order {
        let q = (previous.1 - calls[i]) / (strikes[i] - previous.0);
        if !(-ARBITRAGE_TOLERANCE..=1.0 + ARBITRAGE_TOLERANCE).contains(&q) {
            flags.call_spread[i] = true;
        }
        slopes.push(q);
        previous = (strikes[i], calls[i]);
    }
    for (pos, pair) in slopes.windows(2).enumerate() {
        if pair[0] < pair[1] - ARBITRAGE_TOLERANCE {
            flags.butterfly[order[pos]] = true;
        }
    }
    flags
}

/// Checks forward-normalised call prices of consecutive expiries at fixed
/// moneyness.
///
/// `normalized[i][j]` is the undiscounted call price over the forward at
/// expiry `i` and level `j`; it must not decrease with expiry. A flag marks
/// the later expiry of a decreasing pair.
#[must_use]
pub fn check_calendar(normalized: &[Vec<f64>]) -> Vec<Vec<bool>> {
    let mut flags: Vec<Vec<bool>> = normalized.iter().map(|row| vec![false; row.len()]).collect();
    for i in 1..normalized.len() {
        let (earlier, later) = (&normalized[i - 1], &normalized[i]);
        for (j, (a, b)) in earlier.iter().zip(later).enumerate() {
            if a.is_finite() && b.is_finite() && *b < *a - ARBITRAGE_TOLERANCE {
                flags[i][j] = true;
            }
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::black::black_price_vol;
    use pillar_market::quotes::OptionType;

    fn calls(forward: f64, strikes: &[f64], vol: f64) -> Vec<f64> {
        strikes
            .iter()
            .map(|k| black_price_vol(OptionType::Call, forward, *k, vol, 1.0, 1.0))
            .collect()
    }

    #[test]
    fn test_black_prices_are_free() {
        let strikes = [60.0, 80.0, 100.0, 120.0, 150.0];
        let flags = check_slice(100.0, &strikes, &calls(100.0, &strikes, 0.3));
        assert!(flags.is_free());
    }

    #[test]
    fn test_call_spread_violation() {
        // Call price rising with strike.
        let flags = check_slice(100.0, &[90.0, 110.0], &[12.0, 14.0]);
        assert_eq!(flags.call_spread, vec![false, true]);
    }

    #[test]
    fn test_butterfly_violation_in_input_order() {
        // Slopes 0.25, 0.05, 0.4: the middle strike's butterfly is negative.
        let c90 = 100.0 - 0.25 * 90.0;
        let c100 = c90 - 0.05 * 10.0;
        let c110 = c100 - 0.4 * 10.0;
        let flags = check_slice(100.0, &[110.0, 90.0, 100.0], &[c110, c90, c100]);
        assert_eq!(flags.butterfly, vec![false, false, true]);
        assert!(!flags.call_spread.iter().any(|f| *f));
    }

    #[test]
    fn test_non_finite_cells_are_skipped() {
        let strikes = [80.0, f64::NAN, 120.0];
        let prices = calls(100.0, &[80.0, 100.0, 120.0], 0.2);
        let flags = check_slice(100.0, &strikes, &[prices[0], f64::NAN, prices[2]]);
        assert!(flags.is_free());
        assert_eq!(flags.butterfly.len(), 3);
    }

    #[test]
    fn test_calendar_flags_later_expiry() {
        let flags = check_calendar(&[vec![0.10, 0.05], vec![0.12, 0.04], vec![0.15, 0.06]]);
        assert_eq!(flags, vec![vec![false, false], vec![false, true], vec![false, false]]);
    }
}

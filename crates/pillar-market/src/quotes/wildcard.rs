//! Wildcard quote patterns and quote-list selection.

use std::fmt;

use crate::error::{MarketError, MarketResult};

/// A quote-name pattern where `*` matches any run of characters.
///
/// # Example
///
/// ```rust
/// use pillar_market::quotes::Wildcard;
///
/// let w = Wildcard::new("MM/RATE/EUR/*").unwrap();
/// assert!(w.matches("MM/RATE/EUR/0D/6M"));
/// assert!(!w.matches("MM/RATE/USD/0D/3M"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Wildcard {
    pattern: String,
    /// Pattern split on `*`: the literal pieces between wildcards.
    pieces: Vec<String>,
}

impl Wildcard {
    /// Creates a wildcard, returning `None` when the pattern has no `*`.
    #[must_use]
    pub fn new(pattern: &str) -> Option<Self> {
        if !pattern.contains('*') {
            return None;
        }
        Some(Self {
            pattern: pattern.to_string(),
            pieces: pattern.split('*').map(str::to_string).collect(),
        })
    }

    /// The original pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal text before the first `*`.
    ///
    /// Every matching name starts with it, which lets stores narrow a scan.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.pieces[0]
    }

    /// True when `name` matches the whole pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let (first, rest) = match self.pieces.split_first() {
            Some(split) => split,
            None => return false,
        };
        let Some(mut remaining) = name.strip_prefix(first.as_str()) else {
            return false;
        };
        let Some((last, middle)) = rest.split_last() else {
            return remaining.is_empty();
        };
        for piece in middle {
            match remaining.find(piece.as_str()) {
                Some(pos) => remaining = &remaining[pos + piece.len()..],
                None => return false,
            }
        }
        remaining.len() >= last.len() && remaining.ends_with(last.as_str())
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// How a configured quote list selects quotes.
///
/// A list is either a single wildcard pattern or a list of explicit names;
/// mixing the two is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteSelection {
    /// All quotes matching the pattern.
    Wildcard(Wildcard),
    /// Exactly these quotes.
    Explicit(Vec<String>),
}

impl QuoteSelection {
    /// Classifies a configured quote list.
    ///
    /// # Errors
    ///
    /// Fails when a wildcard appears in a list with more than one entry, or
    /// when the list is empty.
    pub fn from_quotes(curve_id: &str, quotes: &[String]) -> MarketResult<Self> {
        if quotes.is_empty() {
            return Err(MarketError::InvalidWildcard {
                curve_id: curve_id.to_string(),
                reason: "no quotes configured".into(),
            });
        }
        let has_wildcard = quotes.iter().any(|q| q.contains('*'));
        if has_wildcard && quotes.len() > 1 {
            return Err(MarketError::InvalidWildcard {
                curve_id: curve_id.to_string(),
                reason: format!(
                    "wildcards only supported for a single quote string but found more than one quote ({})",
                    quotes.len()
                ),
            });
        }
        match quotes.first().and_then(|q| Wildcard::new(q)) {
            Some(w) => Ok(Self::Wildcard(w)),
            None => Ok(Self::Explicit(quotes.to_vec())),
        }
    }

    /// True in wildcard mode.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

/// Picks the single wildcard entry of a configured dimension, if any.
///
/// Used for surface axes (expiries or strikes) where `*` may replace the
/// explicit list. A `*` mixed with explicit values is an error.
pub fn axis_wildcard(curve_id: &str, axis: &str, values: &[String]) -> MarketResult<bool> {
    let wildcards = values.iter().filter(|v| v.contains('*')).count();
    match (wildcards, values.len()) {
        (0, _) => Ok(false),
        (1, 1) => Ok(true),
        _ => Err(MarketError::InvalidWildcard {
            curve_id: curve_id.to_string(),
            reason: format!("only one wildcard allowed for {axis}, and no explicit values alongside it"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_suffix() {
        let w = Wildcard::new("IR_SWAP/RATE/EUR/*/6M/*").unwrap();
        assert!(w.matches("IR_SWAP/RATE/EUR/2D/6M/10Y"));
        assert!(!w.matches("IR_SWAP/RATE/EUR/2D/3M/10Y"));
        assert_eq!(w.prefix(), "IR_SWAP/RATE/EUR/");
    }

    #[test]
    fn test_trailing_literal() {
        let w = Wildcard::new("*/C").unwrap();
        assert!(w.matches("COMMODITY_OPTION/PRICE/GOLD/USD/2025-06-01/100/C"));
        assert!(!w.matches("COMMODITY_OPTION/PRICE/GOLD/USD/2025-06-01/100/P"));
        let w = Wildcard::new("ab*ab").unwrap();
        assert!(!w.matches("ab"));
        assert!(w.matches("abab"));
    }

    #[test]
    fn test_no_star_is_not_wildcard() {
        assert!(Wildcard::new("MM/RATE/EUR/0D/6M").is_none());
    }

    #[test]
    fn test_selection_rejects_mixed_lists() {
        let quotes = vec!["MM/RATE/EUR/*".to_string(), "MM/RATE/EUR/0D/6M".to_string()];
        let err = QuoteSelection::from_quotes("EUR-6M", &quotes).unwrap_err();
        assert!(err.to_string().contains("more than one"));

        let single = vec!["MM/RATE/EUR/*".to_string()];
        assert!(QuoteSelection::from_quotes("EUR-6M", &single).unwrap().is_wildcard());
    }

    #[test]
    fn test_axis_wildcard() {
        assert!(axis_wildcard("C", "expiries", &["*".to_string()]).unwrap());
        assert!(!axis_wildcard("C", "expiries", &["2025-01-01".to_string()]).unwrap());
        assert!(axis_wildcard("C", "strikes", &["*".to_string(), "100".to_string()]).is_err());
    }
}

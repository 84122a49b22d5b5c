//! Error types for quotes, conventions and configuration.

use pillar_core::{CoreError, Date};
use thiserror::Error;

/// A specialized Result type for market data operations.
pub type MarketResult<T> = Result<T, MarketError>;

/// Errors raised while reading quotes, conventions or curve configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// Date, period or convention parsing failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A quote name does not follow the slash-delimited schema.
    #[error("Cannot parse market datum '{name}': {reason}")]
    QuoteParse {
        /// The quote name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required quote is missing for the as-of date.
    #[error("Quote '{name}' not found for {asof}")]
    QuoteNotFound {
        /// The quote name.
        name: String,
        /// The as-of date requested.
        asof: Date,
    },

    /// A quote has expired where a live one is required.
    #[error("Quote '{name}' expired on {expiry} (as of {asof})")]
    ExpiredQuote {
        /// The quote name.
        name: String,
        /// The expiry of the quote.
        expiry: Date,
        /// The as-of date.
        asof: Date,
    },

    /// No convention is registered under the id.
    #[error("No conventions found with ID: {id}")]
    ConventionNotFound {
        /// The convention id.
        id: String,
    },

    /// The convention exists but is of another kind.
    #[error("Conventions ID does not give {expected} conventions.")]
    ConventionTypeMismatch {
        /// The convention id.
        id: String,
        /// Human-readable name of the expected kind.
        expected: &'static str,
    },

    /// No curve configuration is registered under the id.
    #[error("No configuration found for curve ID {curve_id}")]
    ConfigNotFound {
        /// The curve id.
        curve_id: String,
    },

    /// A quote list mixes wildcard and explicit entries or a pattern is malformed.
    #[error("Invalid wildcard for curve {curve_id}: {reason}")]
    InvalidWildcard {
        /// The curve id.
        curve_id: String,
        /// Description of the problem.
        reason: String,
    },

    /// Configured strikes, deltas, moneyness levels, expiries or quotes repeat.
    #[error("{what} for curve {curve_id}")]
    Duplicate {
        /// The curve id.
        curve_id: String,
        /// Message describing the duplication.
        what: String,
    },

    /// Explicitly configured quotes were not all found.
    #[error(
        "Found {found} live and {expired} expired quotes for curve {curve_id} but {expected} were configured"
    )]
    QuoteCountMismatch {
        /// The curve id.
        curve_id: String,
        /// Number of configured quotes.
        expected: usize,
        /// Number of live quotes found.
        found: usize,
        /// Number of expired quotes found.
        expired: usize,
    },

    /// A referenced curve has not been built.
    #[error("The curve '{required}' required in the building of the curve '{curve_id}' was not found.")]
    MissingDependency {
        /// The curve being built.
        curve_id: String,
        /// The missing curve.
        required: String,
    },

    /// The configuration is inconsistent.
    #[error("Invalid configuration for curve {curve_id}: {reason}")]
    InvalidConfig {
        /// The curve id.
        curve_id: String,
        /// Description of the problem.
        reason: String,
    },

    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A configuration or quote file could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl MarketError {
    /// Creates a quote parse error.
    #[must_use]
    pub fn quote_parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QuoteParse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(curve_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            curve_id: curve_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(curve_id: impl Into<String>, what: impl Into<String>) -> Self {
        Self::Duplicate {
            curve_id: curve_id.into(),
            what: what.into(),
        }
    }

    /// Creates a missing dependency error.
    #[must_use]
    pub fn missing_dependency(curve_id: impl Into<String>, required: impl Into<String>) -> Self {
        Self::MissingDependency {
            curve_id: curve_id.into(),
            required: required.into(),
        }
    }

    /// Creates a convention type mismatch error.
    #[must_use]
    pub fn convention_mismatch(id: impl Into<String>, expected: &'static str) -> Self {
        Self::ConventionTypeMismatch {
            id: id.into(),
            expected,
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Deserialization(err.to_string())
    }
}

impl From<toml::de::Error> for MarketError {
    fn from(err: toml::de::Error) -> Self {
        MarketError::Deserialization(err.to_string())
    }
}

impl From<csv::Error> for MarketError {
    fn from(err: csv::Error) -> Self {
        MarketError::Deserialization(err.to_string())
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        MarketError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_messages() {
        let err = MarketError::ConventionNotFound {
            id: "EUR-DEP".into(),
        };
        assert_eq!(err.to_string(), "No conventions found with ID: EUR-DEP");

        let err = MarketError::convention_mismatch("EUR-DEP", "deposit rate");
        assert_eq!(
            err.to_string(),
            "Conventions ID does not give deposit rate conventions."
        );
    }

    #[test]
    fn test_missing_dependency_message() {
        let err = MarketError::missing_dependency("EUR-6M", "Yield/EUR/EUR-EONIA");
        assert_eq!(
            err.to_string(),
            "The curve 'Yield/EUR/EUR-EONIA' required in the building of the curve 'EUR-6M' was not found."
        );
    }
}

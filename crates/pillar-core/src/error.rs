//! Error types for dates and market conventions.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing or computing with dates and conventions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A tenor string could not be parsed.
    #[error("Invalid period '{input}': {reason}")]
    InvalidPeriod {
        /// The offending input.
        input: String,
        /// Reason for rejection.
        reason: String,
    },

    /// Unknown day count convention name.
    #[error("Day counter '{name}' not recognized")]
    UnknownDayCount {
        /// The name that failed to parse.
        name: String,
    },

    /// Unknown calendar name.
    #[error("Calendar '{name}' not recognized")]
    UnknownCalendar {
        /// The name that failed to parse.
        name: String,
    },

    /// Unknown currency code.
    #[error("Currency '{code}' not recognized")]
    UnknownCurrency {
        /// The code that failed to parse.
        code: String,
    },

    /// Generic parse failure for enumerated conventions.
    #[error("Cannot parse {kind} from '{input}'")]
    Parse {
        /// The kind of value being parsed (e.g. "frequency").
        kind: &'static str,
        /// The offending input.
        input: String,
    },

    /// Calendar or business day error.
    #[error("Calendar error: {reason}")]
    CalendarError {
        /// Description of the error.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid period error.
    #[must_use]
    pub fn invalid_period(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic parse error.
    #[must_use]
    pub fn parse(kind: &'static str, input: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            input: input.into(),
        }
    }
}

//! Quote stores.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use pillar_core::Date;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MarketError, MarketResult};
use crate::quotes::{MarketDatum, Wildcard};

/// Read access to quotes by name and as-of date.
pub trait QuoteStore: Send + Sync {
    /// Returns the quote with exactly this name.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::QuoteNotFound` when absent.
    fn get(&self, name: &str, asof: Date) -> MarketResult<MarketDatum>;

    /// Returns all quotes whose names match the wildcard, ordered by name.
    fn get_pattern(&self, wildcard: &Wildcard, asof: Date) -> Vec<MarketDatum>;

    /// True when a quote with this name exists.
    fn has(&self, name: &str, asof: Date) -> bool;
}

/// Quote store held in memory.
///
/// Keeps at most one quote per (date, name); a later insert replaces an
/// earlier one.
///
/// # Example
///
/// ```rust
/// use pillar_core::Date;
/// use pillar_market::quotes::{InMemoryQuoteStore, QuoteStore, Wildcard};
///
/// let asof = Date::from_ymd(2024, 1, 15).unwrap();
/// let mut store = InMemoryQuoteStore::new();
/// store.add_quote(asof, "MM/RATE/EUR/2D/3M", 0.031).unwrap();
/// store.add_quote(asof, "MM/RATE/EUR/2D/6M", 0.032).unwrap();
///
/// let all = store.get_pattern(&Wildcard::new("MM/RATE/EUR/*").unwrap(), asof);
/// assert_eq!(all.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuoteStore {
    quotes: BTreeMap<Date, BTreeMap<String, MarketDatum>>,
}

/// One CSV row: `date,name,value`.
#[derive(Debug, Deserialize)]
struct QuoteRecord {
    date: String,
    name: String,
    value: f64,
}

impl InMemoryQuoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parsed quote.
    pub fn add(&mut self, datum: MarketDatum) {
        let by_name = self.quotes.entry(datum.asof()).or_default();
        if let Some(previous) = by_name.insert(datum.name().to_string(), datum) {
            debug!(name = previous.name(), asof = %previous.asof(), "replaced duplicate quote");
        }
    }

    /// Parses and inserts a quote.
    ///
    /// # Errors
    ///
    /// Fails when the quote name cannot be parsed.
    pub fn add_quote(&mut self, asof: Date, name: &str, value: f64) -> MarketResult<()> {
        self.add(MarketDatum::parse(asof, name, value)?);
        Ok(())
    }

    /// Builder-style insert.
    ///
    /// # Errors
    ///
    /// Fails when the quote name cannot be parsed.
    pub fn with_quote(mut self, asof: Date, name: &str, value: f64) -> MarketResult<Self> {
        self.add_quote(asof, name, value)?;
        Ok(self)
    }

    /// Loads `date,name,value` rows, without a header line.
    ///
    /// Lines starting with `#` are comments. Rows whose name does not
    /// parse are skipped with a warning; malformed rows are errors.
    pub fn from_csv_reader<R: Read>(reader: R) -> MarketResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut store = Self::new();
        let mut skipped = 0usize;
        for row in csv_reader.deserialize() {
            let record: QuoteRecord = row?;
            let asof = Date::parse(&record.date)?;
            match MarketDatum::parse(asof, &record.name, record.value) {
                Ok(datum) => store.add(datum),
                Err(e) => {
                    skipped += 1;
                    warn!(name = %record.name, error = %e, "skipping unparsable quote");
                }
            }
        }
        debug!(quotes = store.len(), skipped, "loaded quotes");
        Ok(store)
    }

    /// Loads quotes from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> MarketResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Total number of quotes across all dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.values().map(BTreeMap::len).sum()
    }

    /// True when the store holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuoteStore for InMemoryQuoteStore {
    fn get(&self, name: &str, asof: Date) -> MarketResult<MarketDatum> {
        self.quotes
            .get(&asof)
            .and_then(|by_name| by_name.get(name))
            .cloned()
            .ok_or_else(|| MarketError::QuoteNotFound {
                name: name.to_string(),
                asof,
            })
    }

    fn get_pattern(&self, wildcard: &Wildcard, asof: Date) -> Vec<MarketDatum> {
        let Some(by_name) = self.quotes.get(&asof) else {
            return Vec::new();
        };
        let prefix = wildcard.prefix();
        by_name
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(name, _)| wildcard.matches(name))
            .map(|(_, datum)| datum.clone())
            .collect()
    }

    fn has(&self, name: &str, asof: Date) -> bool {
        self.quotes
            .get(&asof)
            .is_some_and(|by_name| by_name.contains_key(name))
    }
}

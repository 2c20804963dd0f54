//! Macro backdrop for the metals: dollar index, 10-year yield, equities.
//!
//! Each configured symbol is reduced to its last close and the change over
//! the trailing window. A symbol that cannot be fetched is skipped with a
//! warning; the snapshot holds whatever did load.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MacroConfig;
use crate::data::{BarInterval, DataProvider};
use crate::domain::Series;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroQuote {
    pub symbol: String,
    pub label: String,
    /// Close of the first bar in the window.
    pub first_close: f64,
    pub last_close: f64,
    pub change: f64,
    /// Change relative to `first_close`, in percent.
    pub change_pct: f64,
    pub since: DateTime<Utc>,
    pub as_of: DateTime<Utc>,
    pub bars: usize,
}

impl MacroQuote {
    /// `None` for an empty series.
    pub fn from_series(symbol: &str, label: &str, series: &Series) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;
        let change = last.close - first.close;
        Some(Self {
            symbol: symbol.to_string(),
            label: label.to_string(),
            first_close: first.close,
            last_close: last.close,
            change,
            change_pct: change / first.close * 100.0,
            since: first.timestamp,
            as_of: last.timestamp,
            bars: series.len(),
        })
    }
}

/// Daily quotes for every symbol in `config`, in configured order.
pub fn macro_snapshot(provider: &dyn DataProvider, config: &MacroConfig) -> Vec<MacroQuote> {
    let mut quotes = Vec::with_capacity(config.symbols.len());

    for entry in &config.symbols {
        let symbol = entry.symbol.as_str();
        let series =
            match provider.fetch_trailing(symbol, BarInterval::OneDay, config.lookback_days) {
                Ok(series) => series,
                Err(err) => {
                    tracing::warn!(symbol, error = %err, "macro symbol skipped");
                    continue;
                }
            };
        match MacroQuote::from_series(symbol, &entry.label, &series) {
            Some(quote) => quotes.push(quote),
            None => tracing::warn!(symbol, "macro symbol skipped: no bars in window"),
        }
    }

    tracing::debug!(
        requested = config.symbols.len(),
        loaded = quotes.len(),
        "macro snapshot"
    );
    quotes
}

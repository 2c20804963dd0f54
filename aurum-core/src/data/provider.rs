//! Data provider trait and structured error types.
//!
//! The core never performs I/O. Providers fetch and validate bars at the
//! boundary; an error here means "no evaluation this cycle" for the symbol.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{Series, SeriesError};

/// Sampling interval requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl BarInterval {
    /// Query-string form (`1h`, `1d`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BarInterval::OneHour => "1h",
            BarInterval::OneDay => "1d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            BarInterval::OneHour => Duration::hours(1),
            BarInterval::OneDay => Duration::days(1),
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e.to_string())
    }
}

/// Source of OHLCV series (Yahoo Finance, CSV files, test doubles).
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Bars for `symbol` at `interval` with timestamps in `[start, end]`.
    fn fetch(
        &self,
        symbol: &str,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Series, DataError>;

    /// Bars covering the trailing `days` up to now.
    fn fetch_trailing(
        &self,
        symbol: &str,
        interval: BarInterval,
        days: u32,
    ) -> Result<Series, DataError> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));
        self.fetch(symbol, interval, start, end)
    }

    /// False while the provider refuses requests (rate limit, ban).
    fn is_available(&self) -> bool {
        true
    }
}

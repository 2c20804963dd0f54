//! CSV bar import and a directory-backed provider.
//!
//! `CsvProvider` reads `<dir>/<symbol>_<interval>.csv` (e.g. `GC=F_1h.csv`)
//! and serves as the offline data source for every command.
//!
//! Accepted header names: `timestamp`/`datetime`/`date` (any case used by
//! common exporters), `open`, `high`, `low`, `close`, `volume`. Extra columns
//! such as `Adj Close` are ignored. Timestamps may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS[+HH:MM]` (UTC assumed without offset) or `YYYY-MM-DD`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::provider::{BarInterval, DataError, DataProvider};
use crate::domain::{Bar, Series};

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    #[serde(alias = "Timestamp", alias = "Datetime", alias = "datetime", alias = "Date", alias = "date")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

/// Parse a timestamp in any of the accepted formats.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read bars from CSV. Rows may be in any order; duplicate timestamps keep the last row.
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Series, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for (line, row) in rdr.deserialize::<CsvBarRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            DataError::Csv(format!(
                "row {}: unrecognised timestamp '{}'",
                line + 1,
                row.timestamp
            ))
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        });
    }

    Ok(Series::from_unsorted(bars)?)
}

pub fn read_bars_csv_path(path: &Path) -> Result<Series, DataError> {
    let file = std::fs::File::open(path)?;
    read_bars_csv(file)
}

/// Provider reading `<dir>/<symbol>_<interval>.csv` (e.g. `GC=F_1h.csv`).
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, interval: BarInterval) -> PathBuf {
        self.dir.join(format!("{symbol}_{interval}.csv"))
    }

    fn load(&self, symbol: &str, interval: BarInterval) -> Result<Series, DataError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        read_bars_csv_path(&path)
    }
}

fn window(series: &Series, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Series, DataError> {
    let bars: Vec<Bar> = series
        .bars()
        .iter()
        .filter(|b| b.timestamp >= start && b.timestamp <= end)
        .copied()
        .collect();
    Ok(Series::new(bars)?)
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Series, DataError> {
        window(&self.load(symbol, interval)?, start, end)
    }

    /// Files are snapshots: the trailing window ends at the last bar on
    /// file rather than at the wall clock.
    fn fetch_trailing(
        &self,
        symbol: &str,
        interval: BarInterval,
        days: u32,
    ) -> Result<Series, DataError> {
        let series = self.load(symbol, interval)?;
        match series.last().map(|b| b.timestamp) {
            Some(end) => window(&series, end - Duration::days(i64::from(days)), end),
            None => Ok(series),
        }
    }
}

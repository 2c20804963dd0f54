//! Domain types for the signal core

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{Series, SeriesError};

/// Instrument symbol (e.g. `GC=F`).
pub type Symbol = String;

/// Build an hourly series from close prices for testing.
///
/// open = previous close (or close for the first bar), high = max(open,close) + 1,
/// low = min(open,close) - 1, volume = 1000, timestamps hourly from 2024-01-02 00:00 UTC.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> Series {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect();
    Series::new(bars).expect("synthetic series is valid")
}

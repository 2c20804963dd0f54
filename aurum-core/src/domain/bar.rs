//! Bar: one OHLCV sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV sample at a single timestamp.
///
/// Bars carry no symbol: a `Series` belongs to exactly one instrument and the
/// caller keys it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if every OHLCV field is finite (no NaN, no infinity).
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Finite fields, `low <= min(open, close) <= max(open, close) <= high`,
    /// positive prices, non-negative volume.
    pub fn is_sane(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.low > 0.0
            && self.volume >= 0.0
    }

    /// Intrabar range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            open: 2050.0,
            high: 2061.5,
            low: 2044.0,
            close: 2058.2,
            volume: 12_500.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_rejects_nan_close() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_finite());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_rejects_infinite_prices() {
        let mut bar = sample_bar();
        bar.high = f64::INFINITY;
        assert!(!bar.is_finite());
        assert!(!bar.is_sane());

        let mut bar = sample_bar();
        bar.high = f64::INFINITY;
        bar.close = f64::INFINITY;
        bar.open = f64::INFINITY;
        assert!(!bar.is_sane());

        let mut bar = sample_bar();
        bar.volume = f64::INFINITY;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_high_below_close() {
        let mut bar = sample_bar();
        bar.high = 2055.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_rejects_negative_volume() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_range() {
        assert!((sample_bar().range() - 17.5).abs() < 1e-12);
    }
}

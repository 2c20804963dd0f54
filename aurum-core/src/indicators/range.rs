//! True Range and Average Daily Range (ADR).
//!
//! TR[0] = high[0] - low[0] (no previous close).
//! TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
//! ADR = EMA of TR with span `period` (alpha = 2 / (period + 1)), computed on
//! a daily series independent of the intraday EMA lookback.

use super::ema::ema_of_series;
use super::{Indicator, Smoothing};
use crate::domain::{Bar, Series};
use crate::error::SignalError;

/// True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => hl,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Adr {
    period: usize,
    smoothing: Smoothing,
    name: String,
}

impl Adr {
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, Smoothing::Recursive)
    }

    pub fn with_smoothing(period: usize, smoothing: Smoothing) -> Self {
        assert!(period >= 1, "ADR period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("adr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Current ADR: last value of the smoothed True Range over `daily`.
    ///
    /// Needs `min_bars()` daily bars (two) so that one True Range sees a
    /// previous close.
    pub fn current(&self, daily: &Series) -> Result<f64, SignalError> {
        if daily.len() < self.min_bars() {
            return Err(SignalError::data(format!(
                "ADR needs at least {} daily bars, got {}",
                self.min_bars(),
                daily.len()
            )));
        }
        let adr = self
            .compute(daily.bars())
            .last()
            .copied()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SignalError::data("ADR is not finite"))?;
        Ok(adr)
    }
}

impl Indicator for Adr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&true_range(bars), self.period, self.smoothing)
    }
}

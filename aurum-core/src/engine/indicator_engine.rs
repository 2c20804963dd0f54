//! Indicator engine: EMA columns on the resampled series, ADR from daily bars,
//! and the snapshot at the most recent bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IndicatorConfig;
use crate::domain::{Bar, Series};
use crate::error::SignalError;
use crate::indicators::{Adr, Ema, Indicator, IndicatorValues, Smoothing};

/// Resampled series with EMA columns attached, for charting collaborators.
///
/// Output only: a NaN in a column serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub series: Series,
    pub columns: IndicatorValues,
    pub fast_key: String,
    pub slow_key: String,
}

impl ChartFrame {
    pub fn fast_ema(&self) -> &[f64] {
        self.columns.get_series(&self.fast_key).unwrap_or(&[])
    }

    pub fn slow_ema(&self) -> &[f64] {
        self.columns.get_series(&self.slow_key).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Indicator state at the most recent bar of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub fast_ema: f64,
    pub slow_ema: f64,
    /// Slow EMA at the second-to-last bar; equals `slow_ema` for a one-bar series.
    pub slow_ema_previous: f64,
    pub last_close: f64,
    pub period_high: f64,
    pub period_low: f64,
    /// ADR from the daily series; `None` when it could not be computed.
    pub adr: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    fast: Ema,
    slow: Ema,
    adr: Adr,
}

impl IndicatorEngine {
    pub fn new(
        fast_span: usize,
        slow_span: usize,
        adr_period: usize,
        smoothing: Smoothing,
    ) -> Result<Self, SignalError> {
        Self::from_config(&IndicatorConfig {
            fast_span,
            slow_span,
            adr_period,
            smoothing,
        })
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            fast: Ema::with_smoothing(config.fast_span, config.smoothing),
            slow: Ema::with_smoothing(config.slow_span, config.smoothing),
            adr: Adr::with_smoothing(config.adr_period, config.smoothing),
        })
    }

    pub fn fast_span(&self) -> usize {
        self.fast.span()
    }

    pub fn slow_span(&self) -> usize {
        self.slow.span()
    }

    pub fn adr_period(&self) -> usize {
        self.adr.period()
    }

    /// Attach fast and slow EMA columns. A series shorter than the EMAs'
    /// `min_bars` (one bar) is `DataUnavailable`.
    pub fn chart(&self, series: &Series) -> Result<ChartFrame, SignalError> {
        let needed = self.fast.min_bars().max(self.slow.min_bars());
        if series.len() < needed {
            return Err(SignalError::data(format!(
                "EMA needs at least {needed} bar(s), got {}",
                series.len()
            )));
        }
        let mut columns = IndicatorValues::new();
        columns.insert_computed(&self.fast, series.bars());
        columns.insert_computed(&self.slow, series.bars());
        Ok(ChartFrame {
            series: series.clone(),
            columns,
            fast_key: self.fast.name().to_string(),
            slow_key: self.slow.name().to_string(),
        })
    }

    /// Current ADR from a daily series (at least two bars).
    pub fn adr(&self, daily: &Series) -> Result<f64, SignalError> {
        self.adr.current(daily)
    }

    /// Snapshot at the last bar of `frame`.
    pub fn snapshot(
        &self,
        frame: &ChartFrame,
        adr: Option<f64>,
    ) -> Result<IndicatorSnapshot, SignalError> {
        let empty = || SignalError::data("cannot snapshot an empty chart");
        let last: &Bar = frame.series.last().ok_or_else(empty)?;
        let fast = frame.fast_ema();
        let slow = frame.slow_ema();

        let fast_ema = fast.last().copied().ok_or_else(empty)?;
        let slow_ema = slow.last().copied().ok_or_else(empty)?;
        let slow_ema_previous = slow
            .len()
            .checked_sub(2)
            .map(|i| slow[i])
            .unwrap_or(slow_ema);

        if !(fast_ema.is_finite() && slow_ema.is_finite() && slow_ema_previous.is_finite()) {
            return Err(SignalError::data("EMA values are not finite"));
        }

        Ok(IndicatorSnapshot {
            timestamp: last.timestamp,
            fast_ema,
            slow_ema,
            slow_ema_previous,
            last_close: last.close,
            period_high: frame.series.period_high().ok_or_else(empty)?,
            period_low: frame.series.period_low().ok_or_else(empty)?,
            adr,
        })
    }
}

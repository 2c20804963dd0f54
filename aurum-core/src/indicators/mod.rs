//! Indicators: EMA of close, True Range and the ADR volatility envelope.
//!
//! Indicators are pure functions: bar history in, one value per bar out.
//! Running one twice on the same input gives bit-identical output.

pub mod ema;
pub mod range;

pub use ema::{ema_of_series, Ema};
pub use range::{true_range, Adr};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Bar;

/// Smoothing convention for exponentially weighted averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// `ema[0] = x[0]`, `ema[i] = a*x[i] + (1-a)*ema[i-1]`.
    #[default]
    Recursive,
    /// Bias-adjusted weighted mean `sum((1-a)^k * x[i-k]) / sum((1-a)^k)`.
    Adjusted,
}

/// An indicator over a bar series.
///
/// Output has the same length as the input. Values before `lookback()` bars
/// are available may be less meaningful but are never look-ahead: the value
/// at bar t depends only on bars `0..=t`.
pub trait Indicator: Send + Sync {
    /// Column name (e.g. "ema_5", "adr_14").
    fn name(&self) -> &str;

    /// Bars needed before the value is meaningful.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Smallest series the indicator accepts: the lookback plus the bar
    /// being evaluated.
    fn min_bars(&self) -> usize {
        self.lookback() + 1
    }
}

/// Named indicator columns aligned with a series, one value per bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorValues {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Compute `indicator` over `bars` and store it under its name.
    pub fn insert_computed(&mut self, indicator: &dyn Indicator, bars: &[Bar]) {
        self.insert(indicator.name(), indicator.compute(bars));
    }

    /// Value of a column at a bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Last value of a column.
    pub fn last(&self, name: &str) -> Option<f64> {
        self.series.get(name).and_then(|v| v.last().copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Column names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Assert two f64 values are approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

//! Series: an ordered, validated sequence of bars for one instrument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

/// Reasons a bar sequence cannot become a `Series`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} is not strictly after bar {prev}: timestamps must be strictly increasing")]
    Unordered { index: usize, prev: usize },

    #[error("bar {index} violates low <= open/close <= high or has a non-positive price")]
    InsaneBar { index: usize },
}

/// Bars ordered strictly by timestamp with no duplicates.
///
/// Built fresh on every evaluation cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Validate and wrap a bar sequence.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::InsaneBar { index: i });
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(SeriesError::Unordered {
                    index: i,
                    prev: i - 1,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Build from bars in arbitrary order: sorts by timestamp and keeps the
    /// last bar for any duplicated timestamp. Insane bars are still rejected.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, SeriesError> {
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(deduped)
    }

    /// Wrap bars already known to be ordered and sane (resampler output).
    pub(crate) fn from_ordered(bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { bars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Highest high over the whole series.
    pub fn period_high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }

    /// Lowest low over the whole series.
    pub fn period_low(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.low).reduce(f64::min)
    }

    pub fn total_volume(&self) -> f64 {
        self.bars.iter().map(|b| b.volume).sum()
    }
}

impl TryFrom<Vec<Bar>> for Series {
    type Error = SeriesError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<Series> for Vec<Bar> {
    fn from(series: Series) -> Self {
        series.bars
    }
}

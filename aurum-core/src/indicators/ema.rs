//! Exponential Moving Average (EMA) of close.
//!
//! alpha = 2 / (span + 1)
//! Recursive: EMA[0] = close[0]; EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//! Adjusted:  EMA[t] = sum((1-alpha)^k * close[t-k]) / sum((1-alpha)^k), k = 0..=t
//! Both seed at the first bar, so there is no warmup gap.

use super::{Indicator, Smoothing};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    smoothing: Smoothing,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self::with_smoothing(span, Smoothing::Recursive)
    }

    pub fn with_smoothing(span: usize, smoothing: Smoothing) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            smoothing,
            name: format!("ema_{span}"),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.span, self.smoothing)
    }
}

/// EMA of an arbitrary series (closes, true ranges).
///
/// A NaN input taints every value from that index on. Span 0 yields all NaN.
pub fn ema_of_series(values: &[f64], span: usize, smoothing: Smoothing) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    // Running numerator/denominator for the adjusted form.
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut prev = f64::NAN;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return result;
        }
        let ema = match smoothing {
            Smoothing::Recursive => {
                if i == 0 {
                    v
                } else {
                    alpha * v + decay * prev
                }
            }
            Smoothing::Adjusted => {
                weighted_sum = v + decay * weighted_sum;
                weight_total = 1.0 + decay * weight_total;
                weighted_sum / weight_total
            }
        };
        result[i] = ema;
        prev = ema;
    }

    result
}

//! Signal classifier: action and ADR exhaustion state from an indicator snapshot.
//!
//! ema_distance_pct = |fast - slow| / last_close * 100
//! ema_slope_pct    = |slow - slow_prev| / last_close * 100
//! adr_consumption  = (period_high - period_low) / adr
//!
//! A crossover alone is noise. Buy/Sell additionally require a wide enough EMA
//! gap, a slow EMA that is still moving, and a range that has not already used
//! up the ADR envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::IndicatorSnapshot;
use crate::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Wait => "WAIT",
        })
    }
}

/// How much of the ADR envelope the period range has consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionState {
    Young,
    Optimal,
    Late,
    Exhausted,
}

impl fmt::Display for ExhaustionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExhaustionState::Young => "YOUNG",
            ExhaustionState::Optimal => "OPTIMAL",
            ExhaustionState::Late => "LATE",
            ExhaustionState::Exhausted => "EXHAUSTED",
        })
    }
}

/// Operator-tunable gates. `max_adr_use_pct` is a fraction of the ADR
/// (0.60 = 60%), compared directly against `adr_consumption`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub min_ema_distance_pct: f64,
    pub min_ema_slope_pct: f64,
    pub max_adr_use_pct: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_ema_distance_pct: 0.10,
            min_ema_slope_pct: 0.03,
            max_adr_use_pct: 0.60,
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<(), SignalError> {
        for (field, value) in [
            ("min_ema_distance_pct", self.min_ema_distance_pct),
            ("min_ema_slope_pct", self.min_ema_slope_pct),
            ("max_adr_use_pct", self.max_adr_use_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SignalError::config(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Exclusive upper bounds on ADR consumption for Young, Optimal and Late.
/// Anything at or above `late` is Exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustionBands {
    pub young: f64,
    pub optimal: f64,
    pub late: f64,
}

impl Default for ExhaustionBands {
    fn default() -> Self {
        Self {
            young: 0.30,
            optimal: 0.60,
            late: 0.80,
        }
    }
}

impl ExhaustionBands {
    pub fn validate(&self) -> Result<(), SignalError> {
        let ordered = self.young > 0.0 && self.young < self.optimal && self.optimal < self.late;
        if !ordered || !self.late.is_finite() {
            return Err(SignalError::config(format!(
                "exhaustion bands must satisfy 0 < young < optimal < late, got {} / {} / {}",
                self.young, self.optimal, self.late
            )));
        }
        Ok(())
    }

    pub fn state(&self, adr_consumption: f64) -> ExhaustionState {
        if adr_consumption < self.young {
            ExhaustionState::Young
        } else if adr_consumption < self.optimal {
            ExhaustionState::Optimal
        } else if adr_consumption < self.late {
            ExhaustionState::Late
        } else {
            ExhaustionState::Exhausted
        }
    }
}

/// Classifier output for one symbol and cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub action: Action,
    /// `None` when the ADR is unavailable.
    pub exhaustion: Option<ExhaustionState>,
    pub adr_consumption: Option<f64>,
    pub ema_distance_pct: f64,
    pub ema_slope_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalClassifier {
    thresholds: ClassifierThresholds,
    bands: ExhaustionBands,
}

impl SignalClassifier {
    pub fn new(
        thresholds: ClassifierThresholds,
        bands: ExhaustionBands,
    ) -> Result<Self, SignalError> {
        thresholds.validate()?;
        bands.validate()?;
        Ok(Self { thresholds, bands })
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn bands(&self) -> &ExhaustionBands {
        &self.bands
    }

    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> Classification {
        classify(snapshot, &self.thresholds, &self.bands)
    }
}

/// ADR consumption, or `None` when the ADR is missing or not positive.
pub fn adr_consumption(snapshot: &IndicatorSnapshot) -> Option<f64> {
    snapshot
        .adr
        .filter(|adr| adr.is_finite() && *adr > 0.0)
        .map(|adr| (snapshot.period_high - snapshot.period_low) / adr)
}

/// Pure classification of a snapshot.
pub fn classify(
    snapshot: &IndicatorSnapshot,
    thresholds: &ClassifierThresholds,
    bands: &ExhaustionBands,
) -> Classification {
    let fast = snapshot.fast_ema;
    let slow = snapshot.slow_ema;
    let ema_distance_pct = (fast - slow).abs() / snapshot.last_close * 100.0;
    let ema_slope_pct = (slow - snapshot.slow_ema_previous).abs() / snapshot.last_close * 100.0;
    let consumption = adr_consumption(snapshot);

    let action = match consumption {
        Some(c)
            if ema_distance_pct >= thresholds.min_ema_distance_pct
                && ema_slope_pct >= thresholds.min_ema_slope_pct
                && c <= thresholds.max_adr_use_pct =>
        {
            if fast > slow {
                Action::Buy
            } else if fast < slow {
                Action::Sell
            } else {
                Action::Wait
            }
        }
        _ => Action::Wait,
    };

    Classification {
        action,
        exhaustion: consumption.map(|c| bands.state(c)),
        adr_consumption: consumption,
        ema_distance_pct,
        ema_slope_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Snapshot with last_close = 100 so percentages read directly off the EMA gaps.
    fn snapshot(fast: f64, slow: f64, slow_prev: f64, range: f64, adr: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            fast_ema: fast,
            slow_ema: slow,
            slow_ema_previous: slow_prev,
            last_close: 100.0,
            period_high: 100.0 + range,
            period_low: 100.0,
            adr,
        }
    }

    fn defaults() -> (ClassifierThresholds, ExhaustionBands) {
        (ClassifierThresholds::default(), ExhaustionBands::default())
    }

    #[test]
    fn buy_when_all_gates_pass() {
        let (t, b) = defaults();
        // distance 0.5%, slope 0.1%, consumption 0.4
        let c = classify(&snapshot(100.5, 100.0, 99.9, 4.0, Some(10.0)), &t, &b);
        assert_eq!(c.action, Action::Buy);
        assert_eq!(c.exhaustion, Some(ExhaustionState::Optimal));
        assert!((c.ema_distance_pct - 0.5).abs() < 1e-9);
        assert!((c.ema_slope_pct - 0.1).abs() < 1e-9);
        assert!((c.adr_consumption.unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn sell_when_fast_below_slow() {
        let (t, b) = defaults();
        let c = classify(&snapshot(99.5, 100.0, 100.1, 2.0, Some(10.0)), &t, &b);
        assert_eq!(c.action, Action::Sell);
        assert_eq!(c.exhaustion, Some(ExhaustionState::Young));
    }

    #[test]
    fn equal_emas_always_wait() {
        let zero = ClassifierThresholds {
            min_ema_distance_pct: 0.0,
            min_ema_slope_pct: 0.0,
            max_adr_use_pct: 10.0,
        };
        let c = classify(
            &snapshot(100.0, 100.0, 90.0, 1.0, Some(10.0)),
            &zero,
            &ExhaustionBands::default(),
        );
        assert_eq!(c.action, Action::Wait);
    }

    #[test]
    fn distance_gate_blocks() {
        let (t, b) = defaults();
        // distance 0.05% < 0.10%
        let c = classify(&snapshot(100.05, 100.0, 99.9, 4.0, Some(10.0)), &t, &b);
        assert_eq!(c.action, Action::Wait);
    }

    #[test]
    fn slope_gate_blocks() {
        let (t, b) = defaults();
        // slope 0.01% < 0.03%
        let c = classify(&snapshot(100.5, 100.0, 99.99, 4.0, Some(10.0)), &t, &b);
        assert_eq!(c.action, Action::Wait);
    }

    #[test]
    fn consumption_gate_blocks() {
        let (t, b) = defaults();
        // consumption 0.7 > 0.6
        let c = classify(&snapshot(100.5, 100.0, 99.9, 7.0, Some(10.0)), &t, &b);
        assert_eq!(c.action, Action::Wait);
        assert_eq!(c.exhaustion, Some(ExhaustionState::Late));
    }

    #[test]
    fn consumption_at_limit_passes() {
        let (t, b) = defaults();
        let c = classify(&snapshot(100.5, 100.0, 99.9, 6.0, Some(10.0)), &t, &b);
        assert_eq!(c.adr_consumption, Some(0.6));
        assert_eq!(c.action, Action::Buy);
        assert_eq!(c.exhaustion, Some(ExhaustionState::Late));
    }

    #[test]
    fn missing_or_zero_adr_waits_without_state() {
        let (t, b) = defaults();
        for adr in [None, Some(0.0), Some(-3.0)] {
            let c = classify(&snapshot(100.5, 100.0, 99.9, 4.0, adr), &t, &b);
            assert_eq!(c.action, Action::Wait);
            assert_eq!(c.exhaustion, None);
            assert_eq!(c.adr_consumption, None);
        }
    }

    #[test]
    fn band_boundaries_are_exclusive_upper() {
        let b = ExhaustionBands::default();
        assert_eq!(b.state(0.0), ExhaustionState::Young);
        assert_eq!(b.state(0.29), ExhaustionState::Young);
        assert_eq!(b.state(0.30), ExhaustionState::Optimal);
        assert_eq!(b.state(0.59), ExhaustionState::Optimal);
        assert_eq!(b.state(0.60), ExhaustionState::Late);
        assert_eq!(b.state(0.79), ExhaustionState::Late);
        assert_eq!(b.state(0.80), ExhaustionState::Exhausted);
        assert_eq!(b.state(3.0), ExhaustionState::Exhausted);
    }

    #[test]
    fn crossing_optimal_bound_flips_only_state() {
        let thresholds = ClassifierThresholds {
            max_adr_use_pct: 1.0,
            ..ClassifierThresholds::default()
        };
        let b = ExhaustionBands::default();
        let before = classify(&snapshot(100.5, 100.0, 99.9, 5.9, Some(10.0)), &thresholds, &b);
        let after = classify(&snapshot(100.5, 100.0, 99.9, 6.1, Some(10.0)), &thresholds, &b);

        assert_eq!(before.exhaustion, Some(ExhaustionState::Optimal));
        assert_eq!(after.exhaustion, Some(ExhaustionState::Late));
        assert_eq!(before.action, after.action);
        assert_eq!(before.ema_distance_pct, after.ema_distance_pct);
        assert_eq!(before.ema_slope_pct, after.ema_slope_pct);
    }

    #[test]
    fn rejects_negative_thresholds() {
        let t = ClassifierThresholds {
            min_ema_slope_pct: -0.01,
            ..ClassifierThresholds::default()
        };
        assert!(SignalClassifier::new(t, ExhaustionBands::default()).is_err());
    }

    #[test]
    fn rejects_unordered_bands() {
        let b = ExhaustionBands {
            young: 0.6,
            optimal: 0.3,
            late: 0.8,
        };
        assert!(matches!(
            SignalClassifier::new(ClassifierThresholds::default(), b),
            Err(SignalError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn display_labels() {
        assert_eq!(Action::Buy.to_string(), "BUY");
        assert_eq!(ExhaustionState::Exhausted.to_string(), "EXHAUSTED");
    }
}

//! Fixed-fractional risk toolkit: position sizing, expectancy, Kelly,
//! ruin probability and Monte Carlo equity paths.
//!
//! Each trade risks a fixed amount `R` and either wins `R * reward_risk` with
//! probability `win_rate` or loses `R`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    NotProbability { field: &'static str, value: f64 },

    #[error("{field} must be at least 1")]
    Empty { field: &'static str },
}

fn positive(field: &'static str, value: f64) -> Result<f64, RiskError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RiskError::NotPositive { field, value })
    }
}

fn probability(field: &'static str, value: f64) -> Result<f64, RiskError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(RiskError::NotProbability { field, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Money at risk on the trade.
    pub risk_amount: f64,
    pub lots: f64,
}

/// Size a position so that hitting the stop loses `risk_pct` percent of `capital`.
pub fn position_size(
    capital: f64,
    risk_pct: f64,
    stop_loss_pips: f64,
    pip_value: f64,
) -> Result<PositionSize, RiskError> {
    let capital = positive("capital", capital)?;
    let risk_pct = positive("risk_pct", risk_pct)?;
    let stop_loss_pips = positive("stop_loss_pips", stop_loss_pips)?;
    let pip_value = positive("pip_value", pip_value)?;

    let risk_amount = capital * risk_pct / 100.0;
    Ok(PositionSize {
        risk_amount,
        lots: risk_amount / (stop_loss_pips * pip_value),
    })
}

/// Expected profit per trade: `R * (p * RR - (1 - p))`.
pub fn expectancy(win_rate: f64, reward_risk: f64, risk: f64) -> Result<f64, RiskError> {
    let p = probability("win_rate", win_rate)?;
    let rr = positive("reward_risk", reward_risk)?;
    let risk = positive("risk", risk)?;
    Ok(risk * (p * rr - (1.0 - p)))
}

/// Minimum win rate for positive expectancy: `1 / (RR + 1)`.
pub fn breakeven_win_rate(reward_risk: f64) -> Result<f64, RiskError> {
    let rr = positive("reward_risk", reward_risk)?;
    Ok(1.0 / (rr + 1.0))
}

/// Full Kelly fraction `(p * RR - (1 - p)) / RR`. Negative means no edge.
pub fn kelly_fraction(win_rate: f64, reward_risk: f64) -> Result<f64, RiskError> {
    let p = probability("win_rate", win_rate)?;
    let rr = positive("reward_risk", reward_risk)?;
    Ok((p * rr - (1.0 - p)) / rr)
}

/// Cramér-Lundberg style approximation `((1 - p) / p) ^ units`, where
/// `units` is the starting capital measured in risk units. Certain ruin
/// (1.0) at or below a 50% win rate.
pub fn risk_of_ruin(win_rate: f64, capital_units: f64) -> Result<f64, RiskError> {
    let p = probability("win_rate", win_rate)?;
    let units = positive("capital_units", capital_units)?;
    if p <= 0.5 {
        return Ok(1.0);
    }
    Ok(((1.0 - p) / p).powf(units))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub capital: f64,
    pub risk_pct: f64,
    pub win_rate: f64,
    pub reward_risk: f64,
    pub trades: usize,
    pub paths: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            capital: 10_000.0,
            risk_pct: 1.0,
            win_rate: 0.55,
            reward_risk: 2.0,
            trades: 300,
            paths: 50,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), RiskError> {
        positive("capital", self.capital)?;
        positive("risk_pct", self.risk_pct)?;
        probability("win_rate", self.win_rate)?;
        positive("reward_risk", self.reward_risk)?;
        if self.trades == 0 {
            return Err(RiskError::Empty { field: "trades" });
        }
        if self.paths == 0 {
            return Err(RiskError::Empty { field: "paths" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One curve per path, starting at the initial capital. A ruined path
    /// ends at the first trade that took capital to zero or below.
    pub curves: Vec<Vec<f64>>,
    pub final_capitals: Vec<f64>,
    /// Per-step mean across paths, each ruined path held at its last value.
    pub mean_curve: Vec<f64>,
    pub ruined: usize,
}

impl SimulationResult {
    pub fn ruin_rate(&self) -> f64 {
        if self.curves.is_empty() {
            return 0.0;
        }
        self.ruined as f64 / self.curves.len() as f64
    }

    pub fn median_final(&self) -> f64 {
        let mut sorted = self.final_capitals.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        match n {
            0 => 0.0,
            _ if n % 2 == 1 => sorted[n / 2],
            _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
        }
    }
}

/// Monte Carlo equity paths with a fixed risk amount per trade.
///
/// The risk amount is `capital * risk_pct / 100` of the initial capital and
/// does not compound. Pass a seeded `StdRng` for reproducible output.
pub fn simulate_equity<R: Rng + ?Sized>(
    params: &SimulationParams,
    rng: &mut R,
) -> Result<SimulationResult, RiskError> {
    params.validate()?;

    let risk = params.capital * params.risk_pct / 100.0;
    let reward = risk * params.reward_risk;

    let mut curves = Vec::with_capacity(params.paths);
    let mut ruined = 0usize;

    for _ in 0..params.paths {
        let mut capital = params.capital;
        let mut curve = Vec::with_capacity(params.trades + 1);
        curve.push(capital);
        for _ in 0..params.trades {
            if rng.gen::<f64>() < params.win_rate {
                capital += reward;
            } else {
                capital -= risk;
            }
            curve.push(capital);
            if capital <= 0.0 {
                ruined += 1;
                break;
            }
        }
        curves.push(curve);
    }

    let final_capitals: Vec<f64> = curves
        .iter()
        .map(|c| c.last().copied().unwrap_or(params.capital))
        .collect();

    let steps = params.trades + 1;
    let mean_curve = (0..steps)
        .map(|i| {
            let sum: f64 = curves
                .iter()
                .map(|c| c.get(i).or_else(|| c.last()).copied().unwrap_or(0.0))
                .sum();
            sum / curves.len() as f64
        })
        .collect();

    tracing::debug!(
        paths = params.paths,
        trades = params.trades,
        ruined,
        "equity simulation finished"
    );

    Ok(SimulationResult {
        curves,
        final_capitals,
        mean_curve,
        ruined,
    })
}

//! Fitness function: composite score used to rank optimization candidates.

use serde::{Deserialize, Serialize};

use wfalab_core::engine::BacktestResult;

/// Weights and caps of the composite score.
///
/// `score = sharpe·w_s + min(pf, pf_cap)·w_pf + (win_rate / 100)·w_wr
///        + max(0, 1 − dd% / dd_bound)·w_dd`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub sharpe: f64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub drawdown: f64,
    /// Profit factor above this contributes no extra score.
    pub profit_factor_cap: f64,
    /// Drawdown percent at which the drawdown term reaches zero.
    pub drawdown_bound_percent: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sharpe: 0.40,
            profit_factor: 0.25,
            win_rate: 0.20,
            drawdown: 0.15,
            profit_factor_cap: 5.0,
            drawdown_bound_percent: 50.0,
        }
    }
}

impl ScoringWeights {
    /// Score a backtest. Fewer than `min_trades` trades scores `-inf`,
    /// which excludes the candidate from ranking.
    ///
    /// Non-finite Sharpe or profit factor count as zero so one degenerate
    /// metric cannot poison the sum. An infinite profit factor (no losing
    /// trades) is capped like any other.
    pub fn score(&self, result: &BacktestResult, min_trades: usize) -> f64 {
        if result.total_trades < min_trades {
            return f64::NEG_INFINITY;
        }

        let sharpe = finite_or_zero(result.sharpe_ratio);
        let profit_factor = if result.profit_factor == f64::INFINITY {
            self.profit_factor_cap
        } else {
            finite_or_zero(result.profit_factor).min(self.profit_factor_cap)
        };
        let win_rate = finite_or_zero(result.win_rate) / 100.0;
        let drawdown = if self.drawdown_bound_percent > 0.0 {
            (1.0 - finite_or_zero(result.max_drawdown_percent) / self.drawdown_bound_percent)
                .max(0.0)
        } else {
            0.0
        };

        sharpe * self.sharpe
            + profit_factor * self.profit_factor
            + win_rate * self.win_rate
            + drawdown * self.drawdown
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

//! Summary statistics — pure functions over a trade list and equity curve.

use serde::{Deserialize, Serialize};

use crate::domain::{BarTime, Trade};

/// Trading days per year used to annualize the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One point of an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: BarTime,
    pub value: f64,
}

/// Peak-to-trough drawdown of an equity curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
}

/// Complete result of a backtest over some bar range.
///
/// `win_rate` and the `*_percent` fields are in percent (0–100 scale).
/// `profit_factor` is infinite when there are winners and no losers, and
/// serializes as the string `"inf"` in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub net_profit: f64,
    pub net_profit_percent: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    #[serde(with = "unbounded_ratio")]
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
}

/// Serde for ratios that may be `+inf`, which JSON has no number for.
mod unbounded_ratio {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const INF: &str = "inf";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str(INF)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) if text == INF => Ok(f64::INFINITY),
            Repr::Text(text) => Err(D::Error::custom(format!(
                "expected a number or \"{INF}\", got \"{text}\""
            ))),
        }
    }
}

/// Build a full result from trades and an equity curve.
pub fn calculate_backtest_stats(
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    initial_capital: f64,
    final_capital: f64,
    max_drawdown: f64,
    max_drawdown_percent: f64,
) -> BacktestResult {
    let winners: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
    let losers: Vec<f64> = trades.iter().filter(|t| t.pnl < 0.0).map(|t| t.pnl).collect();
    let gross_profit: f64 = winners.iter().sum();
    let gross_loss: f64 = losers.iter().map(|l| l.abs()).sum();

    let total_trades = trades.len();
    let win_rate = if total_trades == 0 {
        0.0
    } else {
        winners.len() as f64 / total_trades as f64 * 100.0
    };

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let net_profit = final_capital - initial_capital;
    let net_profit_percent = if initial_capital > 0.0 {
        net_profit / initial_capital * 100.0
    } else {
        0.0
    };

    let values: Vec<f64> = equity_curve.iter().map(|p| p.value).collect();

    BacktestResult {
        total_trades,
        winning_trades: winners.len(),
        losing_trades: losers.len(),
        win_rate,
        profit_factor,
        average_win: mean_f64(&winners),
        average_loss: mean_f64(&losers),
        sharpe_ratio: sharpe_ratio(&values),
        trades,
        equity_curve,
        initial_capital,
        final_capital,
        net_profit,
        net_profit_percent,
        max_drawdown,
        max_drawdown_percent,
    }
}

/// Largest peak-to-trough decline, starting from `initial_capital` as the first peak.
pub fn calculate_max_drawdown(equity_curve: &[EquityPoint], initial_capital: f64) -> Drawdown {
    let mut peak = initial_capital;
    let mut result = Drawdown::default();

    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        }
        let dd = peak - point.value;
        if dd > result.max_drawdown {
            result.max_drawdown = dd;
        }
        if peak > 0.0 {
            let dd_pct = dd / peak * 100.0;
            if dd_pct > result.max_drawdown_percent {
                result.max_drawdown_percent = dd_pct;
            }
        }
    }
    result
}

/// Annualized Sharpe ratio from per-bar equity returns (zero risk-free rate).
///
/// Returns 0.0 with fewer than 2 returns or zero variance.
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns = bar_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Simple returns between consecutive equity values.
pub fn bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

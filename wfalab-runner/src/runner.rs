//! Windowed backtest runner.
//!
//! Runs a strategy over the index window `[start, end)` of a series while
//! letting its indicators warm up on up to `lookback` bars before the
//! window. Only signals timestamped inside the window reach the engine, and
//! the reported result covers the window alone: trades entered before the
//! window start are dropped, the equity curve is cut at the window start,
//! and the summary statistics are recomputed from what remains.

use thiserror::Error;

use wfalab_core::domain::{ParameterSet, Signal};
use wfalab_core::engine::{
    calculate_backtest_stats, calculate_max_drawdown, run_backtest, BacktestResult,
    BacktestSettings,
};
use wfalab_core::series::PriceSeries;
use wfalab_core::strategy::{Strategy, StrategyError};

/// Bars of indicator history fed to the strategy ahead of each window.
pub const DEFAULT_LOOKBACK: usize = 250;

/// Errors from a single windowed backtest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("window [{start}, {end}) is outside a series of {len} bars")]
    InvalidWindow { start: usize, end: usize, len: usize },
    #[error("buffered slice [{start}, {end}) is empty")]
    EmptySlice { start: usize, end: usize },
    #[error("strategy '{strategy}' failed: {source}")]
    Strategy {
        strategy: String,
        #[source]
        source: StrategyError,
    },
}

/// Outcome of a windowed backtest.
#[derive(Debug, Clone)]
pub struct WindowedRun {
    /// Result restricted to the window.
    pub result: BacktestResult,
    /// Signals that were passed to the engine, all inside the window.
    pub signals: Vec<Signal>,
}

/// Backtest `strategy` with `params` over bars `[start, end)` of `series`.
pub fn run_windowed_backtest(
    series: &PriceSeries<'_>,
    start: usize,
    end: usize,
    strategy: &dyn Strategy,
    params: &ParameterSet,
    settings: &BacktestSettings,
    lookback: usize,
) -> Result<WindowedRun, RunError> {
    if start >= end || end > series.len() {
        return Err(RunError::InvalidWindow {
            start,
            end,
            len: series.len(),
        });
    }

    let buffered_start = start.saturating_sub(lookback);
    let buffered = series.slice(buffered_start, end);
    if buffered.is_empty() {
        return Err(RunError::EmptySlice {
            start: buffered_start,
            end,
        });
    }

    let bars = series.bars();
    let window_start = bars[start].time;
    let window_end = bars[end - 1].time;

    let signals: Vec<Signal> = strategy
        .execute(&buffered, params)
        .map_err(|source| RunError::Strategy {
            strategy: strategy.name().to_string(),
            source,
        })?
        .into_iter()
        .filter(|s| s.time >= window_start && s.time <= window_end)
        .collect();

    let raw = run_backtest(buffered.bars(), &signals, settings);

    let offset = start - buffered_start;
    let trades: Vec<_> = raw
        .trades
        .into_iter()
        .filter(|t| t.entry_time >= window_start)
        .collect();
    let equity_curve = raw.equity_curve.get(offset..).unwrap_or_default().to_vec();

    let final_capital = equity_curve
        .last()
        .map_or(settings.initial_capital, |p| p.value);
    let drawdown = calculate_max_drawdown(&equity_curve, settings.initial_capital);

    let result = calculate_backtest_stats(
        trades,
        equity_curve,
        settings.initial_capital,
        final_capital,
        drawdown.max_drawdown,
        drawdown.max_drawdown_percent,
    );

    Ok(WindowedRun { result, signals })
}

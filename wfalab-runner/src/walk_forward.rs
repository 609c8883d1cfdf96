//! Walk-forward analysis: rolling optimize-then-test windows.
//!
//! The bar series is cut into windows of `optimization_window` bars followed
//! by `test_window` bars, advancing by `step_size`. In every window:
//!
//! 1. the parameter grid is scored on the optimization bars
//! 2. the top-N candidates are averaged into one anchored parameter set
//! 3. that set is backtested in-sample (original capital) and
//!    out-of-sample (capital carried over from the previous test window)
//!
//! The test windows are then stitched together and scored for robustness.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use wfalab_core::domain::{merge_params, Bar, BarTime, ParameterSet};
use wfalab_core::engine::{BacktestResult, BacktestSettings};
use wfalab_core::series::{PriceSeries, SeriesId};
use wfalab_core::strategy::Strategy;

use crate::auto_range::{auto_range_plan, AutoRangePlan};
use crate::averager::anchored_params;
use crate::cancel::{CancellationToken, Cancelled};
use crate::fitness::ScoringWeights;
use crate::grid::{
    active_ranges, build_grid, grid_size, require_known_params, GridError, ParameterRange,
};
use crate::optimizer::{OptimizerConfig, WindowOptimizer};
use crate::robustness::{
    average_sharpe, combined_out_of_sample, parameter_stability, performance_degradation_percent,
    robustness_score, walk_forward_efficiency,
};
use crate::runner::{run_windowed_backtest, RunError, DEFAULT_LOOKBACK};

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for a walk-forward run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Bars per optimization (in-sample) window.
    pub optimization_window: usize,
    /// Bars per test (out-of-sample) window.
    pub test_window: usize,
    /// Bars the window start advances each step.
    pub step_size: usize,
    /// Candidates averaged into the anchored parameter set.
    pub top_n: usize,
    /// Candidates with fewer trades are not ranked.
    pub min_trades: usize,
    /// Indicator warm-up bars fed ahead of each window.
    pub lookback: usize,
    pub backtest: BacktestSettings,
    pub optimizer: OptimizerConfig,
    pub scoring: ScoringWeights,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            optimization_window: 252,
            test_window: 63,
            step_size: 63,
            top_n: 5,
            min_trades: 3,
            lookback: DEFAULT_LOOKBACK,
            backtest: BacktestSettings::default(),
            optimizer: OptimizerConfig::default(),
            scoring: ScoringWeights::default(),
        }
    }
}

impl WalkForwardConfig {
    fn validate(&self) -> Result<(), WalkForwardError> {
        let invalid = |msg: &str| Err(WalkForwardError::InvalidConfig(msg.to_string()));
        if self.optimization_window == 0 {
            return invalid("optimization_window must be positive");
        }
        if self.test_window == 0 {
            return invalid("test_window must be positive");
        }
        if self.step_size == 0 {
            return invalid("step_size must be positive");
        }
        if self.top_n == 0 {
            return invalid("top_n must be positive");
        }
        let capital = self.backtest.initial_capital;
        if !(capital.is_finite() && capital > 0.0) {
            return invalid("initial_capital must be a positive number");
        }
        Ok(())
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Bar index bounds of one window. Ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub index: usize,
    pub optimization_start: usize,
    pub optimization_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

/// How the optimizer fared on a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowDiagnostics {
    pub candidates_evaluated: usize,
    /// Candidates meeting `min_trades`.
    pub candidates_admissible: usize,
    pub candidate_failures: usize,
    pub first_failure: Option<String>,
    /// No admissible candidate: parameters are the range midpoints.
    pub used_fallback: bool,
}

/// One completed walk-forward window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub index: usize,
    pub optimization_start: usize,
    pub optimization_end: usize,
    pub test_start: usize,
    pub test_end: usize,
    pub optimization_start_time: BarTime,
    /// Time of the last optimization bar.
    pub optimization_end_time: BarTime,
    pub test_start_time: BarTime,
    /// Time of the last test bar.
    pub test_end_time: BarTime,
    /// Anchored values of the ranged parameters.
    pub optimized_params: ParameterSet,
    pub in_sample: BacktestResult,
    pub out_of_sample: BacktestResult,
    /// In-sample Sharpe minus out-of-sample Sharpe.
    pub sharpe_degradation: f64,
    pub performance_degradation_percent: f64,
    pub diagnostics: WindowDiagnostics,
}

/// Complete result of a walk-forward run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub strategy: String,
    /// Identity of the analysed bar series.
    pub series_id: SeriesId,
    pub ranges: Vec<ParameterRange>,
    pub grid_size: usize,
    pub windows: Vec<WalkForwardWindow>,
    pub combined_oos: BacktestResult,
    pub avg_in_sample_sharpe: f64,
    pub avg_out_of_sample_sharpe: f64,
    pub walk_forward_efficiency: f64,
    /// 0–100.
    pub parameter_stability: f64,
    /// 0–100.
    pub robustness_score: u32,
    pub window_count: usize,
    pub optimization_time_ms: u64,
}

/// Reported after each completed window.
#[derive(Debug, Clone)]
pub struct WindowProgress {
    /// Windows completed so far, including this one.
    pub completed: usize,
    pub total: usize,
    pub params: ParameterSet,
    pub out_of_sample_net_profit_percent: f64,
}

/// Errors from a walk-forward run.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("insufficient data: {total_bars} bars < one window of {required}")]
    InsufficientData { total_bars: usize, required: usize },
    #[error("no walk-forward window fits in {total_bars} bars")]
    NoWindows { total_bars: usize },
    #[error("backtest failed in window {window}: {source}")]
    WindowBacktest {
        window: usize,
        #[source]
        source: RunError,
    },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

// ─── Scheduling ──────────────────────────────────────────────────────

/// Window bounds for `total_bars` under `config`.
///
/// Windows start at 0 and advance by `step_size` while the whole
/// optimization + test span still fits.
pub fn plan_windows(
    total_bars: usize,
    config: &WalkForwardConfig,
) -> Result<Vec<WindowBounds>, WalkForwardError> {
    let required = config.optimization_window + config.test_window;
    if total_bars < required {
        return Err(WalkForwardError::InsufficientData {
            total_bars,
            required,
        });
    }

    let step = config.step_size.max(1);
    let windows: Vec<WindowBounds> = (0..)
        .map(|i| i * step)
        .take_while(|start| start + required <= total_bars)
        .enumerate()
        .map(|(index, start)| WindowBounds {
            index,
            optimization_start: start,
            optimization_end: start + config.optimization_window,
            test_start: start + config.optimization_window,
            test_end: start + required,
        })
        .collect();

    if windows.is_empty() {
        return Err(WalkForwardError::NoWindows { total_bars });
    }
    Ok(windows)
}

// ─── Driver ──────────────────────────────────────────────────────────

type ProgressFn<'a> = Box<dyn Fn(&WindowProgress) + Send + Sync + 'a>;

/// A configured walk-forward run for one strategy.
pub struct WalkForward<'a> {
    strategy: &'a dyn Strategy,
    config: WalkForwardConfig,
    overrides: ParameterSet,
    cancel: CancellationToken,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> WalkForward<'a> {
    pub fn new(strategy: &'a dyn Strategy, config: WalkForwardConfig) -> Self {
        Self {
            strategy,
            config,
            overrides: ParameterSet::new(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Fixed parameter values layered over the strategy defaults.
    pub fn with_params(mut self, overrides: ParameterSet) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&WindowProgress) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Run with window sizes and ranges derived from the strategy defaults
    /// and the bar count.
    pub fn run_quick(mut self, bars: &[Bar]) -> Result<WalkForwardResult, WalkForwardError> {
        let defaults = merge_params(&self.strategy.default_params(), &self.overrides);
        let AutoRangePlan {
            ranges,
            optimization_window,
            test_window,
            step_size,
        } = auto_range_plan(bars.len(), &defaults);
        info!(
            strategy = self.strategy.name(),
            ranges = ranges.len(),
            optimization_window,
            test_window,
            step_size,
            "quick mode plan"
        );
        self.config.optimization_window = optimization_window;
        self.config.test_window = test_window;
        self.config.step_size = step_size;
        self.run(bars, &ranges)
    }

    /// Run the full analysis over `bars` searching `ranges`.
    pub fn run(
        &self,
        bars: &[Bar],
        ranges: &[ParameterRange],
    ) -> Result<WalkForwardResult, WalkForwardError> {
        let config = &self.config;
        config.validate()?;

        let base_params = merge_params(&self.strategy.default_params(), &self.overrides);
        let ranges = active_ranges(ranges)?;
        require_known_params(&ranges, &base_params)?;
        let grid = build_grid(&ranges, config.optimizer.max_grid_size)?;
        let bounds = plan_windows(bars.len(), config)?;

        let started = Instant::now();
        let series = PriceSeries::new(bars);
        info!(
            strategy = self.strategy.name(),
            series = %series.id(),
            bars = bars.len(),
            grid = grid.len(),
            windows = bounds.len(),
            "starting walk-forward"
        );

        let initial_capital = config.backtest.initial_capital;

        let optimizer = WindowOptimizer {
            strategy: self.strategy,
            base_params: &base_params,
            settings: &config.backtest,
            weights: &config.scoring,
            config: &config.optimizer,
            lookback: config.lookback,
            min_trades: config.min_trades,
            top_n: config.top_n,
            cancel: &self.cancel,
        };

        let mut windows = Vec::with_capacity(bounds.len());
        let mut running_capital = initial_capital;

        for b in &bounds {
            self.cancel.check()?;

            let optimization =
                optimizer.optimize(&series, b.optimization_start, b.optimization_end, &grid)?;
            let anchored = anchored_params(&optimization.top, &ranges);
            let params = merge_params(&base_params, &anchored);

            let backtest = |start: usize, end: usize, capital: f64| {
                run_windowed_backtest(
                    &series,
                    start,
                    end,
                    self.strategy,
                    &params,
                    &config.backtest.with_capital(capital),
                    config.lookback,
                )
                .map(|run| run.result)
                .map_err(|source| WalkForwardError::WindowBacktest {
                    window: b.index,
                    source,
                })
            };
            let in_sample = backtest(b.optimization_start, b.optimization_end, initial_capital)?;
            let out_of_sample = backtest(b.test_start, b.test_end, running_capital)?;
            running_capital = out_of_sample.final_capital;

            let diagnostics = WindowDiagnostics {
                candidates_evaluated: optimization.evaluated,
                candidates_admissible: optimization.admissible,
                candidate_failures: optimization.failures.len(),
                first_failure: optimization.failures.first().map(|f| f.error.clone()),
                used_fallback: optimization.top.is_empty(),
            };
            if let Some(first) = &diagnostics.first_failure {
                warn!(window = b.index, error = %first, "candidate backtest failed");
                debug!(
                    window = b.index,
                    failures = diagnostics.candidate_failures,
                    "candidates failed"
                );
            }

            let window = WalkForwardWindow {
                index: b.index,
                optimization_start: b.optimization_start,
                optimization_end: b.optimization_end,
                test_start: b.test_start,
                test_end: b.test_end,
                optimization_start_time: bars[b.optimization_start].time,
                optimization_end_time: bars[b.optimization_end - 1].time,
                test_start_time: bars[b.test_start].time,
                test_end_time: bars[b.test_end - 1].time,
                sharpe_degradation: in_sample.sharpe_ratio - out_of_sample.sharpe_ratio,
                performance_degradation_percent: performance_degradation_percent(
                    &in_sample,
                    &out_of_sample,
                ),
                optimized_params: anchored,
                in_sample,
                out_of_sample,
                diagnostics,
            };

            info!(
                window = window.index + 1,
                of = bounds.len(),
                params = ?window.optimized_params,
                is_pct = window.in_sample.net_profit_percent,
                oos_pct = window.out_of_sample.net_profit_percent,
                fallback = window.diagnostics.used_fallback,
                "window done"
            );
            if let Some(progress) = &self.progress {
                progress(&WindowProgress {
                    completed: windows.len() + 1,
                    total: bounds.len(),
                    params: window.optimized_params.clone(),
                    out_of_sample_net_profit_percent: window.out_of_sample.net_profit_percent,
                });
            }
            windows.push(window);
        }

        let combined_oos = combined_out_of_sample(&windows, initial_capital);
        let avg_in_sample_sharpe = average_sharpe(windows.iter().map(|w| &w.in_sample));
        let avg_out_of_sample_sharpe = average_sharpe(windows.iter().map(|w| &w.out_of_sample));
        let efficiency = walk_forward_efficiency(avg_in_sample_sharpe, avg_out_of_sample_sharpe);
        let stability = parameter_stability(&windows, &ranges);
        let robustness = robustness_score(&windows, efficiency, stability);
        let elapsed = started.elapsed();

        info!(
            windows = windows.len(),
            oos_net_pct = combined_oos.net_profit_percent,
            efficiency,
            stability,
            robustness,
            elapsed_ms = elapsed.as_millis() as u64,
            "walk-forward complete"
        );

        Ok(WalkForwardResult {
            strategy: self.strategy.name().to_string(),
            series_id: series.id(),
            grid_size: grid_size(&ranges),
            ranges,
            window_count: windows.len(),
            windows,
            combined_oos,
            avg_in_sample_sharpe,
            avg_out_of_sample_sharpe,
            walk_forward_efficiency: efficiency,
            parameter_stability: stability,
            robustness_score: robustness,
            optimization_time_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Run a walk-forward analysis with default parameters and no cancellation.
pub fn run_walk_forward(
    bars: &[Bar],
    strategy: &dyn Strategy,
    ranges: &[ParameterRange],
    config: WalkForwardConfig,
) -> Result<WalkForwardResult, WalkForwardError> {
    WalkForward::new(strategy, config).run(bars, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(opt: usize, test: usize, step: usize) -> WalkForwardConfig {
        WalkForwardConfig {
            optimization_window: opt,
            test_window: test,
            step_size: step,
            ..WalkForwardConfig::default()
        }
    }

    #[test]
    fn plan_advances_by_step_while_windows_fit() {
        let windows = plan_windows(1000, &config(400, 100, 100)).unwrap();
        assert_eq!(windows.len(), 6);
        assert_eq!(windows[0].optimization_start, 0);
        assert_eq!(windows[0].test_start, 400);
        assert_eq!(windows[5].optimization_start, 500);
        assert_eq!(windows[5].test_end, 1000);
        assert!(windows.iter().enumerate().all(|(i, w)| w.index == i));
    }

    #[test]
    fn plan_exact_fit_gives_one_window() {
        let windows = plan_windows(500, &config(400, 100, 100)).unwrap();
        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn plan_rejects_short_data() {
        let err = plan_windows(499, &config(400, 100, 100)).unwrap_err();
        assert!(matches!(
            err,
            WalkForwardError::InsufficientData {
                total_bars: 499,
                required: 500
            }
        ));
    }

    #[test]
    fn plan_with_overlapping_test_windows() {
        let windows = plan_windows(300, &config(100, 50, 25)).unwrap();
        assert_eq!(windows.len(), 7);
        assert_eq!(windows[6].test_end, 300);
    }

    #[test]
    fn config_validation() {
        for bad in [config(0, 10, 10), config(10, 0, 10), config(10, 10, 0)] {
            assert!(matches!(
                bad.validate(),
                Err(WalkForwardError::InvalidConfig(_))
            ));
        }
        let mut no_capital = config(10, 10, 10);
        no_capital.backtest.initial_capital = 0.0;
        assert!(no_capital.validate().is_err());
        assert!(WalkForwardConfig::default().validate().is_ok());
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let parsed: WalkForwardConfig =
            serde_json::from_str(r#"{"optimization_window": 100, "test_window": 20}"#).unwrap();
        assert_eq!(parsed.optimization_window, 100);
        assert_eq!(parsed.test_window, 20);
        assert_eq!(parsed.step_size, 63);
        assert_eq!(parsed.top_n, 5);
        assert_eq!(parsed.min_trades, 3);
        assert_eq!(parsed.lookback, DEFAULT_LOOKBACK);
    }
}

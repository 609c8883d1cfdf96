//! Per-window grid optimizer.
//!
//! Evaluates every grid candidate on the optimization window in fixed-size
//! batches. Each batch is scored (in parallel when enabled), then the pool of
//! survivors is pruned to `2 × top_n` so memory stays bounded on large grids.
//! Cancellation is checked between batches.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wfalab_core::domain::{merge_params, ParameterSet};
use wfalab_core::engine::{BacktestResult, BacktestSettings};
use wfalab_core::series::PriceSeries;
use wfalab_core::strategy::Strategy;

use crate::cancel::{CancellationToken, Cancelled};
use crate::fitness::ScoringWeights;
use crate::grid::GRID_SAFETY_CAP;
use crate::runner::{run_windowed_backtest, RunError};

/// Batch and parallelism settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub batch_size: usize,
    /// Score each batch on the rayon pool.
    pub parallel: bool,
    pub max_grid_size: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            parallel: true,
            max_grid_size: GRID_SAFETY_CAP,
        }
    }
}

/// A scored candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// The grid point (range parameters only).
    pub params: ParameterSet,
    pub result: BacktestResult,
    pub score: f64,
}

/// A candidate whose backtest failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub params: ParameterSet,
    pub error: String,
}

/// Output of one window's optimization.
#[derive(Debug, Clone, Default)]
pub struct WindowOptimization {
    /// Best candidates by score, descending, at most `top_n`.
    pub top: Vec<OptimizationResult>,
    pub evaluated: usize,
    /// Candidates with a finite score.
    pub admissible: usize,
    pub failures: Vec<CandidateFailure>,
}

/// Everything needed to score grid candidates on one series.
pub struct WindowOptimizer<'a> {
    pub strategy: &'a dyn Strategy,
    /// Strategy defaults merged with any fixed overrides.
    pub base_params: &'a ParameterSet,
    pub settings: &'a BacktestSettings,
    pub weights: &'a ScoringWeights,
    pub config: &'a OptimizerConfig,
    pub lookback: usize,
    pub min_trades: usize,
    pub top_n: usize,
    pub cancel: &'a CancellationToken,
}

impl WindowOptimizer<'_> {
    /// Score `grid` on bars `[start, end)` and keep the best `top_n`.
    pub fn optimize(
        &self,
        series: &PriceSeries<'_>,
        start: usize,
        end: usize,
        grid: &[ParameterSet],
    ) -> Result<WindowOptimization, Cancelled> {
        let batch_size = self.config.batch_size.max(1);
        let keep = self.top_n.saturating_mul(2).max(1);
        let mut out = WindowOptimization::default();

        for (batch_index, batch) in grid.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                self.cancel.check()?;
            }

            let outcomes: Vec<(&ParameterSet, Result<OptimizationResult, RunError>)> =
                if self.config.parallel {
                    batch
                        .par_iter()
                        .map(|candidate| (candidate, self.evaluate(series, start, end, candidate)))
                        .collect()
                } else {
                    batch
                        .iter()
                        .map(|candidate| (candidate, self.evaluate(series, start, end, candidate)))
                        .collect()
                };

            for (candidate, outcome) in outcomes {
                match outcome {
                    Ok(scored) if scored.score.is_finite() => {
                        out.admissible += 1;
                        out.top.push(scored);
                    }
                    Ok(_) => {}
                    Err(e) => out.failures.push(CandidateFailure {
                        params: candidate.clone(),
                        error: e.to_string(),
                    }),
                }
            }
            out.evaluated += batch.len();

            rank(&mut out.top);
            out.top.truncate(keep);
            debug!(
                batch = batch_index,
                evaluated = out.evaluated,
                admissible = out.admissible,
                best = out.top.first().map(|r| r.score),
                "optimizer batch done"
            );
        }

        out.top.truncate(self.top_n);
        Ok(out)
    }

    fn evaluate(
        &self,
        series: &PriceSeries<'_>,
        start: usize,
        end: usize,
        candidate: &ParameterSet,
    ) -> Result<OptimizationResult, RunError> {
        let params = merge_params(self.base_params, candidate);
        let run = run_windowed_backtest(
            series,
            start,
            end,
            self.strategy,
            &params,
            self.settings,
            self.lookback,
        )?;
        let score = self.weights.score(&run.result, self.min_trades);
        Ok(OptimizationResult {
            params: candidate.clone(),
            result: run.result,
            score,
        })
    }
}

/// Sort by score, best first. Ties keep grid order.
fn rank(results: &mut [OptimizationResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

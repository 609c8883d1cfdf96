//! WFALab Runner — walk-forward optimization on top of `wfalab-core`.
//!
//! - Parameter ranges and exhaustive grids
//! - Composite fitness scoring
//! - Windowed backtests with indicator warm-up
//! - Batched, optionally parallel, per-window optimization
//! - Anchored parameter averaging
//! - The walk-forward scheduler and its robustness metrics
//! - Quick mode (automatic ranges and window sizes)
//! - TOML run files and CSV bar loading

pub mod auto_range;
pub mod averager;
pub mod cancel;
pub mod config;
pub mod data_loader;
pub mod fitness;
pub mod grid;
pub mod optimizer;
pub mod robustness;
pub mod runner;
pub mod walk_forward;

pub use auto_range::{auto_range_plan, derive_ranges, window_sizing, AutoRangePlan};
pub use averager::anchored_params;
pub use cancel::{CancellationToken, Cancelled};
pub use config::{ConfigError, RunFile};
pub use data_loader::{load_bars_csv, read_bars_csv, LoadError};
pub use fitness::ScoringWeights;
pub use grid::{
    active_ranges, build_grid, generate_grid, grid_size, require_known_params, GridError,
    ParameterRange, GRID_SAFETY_CAP,
};
pub use optimizer::{
    CandidateFailure, OptimizationResult, OptimizerConfig, WindowOptimization, WindowOptimizer,
};
pub use robustness::{
    combined_out_of_sample, parameter_stability, performance_degradation_percent,
    robustness_score, walk_forward_efficiency,
};
pub use runner::{run_windowed_backtest, RunError, WindowedRun, DEFAULT_LOOKBACK};
pub use walk_forward::{
    plan_windows, run_walk_forward, WalkForward, WalkForwardConfig, WalkForwardError,
    WalkForwardResult, WalkForwardWindow, WindowBounds, WindowDiagnostics, WindowProgress,
};

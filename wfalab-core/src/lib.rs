//! WFALab Core — domain types, price series, strategies and the backtest engine.
//!
//! This crate holds everything the walk-forward engine treats as an external
//! collaborator:
//! - Domain types (bars, timestamps, signals, trades, parameter sets)
//! - `PriceSeries`: a bar slice with explicit identity and derived arrays
//! - Indicators (SMA, RSI) and reference strategies behind the `Strategy` trait
//! - The single-pass backtest engine and its summary statistics
//! - Deterministic synthetic bars

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod series;
pub mod strategy;
pub mod synthetic;

pub use domain::{compare_time, merge_params, Bar, BarTime, ParameterSet, Signal, SignalSide, Trade};
pub use engine::{
    calculate_backtest_stats, calculate_max_drawdown, run_backtest, BacktestResult,
    BacktestSettings, Drawdown, EquityPoint,
};
pub use series::{PriceSeries, SeriesId};
pub use strategy::{strategy_by_name, Strategy, StrategyError, STRATEGY_NAMES};
pub use synthetic::synthetic_bars;

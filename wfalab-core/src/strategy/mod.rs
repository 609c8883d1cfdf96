//! Strategies — pure functions from a price series and parameters to signals.
//!
//! Strategies never see capital, positions or trades. `execute` must be
//! deterministic: the same series and parameters always yield the same
//! signals. Invalid parameters are reported as `StrategyError`, never panics,
//! because an optimizer will happily visit degenerate grid points.

mod price_sma;
mod rsi_reversion;
mod sma_cross;

pub use price_sma::PriceSma;
pub use rsi_reversion::RsiReversion;
pub use sma_cross::SmaCross;

use thiserror::Error;

use crate::domain::{ParameterSet, Signal};
use crate::series::PriceSeries;

/// Errors from signal generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("missing parameter '{0}'")]
    MissingParam(String),
    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParam {
        name: String,
        value: f64,
        reason: String,
    },
}

/// A signal-generating strategy with tunable numeric parameters.
pub trait Strategy: Send + Sync {
    /// Registry name (e.g., "sma_cross").
    fn name(&self) -> &str;

    /// Parameters used when a caller does not override them.
    fn default_params(&self) -> ParameterSet;

    /// Generate signals over the whole series.
    fn execute(
        &self,
        series: &PriceSeries<'_>,
        params: &ParameterSet,
    ) -> Result<Vec<Signal>, StrategyError>;
}

/// Names accepted by [`strategy_by_name`].
pub const STRATEGY_NAMES: &[&str] = &["sma_cross", "price_sma", "rsi_reversion"];

/// Look up a built-in strategy.
pub fn strategy_by_name(name: &str) -> Option<Box<dyn Strategy>> {
    match name {
        "sma_cross" => Some(Box::new(SmaCross)),
        "price_sma" => Some(Box::new(PriceSma)),
        "rsi_reversion" => Some(Box::new(RsiReversion)),
        _ => None,
    }
}

/// Read a parameter as a raw number.
pub fn param(params: &ParameterSet, name: &str) -> Result<f64, StrategyError> {
    let value = *params
        .get(name)
        .ok_or_else(|| StrategyError::MissingParam(name.to_string()))?;
    if !value.is_finite() {
        return Err(StrategyError::InvalidParam {
            name: name.to_string(),
            value,
            reason: "must be finite".into(),
        });
    }
    Ok(value)
}

/// Longest lookback a period parameter may ask for.
pub const MAX_PERIOD: usize = 1_000_000;

/// Read a lookback-period parameter, rounded to the nearest whole bar.
pub fn period_param(params: &ParameterSet, name: &str) -> Result<usize, StrategyError> {
    let value = param(params, name)?;
    let rounded = value.round();
    if rounded < 1.0 {
        return Err(StrategyError::InvalidParam {
            name: name.to_string(),
            value,
            reason: "period must be >= 1".into(),
        });
    }
    if rounded > MAX_PERIOD as f64 {
        return Err(StrategyError::InvalidParam {
            name: name.to_string(),
            value,
            reason: format!("period must be <= {MAX_PERIOD}"),
        });
    }
    Ok(rounded as usize)
}

/// True if series `a` crossed above series `b` between bars i-1 and i.
pub(crate) fn crossed_above(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i - 1] <= b[i - 1] && a[i] > b[i]
}

/// True if series `a` crossed below series `b` between bars i-1 and i.
pub(crate) fn crossed_below(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i - 1] >= b[i - 1] && a[i] < b[i]
}

/// True if all four values around a potential crossover are defined.
pub(crate) fn defined_at(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && !(a[i].is_nan() || b[i].is_nan() || a[i - 1].is_nan() || b[i - 1].is_nan())
}

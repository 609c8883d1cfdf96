//! Moving average crossover — golden cross buys, death cross sells.

use crate::domain::{ParameterSet, Signal};
use crate::indicators::sma;
use crate::series::PriceSeries;

use super::{crossed_above, crossed_below, defined_at, period_param, Strategy, StrategyError};

/// Fast/slow SMA crossover.
///
/// Parameters: `fast_period` (default 10), `slow_period` (default 30).
/// `fast_period` must be strictly below `slow_period`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmaCross;

impl Strategy for SmaCross {
    fn name(&self) -> &str {
        "sma_cross"
    }

    fn default_params(&self) -> ParameterSet {
        [("fast_period".to_string(), 10.0), ("slow_period".to_string(), 30.0)]
            .into_iter()
            .collect()
    }

    fn execute(
        &self,
        series: &PriceSeries<'_>,
        params: &ParameterSet,
    ) -> Result<Vec<Signal>, StrategyError> {
        let fast_period = period_param(params, "fast_period")?;
        let slow_period = period_param(params, "slow_period")?;
        if fast_period >= slow_period {
            return Err(StrategyError::InvalidParam {
                name: "fast_period".into(),
                value: fast_period as f64,
                reason: format!("must be below slow_period ({slow_period})"),
            });
        }

        let closes = series.closes();
        let fast = sma(closes, fast_period);
        let slow = sma(closes, slow_period);

        let mut signals = Vec::new();
        for (i, bar) in series.bars().iter().enumerate() {
            if !defined_at(&fast, &slow, i) {
                continue;
            }
            if crossed_above(&fast, &slow, i) {
                signals.push(Signal::buy(bar.time, bar.close, "golden cross"));
            } else if crossed_below(&fast, &slow, i) {
                signals.push(Signal::sell(bar.time, bar.close, "death cross"));
            }
        }
        Ok(signals)
    }
}

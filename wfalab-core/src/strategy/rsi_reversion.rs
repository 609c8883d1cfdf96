//! RSI mean reversion.

use crate::domain::{ParameterSet, Signal};
use crate::indicators::rsi;
use crate::series::PriceSeries;

use super::{param, period_param, Strategy, StrategyError};

/// Buys when RSI recovers up through `oversold`, sells when it rolls over
/// down through `overbought`.
///
/// Parameters: `period` (14), `oversold` (30), `overbought` (70).
#[derive(Debug, Clone, Copy, Default)]
pub struct RsiReversion;

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn default_params(&self) -> ParameterSet {
        [
            ("period".to_string(), 14.0),
            ("oversold".to_string(), 30.0),
            ("overbought".to_string(), 70.0),
        ]
        .into_iter()
        .collect()
    }

    fn execute(
        &self,
        series: &PriceSeries<'_>,
        params: &ParameterSet,
    ) -> Result<Vec<Signal>, StrategyError> {
        let period = period_param(params, "period")?;
        let oversold = param(params, "oversold")?;
        let overbought = param(params, "overbought")?;
        if !(0.0..100.0).contains(&oversold) || oversold >= overbought || overbought > 100.0 {
            return Err(StrategyError::InvalidParam {
                name: "oversold".into(),
                value: oversold,
                reason: format!("need 0 <= oversold < overbought ({overbought}) <= 100"),
            });
        }

        let values = rsi(series.closes(), period);
        let mut signals = Vec::new();
        for (i, bar) in series.bars().iter().enumerate().skip(1) {
            let (prev, cur) = (values[i - 1], values[i]);
            if prev.is_nan() || cur.is_nan() {
                continue;
            }
            if prev <= oversold && cur > oversold {
                signals.push(Signal::buy(bar.time, bar.close, "rsi left oversold"));
            } else if prev >= overbought && cur < overbought {
                signals.push(Signal::sell(bar.time, bar.close, "rsi left overbought"));
            }
        }
        Ok(signals)
    }
}

//! Close-versus-SMA trend following.

use crate::domain::{ParameterSet, Signal};
use crate::indicators::sma;
use crate::series::PriceSeries;

use super::{crossed_above, crossed_below, defined_at, period_param, Strategy, StrategyError};

/// Buys when the close crosses above its SMA, sells when it crosses below.
///
/// Parameters: `period` (default 20).
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceSma;

impl Strategy for PriceSma {
    fn name(&self) -> &str {
        "price_sma"
    }

    fn default_params(&self) -> ParameterSet {
        [("period".to_string(), 20.0)].into_iter().collect()
    }

    fn execute(
        &self,
        series: &PriceSeries<'_>,
        params: &ParameterSet,
    ) -> Result<Vec<Signal>, StrategyError> {
        let period = period_param(params, "period")?;
        let closes = series.closes();
        let average = sma(closes, period);

        let mut signals = Vec::new();
        for (i, bar) in series.bars().iter().enumerate() {
            if !defined_at(closes, &average, i) {
                continue;
            }
            if crossed_above(closes, &average, i) {
                signals.push(Signal::buy(bar.time, bar.close, "close above sma"));
            } else if crossed_below(closes, &average, i) {
                signals.push(Signal::sell(bar.time, bar.close, "close below sma"));
            }
        }
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalSide;
    use crate::strategy::test_support::bars_from_closes;

    #[test]
    fn crosses_alternate_on_oscillation() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::TAU / 30.0).sin())
            .collect();
        let bars = bars_from_closes(&closes);
        let series = PriceSeries::new(&bars);

        let mut params = ParameterSet::new();
        params.insert("period".into(), 5.0);
        let signals = PriceSma.execute(&series, &params).unwrap();

        assert!(signals.len() >= 4, "expected several crosses, got {}", signals.len());
        for pair in signals.windows(2) {
            assert_ne!(pair[0].side, pair[1].side, "crosses must alternate");
        }
    }

    #[test]
    fn signal_price_is_bar_close() {
        let bars = bars_from_closes(&[10.0, 10.0, 10.0, 13.0, 9.0]);
        let series = PriceSeries::new(&bars);
        let mut params = ParameterSet::new();
        params.insert("period".into(), 3.0);

        let signals = PriceSma.execute(&series, &params).unwrap();
        assert_eq!(signals[0].side, SignalSide::Buy);
        assert_eq!(signals[0].price, 13.0);
    }
}

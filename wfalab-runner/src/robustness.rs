//! Aggregate robustness metrics over completed walk-forward windows.
//!
//! - combined out-of-sample result (trades and equity of every test window
//!   concatenated, stats recomputed)
//! - walk-forward efficiency: avg OOS Sharpe / avg IS Sharpe
//! - parameter stability: how little the chosen parameters move between
//!   windows, 0–100
//! - robustness score: weighted blend of the above plus OOS consistency,
//!   0–100

use wfalab_core::engine::{calculate_backtest_stats, calculate_max_drawdown, BacktestResult};

use crate::grid::ParameterRange;
use crate::walk_forward::WalkForwardWindow;

/// Percent change from in-sample to out-of-sample net profit percent,
/// relative to the in-sample magnitude. Zero when in-sample is exactly zero.
pub fn performance_degradation_percent(in_sample: &BacktestResult, out_of_sample: &BacktestResult) -> f64 {
    let is_pct = in_sample.net_profit_percent;
    if is_pct == 0.0 {
        return 0.0;
    }
    (is_pct - out_of_sample.net_profit_percent) / is_pct.abs() * 100.0
}

/// Concatenate every window's out-of-sample trades and equity curve.
pub fn combined_out_of_sample(windows: &[WalkForwardWindow], initial_capital: f64) -> BacktestResult {
    let trades: Vec<_> = windows
        .iter()
        .flat_map(|w| w.out_of_sample.trades.iter().cloned())
        .collect();
    let equity_curve: Vec<_> = windows
        .iter()
        .flat_map(|w| w.out_of_sample.equity_curve.iter().copied())
        .collect();

    let final_capital = equity_curve.last().map_or(initial_capital, |p| p.value);
    let drawdown = calculate_max_drawdown(&equity_curve, initial_capital);
    calculate_backtest_stats(
        trades,
        equity_curve,
        initial_capital,
        final_capital,
        drawdown.max_drawdown,
        drawdown.max_drawdown_percent,
    )
}

/// Mean Sharpe across windows; zero for no windows.
pub fn average_sharpe<'a>(results: impl Iterator<Item = &'a BacktestResult>) -> f64 {
    let (sum, n) = results.fold((0.0, 0usize), |(sum, n), r| {
        let sharpe = if r.sharpe_ratio.is_finite() { r.sharpe_ratio } else { 0.0 };
        (sum + sharpe, n + 1)
    });
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// `avg_oos / avg_is` when in-sample Sharpe is positive, otherwise zero.
pub fn walk_forward_efficiency(avg_in_sample_sharpe: f64, avg_out_of_sample_sharpe: f64) -> f64 {
    if avg_in_sample_sharpe > 0.0 {
        avg_out_of_sample_sharpe / avg_in_sample_sharpe
    } else {
        0.0
    }
}

/// `(1 − 2·avg normalized stdev) · 100`, clamped to `[0, 100]`.
///
/// Each range's stdev of chosen values is normalized by the range span; a
/// zero-span range counts as perfectly stable. No ranges scores 100.
pub fn parameter_stability(windows: &[WalkForwardWindow], ranges: &[ParameterRange]) -> f64 {
    if ranges.is_empty() || windows.is_empty() {
        return 100.0;
    }

    let total: f64 = ranges
        .iter()
        .map(|range| {
            let span = range.span();
            if span <= 0.0 {
                return 0.0;
            }
            let values: Vec<f64> = windows
                .iter()
                .map(|w| {
                    w.optimized_params
                        .get(&range.name)
                        .copied()
                        .unwrap_or(range.midpoint())
                })
                .collect();
            population_std_dev(&values) / span
        })
        .sum();

    let avg = total / ranges.len() as f64;
    ((1.0 - 2.0 * avg) * 100.0).clamp(0.0, 100.0)
}

/// Integer robustness score in `[0, 100]`.
///
/// ```text
/// 40 · clamp(wfe, 0, 1)
/// + 25 · stability / 100
/// + 20 · fraction of windows with positive OOS net profit
/// + max(0, 15 − stdev(performance degradation %) / 10)
/// ```
pub fn robustness_score(windows: &[WalkForwardWindow], efficiency: f64, stability: f64) -> u32 {
    if windows.is_empty() {
        return 0;
    }
    let efficiency = if efficiency.is_finite() { efficiency.clamp(0.0, 1.0) } else { 0.0 };

    let positive = windows
        .iter()
        .filter(|w| w.out_of_sample.net_profit > 0.0)
        .count() as f64
        / windows.len() as f64;

    let degradations: Vec<f64> = windows
        .iter()
        .map(|w| w.performance_degradation_percent)
        .filter(|d| d.is_finite())
        .collect();
    let consistency = (15.0 - population_std_dev(&degradations) / 10.0).max(0.0);

    let total = 40.0 * efficiency + 25.0 * stability / 100.0 + 20.0 * positive + consistency;
    total.round().clamp(0.0, 100.0) as u32
}

/// Population standard deviation; zero for fewer than two values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfalab_core::domain::{BarTime, ParameterSet};
    use wfalab_core::engine::EquityPoint;

    use crate::walk_forward::WindowDiagnostics;

    fn result(net_profit_percent: f64, sharpe: f64, equity: &[f64]) -> BacktestResult {
        let curve: Vec<EquityPoint> = equity
            .iter()
            .enumerate()
            .map(|(i, &value)| EquityPoint {
                time: BarTime::Timestamp(i as i64),
                value,
            })
            .collect();
        let initial = 1000.0;
        let final_capital = curve.last().map_or(initial, |p| p.value);
        let mut r = calculate_backtest_stats(Vec::new(), curve, initial, final_capital, 0.0, 0.0);
        r.net_profit_percent = net_profit_percent;
        r.sharpe_ratio = sharpe;
        r
    }

    fn window(period: f64, is_pct: f64, oos_pct: f64, oos_equity: &[f64]) -> WalkForwardWindow {
        let in_sample = result(is_pct, 1.0, &[1000.0]);
        let out_of_sample = result(oos_pct, 0.5, oos_equity);
        let performance_degradation_percent =
            performance_degradation_percent(&in_sample, &out_of_sample);
        let params: ParameterSet = [("period".to_string(), period)].into_iter().collect();
        WalkForwardWindow {
            index: 0,
            optimization_start: 0,
            optimization_end: 1,
            test_start: 1,
            test_end: 2,
            optimization_start_time: BarTime::Timestamp(0),
            optimization_end_time: BarTime::Timestamp(0),
            test_start_time: BarTime::Timestamp(1),
            test_end_time: BarTime::Timestamp(1),
            optimized_params: params,
            sharpe_degradation: in_sample.sharpe_ratio - out_of_sample.sharpe_ratio,
            performance_degradation_percent,
            in_sample,
            out_of_sample,
            diagnostics: WindowDiagnostics::default(),
        }
    }

    #[test]
    fn degradation_relative_to_in_sample_magnitude() {
        let is = result(10.0, 0.0, &[]);
        let oos = result(4.0, 0.0, &[]);
        assert!((performance_degradation_percent(&is, &oos) - 60.0).abs() < 1e-12);

        let is = result(-10.0, 0.0, &[]);
        let oos = result(-5.0, 0.0, &[]);
        assert!((performance_degradation_percent(&is, &oos) + 50.0).abs() < 1e-12);

        let is = result(0.0, 0.0, &[]);
        assert_eq!(performance_degradation_percent(&is, &oos), 0.0);
    }

    #[test]
    fn efficiency_zero_when_in_sample_not_positive() {
        assert_eq!(walk_forward_efficiency(0.0, 1.0), 0.0);
        assert_eq!(walk_forward_efficiency(-1.0, 1.0), 0.0);
        assert!((walk_forward_efficiency(2.0, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn identical_params_are_fully_stable() {
        let ranges = vec![ParameterRange::new("period", 5.0, 20.0, 5.0)];
        let windows = vec![
            window(10.0, 5.0, 2.0, &[1010.0]),
            window(10.0, 5.0, 2.0, &[1020.0]),
        ];
        assert_eq!(parameter_stability(&windows, &ranges), 100.0);
    }

    #[test]
    fn alternating_extremes_are_unstable() {
        let ranges = vec![ParameterRange::new("period", 5.0, 20.0, 5.0)];
        // Population stdev of {5, 20} is 7.5 = half the span → 1 − 2·0.5 = 0.
        let windows = vec![
            window(5.0, 5.0, 2.0, &[1010.0]),
            window(20.0, 5.0, 2.0, &[1020.0]),
        ];
        assert_eq!(parameter_stability(&windows, &ranges), 0.0);
    }

    #[test]
    fn zero_span_and_no_ranges() {
        let windows = vec![window(7.0, 1.0, 1.0, &[1000.0])];
        assert_eq!(parameter_stability(&windows, &[]), 100.0);
        let fixed = vec![ParameterRange::new("period", 7.0, 7.0, 1.0)];
        assert_eq!(parameter_stability(&windows, &fixed), 100.0);
    }

    #[test]
    fn combined_result_concatenates_windows() {
        let windows = vec![
            window(10.0, 5.0, 1.0, &[1000.0, 1010.0]),
            window(10.0, 5.0, 1.0, &[1010.0, 1030.0, 1020.0]),
        ];
        let combined = combined_out_of_sample(&windows, 1000.0);
        assert_eq!(combined.equity_curve.len(), 5);
        assert_eq!(combined.final_capital, 1020.0);
        assert!((combined.net_profit - 20.0).abs() < 1e-9);
        assert!(combined.max_drawdown > 0.0);
    }

    #[test]
    fn robustness_components() {
        // wfe 1, full stability, all windows profitable, identical degradation.
        let windows = vec![
            window(10.0, 5.0, 5.0, &[1010.0]),
            window(10.0, 5.0, 5.0, &[1010.0]),
        ];
        assert_eq!(robustness_score(&windows, 1.0, 100.0), 100);

        // wfe clamped to 0, no stability, no profitable window.
        let losing = vec![
            window(10.0, 5.0, -5.0, &[990.0]),
            window(10.0, 5.0, -5.0, &[990.0]),
        ];
        assert_eq!(robustness_score(&losing, -3.0, 0.0), 15);
    }
}

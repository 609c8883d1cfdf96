//! Reference single-pass backtest engine.
//!
//! Long-only, one position at a time:
//! - `buy` while flat opens a position at the signal price, sized at
//!   `position_size_percent` of current equity (commission included)
//! - `sell` while long closes it at the signal price
//! - equity is marked to market on every bar close
//! - a position still open on the last bar is closed at that bar's close
//!
//! Signals are matched to bars by exact timestamp. Signals whose time matches
//! no bar, or whose price is not a positive finite number, are ignored.

pub mod stats;

pub use stats::{
    calculate_backtest_stats, calculate_max_drawdown, BacktestResult, Drawdown, EquityPoint,
};

use serde::{Deserialize, Serialize};

use crate::domain::{compare_time, Bar, BarTime, Signal, SignalSide, Trade};

/// Capital, sizing and cost settings for one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// Percent of current equity committed per entry (0–100).
    pub position_size_percent: f64,
    /// Commission per side, percent of traded notional.
    pub commission_percent: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            position_size_percent: 100.0,
            commission_percent: 0.1,
        }
    }
}

impl BacktestSettings {
    /// Same settings with a different starting capital.
    pub fn with_capital(self, initial_capital: f64) -> Self {
        Self {
            initial_capital,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
struct OpenPosition {
    entry_index: usize,
    entry_time: BarTime,
    entry_price: f64,
    entry_reason: String,
    quantity: f64,
    entry_commission: f64,
}

/// Run a backtest of `signals` over `bars`.
pub fn run_backtest(bars: &[Bar], signals: &[Signal], settings: &BacktestSettings) -> BacktestResult {
    let commission_rate = settings.commission_percent / 100.0;
    let size_fraction = (settings.position_size_percent / 100.0).clamp(0.0, 1.0);

    let mut ordered: Vec<&Signal> = signals.iter().collect();
    ordered.sort_by(|a, b| compare_time(&a.time, &b.time));

    let mut cash = settings.initial_capital;
    let mut position: Option<OpenPosition> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut next_signal = 0;

    for (i, bar) in bars.iter().enumerate() {
        while next_signal < ordered.len() && ordered[next_signal].time < bar.time {
            next_signal += 1;
        }
        while next_signal < ordered.len() && ordered[next_signal].time == bar.time {
            let signal = ordered[next_signal];
            next_signal += 1;
            if !(signal.price.is_finite() && signal.price > 0.0) {
                continue;
            }
            match (signal.side, position.is_some()) {
                (SignalSide::Buy, false) => {
                    let budget = cash * size_fraction;
                    let quantity = budget / (signal.price * (1.0 + commission_rate));
                    if quantity > 0.0 {
                        let notional = quantity * signal.price;
                        let commission = notional * commission_rate;
                        cash -= notional + commission;
                        position = Some(OpenPosition {
                            entry_index: i,
                            entry_time: bar.time,
                            entry_price: signal.price,
                            entry_reason: signal.reason.clone(),
                            quantity,
                            entry_commission: commission,
                        });
                    }
                }
                (SignalSide::Sell, true) => {
                    if let Some(open) = position.take() {
                        let (trade, proceeds) = close_position(
                            open,
                            i,
                            bar.time,
                            signal.price,
                            &signal.reason,
                            commission_rate,
                        );
                        cash += proceeds;
                        trades.push(trade);
                    }
                }
                _ => {}
            }
        }

        if i + 1 == bars.len() {
            if let Some(open) = position.take() {
                let (trade, proceeds) =
                    close_position(open, i, bar.time, bar.close, "end of data", commission_rate);
                cash += proceeds;
                trades.push(trade);
            }
        }

        let held = position.as_ref().map_or(0.0, |p| p.quantity * bar.close);
        equity_curve.push(EquityPoint {
            time: bar.time,
            value: cash + held,
        });
    }

    let final_capital = equity_curve
        .last()
        .map_or(settings.initial_capital, |p| p.value);
    let drawdown = calculate_max_drawdown(&equity_curve, settings.initial_capital);

    calculate_backtest_stats(
        trades,
        equity_curve,
        settings.initial_capital,
        final_capital,
        drawdown.max_drawdown,
        drawdown.max_drawdown_percent,
    )
}

/// Close `open` and return the trade plus the cash it releases.
fn close_position(
    open: OpenPosition,
    exit_index: usize,
    exit_time: BarTime,
    exit_price: f64,
    exit_reason: &str,
    commission_rate: f64,
) -> (Trade, f64) {
    let entry_cost = open.quantity * open.entry_price + open.entry_commission;
    let exit_notional = open.quantity * exit_price;
    let exit_commission = exit_notional * commission_rate;
    let proceeds = exit_notional - exit_commission;
    let pnl = proceeds - entry_cost;

    let trade = Trade {
        entry_time: open.entry_time,
        entry_price: open.entry_price,
        entry_reason: open.entry_reason,
        exit_time,
        exit_price,
        exit_reason: exit_reason.to_string(),
        quantity: open.quantity,
        commission: open.entry_commission + exit_commission,
        pnl,
        pnl_percent: if entry_cost > 0.0 { pnl / entry_cost * 100.0 } else { 0.0 },
        bars_held: exit_index - open.entry_index,
    };
    (trade, proceeds)
}

//! Trade — a completed round-trip trade.

use serde::{Deserialize, Serialize};

use super::bar::BarTime;

/// A complete long round trip: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_time: BarTime,
    pub entry_price: f64,
    pub entry_reason: String,

    // ── Exit ──
    pub exit_time: BarTime,
    pub exit_price: f64,
    pub exit_reason: String,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    /// Entry plus exit commission.
    pub commission: f64,
    /// Net of commission.
    pub pnl: f64,
    /// Net PnL as a percent of the capital committed at entry (incl. commission).
    pub pnl_percent: f64,

    pub bars_held: usize,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(pnl: f64) -> Trade {
        Trade {
            entry_time: BarTime::Timestamp(0),
            entry_price: 100.0,
            entry_reason: "golden cross".into(),
            exit_time: BarTime::Timestamp(86_400),
            exit_price: 110.0,
            exit_reason: "death cross".into(),
            quantity: 50.0,
            commission: 10.0,
            pnl,
            pnl_percent: pnl / 50.0,
            bars_held: 1,
        }
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade(490.0).is_winner());
        assert!(!sample_trade(0.0).is_winner());
        assert!(!sample_trade(-5.0).is_winner());
    }
}

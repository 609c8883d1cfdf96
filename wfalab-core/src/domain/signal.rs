//! Trading signals emitted by strategies.

use serde::{Deserialize, Serialize};

use super::bar::BarTime;

/// Direction of a signal. The reference engine is long-only: buy opens, sell closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSide {
    Buy,
    Sell,
}

/// A single buy/sell instruction at a bar timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub time: BarTime,
    #[serde(rename = "type")]
    pub side: SignalSide,
    pub price: f64,
    pub reason: String,
}

impl Signal {
    pub fn buy(time: BarTime, price: f64, reason: impl Into<String>) -> Self {
        Self {
            time,
            side: SignalSide::Buy,
            price,
            reason: reason.into(),
        }
    }

    pub fn sell(time: BarTime, price: f64, reason: impl Into<String>) -> Self {
        Self {
            time,
            side: SignalSide::Sell,
            price,
            reason: reason.into(),
        }
    }
}
